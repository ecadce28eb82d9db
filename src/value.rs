use std::fmt::Debug;
use std::hash::Hash;

pub trait Face: Sized + Debug + Clone + PartialEq + Eq + Hash + PartialOrd + Ord {}

impl<T> Face for T where T: Sized + Debug + Clone + PartialEq + Eq + Hash + PartialOrd + Ord {}

pub(crate) fn describe<F: Face>(face: &F) -> String {
    format!("{face:?}")
}
