//! Monte Carlo simulation of weighted, labeled dice.
//!
//! A [`WeightedDie`] samples faces proportionally to their weights, a
//! [`Trial`] rolls a set of dice into a roll-by-die outcome table and an
//! [`Analyzer`] derives face counts, jackpots and combination frequencies
//! from one or more trials.

mod analyzer;
mod die;
mod trial;
mod util;
mod value;

use std::cell::RefCell;
use std::rc::Rc;

pub use analyzer::{
    Analyzer, ComboCount, Combinations, FaceCount, FaceCounts, JackpotRow, Jackpots,
    RollFaceCount, RollFaceCounts,
};
pub use die::{FaceWeight, WeightedDie};
pub use trial::{Layout, NarrowRow, Results, RollTable, Trial, WideRow};
use thiserror::Error;
pub use value::Face;

pub const DEFAULT_WEIGHT: f64 = 1.0;

pub type Shared<T: ?Sized> = Rc<RefCell<T>>;
pub type Result<T> = ::core::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("unknown face: {0}")]
    UnknownFace(String),
    #[error("invalid weight: {0}")]
    InvalidWeight(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no results yet, roll first")]
    NoResultsYet,
}

#[must_use]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

pub(crate) fn check_count(count: usize) -> Result<()> {
    if count < 1 {
        return Err(Error::InvalidArgument(format!(
            "roll count must be at least 1, got {count}"
        )));
    }
    Ok(())
}
