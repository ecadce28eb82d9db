use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub type Count = usize;
pub type CountMap<K> = BTreeMap<K, Count>;

pub fn tally<K, I>(keys: I) -> CountMap<K>
where
    K: Ord,
    I: IntoIterator<Item = K>,
{
    let mut counts = CountMap::new();
    for key in keys {
        match counts.entry(key) {
            Entry::Vacant(e) => {
                e.insert(1);
            }
            Entry::Occupied(mut e) => {
                *e.get_mut() += 1;
            }
        }
    }
    counts
}
