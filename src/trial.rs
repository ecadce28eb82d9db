use std::fmt;
use std::str::FromStr;

use bon::Builder;
use log::debug;
use rand::rngs::ThreadRng;
use rand::{thread_rng, RngCore};
use serde::Serialize;

use crate::die::WeightedDie;
use crate::value::Face;
use crate::{check_count, Error, Result, Shared};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    Wide,
    Narrow,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WideRow<F> {
    pub roll: usize,
    pub faces: Vec<F>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NarrowRow<F> {
    pub roll: usize,
    pub die: usize,
    pub face: F,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Results<F> {
    Wide(Vec<WideRow<F>>),
    Narrow(Vec<NarrowRow<F>>),
}

/// Read-only view of a rolled outcome table and the faces its dice declare.
pub trait RollTable<F>
where
    F: Face,
{
    fn outcomes(&self) -> Result<&[Vec<F>]>;
    fn declared_faces(&self) -> Vec<Vec<F>>;
}

/// Rolls every die `count` times and keeps the latest roll-by-die table.
///
/// Dice are observed through shared handles, so weight changes made after
/// construction apply to the next roll.
#[derive(Debug, Builder)]
pub struct Trial<F, G = ThreadRng>
where
    F: Face,
    G: RngCore,
{
    #[builder(finish_fn)]
    rng: G,
    dice: Vec<Shared<WeightedDie<F>>>,
    #[builder(skip)]
    outcomes: Option<Vec<Vec<F>>>,
}

impl<F> Trial<F, ThreadRng>
where
    F: Face,
{
    #[must_use]
    pub fn new(dice: Vec<Shared<WeightedDie<F>>>) -> Self {
        Self::builder().dice(dice).build(thread_rng())
    }
}

impl<F, G> Trial<F, G>
where
    F: Face,
    G: RngCore,
{
    #[must_use]
    pub fn dice(&self) -> &[Shared<WeightedDie<F>>] {
        &self.dice
    }

    #[must_use]
    pub fn dice_count(&self) -> usize {
        self.dice.len()
    }

    #[must_use]
    pub fn roll_count(&self) -> Option<usize> {
        self.outcomes.as_ref().map(Vec::len)
    }

    pub fn roll(&mut self, count: usize) -> Result<()> {
        check_count(count)?;
        if self.dice.is_empty() {
            return Err(Error::InvalidConfiguration("a trial needs at least one die".into()));
        }

        let columns = self
            .dice
            .iter()
            .map(|die| die.borrow().roll_rng(count, &mut self.rng))
            .collect::<Result<Vec<_>>>()?;

        let rows = (0..count)
            .map(|r| columns.iter().map(|column| column[r].clone()).collect())
            .collect();

        debug!("replaced outcomes with {count} rolls of {} dice", self.dice.len());
        self.outcomes = Some(rows);
        Ok(())
    }

    pub fn outcomes(&self) -> Result<&[Vec<F>]> {
        self.outcomes.as_deref().ok_or(Error::NoResultsYet)
    }

    pub fn results(&self, layout: Layout) -> Result<Results<F>> {
        let outcomes = self.outcomes()?;
        let results = match layout {
            Layout::Wide => Results::Wide(
                outcomes
                    .iter()
                    .enumerate()
                    .map(|(i, faces)| WideRow {
                        roll: i + 1,
                        faces: faces.clone(),
                    })
                    .collect(),
            ),
            Layout::Narrow => Results::Narrow(
                outcomes
                    .iter()
                    .enumerate()
                    .flat_map(|(i, faces)| {
                        faces.iter().enumerate().map(move |(die, face)| NarrowRow {
                            roll: i + 1,
                            die,
                            face: face.clone(),
                        })
                    })
                    .collect(),
            ),
        };
        Ok(results)
    }

    #[must_use]
    pub fn declared_faces(&self) -> Vec<Vec<F>> {
        self.dice
            .iter()
            .map(|die| die.borrow().faces().to_vec())
            .collect()
    }
}

impl<F, G> RollTable<F> for Trial<F, G>
where
    F: Face,
    G: RngCore,
{
    fn outcomes(&self) -> Result<&[Vec<F>]> {
        Trial::outcomes(self)
    }

    fn declared_faces(&self) -> Vec<Vec<F>> {
        Trial::declared_faces(self)
    }
}

impl<F> Results<F> {
    #[must_use]
    pub fn layout(&self) -> Layout {
        match self {
            Results::Wide(_) => Layout::Wide,
            Results::Narrow(_) => Layout::Narrow,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Results::Wide(rows) => rows.len(),
            Results::Narrow(rows) => rows.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wide" => Ok(Layout::Wide),
            "narrow" => Ok(Layout::Narrow),
            _ => Err(Error::InvalidArgument(format!(
                "unknown layout {s:?}, expected \"wide\" or \"narrow\""
            ))),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Wide => f.write_str("wide"),
            Layout::Narrow => f.write_str("narrow"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::shared;

    fn trial(dice: usize, seed: u64) -> Trial<u8, StdRng> {
        let dice = (0..dice)
            .map(|_| shared(WeightedDie::new(1..=6).unwrap()))
            .collect();
        Trial::builder().dice(dice).build(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_results_before_roll() {
        let t = trial(2, 0);
        assert_eq!(t.results(Layout::Wide), Err(Error::NoResultsYet));
        assert_eq!(t.results(Layout::Narrow), Err(Error::NoResultsYet));
        assert_eq!(t.roll_count(), None);
    }

    #[test]
    fn test_wide_and_narrow_shapes() {
        let mut t = trial(3, 1);
        t.roll(5).unwrap();
        let Results::Wide(wide) = t.results(Layout::Wide).unwrap() else {
            panic!("expected wide rows");
        };
        assert_eq!(wide.len(), 5);
        assert!(wide.iter().all(|row| row.faces.len() == 3));
        assert_eq!(wide.iter().map(|row| row.roll).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

        let Results::Narrow(narrow) = t.results(Layout::Narrow).unwrap() else {
            panic!("expected narrow rows");
        };
        assert_eq!(narrow.len(), 15);
        for row in &narrow {
            assert_eq!(wide[row.roll - 1].faces[row.die], row.face);
        }
    }

    #[test]
    fn test_roll_replaces_outcomes() {
        let mut t = trial(2, 2);
        t.roll(10).unwrap();
        assert_eq!(t.roll_count(), Some(10));
        t.roll(3).unwrap();
        assert_eq!(t.roll_count(), Some(3));
        assert_eq!(t.outcomes().unwrap().len(), 3);
    }

    #[test]
    fn test_failed_roll_keeps_previous_outcomes() {
        let mut t = trial(2, 3);
        t.roll(4).unwrap();
        let before = t.outcomes().unwrap().to_vec();

        assert!(matches!(t.roll(0), Err(Error::InvalidArgument(_))));
        {
            let mut die = t.dice()[1].borrow_mut();
            for face in 1..=6 {
                die.set_weight(&face, 0).unwrap();
            }
        }
        assert!(matches!(t.roll(4), Err(Error::InvalidConfiguration(_))));
        assert_eq!(t.outcomes().unwrap(), before.as_slice());
    }

    #[test]
    fn test_trial_sees_later_weight_changes() {
        let die = shared(WeightedDie::new(['a', 'b']).unwrap());
        let mut t = Trial::builder()
            .dice(vec![die.clone(), die.clone()])
            .build(StdRng::seed_from_u64(4));
        die.borrow_mut().set_weight(&'a', 0.0).unwrap();
        t.roll(50).unwrap();
        assert!(t.outcomes().unwrap().iter().flatten().all(|f| *f == 'b'));
    }

    #[test]
    fn test_declared_faces_follow_dice() {
        let t = Trial::builder()
            .dice(vec![
                shared(WeightedDie::new(['x', 'y']).unwrap()),
                shared(WeightedDie::new(['z']).unwrap()),
            ])
            .build(StdRng::seed_from_u64(6));
        assert_eq!(t.declared_faces(), vec![vec!['x', 'y'], vec!['z']]);
        assert_eq!(RollTable::declared_faces(&t), t.declared_faces());
        assert_eq!(RollTable::outcomes(&t), Err(Error::NoResultsYet));
    }

    #[test]
    fn test_roll_without_dice() {
        let mut t: Trial<u8> = Trial::new(Vec::new());
        assert!(matches!(t.roll(1), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("wide".parse::<Layout>(), Ok(Layout::Wide));
        assert_eq!("NARROW".parse::<Layout>(), Ok(Layout::Narrow));
        assert!(matches!("tall".parse::<Layout>(), Err(Error::InvalidArgument(_))));
        assert_eq!(Layout::Narrow.to_string(), "narrow");
    }
}
