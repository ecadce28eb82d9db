use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::trial::RollTable;
use crate::util::{tally, Count, CountMap};
use crate::value::Face;
use crate::{Result, Shared};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FaceCount<F> {
    pub trial: usize,
    pub die: usize,
    pub face: F,
    pub count: Count,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JackpotRow {
    pub trial: usize,
    pub roll: usize,
    pub jackpot: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComboCount<F> {
    pub trial: usize,
    pub faces: Vec<F>,
    pub count: Count,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RollFaceCount<F> {
    pub trial: usize,
    pub roll: usize,
    pub face: F,
    pub count: Count,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceCounts<F> {
    rows: Vec<FaceCount<F>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jackpots {
    trials: usize,
    rows: Vec<JackpotRow>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combinations<F> {
    rows: Vec<ComboCount<F>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollFaceCounts<F> {
    rows: Vec<RollFaceCount<F>>,
}

/// Derives statistics from the current outcome tables of one or more trials.
///
/// Nothing is cached: every call reads the trials as they are, so a trial
/// rolled again between calls yields updated statistics. Every result is
/// kept per trial (rows carry the trial index); use the `pooled` helpers to
/// merge across trials. A trial with a single die reports every roll as a
/// jackpot.
pub struct Analyzer<F>
where
    F: Face,
{
    trials: Vec<Shared<dyn RollTable<F>>>,
}

impl<F> Analyzer<F>
where
    F: Face,
{
    #[must_use]
    pub fn new<T, I>(trials: I) -> Self
    where
        T: RollTable<F> + 'static,
        I: IntoIterator<Item = Shared<T>>,
    {
        Self {
            trials: trials
                .into_iter()
                .map(|t| t as Shared<dyn RollTable<F>>)
                .collect(),
        }
    }

    pub fn push<T>(&mut self, trial: Shared<T>)
    where
        T: RollTable<F> + 'static,
    {
        self.trials.push(trial);
    }

    #[must_use]
    pub fn trials(&self) -> &[Shared<dyn RollTable<F>>] {
        &self.trials
    }

    pub fn face_counts_per_die(&self) -> Result<FaceCounts<F>> {
        let mut rows = Vec::new();
        for (t, trial) in self.trials.iter().enumerate() {
            let trial = trial.borrow();
            let outcomes = trial.outcomes()?;
            for (d, faces) in trial.declared_faces().into_iter().enumerate() {
                let observed = tally(outcomes.iter().map(|row| &row[d]));
                rows.extend(faces.into_iter().map(|face| FaceCount {
                    trial: t,
                    die: d,
                    count: observed.get(&face).copied().unwrap_or_default(),
                    face,
                }));
            }
        }
        Ok(FaceCounts { rows })
    }

    pub fn jackpot_indicator(&self) -> Result<Jackpots> {
        let mut rows = Vec::new();
        for (t, trial) in self.trials.iter().enumerate() {
            let trial = trial.borrow();
            rows.extend(
                trial
                    .outcomes()?
                    .iter()
                    .enumerate()
                    .map(|(i, faces)| JackpotRow {
                        trial: t,
                        roll: i + 1,
                        jackpot: faces.iter().all_equal(),
                    }),
            );
        }
        Ok(Jackpots {
            trials: self.trials.len(),
            rows,
        })
    }

    pub fn jackpot_count(&self) -> Result<Vec<Count>> {
        Ok(self.jackpot_indicator()?.counts())
    }

    pub fn combination_frequency(&self) -> Result<Combinations<F>> {
        let mut rows = Vec::new();
        for (t, trial) in self.trials.iter().enumerate() {
            let trial = trial.borrow();
            let combos = tally(
                trial
                    .outcomes()?
                    .iter()
                    .map(|faces| faces.iter().cloned().sorted().collect_vec()),
            );
            rows.extend(combos.into_iter().map(|(faces, count)| ComboCount {
                trial: t,
                faces,
                count,
            }));
        }
        Ok(Combinations { rows })
    }

    pub fn face_counts_per_roll(&self) -> Result<RollFaceCounts<F>> {
        let mut rows = Vec::new();
        for (t, trial) in self.trials.iter().enumerate() {
            let trial = trial.borrow();
            let outcomes = trial.outcomes()?;
            let universe: BTreeSet<F> = trial.declared_faces().into_iter().flatten().collect();
            for (i, faces) in outcomes.iter().enumerate() {
                let observed = tally(faces.iter());
                rows.extend(universe.iter().map(|face| RollFaceCount {
                    trial: t,
                    roll: i + 1,
                    face: face.clone(),
                    count: observed.get(face).copied().unwrap_or_default(),
                }));
            }
        }
        Ok(RollFaceCounts { rows })
    }
}

impl<F> fmt::Debug for Analyzer<F>
where
    F: Face,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("trials", &self.trials.len())
            .finish()
    }
}

impl<F> FaceCounts<F>
where
    F: Face,
{
    #[must_use]
    pub fn rows(&self) -> &[FaceCount<F>] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<FaceCount<F>> {
        self.rows
    }

    #[must_use]
    pub fn get(&self, trial: usize, die: usize, face: &F) -> Option<Count> {
        self.rows
            .iter()
            .find(|r| r.trial == trial && r.die == die && &r.face == face)
            .map(|r| r.count)
    }

    #[must_use]
    pub fn for_die(&self, trial: usize, die: usize) -> Vec<(F, Count)> {
        self.rows
            .iter()
            .filter(|r| r.trial == trial && r.die == die)
            .map(|r| (r.face.clone(), r.count))
            .collect()
    }

    /// Sums counts across trials, keyed by `(die, face)`.
    #[must_use]
    pub fn pooled(&self) -> CountMap<(usize, F)> {
        let mut pooled = CountMap::new();
        for r in &self.rows {
            *pooled.entry((r.die, r.face.clone())).or_default() += r.count;
        }
        pooled
    }
}

impl Jackpots {
    #[must_use]
    pub fn rows(&self) -> &[JackpotRow] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<JackpotRow> {
        self.rows
    }

    #[must_use]
    pub fn for_trial(&self, trial: usize) -> Vec<bool> {
        self.rows
            .iter()
            .filter(|r| r.trial == trial)
            .map(|r| r.jackpot)
            .collect()
    }

    #[must_use]
    pub fn counts(&self) -> Vec<Count> {
        let mut counts = vec![0; self.trials];
        for r in self.rows.iter().filter(|r| r.jackpot) {
            counts[r.trial] += 1;
        }
        counts
    }

    #[must_use]
    pub fn pooled(&self) -> Count {
        self.rows.iter().filter(|r| r.jackpot).count()
    }
}

impl<F> Combinations<F>
where
    F: Face,
{
    #[must_use]
    pub fn rows(&self) -> &[ComboCount<F>] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<ComboCount<F>> {
        self.rows
    }

    #[must_use]
    pub fn for_trial(&self, trial: usize) -> BTreeMap<Vec<F>, Count> {
        self.rows
            .iter()
            .filter(|r| r.trial == trial)
            .map(|r| (r.faces.clone(), r.count))
            .collect()
    }

    #[must_use]
    pub fn get(&self, trial: usize, faces: &[F]) -> Option<Count> {
        let key = faces.iter().cloned().sorted().collect_vec();
        self.rows
            .iter()
            .find(|r| r.trial == trial && r.faces == key)
            .map(|r| r.count)
    }

    #[must_use]
    pub fn total(&self, trial: usize) -> Count {
        self.rows
            .iter()
            .filter(|r| r.trial == trial)
            .map(|r| r.count)
            .sum()
    }

    #[must_use]
    pub fn pooled(&self) -> CountMap<Vec<F>> {
        let mut pooled = CountMap::new();
        for r in &self.rows {
            *pooled.entry(r.faces.clone()).or_default() += r.count;
        }
        pooled
    }
}

impl<F> RollFaceCounts<F>
where
    F: Face,
{
    #[must_use]
    pub fn rows(&self) -> &[RollFaceCount<F>] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<RollFaceCount<F>> {
        self.rows
    }

    #[must_use]
    pub fn get(&self, trial: usize, roll: usize, face: &F) -> Option<Count> {
        self.rows
            .iter()
            .find(|r| r.trial == trial && r.roll == roll && &r.face == face)
            .map(|r| r.count)
    }
}
