use itertools::Itertools;
use log::{debug, trace};
use num::ToPrimitive;
use rand::rngs::ThreadRng;
use rand::{thread_rng, Rng, RngCore};
use serde::Serialize;

use crate::value::{describe, Face};
use crate::{check_count, Error, Result, DEFAULT_WEIGHT};

#[derive(Clone, Debug, PartialEq)]
pub struct WeightedDie<F>
where
    F: Face,
{
    faces: Vec<F>,
    weights: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaceWeight<F> {
    pub face: F,
    pub weight: f64,
}

impl<F> WeightedDie<F>
where
    F: Face,
{
    pub fn new<I>(faces: I) -> Result<Self>
    where
        I: IntoIterator<Item = F>,
    {
        let faces = Self::validate_faces(faces.into_iter().collect())?;
        let weights = vec![DEFAULT_WEIGHT; faces.len()];
        Ok(Self { faces, weights })
    }

    pub fn with_weights<I, W>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (F, W)>,
        W: ToPrimitive,
    {
        let (faces, weights): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        let faces = Self::validate_faces(faces)?;
        let weights = weights
            .into_iter()
            .map(validate_weight)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { faces, weights })
    }

    #[must_use]
    pub fn faces(&self) -> &[F] {
        &self.faces
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    #[must_use]
    pub fn contains(&self, face: &F) -> bool {
        self.position(face).is_some()
    }

    pub fn weight(&self, face: &F) -> Result<f64> {
        self.position(face)
            .map(|i| self.weights[i])
            .ok_or_else(|| Error::UnknownFace(describe(face)))
    }

    pub fn set_weight<W>(&mut self, face: &F, weight: W) -> Result<()>
    where
        W: ToPrimitive,
    {
        let i = self
            .position(face)
            .ok_or_else(|| Error::UnknownFace(describe(face)))?;
        let weight = validate_weight(weight)?;
        debug!("face {face:?} weight {} -> {weight}", self.weights[i]);
        self.weights[i] = weight;
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<FaceWeight<F>> {
        self.faces
            .iter()
            .zip(&self.weights)
            .map(|(face, weight)| FaceWeight {
                face: face.clone(),
                weight: *weight,
            })
            .collect()
    }

    pub fn probabilities(&self) -> Result<Vec<f64>> {
        let scaled = self.scaled_weights()?;
        let total: f64 = scaled.iter().sum();
        Ok(scaled.iter().map(|w| w / total).collect_vec())
    }

    pub fn roll_rng<G>(&self, count: usize, rng: &mut G) -> Result<Vec<F>>
    where
        G: RngCore,
    {
        check_count(count)?;
        let scaled = self.scaled_weights()?;
        let total: f64 = scaled.iter().sum();
        trace!("drawing {count} faces from {} (scaled weight {total})", self.len());
        Ok((0..count)
            .map(|_| self.sample_rng(&scaled, total, rng).clone())
            .collect())
    }

    pub fn roll(&self, count: usize) -> Result<Vec<F>> {
        let mut rng: ThreadRng = thread_rng();
        self.roll_rng(count, &mut rng)
    }

    pub fn roll_once_rng<G>(&self, rng: &mut G) -> Result<F>
    where
        G: RngCore,
    {
        let mut faces = self.roll_rng(1, rng)?;
        Ok(faces.swap_remove(0))
    }

    pub fn roll_once(&self) -> Result<F> {
        let mut rng: ThreadRng = thread_rng();
        self.roll_once_rng(&mut rng)
    }

    fn sample_rng<G>(&self, scaled: &[f64], total: f64, rng: &mut G) -> &F
    where
        G: RngCore,
    {
        let x = rng.gen::<f64>() * total;
        let mut pos = 0.0;
        let mut last = 0;
        for (i, w) in scaled.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            pos += w;
            last = i;
            if x < pos {
                return &self.faces[i];
            }
        }
        // float rounding can leave x at the very top of the range
        &self.faces[last]
    }

    // Dividing by the largest weight keeps the sum finite for any valid weights.
    fn scaled_weights(&self) -> Result<Vec<f64>> {
        let max = self.weights.iter().copied().fold(0.0, f64::max);
        if max <= 0.0 {
            return Err(Error::InvalidConfiguration(
                "all face weights are zero".into(),
            ));
        }
        Ok(self.weights.iter().map(|w| w / max).collect_vec())
    }

    fn position(&self, face: &F) -> Option<usize> {
        self.faces.iter().position(|f| f == face)
    }

    fn validate_faces(faces: Vec<F>) -> Result<Vec<F>> {
        if faces.is_empty() {
            return Err(Error::InvalidConfiguration(
                "a die needs at least one face".into(),
            ));
        }
        if let Some(dup) = faces.iter().duplicates().next() {
            return Err(Error::InvalidConfiguration(format!(
                "duplicate face {}",
                describe(dup)
            )));
        }
        Ok(faces)
    }
}

fn validate_weight<W>(weight: W) -> Result<f64>
where
    W: ToPrimitive,
{
    match weight.to_f64() {
        Some(w) if w.is_finite() && w >= 0.0 => Ok(w),
        Some(w) => Err(Error::InvalidWeight(format!(
            "{w} is not a finite non-negative number"
        ))),
        None => Err(Error::InvalidWeight("value has no f64 representation".into())),
    }
}
