use rand::{Rng, seq::SliceRandom as _};

use crate::{DatasetError, range::FeatureRanges};

/// One labelled feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: Vec<f32>,
    pub label: u8,
}

impl Sample {
    #[must_use]
    pub fn new(features: Vec<f32>, label: u8) -> Self {
        Self { features, label }
    }
}

/// Labelled samples sharing a common feature count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    samples: Vec<Sample>,
    n_features: usize,
}

impl Dataset {
    /// Creates a dataset, checking that every sample has exactly `n_features` features.
    pub fn new(samples: Vec<Sample>, n_features: usize) -> Result<Self, DatasetError> {
        if let Some((index, sample)) = samples
            .iter()
            .enumerate()
            .find(|(_, s)| s.features.len() != n_features)
        {
            return Err(DatasetError::FeatureCountMismatch {
                index,
                expected: n_features,
                found: sample.features.len(),
            });
        }
        Ok(Self {
            samples,
            n_features,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    /// Number of classes implied by the labels: the largest label plus one, 0 when empty.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.samples
            .iter()
            .map(|s| usize::from(s.label) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Observed `[min, max]` of every feature.
    #[must_use]
    pub fn feature_ranges(&self) -> FeatureRanges {
        FeatureRanges::from_samples(&self.samples, self.n_features)
    }

    /// Randomly permutes the samples in place.
    pub fn shuffle<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.samples.shuffle(rng);
    }

    /// Keeps only the first `len` samples.
    pub fn truncate(&mut self, len: usize) {
        self.samples.truncate(len);
    }

    /// Splits the samples into a leading part holding `fraction` of them (rounded down) and
    /// the remainder.
    #[must_use]
    pub fn split(&self, fraction: f32) -> (&[Sample], &[Sample]) {
        let head = fraction_of(self.samples.len(), fraction);
        self.samples.split_at(head)
    }
}

/// `floor(len * fraction)`, clamped to `[0, len]`.
///
/// Products within `f32` rounding error of an integer count as that integer, so that
/// `fraction_of(10, 0.7)` is 7 even though `0.7_f32` is slightly below 0.7.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn fraction_of(len: usize, fraction: f32) -> usize {
    let exact = f64::from(fraction) * len as f64;
    let nearest = exact.round();
    let n = if (exact - nearest).abs() <= exact * f64::from(f32::EPSILON) {
        nearest
    } else {
        exact.floor()
    };
    if n.is_nan() || n <= 0.0 {
        0
    } else {
        (n as usize).min(len)
    }
}
