//! Batch inference back ends.
//!
//! An oracle holds one uploaded ensemble and classifies bursts of samples against it. The
//! wire format mirrors the accelerator interface: node records go in as `u64` values,
//! features as raw little-endian `f32` bytes, and predictions come back as one byte per
//! sample with [`NO_CONSENSUS`] marking samples on which every tree abstained.

use gaforest_tree::{Ensemble, TreeTemplate};

/// Prediction byte for a sample that received no counted vote.
pub const NO_CONSENSUS: u8 = 0xFF;

/// Default maximum number of samples per inference call.
pub const MAX_BURST: usize = 5000;

/// Default number of classes counted by the vote.
pub const VOTE_CLASSES: usize = 32;

const FEATURE_SIZE: usize = size_of::<f32>();

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum OracleError {
    #[display("inference requested before any ensemble was uploaded")]
    NotLoaded,
    #[display("burst of {n_samples} samples exceeds the limit of {max_burst}")]
    BurstTooLarge { n_samples: usize, max_burst: usize },
    #[display("expected {expected} feature bytes, got {found}")]
    FeatureBytes { expected: usize, found: usize },
    #[display("{records} node records cannot be split into trees of {nodes_per_tree} nodes")]
    InvalidModel {
        records: usize,
        nodes_per_tree: usize,
    },
    #[display("expected {expected} prediction bytes, got {found}")]
    PredictionCount { expected: usize, found: usize },
}

/// A device (or stand-in) that classifies samples with a previously uploaded ensemble.
pub trait InferenceOracle {
    /// Largest `n_samples` accepted by [`infer`](Self::infer).
    fn max_burst(&self) -> usize;

    /// Replaces the loaded ensemble with the given packed node records.
    fn upload(&mut self, records: &[u64]) -> Result<(), OracleError>;

    /// Classifies `n_samples` samples whose features are packed as little-endian `f32`.
    ///
    /// Returns one prediction byte per sample. Reuses the most recently uploaded ensemble.
    fn infer(&mut self, features: &[u8], n_samples: usize) -> Result<Vec<u8>, OracleError>;
}

impl<O> InferenceOracle for &mut O
where
    O: InferenceOracle + ?Sized,
{
    fn max_burst(&self) -> usize {
        (**self).max_burst()
    }

    fn upload(&mut self, records: &[u64]) -> Result<(), OracleError> {
        (**self).upload(records)
    }

    fn infer(&mut self, features: &[u8], n_samples: usize) -> Result<Vec<u8>, OracleError> {
        (**self).infer(features, n_samples)
    }
}

/// Oracle that runs tree traversal on the host.
///
/// Produces exactly the predictions of [`Ensemble::classify`] on the decoded records.
#[derive(Debug, Clone)]
pub struct SoftwareOracle {
    nodes_per_tree: usize,
    n_features: usize,
    vote_classes: usize,
    max_burst: usize,
    loaded: Option<Ensemble>,
}

impl SoftwareOracle {
    /// Creates an oracle for trees shaped like `template` and samples of `n_features` features.
    ///
    /// At most 255 classes are counted so that every class id fits below [`NO_CONSENSUS`].
    #[must_use]
    pub fn new(template: &TreeTemplate, n_features: usize, vote_classes: usize) -> Self {
        Self {
            nodes_per_tree: template.len(),
            n_features,
            vote_classes: vote_classes.min(usize::from(NO_CONSENSUS)),
            max_burst: MAX_BURST,
            loaded: None,
        }
    }

    #[must_use]
    pub fn with_max_burst(self, max_burst: usize) -> Self {
        Self { max_burst, ..self }
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl InferenceOracle for SoftwareOracle {
    fn max_burst(&self) -> usize {
        self.max_burst
    }

    fn upload(&mut self, records: &[u64]) -> Result<(), OracleError> {
        let invalid = || OracleError::InvalidModel {
            records: records.len(),
            nodes_per_tree: self.nodes_per_tree,
        };
        let ensemble = Ensemble::unpack(records, self.nodes_per_tree).ok_or_else(invalid)?;
        self.loaded = Some(ensemble);
        Ok(())
    }

    fn infer(&mut self, features: &[u8], n_samples: usize) -> Result<Vec<u8>, OracleError> {
        let ensemble = self.loaded.as_ref().ok_or(OracleError::NotLoaded)?;
        if n_samples > self.max_burst {
            return Err(OracleError::BurstTooLarge {
                n_samples,
                max_burst: self.max_burst,
            });
        }
        let sample_size = self.n_features * FEATURE_SIZE;
        let expected = n_samples * sample_size;
        if features.len() != expected {
            return Err(OracleError::FeatureBytes {
                expected,
                found: features.len(),
            });
        }

        let mut values = vec![0.0; self.n_features];
        let predictions = (0..n_samples)
            .map(|i| {
                let bytes = &features[i * sample_size..(i + 1) * sample_size];
                for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(FEATURE_SIZE)) {
                    *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                }
                ensemble
                    .classify(&values, self.vote_classes)
                    .and_then(|class| u8::try_from(class).ok())
                    .unwrap_or(NO_CONSENSUS)
            })
            .collect();
        Ok(predictions)
    }
}
