//! Fitness functions: how well an ensemble classifies a batch of samples.
//!
//! Two evaluators produce identical scores for the same ensemble and samples:
//!
//! - [`TraversalEvaluator`] walks the trees on the host for each sample.
//! - [`OracleEvaluator`] uploads the ensemble to an [`InferenceOracle`] and reads back
//!   predictions in bursts. Access to the single oracle is serialized.
//!
//! The genetic algorithm scores many candidate ensembles per generation, so evaluators are
//! `Sync` and may be called from several threads at once.

use std::{
    fmt,
    sync::{Mutex, PoisonError},
};

use gaforest_data::Sample;
use gaforest_stats::class_accuracy::ClassAccuracy;
use gaforest_tree::Ensemble;

use crate::{
    burst::predict_in_bursts,
    oracle::{InferenceOracle, OracleError},
};

/// Result of scoring one ensemble on a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Fraction of correctly classified samples, 0 for an empty batch.
    pub accuracy: f32,
    /// Per-class tallies.
    pub classes: ClassAccuracy,
}

impl Evaluation {
    /// Scores predictions against the labels of `samples`.
    ///
    /// Fails with [`OracleError::PredictionCount`] unless there is one prediction per sample.
    pub fn from_predictions(
        samples: &[Sample],
        predictions: &[Option<usize>],
        n_classes: usize,
    ) -> Result<Self, OracleError> {
        if samples.len() != predictions.len() {
            return Err(OracleError::PredictionCount {
                expected: samples.len(),
                found: predictions.len(),
            });
        }
        let mut classes = ClassAccuracy::new(n_classes);
        for (sample, &predicted) in samples.iter().zip(predictions) {
            classes.record(usize::from(sample.label), predicted);
        }
        Ok(Self {
            accuracy: classes.overall(),
            classes,
        })
    }
}

/// Scores an ensemble on a batch of labelled samples.
pub trait FitnessEvaluator: fmt::Debug + Send + Sync {
    fn evaluate(&self, ensemble: &Ensemble, samples: &[Sample]) -> Result<Evaluation, OracleError>;
}

/// Scores ensembles by traversing their trees on the host.
#[derive(Debug, Clone)]
pub struct TraversalEvaluator {
    vote_classes: usize,
}

impl TraversalEvaluator {
    /// Creates an evaluator counting votes for classes in `[0, vote_classes)`.
    #[must_use]
    pub fn new(vote_classes: usize) -> Self {
        Self { vote_classes }
    }
}

impl FitnessEvaluator for TraversalEvaluator {
    fn evaluate(&self, ensemble: &Ensemble, samples: &[Sample]) -> Result<Evaluation, OracleError> {
        let predictions = samples
            .iter()
            .map(|sample| ensemble.classify(&sample.features, self.vote_classes))
            .collect::<Vec<_>>();
        Evaluation::from_predictions(samples, &predictions, self.vote_classes)
    }
}

/// Scores ensembles through an inference oracle.
pub struct OracleEvaluator<O> {
    oracle: Mutex<O>,
    vote_classes: usize,
}

impl<O> OracleEvaluator<O> {
    #[must_use]
    pub fn new(oracle: O, vote_classes: usize) -> Self {
        Self {
            oracle: Mutex::new(oracle),
            vote_classes,
        }
    }

    #[must_use]
    pub fn into_inner(self) -> O {
        self.oracle
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<O> fmt::Debug for OracleEvaluator<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleEvaluator")
            .field("vote_classes", &self.vote_classes)
            .finish_non_exhaustive()
    }
}

impl<O> FitnessEvaluator for OracleEvaluator<O>
where
    O: InferenceOracle + Send,
{
    fn evaluate(&self, ensemble: &Ensemble, samples: &[Sample]) -> Result<Evaluation, OracleError> {
        let mut oracle = self.oracle.lock().unwrap_or_else(PoisonError::into_inner);
        let predictions = predict_in_bursts(&mut *oracle, ensemble, samples)?;
        Evaluation::from_predictions(samples, &predictions, self.vote_classes)
    }
}
