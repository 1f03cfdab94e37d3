//! Splitting sample batches into oracle-sized bursts.

use gaforest_data::Sample;
use gaforest_tree::Ensemble;
use log::debug;

use crate::oracle::{InferenceOracle, NO_CONSENSUS, OracleError};

/// Serializes the features of `samples` as consecutive little-endian `f32` values.
#[must_use]
pub fn pack_features(samples: &[Sample]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|sample| sample.features.iter().flat_map(|v| v.to_le_bytes()))
        .collect()
}

/// Converts a prediction byte back to a class, `None` for [`NO_CONSENSUS`].
#[must_use]
pub fn decode_prediction(byte: u8) -> Option<usize> {
    (byte != NO_CONSENSUS).then_some(usize::from(byte))
}

/// Uploads `ensemble` once and classifies every sample, one burst at a time.
pub fn predict_in_bursts<O>(
    oracle: &mut O,
    ensemble: &Ensemble,
    samples: &[Sample],
) -> Result<Vec<Option<usize>>, OracleError>
where
    O: InferenceOracle + ?Sized,
{
    oracle.upload(&ensemble.pack())?;
    predict_loaded(oracle, samples)
}

/// Classifies every sample with the ensemble already loaded in `oracle`.
pub fn predict_loaded<O>(oracle: &mut O, samples: &[Sample]) -> Result<Vec<Option<usize>>, OracleError>
where
    O: InferenceOracle + ?Sized,
{
    let max_burst = oracle.max_burst().max(1);
    let mut predictions = Vec::with_capacity(samples.len());
    for (burst, chunk) in samples.chunks(max_burst).enumerate() {
        debug!(
            "burst {burst}: {} samples, {} of {} processed",
            chunk.len(),
            predictions.len(),
            samples.len()
        );
        let bytes = oracle.infer(&pack_features(chunk), chunk.len())?;
        if bytes.len() != chunk.len() {
            return Err(OracleError::PredictionCount {
                expected: chunk.len(),
                found: bytes.len(),
            });
        }
        predictions.extend(bytes.into_iter().map(decode_prediction));
    }
    Ok(predictions)
}

/// Counts samples whose prediction differs from host traversal of `ensemble`.
///
/// Predictions beyond the end of `samples` (or samples beyond the end of `predictions`) are
/// ignored.
#[must_use]
pub fn count_mismatches(
    ensemble: &Ensemble,
    samples: &[Sample],
    predictions: &[Option<usize>],
    vote_classes: usize,
) -> usize {
    samples
        .iter()
        .zip(predictions)
        .filter(|(sample, predicted)| ensemble.classify(&sample.features, vote_classes) != **predicted)
        .count()
}

#[cfg(test)]
mod tests {
    use gaforest_tree::{Node, TreeTemplate, Vote};

    use super::*;
    use crate::oracle::SoftwareOracle;

    /// Counts calls forwarded to a software oracle.
    #[derive(Debug)]
    struct CountingOracle {
        inner: SoftwareOracle,
        uploads: usize,
        bursts: Vec<usize>,
    }

    impl InferenceOracle for CountingOracle {
        fn max_burst(&self) -> usize {
            self.inner.max_burst()
        }

        fn upload(&mut self, records: &[u64]) -> Result<(), OracleError> {
            self.uploads += 1;
            self.inner.upload(records)
        }

        fn infer(&mut self, features: &[u8], n_samples: usize) -> Result<Vec<u8>, OracleError> {
            self.bursts.push(n_samples);
            self.inner.infer(features, n_samples)
        }
    }

    fn threshold_ensemble(template: &TreeTemplate) -> Ensemble {
        let mut ensemble = Ensemble::abstaining(template, 3);
        for (i, tree) in ensemble.trees_mut().iter_mut().enumerate() {
            let threshold = 0.25 * (f32::from(u8::try_from(i).unwrap()) + 1.0);
            tree.set_node(template, 0, Node::decision(0, threshold));
            tree.set_node(template, 1, Node::leaf(Vote::Class(0)));
            tree.set_node(template, 2, Node::leaf(Vote::Class(1)));
        }
        ensemble
    }

    #[test]
    fn test_bursts_match_single_pass_traversal() {
        let template = TreeTemplate::new(&[2, 0, 0], 1).unwrap();
        let ensemble = threshold_ensemble(&template);
        let samples = (0..23_u8)
            .map(|i| Sample::new(vec![f32::from(i) / 23.0], 0))
            .collect::<Vec<_>>();

        let mut oracle = CountingOracle {
            inner: SoftwareOracle::new(&template, 1, 2).with_max_burst(5),
            uploads: 0,
            bursts: vec![],
        };
        let predictions = predict_in_bursts(&mut oracle, &ensemble, &samples).unwrap();

        let expected = samples
            .iter()
            .map(|s| ensemble.classify(&s.features, 2))
            .collect::<Vec<_>>();
        assert_eq!(predictions, expected);
        assert_eq!(oracle.uploads, 1);
        assert_eq!(oracle.bursts, vec![5, 5, 5, 5, 3]);
    }

    #[test]
    fn test_empty_batch_skips_inference() {
        let template = TreeTemplate::new(&[2, 0, 0], 1).unwrap();
        let mut oracle = CountingOracle {
            inner: SoftwareOracle::new(&template, 1, 2),
            uploads: 0,
            bursts: vec![],
        };
        let predictions = predict_in_bursts(&mut oracle, &threshold_ensemble(&template), &[]).unwrap();
        assert!(predictions.is_empty());
        assert!(oracle.bursts.is_empty());
    }

    #[test]
    fn test_pack_features_layout() {
        let bytes = pack_features(&[Sample::new(vec![1.0, -2.0], 0)]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &1.0_f32.to_le_bytes());
        assert_eq!(&bytes[4..], &(-2.0_f32).to_le_bytes());
    }

    #[test]
    fn test_decode_prediction() {
        assert_eq!(decode_prediction(3), Some(3));
        assert_eq!(decode_prediction(NO_CONSENSUS), None);
    }

    #[test]
    fn test_count_mismatches() {
        let template = TreeTemplate::new(&[2, 0, 0], 1).unwrap();
        let ensemble = threshold_ensemble(&template);
        let samples = (0..8_u8)
            .map(|i| Sample::new(vec![f32::from(i) / 8.0], 0))
            .collect::<Vec<_>>();
        let mut oracle = SoftwareOracle::new(&template, 1, 2);
        let mut predictions = predict_in_bursts(&mut oracle, &ensemble, &samples).unwrap();
        assert_eq!(count_mismatches(&ensemble, &samples, &predictions, 2), 0);

        predictions[1] = predictions[1].map_or(Some(0), |class| Some(1 - class));
        predictions[6] = None;
        assert_eq!(count_mismatches(&ensemble, &samples, &predictions, 2), 2);
    }
}
