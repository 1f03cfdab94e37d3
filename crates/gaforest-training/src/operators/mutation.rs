use std::ops::Range;

use gaforest_tree::Ensemble;
use rand::Rng;

use super::{probability, sampling::NodeSampler};

/// Regenerates each node of the trees in `trees` with probability `rate`.
///
/// A regenerated node is sampled from scratch, so it may switch between decision and leaf.
pub fn mutate_trees<R>(
    sampler: &NodeSampler<'_>,
    ensemble: &mut Ensemble,
    trees: Range<usize>,
    rate: f32,
    rng: &mut R,
) where
    R: Rng + ?Sized,
{
    let rate = probability(rate);
    let template = sampler.template();
    for tree in &mut ensemble.trees_mut()[trees] {
        for position in 0..tree.len() {
            if rng.random_bool(rate) {
                let node = sampler.sample_node(position, rng);
                tree.set_node(template, position, node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gaforest_data::{FeatureRange, FeatureRanges};
    use gaforest_tree::TreeTemplate;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::params::TrainingParams;

    fn setup() -> (TrainingParams, FeatureRanges) {
        let params = TrainingParams {
            n_features: 2,
            ..TrainingParams::default()
        };
        let ranges = FeatureRanges::new(vec![FeatureRange::new(-1.0, 1.0); 2]);
        (params, ranges)
    }

    #[test]
    fn test_zero_rate_changes_nothing() {
        let (params, ranges) = setup();
        let template = TreeTemplate::standard();
        let sampler = NodeSampler::new(&params, template, &ranges, &[0.0, 0.0]);
        let mut rng = Pcg32::seed_from_u64(5);

        let mut ensemble = Ensemble::abstaining(template, 4);
        sampler.seed_trees(&mut ensemble, 0..4, &mut rng);
        let before = ensemble.clone();
        mutate_trees(&sampler, &mut ensemble, 0..4, 0.0, &mut rng);
        assert_eq!(ensemble, before);
    }

    #[test]
    fn test_only_current_group_changes() {
        let (params, ranges) = setup();
        let template = TreeTemplate::standard();
        let sampler = NodeSampler::new(&params, template, &ranges, &[0.0, 0.0]);
        let mut rng = Pcg32::seed_from_u64(6);

        let mut ensemble = Ensemble::abstaining(template, 6);
        sampler.seed_trees(&mut ensemble, 0..6, &mut rng);
        let before = ensemble.clone();
        // rates above 1 are clamped
        mutate_trees(&sampler, &mut ensemble, 2..4, 1.5, &mut rng);

        for (i, (after, before)) in ensemble.trees().iter().zip(before.trees()).enumerate() {
            assert!(after.conforms_to(template));
            if (2..4).contains(&i) {
                assert_ne!(after, before);
                for position in 0..template.forced_decisions() {
                    assert!(after.nodes()[position].is_decision());
                }
            } else {
                assert_eq!(after, before);
            }
        }
    }
}
