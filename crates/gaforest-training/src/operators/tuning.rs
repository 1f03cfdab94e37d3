use std::ops::Range;

use gaforest_data::FeatureRanges;
use gaforest_tree::{Ensemble, NodeKind};
use rand::Rng;

use super::probability;

/// Nudges the decision thresholds of the trees in `trees`.
///
/// Each tree is tuned with probability `rate`. A tuned tree adds to every decision threshold
/// a delta drawn from a tenth of its feature's range. Tree structure and leaf votes are left
/// untouched.
pub fn tune_trees<R>(
    ranges: &FeatureRanges,
    ensemble: &mut Ensemble,
    trees: Range<usize>,
    rate: f32,
    rng: &mut R,
) where
    R: Rng + ?Sized,
{
    let rate = probability(rate);
    for tree in &mut ensemble.trees_mut()[trees] {
        if !rng.random_bool(rate) {
            continue;
        }
        for node in tree.nodes_mut() {
            if let NodeKind::Decision { threshold } = &mut node.kind {
                let range = ranges.get(usize::from(node.feature_index));
                *threshold += range.perturbation().sample_threshold(rng);
            }
        }
    }
}
