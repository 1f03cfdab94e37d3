//! Random node generation.

use std::ops::Range;

use gaforest_data::FeatureRanges;
use gaforest_tree::{Ensemble, Node, TreeTemplate, Vote};
use rand::Rng;

use crate::params::TrainingParams;

/// Generates random node content that respects a template.
///
/// Leaf votes are biased toward classes the current best ensemble gets wrong: class `k` is
/// chosen with weight `2 * bias * (1 - accuracy[k]) + (1 - bias / 2) / K`.
#[derive(Debug, Clone)]
pub struct NodeSampler<'a> {
    template: &'a TreeTemplate,
    ranges: &'a FeatureRanges,
    class_accuracy: &'a [f32],
    n_features: usize,
    decision_probability: f64,
    abstain_probability: f64,
    class_bias: f32,
    mastered_accuracy: f32,
    mastered_abstain_probability: f64,
}

impl<'a> NodeSampler<'a> {
    /// Creates a sampler choosing leaf classes in `[0, class_accuracy.len())`.
    #[must_use]
    pub fn new(
        params: &TrainingParams,
        template: &'a TreeTemplate,
        ranges: &'a FeatureRanges,
        class_accuracy: &'a [f32],
    ) -> Self {
        Self {
            template,
            ranges,
            class_accuracy,
            n_features: params.n_features,
            decision_probability: params.decision_probability,
            abstain_probability: params.abstain_probability,
            class_bias: params.class_bias,
            mastered_accuracy: params.mastered_accuracy,
            mastered_abstain_probability: params.mastered_abstain_probability,
        }
    }

    #[must_use]
    pub fn template(&self) -> &'a TreeTemplate {
        self.template
    }

    /// Samples the content of the node at `position`.
    ///
    /// Forced positions always get a decision node; positions the template reserves for
    /// leaves never do; every other position gets one with `decision_probability`.
    pub fn sample_node<R>(&self, position: usize, rng: &mut R) -> Node
    where
        R: Rng + ?Sized,
    {
        let feature = rng.random_range(0..self.n_features.max(1));
        let feature_index = u8::try_from(feature).unwrap_or(u8::MAX);
        let is_decision = self.template.forces_decision(position)
            || (self.template.allows_decision(position)
                && rng.random_bool(self.decision_probability));
        let node = if is_decision {
            let threshold = self
                .ranges
                .get(usize::from(feature_index))
                .sample_threshold(rng);
            Node::decision(feature_index, threshold)
        } else {
            Node::leaf(self.sample_vote(rng))
        };
        Node {
            feature_index,
            ..node
        }
    }

    /// Samples a leaf vote.
    pub fn sample_vote<R>(&self, rng: &mut R) -> Vote
    where
        R: Rng + ?Sized,
    {
        if rng.random_bool(self.abstain_probability) {
            return Vote::Abstain;
        }
        let Some(chosen) = self.choose_class(rng) else {
            return Vote::Abstain;
        };
        if self.class_accuracy[chosen] >= self.mastered_accuracy
            && rng.random_bool(self.mastered_abstain_probability)
        {
            return Vote::Abstain;
        }
        u32::try_from(chosen).map_or(Vote::Abstain, Vote::Class)
    }

    #[expect(clippy::cast_precision_loss)]
    fn choose_class<R>(&self, rng: &mut R) -> Option<usize>
    where
        R: Rng + ?Sized,
    {
        let k = self.class_accuracy.len();
        if k == 0 {
            return None;
        }
        let base = (1.0 - self.class_bias / 2.0) / k as f32;
        let weight = |accuracy: f32| 2.0 * self.class_bias * (1.0 - accuracy) + base;
        let total = self.class_accuracy.iter().map(|&a| weight(a)).sum::<f32>();
        if total.is_nan() || total <= 0.0 {
            return None;
        }
        let r = rng.random::<f32>() * total;
        let mut cumulative = 0.0;
        for (class, &accuracy) in self.class_accuracy.iter().enumerate() {
            cumulative += weight(accuracy);
            if r < cumulative {
                return Some(class);
            }
        }
        Some(k - 1)
    }

    /// Fills trees `trees` of `ensemble` with freshly sampled nodes.
    pub fn seed_trees<R>(&self, ensemble: &mut Ensemble, trees: Range<usize>, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for tree in &mut ensemble.trees_mut()[trees] {
            for position in 0..tree.len() {
                let node = self.sample_node(position, rng);
                tree.set_node(self.template, position, node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gaforest_data::FeatureRange;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn ranges() -> FeatureRanges {
        FeatureRanges::new(vec![
            FeatureRange::new(0.0, 1.0),
            FeatureRange::new(-4.0, 4.0),
            FeatureRange::new(2.0, 2.0),
        ])
    }

    fn params() -> TrainingParams {
        TrainingParams {
            n_features: 3,
            ..TrainingParams::default()
        }
    }

    #[test]
    fn test_seeded_trees_respect_template() {
        let template = TreeTemplate::standard();
        let ranges = ranges();
        let accuracy = [0.0; 4];
        let sampler = NodeSampler::new(&params(), template, &ranges, &accuracy);
        let mut rng = Pcg32::seed_from_u64(42);

        let mut ensemble = Ensemble::abstaining(template, 6);
        sampler.seed_trees(&mut ensemble, 2..4, &mut rng);

        for (i, tree) in ensemble.trees().iter().enumerate() {
            assert!(tree.conforms_to(template));
            let seeded = (2..4).contains(&i);
            assert_eq!(tree == &gaforest_tree::Tree::abstaining(template), !seeded);
            if seeded {
                for (position, node) in tree.nodes().iter().enumerate() {
                    if template.forces_decision(position) {
                        assert!(node.is_decision());
                    }
                    assert!(node.feature_index < 3);
                }
            }
        }
    }

    #[test]
    fn test_decision_probability_extremes() {
        let template = TreeTemplate::standard();
        let ranges = ranges();
        let accuracy = [0.0; 2];
        let mut rng = Pcg32::seed_from_u64(1);

        let never = TrainingParams {
            decision_probability: 0.0,
            ..params()
        };
        let sampler = NodeSampler::new(&never, template, &ranges, &accuracy);
        assert!(sampler.sample_node(0, &mut rng).is_decision());
        assert!((4..template.len()).all(|p| !sampler.sample_node(p, &mut rng).is_decision()));

        let always = TrainingParams {
            decision_probability: 1.0,
            ..params()
        };
        let sampler = NodeSampler::new(&always, template, &ranges, &accuracy);
        for position in 0..template.len() {
            let node = sampler.sample_node(position, &mut rng);
            assert_eq!(node.is_decision(), template.allows_decision(position));
        }
    }

    #[test]
    fn test_votes_favor_weak_classes() {
        let template = TreeTemplate::standard();
        let ranges = ranges();
        // class 1 is mastered, class 0 is never right
        let accuracy = [0.0, 1.0];
        let sampler = NodeSampler::new(&params(), template, &ranges, &accuracy);
        let mut rng = Pcg32::seed_from_u64(9);

        let mut counts = [0; 3];
        for _ in 0..4000 {
            match sampler.sample_vote(&mut rng) {
                Vote::Class(c) => counts[usize::try_from(c).unwrap()] += 1,
                Vote::Abstain => counts[2] += 1,
            }
        }
        // weights: class 0 = 1.375, class 1 = 0.375; class 1 abstains half the time
        assert!(counts[0] > 4 * counts[1], "{counts:?}");
        assert!(counts[1] > 0);
        assert!(counts[2] > counts[1]);
    }

    #[test]
    fn test_no_classes_always_abstains() {
        let template = TreeTemplate::standard();
        let ranges = ranges();
        let sampler = NodeSampler::new(&params(), template, &ranges, &[]);
        let mut rng = Pcg32::seed_from_u64(0);
        assert!((0..100).all(|_| sampler.sample_vote(&mut rng) == Vote::Abstain));
    }

    #[test]
    fn test_thresholds_come_from_feature_range() {
        let template = TreeTemplate::standard();
        let ranges = ranges();
        let accuracy = [0.0];
        let sampler = NodeSampler::new(&params(), template, &ranges, &accuracy);
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..500 {
            let node = sampler.sample_node(0, &mut rng);
            let gaforest_tree::NodeKind::Decision { threshold } = node.kind else {
                panic!("position 0 is always a decision");
            };
            match node.feature_index {
                0 => assert!(threshold == 0.0 || threshold == 1.0),
                1 => assert!((-4.0..=4.0).contains(&threshold)),
                _ => assert_eq!(threshold, 2.0),
            }
        }
    }
}
