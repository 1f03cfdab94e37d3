//! Training parameters.
//!
//! Every capacity and rate of the staged genetic algorithm lives here. Defaults reproduce the
//! reference configuration: 128 trees trained in 4 stages of 32, a population of 128
//! ensembles, and a 10-generation accuracy memory.

use std::ops::Range;

use gaforest_tree::{MAX_TREE_NODES, TreeTemplate};
use serde::{Deserialize, Serialize};

/// Parameters of a training run.
///
/// Deserializes from JSON with every field optional; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    /// Number of candidate ensembles per generation.
    pub population: usize,
    /// Number of trees in every ensemble.
    pub n_trees: usize,
    /// Number of trees evolved per boosting stage.
    pub trees_per_stage: usize,
    /// Feature vector length; feature indices are sampled from `[0, n_features)`.
    pub n_features: usize,
    /// Classes counted by the ensemble vote.
    pub vote_classes: usize,

    /// Length of the circular best-accuracy history.
    pub memory_size: usize,
    /// A stage ends once the no-improvement counter exceeds this value.
    pub max_no_improvement: usize,
    /// Mutation factor added per history entry at least as good as the newest one.
    pub mutation_increment: f32,
    /// Mutation and tuning probability when the mutation factor is zero.
    pub base_mutation_rate: f32,
    /// Tuning probability grows this many times faster with the mutation factor.
    pub tune_factor_scale: f32,
    /// Ends a stage after this many generations even if it has not converged.
    pub max_generations_per_stage: Option<usize>,

    /// Probability that a position allowing a decision node gets one.
    pub decision_probability: f64,
    /// Probability that a sampled leaf abstains outright.
    pub abstain_probability: f64,
    /// Weight of per-class error when choosing a leaf's class.
    pub class_bias: f32,
    /// Classes at or above this accuracy are considered mastered.
    pub mastered_accuracy: f32,
    /// Probability that a leaf voting for a mastered class abstains instead.
    pub mastered_abstain_probability: f64,
    /// Bias leaf sampling with the best member's per-class accuracy.
    pub class_feedback: bool,

    /// Fraction of the population shuffled after ranking (the best member never moves).
    pub diversity_fraction: f32,
    /// Fraction of the population, counted from the bottom, replaced by crossover.
    pub crossover_fraction: f32,
    /// Number of consecutive trees inherited together from one parent.
    pub crossover_block: usize,

    /// Leading fraction of the shuffled pool used for fitness.
    pub train_fraction: f32,
    /// Fraction of the sample pool kept after augmentation.
    pub pool_fraction: f32,
    /// Evaluate population members in parallel.
    pub parallel: bool,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            population: 128,
            n_trees: 128,
            trees_per_stage: 32,
            n_features: 32,
            vote_classes: 32,
            memory_size: 10,
            max_no_improvement: 1,
            mutation_increment: 0.02,
            base_mutation_rate: 0.5,
            tune_factor_scale: 3.0,
            max_generations_per_stage: None,
            decision_probability: 0.39,
            abstain_probability: 0.25,
            class_bias: 0.5,
            mastered_accuracy: 0.99,
            mastered_abstain_probability: 0.5,
            class_feedback: true,
            diversity_fraction: 0.25,
            crossover_fraction: 0.1,
            crossover_block: 1,
            train_fraction: 0.8,
            pool_fraction: 1.0,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ParamsError {
    #[display("population must be at least 4, got {population}")]
    PopulationTooSmall { population: usize },
    #[display("`{name}` must be at least {min}")]
    TooSmall { name: &'static str, min: usize },
    #[display("`{name}` must be at most {max}, got {value}")]
    TooLarge {
        name: &'static str,
        max: usize,
        value: usize,
    },
    #[display("`{name}` must be in (0, 1], got {value}")]
    FractionOutOfRange { name: &'static str, value: f32 },
    #[display("`{name}` must be in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[display("`{name}` must be finite and non-negative, got {value}")]
    InvalidRate { name: &'static str, value: f32 },
}

impl TrainingParams {
    /// Number of boosting stages, the last one possibly shorter than `trees_per_stage`.
    #[must_use]
    pub fn n_stages(&self) -> usize {
        self.n_trees.div_ceil(self.trees_per_stage.max(1))
    }

    /// Trees evolved by `stage`; the last group may be shorter.
    #[must_use]
    pub fn stage_trees(&self, stage: usize) -> Range<usize> {
        let start = stage.saturating_mul(self.trees_per_stage).min(self.n_trees);
        start..(start + self.trees_per_stage).min(self.n_trees)
    }

    /// Number of history entries that must be at least as good as the newest one for the
    /// mutation factor to count as saturated.
    #[must_use]
    pub fn saturation_count(&self) -> usize {
        self.memory_size.saturating_sub(2)
    }

    /// Checks that the parameters describe a run that can execute with `template`.
    pub fn validate(&self, template: &TreeTemplate) -> Result<(), ParamsError> {
        if template.len() > MAX_TREE_NODES {
            return Err(ParamsError::TooLarge {
                name: "template length",
                max: MAX_TREE_NODES,
                value: template.len(),
            });
        }
        if self.population < 4 {
            return Err(ParamsError::PopulationTooSmall {
                population: self.population,
            });
        }
        for (name, value, min) in [
            ("n_trees", self.n_trees, 1),
            ("trees_per_stage", self.trees_per_stage, 1),
            ("n_features", self.n_features, 1),
            ("vote_classes", self.vote_classes, 1),
            ("memory_size", self.memory_size, 2),
            ("crossover_block", self.crossover_block, 1),
        ] {
            if value < min {
                return Err(ParamsError::TooSmall { name, min });
            }
        }
        for (name, value, max) in [
            ("n_features", self.n_features, usize::from(u8::MAX) + 1),
            ("vote_classes", self.vote_classes, usize::from(u8::MAX)),
            ("trees_per_stage", self.trees_per_stage, self.n_trees),
        ] {
            if value > max {
                return Err(ParamsError::TooLarge { name, max, value });
            }
        }
        for (name, value) in [
            ("diversity_fraction", self.diversity_fraction),
            ("crossover_fraction", self.crossover_fraction),
            ("train_fraction", self.train_fraction),
            ("pool_fraction", self.pool_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ParamsError::FractionOutOfRange { name, value });
            }
        }
        for (name, value) in [
            ("decision_probability", self.decision_probability),
            ("abstain_probability", self.abstain_probability),
            ("mastered_abstain_probability", self.mastered_abstain_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ParamsError::ProbabilityOutOfRange { name, value });
            }
        }
        for (name, value) in [
            ("mutation_increment", self.mutation_increment),
            ("base_mutation_rate", self.base_mutation_rate),
            ("tune_factor_scale", self.tune_factor_scale),
            ("class_bias", self.class_bias),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ParamsError::InvalidRate { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = TrainingParams::default();
        assert!(params.validate(TreeTemplate::standard()).is_ok());
        assert_eq!(params.n_stages(), 4);
        assert_eq!(params.saturation_count(), 8);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: TrainingParams =
            serde_json::from_str(r#"{"population": 16, "parallel": false}"#).unwrap();
        assert_eq!(params.population, 16);
        assert!(!params.parallel);
        assert_eq!(params.trees_per_stage, 32);
    }

    #[test]
    fn test_uneven_stages() {
        let params = TrainingParams {
            n_trees: 10,
            trees_per_stage: 4,
            ..TrainingParams::default()
        };
        assert_eq!(params.n_stages(), 3);
        assert_eq!(params.stage_trees(0), 0..4);
        assert_eq!(params.stage_trees(2), 8..10);
    }

    #[test]
    fn test_rejects_invalid_params() {
        let template = TreeTemplate::standard();
        let check = |params: TrainingParams| params.validate(template).unwrap_err();

        assert_eq!(
            check(TrainingParams {
                population: 3,
                ..TrainingParams::default()
            }),
            ParamsError::PopulationTooSmall { population: 3 }
        );
        assert!(matches!(
            check(TrainingParams {
                trees_per_stage: 0,
                ..TrainingParams::default()
            }),
            ParamsError::TooSmall {
                name: "trees_per_stage",
                ..
            }
        ));
        assert!(matches!(
            check(TrainingParams {
                vote_classes: 256,
                ..TrainingParams::default()
            }),
            ParamsError::TooLarge {
                name: "vote_classes",
                ..
            }
        ));
        assert!(matches!(
            check(TrainingParams {
                train_fraction: 0.0,
                ..TrainingParams::default()
            }),
            ParamsError::FractionOutOfRange { .. }
        ));
        assert!(matches!(
            check(TrainingParams {
                decision_probability: 1.5,
                ..TrainingParams::default()
            }),
            ParamsError::ProbabilityOutOfRange { .. }
        ));
        assert!(matches!(
            check(TrainingParams {
                base_mutation_rate: f32::NAN,
                ..TrainingParams::default()
            }),
            ParamsError::InvalidRate { .. }
        ));
    }
}
