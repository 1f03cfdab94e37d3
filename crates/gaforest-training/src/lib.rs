//! Genetic training of boosted decision-tree ensembles.
//!
//! An ensemble of fixed-shape trees is trained in stages. Each stage evolves one group of
//! trees with a genetic algorithm while the groups trained by earlier stages stay frozen.
//!
//! # How Training Works
//!
//! 1. **Seed** - Fill the stage's tree group of every member with random nodes
//! 2. **Evaluate** - Score every member on the training part of the shuffled sample pool
//! 3. **Reorganize** - Rank members by fitness and shuffle a band below the best one
//! 4. **Vary** - Replace non-elite members with mutated or tuned copies of elite donors
//! 5. **Crossover** - Replace the bottom members with block-wise children of the top ones
//! 6. **Repeat** - Until perfect accuracy or until the accuracy history stops improving
//! 7. **Freeze** - Copy the winner's trees into the golden ensemble and start the next stage
//!
//! # Architecture
//!
//! ```text
//! BoostingTrainer
//!     ↓ owns per stage
//! Population ── evaluated by ──► FitnessEvaluator (gaforest-inference)
//!     ↓ varied by
//! GroupEvolver ── NodeSampler, mutate / tune / crossover
//!     ↓ paced by
//! AccuracyMemory (adaptive mutation factor)
//! ```
//!
//! # Example
//!
//! ```
//! use gaforest_data::Sample;
//! use gaforest_inference::TraversalEvaluator;
//! use gaforest_training::{BoostingTrainer, TrainingParams, seed::RunSeed};
//! use gaforest_tree::TreeTemplate;
//!
//! let pool = (0..40_u8)
//!     .map(|i| Sample::new(vec![f32::from(i)], u8::from(i >= 20)))
//!     .collect::<Vec<_>>();
//! let params = TrainingParams {
//!     population: 8,
//!     n_trees: 4,
//!     trees_per_stage: 2,
//!     n_features: 1,
//!     vote_classes: 2,
//!     max_generations_per_stage: Some(3),
//!     ..TrainingParams::default()
//! };
//! let evaluator = TraversalEvaluator::new(params.vote_classes);
//! let trainer = BoostingTrainer::new(params, TreeTemplate::standard(), &evaluator)?;
//! let report = trainer.train(pool, RunSeed::from_bytes([0; 16]), &mut ())?;
//! assert_eq!(report.golden.len(), 4);
//! # Ok::<(), gaforest_training::TrainingError>(())
//! ```

pub use self::{
    augment::{augment, subsample},
    boosting::{
        BoostingTrainer, GenerationSummary, StageSummary, TrainingError, TrainingObserver,
        TrainingReport,
    },
    params::{ParamsError, TrainingParams},
    population::{Member, Population},
};

pub mod augment;
pub mod boosting;
pub mod history;
pub mod operators;
pub mod params;
pub mod population;
pub mod seed;
