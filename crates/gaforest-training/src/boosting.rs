//! Staged training of a golden ensemble.
//!
//! Trees are trained in groups of `trees_per_stage`. Each stage runs a genetic algorithm over
//! the current group only:
//!
//! ```text
//! seed group ─► evaluate ─► converged? ──yes──► freeze group into golden ─► next stage
//!                  ▲           │ no
//!                  └─ crossover ◄─ mutate/tune
//! ```
//!
//! When a stage ends, the winner's trees up to the end of the group are copied into the
//! golden ensemble and every member is reset to it, so the next stage boosts on top of the
//! frozen trees.

use std::ops::Range;

use gaforest_data::{FeatureRanges, Sample, fraction_of};
use gaforest_inference::{Evaluation, FitnessEvaluator, OracleError};
use gaforest_stats::descriptive::DescriptiveStats;
use gaforest_tree::{Ensemble, TreeTemplate};
use log::{debug, info};
use rand::seq::SliceRandom as _;
use serde::{Deserialize, Serialize};

use crate::{
    augment::subsample,
    history::{AccuracyMemory, MutationPressure},
    operators::GroupEvolver,
    params::{ParamsError, TrainingParams},
    population::Population,
    seed::RunSeed,
};

/// Number of leading fitness scores reported per generation.
pub const TOP_SCORES: usize = 10;

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainingError {
    #[display("invalid training parameters: {_0}")]
    #[from]
    Params(ParamsError),
    #[display("fitness evaluation failed: {_0}")]
    #[from]
    Evaluation(OracleError),
    #[display("the training pool is empty")]
    EmptyPool,
}

/// Progress of one evaluated generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    pub stage: usize,
    pub generation: usize,
    /// Leading fitness scores after ranking, best first.
    pub top: Vec<f32>,
    pub fitness: DescriptiveStats,
    /// Accuracy of the golden ensemble on the held-out samples, from the second stage on.
    pub holdout_accuracy: Option<f32>,
    /// Mutation pressure the next variation step will use.
    pub mutation: MutationPressure,
    pub no_improvement: usize,
}

impl GenerationSummary {
    #[must_use]
    pub fn best_fitness(&self) -> f32 {
        self.top.first().copied().unwrap_or(0.0)
    }
}

/// Outcome of one boosting stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: usize,
    pub trees: Range<usize>,
    /// Number of evaluated generations.
    pub generations: usize,
    /// Training accuracy of the stage winner.
    pub train_accuracy: f32,
    /// Accuracy of the golden ensemble on the held-out samples after freezing.
    pub holdout_accuracy: Option<f32>,
    /// `true` if the stage reached perfect training accuracy.
    pub converged: bool,
}

/// Result of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub seed: RunSeed,
    pub golden: Ensemble,
    pub stages: Vec<StageSummary>,
    /// Golden ensemble scored on the whole sample pool.
    pub final_evaluation: Evaluation,
}

/// Receives progress notifications during training.
pub trait TrainingObserver {
    fn on_generation(&mut self, _summary: &GenerationSummary) {}
    fn on_stage(&mut self, _summary: &StageSummary) {}
}

impl TrainingObserver for () {}

/// Drives the staged genetic algorithm.
#[derive(Debug)]
pub struct BoostingTrainer<'a, E: ?Sized> {
    params: TrainingParams,
    template: &'a TreeTemplate,
    evaluator: &'a E,
}

impl<'a, E> BoostingTrainer<'a, E>
where
    E: FitnessEvaluator + ?Sized,
{
    /// Creates a trainer after validating `params` against `template`.
    pub fn new(
        params: TrainingParams,
        template: &'a TreeTemplate,
        evaluator: &'a E,
    ) -> Result<Self, TrainingError> {
        params.validate(template)?;
        Ok(Self {
            params,
            template,
            evaluator,
        })
    }

    #[must_use]
    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Trains a golden ensemble on `pool`.
    ///
    /// The pool is subsampled to `pool_fraction` once, then reshuffled at the start of every
    /// stage. Fitness is measured on the leading `train_fraction` of the shuffled pool; the
    /// remainder is held out to validate the golden ensemble.
    pub fn train<O>(
        &self,
        mut pool: Vec<Sample>,
        seed: RunSeed,
        observer: &mut O,
    ) -> Result<TrainingReport, TrainingError>
    where
        O: TrainingObserver + ?Sized,
    {
        if pool.is_empty() {
            return Err(TrainingError::EmptyPool);
        }
        let params = &self.params;
        let mut stream = seed.stream();
        subsample(&mut pool, params.pool_fraction, &mut stream.fork());

        let n_classes = pool
            .iter()
            .map(|s| usize::from(s.label) + 1)
            .max()
            .unwrap_or(0)
            .min(params.vote_classes);
        let ranges = FeatureRanges::from_samples(&pool, params.n_features);
        info!(
            "training {} trees in {} stages on {} samples ({n_classes} classes), seed {seed}",
            params.n_trees,
            params.n_stages(),
            pool.len(),
        );

        let mut population =
            Population::abstaining(self.template, params.n_trees, params.population);
        let mut golden = Ensemble::abstaining(self.template, params.n_trees);
        let mut memory = AccuracyMemory::new(
            params.memory_size,
            params.mutation_increment,
            params.saturation_count(),
        );
        let mut stages = Vec::with_capacity(params.n_stages());

        for stage in 0..params.n_stages() {
            let group = params.stage_trees(stage);
            pool.shuffle(&mut stream.fork());
            let n_train = fraction_of(pool.len(), params.train_fraction).max(1);
            let (train, holdout) = pool.split_at(n_train);
            info!(
                "stage {stage}: trees {group:?}, {} training and {} held-out samples",
                train.len(),
                holdout.len(),
            );

            let mut class_accuracy = self.class_feedback(&population, n_classes);
            GroupEvolver::new(params, self.template, &ranges, &class_accuracy, group.clone())
                .seed(&mut population, &mut stream.fork());

            memory.reset();
            let mut pressure = MutationPressure::default();
            let mut no_improvement = 0;
            let mut generation = 0;
            let converged = loop {
                population.evaluate_fitness(self.evaluator, train, params.parallel)?;
                population.reorganize(params.diversity_fraction, &mut stream.fork());
                let best = population.best().fitness;
                let holdout_accuracy = if stage > 0 {
                    self.holdout_accuracy(&golden, holdout)?
                } else {
                    None
                };
                let summary = GenerationSummary {
                    stage,
                    generation,
                    top: top_scores(&population),
                    fitness: population.fitness_stats().unwrap_or_default(),
                    holdout_accuracy,
                    mutation: pressure,
                    no_improvement,
                };
                log_generation(&summary);
                observer.on_generation(&summary);

                if best >= 1.0 {
                    break true;
                }
                if no_improvement > params.max_no_improvement
                    || params
                        .max_generations_per_stage
                        .is_some_and(|cap| generation + 1 >= cap)
                {
                    break false;
                }

                class_accuracy = self.class_feedback(&population, n_classes);
                let evolver = GroupEvolver::new(
                    params,
                    self.template,
                    &ranges,
                    &class_accuracy,
                    group.clone(),
                );
                let n_tuned = evolver.vary(
                    &mut population,
                    pressure.factor,
                    pressure.saturated,
                    &mut stream.fork(),
                );
                evolver.crossover(&mut population, &mut stream.fork());
                debug!(
                    "stage {stage} generation {generation}: tuned {n_tuned}, mutated {}",
                    population.len() - population.len() / 4 - n_tuned,
                );

                generation += 1;
                pressure = memory.record(best);
                if pressure.saturated {
                    no_improvement += 1;
                } else {
                    no_improvement = 0;
                }
            };

            let winner = population.best();
            golden.copy_trees_from(&winner.ensemble, 0..group.end);
            let train_accuracy = winner.fitness;
            population.reset_to(&golden);

            let summary = StageSummary {
                stage,
                trees: group,
                generations: generation + 1,
                train_accuracy,
                holdout_accuracy: self.holdout_accuracy(&golden, holdout)?,
                converged,
            };
            info!(
                "stage {stage} done after {} generations: train {:.4}, holdout {}",
                summary.generations,
                summary.train_accuracy,
                summary
                    .holdout_accuracy
                    .map_or_else(|| "n/a".to_owned(), |a| format!("{a:.4}")),
            );
            observer.on_stage(&summary);
            stages.push(summary);
        }

        let final_evaluation = self.evaluator.evaluate(&golden, &pool)?;
        info!(
            "training finished: accuracy {:.4} on {} samples",
            final_evaluation.accuracy,
            pool.len(),
        );
        Ok(TrainingReport {
            seed,
            golden,
            stages,
            final_evaluation,
        })
    }

    /// Per-class accuracy of the best member, or all zeros without feedback.
    fn class_feedback(&self, population: &Population, n_classes: usize) -> Vec<f32> {
        let mut accuracy = match &population.best().classes {
            Some(classes) if self.params.class_feedback => classes.accuracies_or(0.0),
            _ => vec![],
        };
        accuracy.resize(n_classes, 0.0);
        accuracy
    }

    fn holdout_accuracy(
        &self,
        golden: &Ensemble,
        holdout: &[Sample],
    ) -> Result<Option<f32>, OracleError> {
        if holdout.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.evaluator.evaluate(golden, holdout)?.accuracy))
    }
}

fn top_scores(population: &Population) -> Vec<f32> {
    population
        .members()
        .iter()
        .take(TOP_SCORES)
        .map(|m| m.fitness)
        .collect()
}

fn log_generation(summary: &GenerationSummary) {
    info!(
        "stage {} generation {}: best {:.4}, mean {:.4}, mutation factor {:.2}",
        summary.stage,
        summary.generation,
        summary.best_fitness(),
        summary.fitness.mean,
        summary.mutation.factor,
    );
    debug!("  top: {:.4?}", summary.top);
    if let Some(accuracy) = summary.holdout_accuracy {
        info!("  golden holdout accuracy: {accuracy:.4}");
    }
}
