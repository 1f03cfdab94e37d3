//! Genetic operators acting on one stage's group of trees.
//!
//! Every operator only touches trees inside the current group; trees frozen by earlier
//! stages are carried over verbatim.

use std::ops::Range;

use gaforest_data::FeatureRanges;
use gaforest_tree::TreeTemplate;
use rand::Rng;

use self::{
    crossover::{CrossoverPlan, cross_trees},
    mutation::mutate_trees,
    sampling::NodeSampler,
    tuning::tune_trees,
};
use crate::{params::TrainingParams, population::Population};

pub mod crossover;
pub mod mutation;
pub mod sampling;
pub mod tuning;

/// Converts a rate into a probability accepted by [`Rng::random_bool`].
fn probability(rate: f32) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        f64::from(rate.clamp(0.0, 1.0))
    }
}

/// Which operator turned a donor into a new member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Variation {
    Mutate,
    Tune,
}

/// Applies seeding, mutation, tuning and crossover to one group of trees.
#[derive(Debug, Clone)]
pub struct GroupEvolver<'a> {
    params: &'a TrainingParams,
    ranges: &'a FeatureRanges,
    sampler: NodeSampler<'a>,
    group: Range<usize>,
}

impl<'a> GroupEvolver<'a> {
    /// Creates an evolver for the trees in `group`.
    ///
    /// `class_accuracy` holds one accuracy per class and biases leaf sampling toward the
    /// classes that are still misclassified.
    #[must_use]
    pub fn new(
        params: &'a TrainingParams,
        template: &'a TreeTemplate,
        ranges: &'a FeatureRanges,
        class_accuracy: &'a [f32],
        group: Range<usize>,
    ) -> Self {
        Self {
            params,
            ranges,
            sampler: NodeSampler::new(params, template, ranges, class_accuracy),
            group,
        }
    }

    #[must_use]
    pub fn group(&self) -> Range<usize> {
        self.group.clone()
    }

    /// Fills the group of every member with freshly sampled trees.
    pub fn seed<R>(&self, population: &mut Population, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for member in population.members_mut() {
            self.sampler.seed_trees(&mut member.ensemble, self.group(), rng);
        }
    }

    /// Replaces every member outside the elite quarter with a varied copy of an elite donor.
    ///
    /// 1. Picks a donor uniformly from the elite `[0, population / 4)`
    /// 2. Tunes the copy when the donor's index is below
    ///    `floor(population / 8 * donor_fitness)` or when `saturated` is set, mutates it
    ///    otherwise
    ///
    /// The population must be ranked. Returns how many members were tuned.
    pub fn vary<R>(
        &self,
        population: &mut Population,
        mutation_factor: f32,
        saturated: bool,
        rng: &mut R,
    ) -> usize
    where
        R: Rng + ?Sized,
    {
        let n_elite = population.len() / 4;
        if n_elite == 0 {
            return 0;
        }
        let eighth = population.len() / 8;
        #[expect(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let tune_below = |fitness: f32| {
            let band = eighth as f32 * fitness;
            if band > 0.0 { band as usize } else { 0 }
        };
        let mutation_rate = self.params.base_mutation_rate + mutation_factor;
        let tune_rate =
            self.params.base_mutation_rate + self.params.tune_factor_scale * mutation_factor;

        let (elite, rest) = population.members_mut().split_at_mut(n_elite);
        let mut n_tuned = 0;
        for member in rest {
            let donor_index = rng.random_range(0..n_elite);
            let donor = &elite[donor_index];
            let variation = if saturated || donor_index < tune_below(donor.fitness) {
                Variation::Tune
            } else {
                Variation::Mutate
            };
            member.ensemble.clone_from(&donor.ensemble);
            match variation {
                Variation::Tune => {
                    tune_trees(
                        self.ranges,
                        &mut member.ensemble,
                        self.group(),
                        tune_rate,
                        rng,
                    );
                    n_tuned += 1;
                }
                Variation::Mutate => mutate_trees(
                    &self.sampler,
                    &mut member.ensemble,
                    self.group(),
                    mutation_rate,
                    rng,
                ),
            }
        }
        n_tuned
    }

    /// Overwrites the bottom `crossover_fraction` of the population with children of the top
    /// members.
    pub fn crossover<R>(&self, population: &mut Population, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let plan = CrossoverPlan::new(population.len(), self.params.crossover_fraction);
        for child in plan.children.clone() {
            let mother = rng.random_range(plan.mothers.clone());
            let father = rng.random_range(plan.fathers.clone());
            // only the group's trees are copied out; parents may overlap the children
            let members = population.members();
            let mother = members[mother].ensemble.trees()[self.group()].to_vec();
            let father = members[father].ensemble.trees()[self.group()].to_vec();
            let child = &mut population.members_mut()[child].ensemble.trees_mut()[self.group()];
            cross_trees(&mother, &father, child, self.params.crossover_block, rng);
        }
    }
}
