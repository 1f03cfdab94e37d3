//! A generation of candidate ensembles.
//!
//! Each [`Member`] pairs an ensemble with the fitness it scored in the latest evaluation.
//! Every reordering operation moves whole members, so an ensemble and its score never drift
//! apart.

use gaforest_data::{Sample, fraction_of};
use gaforest_inference::{Evaluation, FitnessEvaluator, OracleError};
use gaforest_stats::{class_accuracy::ClassAccuracy, descriptive::DescriptiveStats};
use gaforest_tree::{Ensemble, TreeTemplate};
use rand::{Rng, seq::SliceRandom as _};
use rayon::prelude::*;

/// One candidate ensemble and its latest score.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub ensemble: Ensemble,
    /// Accuracy on the training samples, 0 until evaluated.
    pub fitness: f32,
    /// Per-class tallies of the latest evaluation.
    pub classes: Option<ClassAccuracy>,
}

impl Member {
    #[must_use]
    pub fn new(ensemble: Ensemble) -> Self {
        Self {
            ensemble,
            fitness: 0.0,
            classes: None,
        }
    }

    fn apply(&mut self, evaluation: Evaluation) {
        self.fitness = evaluation.accuracy;
        self.classes = Some(evaluation.classes);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    members: Vec<Member>,
}

impl Population {
    /// Creates `size` members holding `n_trees` abstaining trees each.
    #[must_use]
    pub fn abstaining(template: &TreeTemplate, n_trees: usize, size: usize) -> Self {
        let ensemble = Ensemble::abstaining(template, n_trees);
        Self {
            members: vec![Member::new(ensemble); size],
        }
    }

    #[must_use]
    pub fn from_members(members: Vec<Member>) -> Self {
        Self { members }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut [Member] {
        &mut self.members
    }

    /// The member at index 0; the best one after [`rank`](Self::rank).
    ///
    /// # Panics
    ///
    /// Panics if the population is empty.
    #[must_use]
    pub fn best(&self) -> &Member {
        &self.members[0]
    }

    /// Scores every member on `samples`, in parallel when `parallel` is set.
    pub fn evaluate_fitness<E>(
        &mut self,
        evaluator: &E,
        samples: &[Sample],
        parallel: bool,
    ) -> Result<(), OracleError>
    where
        E: FitnessEvaluator + ?Sized,
    {
        let evaluate = |member: &mut Member| -> Result<(), OracleError> {
            let evaluation = evaluator.evaluate(&member.ensemble, samples)?;
            member.apply(evaluation);
            Ok(())
        };
        if parallel {
            self.members.par_iter_mut().try_for_each(evaluate)
        } else {
            self.members.iter_mut().try_for_each(evaluate)
        }
    }

    /// Sorts members by fitness, best first.
    ///
    /// The sort is stable: members with equal fitness keep their relative order.
    pub fn rank(&mut self) {
        self.members.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
    }

    /// Randomly permutes the `max(1, floor(len * fraction))` members following index 0.
    ///
    /// The member at index 0 never moves.
    pub fn inject_diversity<R>(&mut self, fraction: f32, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let count = fraction_of(self.members.len(), fraction).max(1);
        let end = (count + 1).min(self.members.len());
        if end > 1 {
            self.members[1..end].shuffle(rng);
        }
    }

    /// [`rank`](Self::rank) followed by [`inject_diversity`](Self::inject_diversity).
    pub fn reorganize<R>(&mut self, fraction: f32, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.rank();
        self.inject_diversity(fraction, rng);
    }

    /// Replaces every member's ensemble with a copy of `ensemble`.
    pub fn reset_to(&mut self, ensemble: &Ensemble) {
        for member in &mut self.members {
            member.ensemble.clone_from(ensemble);
        }
    }

    /// Summary of the members' fitness, `None` for an empty population.
    #[must_use]
    pub fn fitness_stats(&self) -> Option<DescriptiveStats> {
        DescriptiveStats::new(self.members.iter().map(|m| m.fitness))
    }
}

#[cfg(test)]
mod tests {
    use gaforest_inference::TraversalEvaluator;
    use gaforest_tree::{Node, Vote};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn leaf_template() -> TreeTemplate {
        TreeTemplate::new(&[0], 0).unwrap()
    }

    /// Members whose single tree always votes for `i`, scored with the given fitness.
    fn population(fitness: &[f32]) -> Population {
        let template = leaf_template();
        let members = fitness
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let mut ensemble = Ensemble::abstaining(&template, 1);
                let vote = Vote::Class(u32::try_from(i).unwrap());
                ensemble.trees_mut()[0].set_node(&template, 0, Node::leaf(vote));
                Member {
                    fitness: f,
                    ..Member::new(ensemble)
                }
            })
            .collect();
        Population::from_members(members)
    }

    fn identities(population: &Population) -> Vec<usize> {
        population
            .members()
            .iter()
            .map(|m| m.ensemble.classify(&[], 256).unwrap())
            .collect()
    }

    #[test]
    fn test_rank_is_stable_descending() {
        let mut population = population(&[0.9, 0.9, 0.7, 0.95]);
        population.rank();
        assert_eq!(identities(&population), vec![3, 0, 1, 2]);
        let fitness = population.members().iter().map(|m| m.fitness).collect::<Vec<_>>();
        assert_eq!(fitness, vec![0.95, 0.9, 0.9, 0.7]);
    }

    #[test]
    fn test_inject_diversity_keeps_best_and_pairs() {
        let fitness = (0..16u8).map(|i| f32::from(16 - i) / 16.0).collect::<Vec<_>>();
        let mut population = population(&fitness);
        population.inject_diversity(0.25, &mut Pcg32::seed_from_u64(1));

        let ids = identities(&population);
        assert_eq!(ids[0], 0);
        // only slots 1..=4 may move
        assert_eq!(&ids[5..], &(5..16).collect::<Vec<_>>()[..]);
        let mut moved = ids[1..5].to_vec();
        moved.sort_unstable();
        assert_eq!(moved, vec![1, 2, 3, 4]);
        for (id, member) in ids.iter().zip(population.members()) {
            assert_eq!(member.fitness, fitness[*id]);
        }
    }

    #[test]
    fn test_inject_diversity_small_population() {
        let mut population = population(&[0.5, 0.4]);
        population.inject_diversity(0.25, &mut Pcg32::seed_from_u64(1));
        assert_eq!(identities(&population), vec![0, 1]);
    }

    #[test]
    fn test_evaluate_fitness_parallel_matches_sequential() {
        let samples = vec![Sample::new(vec![], 1), Sample::new(vec![], 2)];
        let evaluator = TraversalEvaluator::new(4);
        let mut sequential = population(&[0.0; 4]);
        let mut parallel = sequential.clone();
        sequential.evaluate_fitness(&evaluator, &samples, false).unwrap();
        parallel.evaluate_fitness(&evaluator, &samples, true).unwrap();
        assert_eq!(sequential, parallel);

        let fitness = sequential.members().iter().map(|m| m.fitness).collect::<Vec<_>>();
        assert_eq!(fitness, vec![0.0, 0.5, 0.5, 0.0]);
        let classes = sequential.members()[1].classes.as_ref().unwrap();
        assert_eq!(classes.class_accuracy(1), Some(1.0));
    }

    #[test]
    fn test_reset_to() {
        let mut population = population(&[0.1, 0.2, 0.3]);
        let best = population.members()[2].ensemble.clone();
        population.reset_to(&best);
        assert_eq!(identities(&population), vec![2, 2, 2]);
    }

    #[test]
    fn test_fitness_stats() {
        let stats = population(&[0.25, 0.75]).fitness_stats().unwrap();
        assert_eq!(stats.mean, 0.5);
        assert!(Population::from_members(vec![]).fitness_stats().is_none());
    }
}
