use std::ops::Range;

use gaforest_tree::Tree;
use rand::Rng;

/// Fills `child` from the equally long `mother` and `father` slices, block by block.
///
/// The slots are split into consecutive blocks of `block` trees (the last block may be
/// shorter). Each block is copied wholesale from one parent chosen by a fair coin flip. Node
/// content is never mixed.
pub fn cross_trees<R>(
    mother: &[Tree],
    father: &[Tree],
    child: &mut [Tree],
    block: usize,
    rng: &mut R,
) where
    R: Rng + ?Sized,
{
    let mut start = 0;
    for slots in child.chunks_mut(block.max(1)) {
        let parent = if rng.random_bool(0.5) { mother } else { father };
        let end = start + slots.len();
        slots.clone_from_slice(&parent[start..end]);
        start = end;
    }
}

/// Population slots `[parents, children)` used by crossover.
///
/// Children fill the bottom `fraction` of the population. Mothers are drawn from the first
/// band of `max(1, population / 80)` slots, fathers from the band after it (clamped to the
/// population).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossoverPlan {
    pub mothers: Range<usize>,
    pub fathers: Range<usize>,
    pub children: Range<usize>,
}

impl CrossoverPlan {
    #[must_use]
    pub fn new(population: usize, fraction: f32) -> Self {
        let band = (population / 80).max(1);
        let n_children = gaforest_data::fraction_of(population, fraction);
        let clamp = |i: usize| i.min(population.saturating_sub(1));
        Self {
            mothers: 0..band.min(population),
            fathers: clamp(band)..clamp(2 * band - 1) + 1,
            children: population - n_children..population,
        }
    }
}

#[cfg(test)]
mod tests {
    use gaforest_tree::{Ensemble, Node, TreeTemplate, Vote};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn uniform(template: &TreeTemplate, class: u32, n_trees: usize) -> Ensemble {
        let mut tree = Tree::abstaining(template);
        tree.set_node(template, 0, Node::leaf(Vote::Class(class)));
        Ensemble::from_trees(vec![tree; n_trees])
    }

    fn classes(ensemble: &Ensemble) -> Vec<Option<usize>> {
        ensemble
            .trees()
            .iter()
            .map(|t| t.classify(&[]).class_below(16))
            .collect()
    }

    #[test]
    fn test_blocks_come_from_one_parent() {
        let template = TreeTemplate::new(&[0], 0).unwrap();
        let mother = uniform(&template, 1, 12);
        let father = uniform(&template, 2, 12);
        let mut rng = Pcg32::seed_from_u64(21);

        let mut seen = [false; 2];
        for _ in 0..20 {
            let mut child = uniform(&template, 9, 12);
            cross_trees(
                &mother.trees()[2..11],
                &father.trees()[2..11],
                &mut child.trees_mut()[2..11],
                3,
                &mut rng,
            );
            let classes = classes(&child);

            assert_eq!(&classes[..2], &[Some(9); 2]);
            assert_eq!(&classes[11..], &[Some(9)]);
            for block in classes[2..11].chunks(3) {
                assert!(block == [Some(1); 3] || block == [Some(2); 3], "{block:?}");
                seen[usize::from(block[0] == Some(2))] = true;
            }
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn test_plan_defaults() {
        let plan = CrossoverPlan::new(128, 0.1);
        assert_eq!(plan.mothers, 0..1);
        assert_eq!(plan.fathers, 1..2);
        assert_eq!(plan.children, 116..128);

        let plan = CrossoverPlan::new(400, 0.1);
        assert_eq!(plan.mothers, 0..5);
        assert_eq!(plan.fathers, 5..10);
        assert_eq!(plan.children, 360..400);
    }

    #[test]
    fn test_plan_small_population() {
        let plan = CrossoverPlan::new(4, 0.25);
        assert_eq!(plan.mothers, 0..1);
        assert_eq!(plan.fathers, 1..2);
        assert_eq!(plan.children, 3..4);

        let plan = CrossoverPlan::new(1, 0.5);
        assert_eq!(plan.fathers, 0..1);
        assert!(plan.children.is_empty());
    }
}
