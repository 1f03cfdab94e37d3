use std::ops::Range;

use crate::{node::Node, template::TreeTemplate, tree::Tree};

/// An ordered collection of trees classifying by majority vote.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    trees: Vec<Tree>,
}

impl Ensemble {
    /// Creates an ensemble of `n_trees` abstaining trees.
    #[must_use]
    pub fn abstaining(template: &TreeTemplate, n_trees: usize) -> Self {
        Self {
            trees: vec![Tree::abstaining(template); n_trees],
        }
    }

    #[must_use]
    pub fn from_trees(trees: Vec<Tree>) -> Self {
        Self { trees }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    #[must_use]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn trees_mut(&mut self) -> &mut [Tree] {
        &mut self.trees
    }

    /// Replaces the trees in `range` with copies of `source`'s trees at the same positions.
    pub fn copy_trees_from(&mut self, source: &Ensemble, range: Range<usize>) {
        self.trees[range.clone()].clone_from_slice(&source.trees[range]);
    }

    /// Counts the votes of every tree for one sample.
    ///
    /// Abstentions and votes for classes `>= n_classes` are not counted.
    #[must_use]
    pub fn tally(&self, features: &[f32], n_classes: usize) -> Vec<u32> {
        let mut counts = vec![0; n_classes];
        for tree in &self.trees {
            if let Some(class) = tree.classify(features).class_below(n_classes) {
                counts[class] += 1;
            }
        }
        counts
    }

    /// Classifies one sample by majority vote.
    ///
    /// Returns the class with the strictly greatest vote count; on ties the lowest class wins.
    /// Returns `None` if no tree cast a counted vote.
    ///
    /// # Example
    ///
    /// ```
    /// use gaforest_tree::{Ensemble, Node, Tree, TreeTemplate, Vote};
    ///
    /// let template = TreeTemplate::new(&[0], 0).unwrap();
    /// let tree = |vote| Tree::from_nodes([Node::leaf(vote)]).unwrap();
    /// let ensemble = Ensemble::from_trees(vec![
    ///     tree(Vote::Class(2)),
    ///     tree(Vote::Class(1)),
    ///     tree(Vote::Abstain),
    /// ]);
    /// assert_eq!(ensemble.classify(&[], 4), Some(1));
    ///
    /// let silent = Ensemble::abstaining(&template, 3);
    /// assert_eq!(silent.classify(&[], 4), None);
    /// ```
    #[must_use]
    pub fn classify(&self, features: &[f32], n_classes: usize) -> Option<usize> {
        let counts = self.tally(features, n_classes);
        let mut best: Option<(usize, u32)> = None;
        for (class, &count) in counts.iter().enumerate() {
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((class, count));
            }
        }
        best.map(|(class, _)| class)
    }

    /// Packs every node into transfer records, tree-major and node-minor.
    #[must_use]
    pub fn pack(&self) -> Vec<u64> {
        self.trees
            .iter()
            .flat_map(|tree| tree.nodes().iter().map(|node| node.pack()))
            .collect()
    }

    /// Decodes transfer records into `records.len() / nodes_per_tree` trees.
    ///
    /// Returns `None` if `nodes_per_tree` is zero, larger than a tree can hold, or does not
    /// divide the record count.
    #[must_use]
    pub fn unpack(records: &[u64], nodes_per_tree: usize) -> Option<Self> {
        if nodes_per_tree == 0 || records.len() % nodes_per_tree != 0 {
            return None;
        }
        let trees = records
            .chunks_exact(nodes_per_tree)
            .map(|chunk| Tree::from_nodes(chunk.iter().map(|&record| Node::unpack(record))))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { trees })
    }
}
