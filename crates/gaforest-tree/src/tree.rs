use arrayvec::ArrayVec;

use crate::{
    node::{Node, NodeKind, Vote, bitwise_less},
    template::{MAX_TREE_NODES, TreeTemplate},
};

/// A single decision tree stored as a flat array of nodes.
///
/// Node 0 is the root. The left child of a decision node at `i` is `i + 1`; the right child
/// is the node's own `right_child` index.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: ArrayVec<Node, MAX_TREE_NODES>,
}

impl Tree {
    /// Creates a tree whose every position is an abstaining leaf.
    ///
    /// Right-child indices are copied from the template so that packed records carry the
    /// template shape even before any decision node is placed.
    #[must_use]
    pub fn abstaining(template: &TreeTemplate) -> Self {
        let nodes = template
            .right_children()
            .iter()
            .map(|&right| Node::ABSTAIN.with_right_child(right))
            .collect();
        Self { nodes }
    }

    /// Creates a tree from decoded nodes.
    ///
    /// Returns `None` if more than [`MAX_TREE_NODES`] nodes are given.
    pub fn from_nodes<I>(nodes: I) -> Option<Self>
    where
        I: IntoIterator<Item = Node>,
    {
        let mut array = ArrayVec::new();
        for node in nodes {
            array.try_push(node).ok()?;
        }
        Some(Self { nodes: array })
    }

    /// Number of node slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Places `node` at `position`, taking the right-child index from the template.
    pub fn set_node(&mut self, template: &TreeTemplate, position: usize, node: Node) {
        self.nodes[position] = node.with_right_child(template.right_child(position));
    }

    /// Walks the tree for one sample and returns the reached leaf's vote.
    ///
    /// Starting at node 0, each decision node sends the sample to its left child when
    /// `features[feature_index] < threshold` (compared with [`bitwise_less`]) and to its right
    /// child otherwise. Template-shaped trees always move forward and end at a leaf.
    ///
    /// A malformed tree that points outside the node array or backwards, or that reads a
    /// feature the sample does not have, yields [`Vote::Abstain`].
    #[must_use]
    pub fn classify(&self, features: &[f32]) -> Vote {
        let mut index = 0;
        loop {
            let Some(node) = self.nodes.get(index) else {
                return Vote::Abstain;
            };
            let threshold = match node.kind {
                NodeKind::Leaf { vote } => return vote,
                NodeKind::Decision { threshold } => threshold,
            };
            let Some(&value) = features.get(usize::from(node.feature_index)) else {
                return Vote::Abstain;
            };
            let next = if bitwise_less(value, threshold) {
                index + 1
            } else {
                usize::from(node.right_child)
            };
            if next <= index {
                return Vote::Abstain;
            }
            index = next;
        }
    }

    /// Returns `true` if the tree has the template's length, every right-child index matches
    /// the template, and no decision node sits where the template forbids one.
    #[must_use]
    pub fn conforms_to(&self, template: &TreeTemplate) -> bool {
        self.len() == template.len()
            && self.nodes.iter().enumerate().all(|(position, node)| {
                node.right_child == template.right_child(position)
                    && (!node.is_decision() || template.allows_decision(position))
            })
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg32;

    use super::*;

    fn small_template() -> TreeTemplate {
        // 0 -> (1, 4), 1 -> (2, 3), 4 -> (5, 6)
        TreeTemplate::new(&[4, 3, 0, 0, 6, 0, 0], 1).unwrap()
    }

    /// Root splits on feature 0 at 0.5; left subtree splits on feature 1 at 0.5.
    fn small_tree() -> Tree {
        let template = small_template();
        let mut tree = Tree::abstaining(&template);
        tree.set_node(&template, 0, Node::decision(0, 0.5));
        tree.set_node(&template, 1, Node::decision(1, 0.5));
        tree.set_node(&template, 2, Node::leaf(Vote::Class(0)));
        tree.set_node(&template, 3, Node::leaf(Vote::Class(1)));
        tree.set_node(&template, 4, Node::leaf(Vote::Class(2)));
        tree
    }

    #[test]
    fn test_abstaining_tree() {
        let template = TreeTemplate::standard();
        let tree = Tree::abstaining(template);
        assert_eq!(tree.len(), 256);
        assert!(tree.conforms_to(template));
        assert_eq!(tree.classify(&[0.0; 32]), Vote::Abstain);
    }

    #[test]
    fn test_classify_follows_thresholds() {
        let tree = small_tree();
        assert_eq!(tree.classify(&[0.1, 0.1]), Vote::Class(0));
        assert_eq!(tree.classify(&[0.1, 0.9]), Vote::Class(1));
        assert_eq!(tree.classify(&[0.9, 0.1]), Vote::Class(2));
        // equal to the threshold goes right
        assert_eq!(tree.classify(&[0.5, 0.1]), Vote::Class(2));
    }

    #[test]
    fn test_missing_feature_abstains() {
        let tree = small_tree();
        assert_eq!(tree.classify(&[0.1]), Vote::Abstain);
    }

    #[test]
    fn test_backward_right_child_abstains() {
        let mut tree = small_tree();
        tree.nodes_mut()[0] = Node::decision(0, 0.5).with_right_child(0);
        assert_eq!(tree.classify(&[0.9, 0.0]), Vote::Abstain);
        assert!(!tree.conforms_to(&small_template()));
    }

    #[test]
    fn test_out_of_range_right_child_abstains() {
        let mut tree = small_tree();
        tree.nodes_mut()[0] = Node::decision(0, 0.5).with_right_child(200);
        assert_eq!(tree.classify(&[0.9, 0.0]), Vote::Abstain);
    }

    #[test]
    fn test_decision_at_leaf_position_does_not_conform() {
        let template = small_template();
        let mut tree = small_tree();
        tree.nodes_mut()[2] = Node::decision(0, 1.0);
        assert!(!tree.conforms_to(&template));
    }

    #[test]
    fn test_traversal_terminates_on_random_template_trees() {
        let template = TreeTemplate::standard();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..20 {
            let mut tree = Tree::abstaining(template);
            for position in 0..template.len() {
                let node = if template.allows_decision(position) && rng.random_bool(0.8) {
                    Node::decision(rng.random_range(0..4), rng.random_range(-1.0..1.0))
                } else {
                    Node::leaf(Vote::Class(rng.random_range(0..3)))
                };
                tree.set_node(template, position, node);
            }
            assert!(tree.conforms_to(template));
            for _ in 0..50 {
                let features: Vec<f32> = (0..4).map(|_| rng.random_range(-2.0..2.0)).collect();
                assert!(tree.classify(&features).is_class());
            }
        }
    }

    #[test]
    fn test_from_nodes_rejects_oversized_input() {
        assert!(Tree::from_nodes(vec![Node::ABSTAIN; MAX_TREE_NODES]).is_some());
        assert!(Tree::from_nodes(vec![Node::ABSTAIN; MAX_TREE_NODES + 1]).is_none());
    }
}
