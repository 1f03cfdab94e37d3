//! Fixed-shape decision trees, their packed node encoding, and ensemble voting.
//!
//! - [`Node`] is one decision or leaf node; it packs into a single `u64` record.
//! - [`TreeTemplate`] fixes which positions of a tree may hold decision nodes.
//! - [`Tree`] is a flat node array walked from position 0.
//! - [`Ensemble`] classifies by majority vote over its trees.
//! - [`model_file`] stores an ensemble on disk.

pub use self::{
    ensemble::Ensemble,
    model_file::{MODEL_MAGIC, ModelFileError},
    node::{ABSTAIN_PAYLOAD, Node, NodeKind, Vote, bitwise_less},
    template::{MAX_TREE_NODES, STANDARD_FORCED_DECISIONS, TemplateError, TreeTemplate},
    tree::Tree,
};

pub mod ensemble;
pub mod model_file;
pub mod node;
pub mod template;
pub mod tree;
