//! Fixed tree topology shared by every tree of an ensemble.
//!
//! Trees are never grown or pruned. Their shape is defined once by a per-position table of
//! right-child indices: position `i` may hold a decision node only if `right_child_of(i)` is
//! non-zero, in which case its children are `i + 1` (left) and `right_child_of(i)` (right).
//! Genetic operators only ever change node *content* inside this shape.
//!
//! The standard template is the pre-order layout of a complete binary tree with seven levels
//! of decisions: 127 decision positions and 128 leaf positions, plus one trailing slot that
//! is always a leaf so that every tree occupies exactly 256 records.

use std::sync::LazyLock;

use arrayvec::ArrayVec;

/// Maximum number of nodes in a tree.
///
/// Node indices are stored in a single byte, so a tree can never be larger than this.
pub const MAX_TREE_NODES: usize = 256;

/// Number of leading positions that are always decision nodes in the standard template.
pub const STANDARD_FORCED_DECISIONS: usize = 4;

#[rustfmt::skip]
const STANDARD_RIGHT_CHILDREN: [u8; MAX_TREE_NODES] = [
    128, 65, 34, 19, 12, 9, 8, 0, 0, 11, 0, 0, 16, 15, 0, 0,
    18, 0, 0, 27, 24, 23, 0, 0, 26, 0, 0, 31, 30, 0, 0, 33,
    0, 0, 50, 43, 40, 39, 0, 0, 42, 0, 0, 47, 46, 0, 0, 49,
    0, 0, 58, 55, 54, 0, 0, 57, 0, 0, 62, 61, 0, 0, 64, 0,
    0, 97, 82, 75, 72, 71, 0, 0, 74, 0, 0, 79, 78, 0, 0, 81,
    0, 0, 90, 87, 86, 0, 0, 89, 0, 0, 94, 93, 0, 0, 96, 0,
    0, 113, 106, 103, 102, 0, 0, 105, 0, 0, 110, 109, 0, 0, 112, 0,
    0, 121, 118, 117, 0, 0, 120, 0, 0, 125, 124, 0, 0, 127, 0, 0,
    192, 161, 146, 139, 136, 135, 0, 0, 138, 0, 0, 143, 142, 0, 0, 145,
    0, 0, 154, 151, 150, 0, 0, 153, 0, 0, 158, 157, 0, 0, 160, 0,
    0, 177, 170, 167, 166, 0, 0, 169, 0, 0, 174, 173, 0, 0, 176, 0,
    0, 185, 182, 181, 0, 0, 184, 0, 0, 189, 188, 0, 0, 191, 0, 0,
    224, 209, 202, 199, 198, 0, 0, 201, 0, 0, 206, 205, 0, 0, 208, 0,
    0, 217, 214, 213, 0, 0, 216, 0, 0, 221, 220, 0, 0, 223, 0, 0,
    240, 233, 230, 229, 0, 0, 232, 0, 0, 237, 236, 0, 0, 239, 0, 0,
    248, 245, 244, 0, 0, 247, 0, 0, 252, 251, 0, 0, 254, 0, 0, 0,
];

static STANDARD_TEMPLATE: LazyLock<TreeTemplate> = LazyLock::new(|| {
    TreeTemplate::new(&STANDARD_RIGHT_CHILDREN, STANDARD_FORCED_DECISIONS)
        .expect("standard template table is well-formed")
});

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TemplateError {
    #[display("template must contain at least one position")]
    Empty,
    #[display("template has {len} positions, at most 256 are supported")]
    TooLarge { len: usize },
    #[display("position {position} has right child {right_child}, which is not a later position in the template")]
    InvalidRightChild { position: usize, right_child: u8 },
    #[display("position {position} is forced to be a decision node but has no right child")]
    ForcedLeaf { position: usize },
}

/// Per-position right-child table defining the shape of every tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeTemplate {
    right_children: ArrayVec<u8, MAX_TREE_NODES>,
    forced_decisions: usize,
}

impl TreeTemplate {
    /// Builds a template from a right-child table.
    ///
    /// Every non-zero entry at position `i` must point past the left child (`> i + 1`) and
    /// stay inside the table, which guarantees that traversal from position 0 always moves
    /// forward and ends at a leaf. The first `forced_decisions` positions must be allowed to
    /// hold decision nodes.
    pub fn new(right_children: &[u8], forced_decisions: usize) -> Result<Self, TemplateError> {
        if right_children.is_empty() {
            return Err(TemplateError::Empty);
        }
        let right_children: ArrayVec<u8, MAX_TREE_NODES> = right_children
            .try_into()
            .map_err(|_| TemplateError::TooLarge {
                len: right_children.len(),
            })?;

        for (position, &right_child) in right_children.iter().enumerate() {
            let right = usize::from(right_child);
            if right != 0 && (right <= position + 1 || right >= right_children.len()) {
                return Err(TemplateError::InvalidRightChild {
                    position,
                    right_child,
                });
            }
        }
        if let Some(position) = (0..forced_decisions).find(|&p| {
            right_children.get(p).is_none_or(|&r| r == 0)
        }) {
            return Err(TemplateError::ForcedLeaf { position });
        }

        Ok(Self {
            right_children,
            forced_decisions,
        })
    }

    /// Returns the process-wide standard 256-position template.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD_TEMPLATE
    }

    /// Number of node positions in every tree built from this template.
    #[must_use]
    pub fn len(&self) -> usize {
        self.right_children.len()
    }

    /// Always `false`; templates cannot be empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.right_children.is_empty()
    }

    /// Right-child index of `position`, 0 if the position must hold a leaf.
    #[must_use]
    pub fn right_child(&self, position: usize) -> u8 {
        self.right_children[position]
    }

    /// Returns `true` if `position` may hold a decision node.
    #[must_use]
    pub fn allows_decision(&self, position: usize) -> bool {
        self.right_children[position] != 0
    }

    /// Returns `true` if `position` must hold a decision node.
    #[must_use]
    pub fn forces_decision(&self, position: usize) -> bool {
        position < self.forced_decisions
    }

    /// Number of leading positions forced to be decision nodes.
    #[must_use]
    pub fn forced_decisions(&self) -> usize {
        self.forced_decisions
    }

    /// The raw right-child table.
    #[must_use]
    pub fn right_children(&self) -> &[u8] {
        &self.right_children
    }
}
