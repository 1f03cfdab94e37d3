//! Decision node representation and its packed 64-bit record format.
//!
//! Every node of every tree is transferred to inference back ends (and stored in model files)
//! as a single 8-byte record. In memory, a node is a tagged variant so that code never has to
//! reinterpret the payload bits by hand.
//!
//! # Record Layout (little-endian `u64`)
//!
//! ```text
//!  bits 0-7    tag            bit 0 set => decision node, clear => leaf
//!  bits 8-15   feature index  index into the sample's feature vector
//!  bits 16-23  right child    absolute node index of the right child (0 = none)
//!  bits 24-31  padding        always zero when packed by this crate
//!  bits 32-63  payload        f32 threshold (decision) or i32 class id (leaf)
//! ```
//!
//! The left child of node `i` is always node `i + 1`, so it is never stored.
//!
//! # Example
//!
//! ```
//! use gaforest_tree::{Node, NodeKind, Vote};
//!
//! let node = Node::decision(3, -0.25).with_right_child(12);
//! let record = node.pack();
//! let decoded = Node::unpack(record);
//!
//! assert_eq!(decoded.feature_index, 3);
//! assert_eq!(decoded.right_child, 12);
//! assert_eq!(decoded.kind, NodeKind::Decision { threshold: -0.25 });
//!
//! let leaf = Node::leaf(Vote::Abstain);
//! assert_eq!(Node::unpack(leaf.pack()).kind, NodeKind::Leaf { vote: Vote::Abstain });
//! ```

/// Payload value stored in a leaf that casts no vote.
pub const ABSTAIN_PAYLOAD: i32 = -1;

const DECISION_TAG: u8 = 0x01;
const LEAF_TAG: u8 = 0x00;

/// Outcome of a leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::IsVariant)]
pub enum Vote {
    /// Vote for the given class.
    Class(u32),
    /// Cast no vote.
    Abstain,
}

impl Vote {
    /// Decodes a leaf payload.
    ///
    /// Every negative payload is treated as an abstention.
    #[must_use]
    pub fn from_payload(payload: i32) -> Self {
        u32::try_from(payload).map_or(Self::Abstain, Self::Class)
    }

    /// Encodes this vote as a leaf payload.
    ///
    /// Classes above `i32::MAX` cannot be represented and are encoded as an abstention.
    #[must_use]
    pub fn to_payload(self) -> i32 {
        match self {
            Self::Class(class) => i32::try_from(class).unwrap_or(ABSTAIN_PAYLOAD),
            Self::Abstain => ABSTAIN_PAYLOAD,
        }
    }

    /// Returns the voted class if it is below `n_classes`.
    #[must_use]
    pub fn class_below(self, n_classes: usize) -> Option<usize> {
        match self {
            Self::Class(class) => usize::try_from(class).ok().filter(|&c| c < n_classes),
            Self::Abstain => None,
        }
    }
}

/// Content of a node: either a split on a threshold or a terminal vote.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::IsVariant)]
pub enum NodeKind {
    /// Continue to the left child if `feature < threshold`, otherwise to the right child.
    Decision { threshold: f32 },
    /// Stop traversal and return `vote`.
    Leaf { vote: Vote },
}

/// A single decoded tree node.
///
/// `feature_index` and `right_child` are carried for leaves as well, because the record
/// format always stores them and round-tripping must preserve them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub feature_index: u8,
    pub right_child: u8,
}

impl Node {
    /// An abstaining leaf with no right child.
    pub const ABSTAIN: Self = Self {
        kind: NodeKind::Leaf {
            vote: Vote::Abstain,
        },
        feature_index: 0,
        right_child: 0,
    };

    /// Creates a decision node comparing `feature_index` against `threshold`.
    ///
    /// The right child is left as 0; it is filled from the template with
    /// [`with_right_child`](Self::with_right_child) when the node is placed into a tree.
    #[must_use]
    pub fn decision(feature_index: u8, threshold: f32) -> Self {
        Self {
            kind: NodeKind::Decision { threshold },
            feature_index,
            right_child: 0,
        }
    }

    /// Creates a leaf node casting `vote`.
    #[must_use]
    pub fn leaf(vote: Vote) -> Self {
        Self {
            kind: NodeKind::Leaf { vote },
            ..Self::ABSTAIN
        }
    }

    /// Returns this node with its right-child index replaced.
    #[must_use]
    pub fn with_right_child(self, right_child: u8) -> Self {
        Self {
            right_child,
            ..self
        }
    }

    /// Returns `true` if traversal continues past this node.
    #[must_use]
    pub fn is_decision(&self) -> bool {
        self.kind.is_decision()
    }

    /// Packs this node into its 64-bit transfer record.
    #[must_use]
    pub fn pack(self) -> u64 {
        let (tag, payload) = match self.kind {
            NodeKind::Decision { threshold } => (DECISION_TAG, threshold.to_le_bytes()),
            NodeKind::Leaf { vote } => (LEAF_TAG, vote.to_payload().to_le_bytes()),
        };
        u64::from_le_bytes([
            tag,
            self.feature_index,
            self.right_child,
            0,
            payload[0],
            payload[1],
            payload[2],
            payload[3],
        ])
    }

    /// Decodes a 64-bit transfer record.
    ///
    /// Only bit 0 of the tag byte is significant; the padding byte is ignored. Decoding
    /// normalizes: packing the result clears the other tag bits and the padding, and writes
    /// every negative leaf payload as [`ABSTAIN_PAYLOAD`]. Records packed by this crate
    /// survive the round trip bit for bit.
    #[must_use]
    pub fn unpack(record: u64) -> Self {
        let bytes = record.to_le_bytes();
        let payload = [bytes[4], bytes[5], bytes[6], bytes[7]];
        let kind = if bytes[0] & DECISION_TAG == 0 {
            NodeKind::Leaf {
                vote: Vote::from_payload(i32::from_le_bytes(payload)),
            }
        } else {
            NodeKind::Decision {
                threshold: f32::from_le_bytes(payload),
            }
        };
        Self {
            kind,
            feature_index: bytes[1],
            right_child: bytes[2],
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::ABSTAIN
    }
}

/// Compares a feature value against a threshold the way the inference hardware does.
///
/// Both values are reinterpreted as signed 32-bit integers and compared as integers. This
/// matches IEEE-754 ordering for non-negative values only: negative values order by their
/// integer bit pattern, and NaN payloads compare like any other bit pattern.
#[inline]
#[must_use]
pub fn bitwise_less(value: f32, threshold: f32) -> bool {
    i32::from_ne_bytes(value.to_ne_bytes()) < i32::from_ne_bytes(threshold.to_ne_bytes())
}
