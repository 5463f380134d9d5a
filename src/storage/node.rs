//! B+Tree node representation and fixed-layout codec.
//!
//! A node is an explicit tagged variant — [`Node::Leaf`] or
//! [`Node::Internal`] — with a 1-byte discriminant on disk. Leaf and
//! internal nodes reuse the same block layout; they differ only in how the
//! child slots are interpreted.

use crate::common::{Error, NodeAddr, Result, RowAddr};

/// A leaf node: keys paired with row addresses, plus the leaf-chain link.
///
/// `rows[i]` is the row address stored for `keys[i]`. `next` points at the
/// leaf holding the next keys in ascending order, nil at the end of the
/// chain. The chain is what makes range search possible without revisiting
/// internal nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    pub keys: Vec<i32>,
    pub rows: Vec<RowAddr>,
    pub next: NodeAddr,
}

/// An internal node: separator keys and one more child than keys.
///
/// All keys reachable through `children[i]` are `< keys[i]` and
/// `>= keys[i-1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalNode {
    pub keys: Vec<i32>,
    pub children: Vec<NodeAddr>,
}

/// A B+Tree node as held in memory.
///
/// Every read from disk produces an independently owned `Node`; nodes are
/// never aliased between levels of a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(LeafNode),
    Internal(InternalNode),
}

impl Node {
    /// On-disk tag for an internal node.
    pub const TAG_INTERNAL: u8 = 1;
    /// On-disk tag for a leaf node.
    pub const TAG_LEAF: u8 = 2;

    /// Offsets within a block.
    ///
    /// ```text
    /// Offset            Size          Field
    /// ------            ----          -----
    /// 0                 1             tag
    /// 1                 2             key count (LE u16)
    /// 3                 4*(order-1)   key slots (LE i32)
    /// 3 + 4*(order-1)   8*order       child slots (LE u64)
    /// ```
    ///
    /// For a leaf, child slots `0..count` hold row addresses aligned with
    /// the keys and the *final* slot (`order - 1`) holds the next-leaf
    /// address. For an internal node, slots `0..=count` hold child node
    /// addresses.
    pub const OFFSET_TAG: usize = 0;
    pub const OFFSET_COUNT: usize = 1;
    pub const OFFSET_KEYS: usize = 3;

    /// Offset of the child-slot array for a given order.
    #[inline]
    pub const fn offset_children(order: usize) -> usize {
        Self::OFFSET_KEYS + 4 * (order - 1)
    }

    /// Bytes actually used by a node of the given order.
    #[inline]
    pub const fn encoded_len(order: usize) -> usize {
        Self::offset_children(order) + 8 * order
    }

    /// Create an empty leaf with no successor.
    pub fn empty_leaf() -> Self {
        Node::Leaf(LeafNode {
            keys: Vec::new(),
            rows: Vec::new(),
            next: NodeAddr::NIL,
        })
    }

    /// Number of keys currently held.
    #[inline]
    pub fn key_count(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.keys.len(),
            Node::Internal(node) => node.keys.len(),
        }
    }

    /// The keys, regardless of node kind.
    #[inline]
    pub fn keys(&self) -> &[i32] {
        match self {
            Node::Leaf(leaf) => &leaf.keys,
            Node::Internal(node) => &node.keys,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Serialize into a block.
    ///
    /// Rewrites the whole record — individual fields are never patched in
    /// place, so a node on disk is always internally consistent.
    ///
    /// # Panics
    /// Panics if `buf` is smaller than `encoded_len(order)` or the node
    /// exceeds the capacity the order allows. Both are internal invariants,
    /// not runtime conditions.
    pub fn encode(&self, buf: &mut [u8], order: usize) {
        assert!(buf.len() >= Self::encoded_len(order), "block too small");
        buf.fill(0);

        let count = self.key_count();
        assert!(count <= order - 1, "node overflows order {}", order);
        buf[Self::OFFSET_COUNT..Self::OFFSET_COUNT + 2]
            .copy_from_slice(&(count as u16).to_le_bytes());

        let mut key_at = Self::OFFSET_KEYS;
        for key in self.keys() {
            buf[key_at..key_at + 4].copy_from_slice(&key.to_le_bytes());
            key_at += 4;
        }

        let children = Self::offset_children(order);
        match self {
            Node::Leaf(leaf) => {
                debug_assert_eq!(leaf.rows.len(), count);
                buf[Self::OFFSET_TAG] = Self::TAG_LEAF;
                let mut at = children;
                for row in &leaf.rows {
                    buf[at..at + 8].copy_from_slice(&row.0.to_le_bytes());
                    at += 8;
                }
                // Next-leaf link always sits in the last child slot.
                let last = children + 8 * (order - 1);
                buf[last..last + 8].copy_from_slice(&leaf.next.0.to_le_bytes());
            }
            Node::Internal(node) => {
                debug_assert_eq!(node.children.len(), count + 1);
                buf[Self::OFFSET_TAG] = Self::TAG_INTERNAL;
                let mut at = children;
                for child in &node.children {
                    buf[at..at + 8].copy_from_slice(&child.0.to_le_bytes());
                    at += 8;
                }
            }
        }
    }

    /// Deserialize from a block read at `addr`.
    ///
    /// `addr` is only used for error context; the address itself is never
    /// persisted inside the block.
    pub fn decode(buf: &[u8], order: usize, addr: NodeAddr) -> Result<Node> {
        assert!(buf.len() >= Self::encoded_len(order), "block too small");

        let count = u16::from_le_bytes([buf[Self::OFFSET_COUNT], buf[Self::OFFSET_COUNT + 1]])
            as usize;
        let tag = buf[Self::OFFSET_TAG];
        if count > order - 1 || (tag != Self::TAG_LEAF && tag != Self::TAG_INTERNAL) {
            return Err(Error::CorruptNode { addr: addr.0, tag });
        }

        let mut keys = Vec::with_capacity(count);
        let mut key_at = Self::OFFSET_KEYS;
        for _ in 0..count {
            keys.push(i32::from_le_bytes(
                buf[key_at..key_at + 4].try_into().unwrap(),
            ));
            key_at += 4;
        }

        let children = Self::offset_children(order);
        let read_slot = |i: usize| -> u64 {
            let at = children + 8 * i;
            u64::from_le_bytes(buf[at..at + 8].try_into().unwrap())
        };

        if tag == Self::TAG_LEAF {
            let rows = (0..count).map(|i| RowAddr::new(read_slot(i))).collect();
            let next = NodeAddr::new(read_slot(order - 1));
            Ok(Node::Leaf(LeafNode { keys, rows, next }))
        } else {
            let children = (0..=count).map(|i| NodeAddr::new(read_slot(i))).collect();
            Ok(Node::Internal(InternalNode { keys, children }))
        }
    }
}
