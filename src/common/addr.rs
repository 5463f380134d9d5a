//! File-address newtypes.
//!
//! Both the index file and the row file address records by absolute byte
//! offset, with 0 reserved as the "nothing here" sentinel (offset 0 always
//! falls inside a file header, so no real record can live there).

use std::fmt;

/// Address of a node block in the index file.
///
/// # Example
/// ```
/// use rowstore::NodeAddr;
///
/// let addr = NodeAddr::new(20);
/// assert!(!addr.is_nil());
/// assert_eq!(addr.0, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddr(pub u64);

impl NodeAddr {
    /// The "no node" sentinel.
    pub const NIL: NodeAddr = NodeAddr(0);

    /// Create a new NodeAddr.
    #[inline]
    pub fn new(addr: u64) -> Self {
        NodeAddr(addr)
    }

    /// Check whether this is the nil sentinel.
    #[inline]
    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            write!(f, "Node(nil)")
        } else {
            write!(f, "Node(@{})", self.0)
        }
    }
}

/// Address of a row record in the row file.
///
/// This is the "value" the B+Tree stores for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowAddr(pub u64);

impl RowAddr {
    /// The "no row" sentinel.
    pub const NIL: RowAddr = RowAddr(0);

    /// Create a new RowAddr.
    #[inline]
    pub fn new(addr: u64) -> Self {
        RowAddr(addr)
    }

    /// Check whether this is the nil sentinel.
    #[inline]
    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }
}

impl fmt::Display for RowAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            write!(f, "Row(nil)")
        } else {
            write!(f, "Row(@{})", self.0)
        }
    }
}
