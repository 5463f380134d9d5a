//! Configuration constants for rowstore.

/// Size of the index-file header in bytes.
///
/// # Layout
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       8     root address (0 = empty tree)
/// 8       8     node free-list head (0 = empty list)
/// 16      4     block size (little-endian u32)
/// ```
///
/// Node blocks begin at byte 20. Address 0 is reserved as the "no node"
/// sentinel, which works out because no node can ever live inside the header.
pub const INDEX_HEADER_SIZE: u64 = 20;

/// Smallest accepted block size.
///
/// The tree order is `block_size / 12`, and the rebalancing logic needs an
/// order of at least 3 (two keys per leaf, so a split always leaves both
/// halves at or above minimum occupancy).
pub const MIN_BLOCK_SIZE: u32 = 36;

/// Largest accepted block size.
///
/// Key counts are persisted as `u16`, so the order must stay below 65536.
pub const MAX_BLOCK_SIZE: u32 = 65_535 * 12;

/// Compute the tree order (maximum children per internal node) for a block
/// size.
///
/// A node needs 1 tag byte, a 2-byte count, `order - 1` 4-byte keys and
/// `order` 8-byte child slots: `12 * order - 1` bytes, which always fits in
/// `block_size` when `order = block_size / 12`.
#[inline]
pub const fn order_for_block_size(block_size: u32) -> usize {
    (block_size / 12) as usize
}
