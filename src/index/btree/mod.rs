//! Disk-resident B+Tree keyed by `i32`, storing one row address per key.
//!
//! The tree enforces key uniqueness and supports point search, ordered range
//! search, insertion with split propagation, and deletion with
//! borrow/combine rebalancing. All structural state lives in a single index
//! file managed by [`NodeFile`]; this module holds the algorithms only.
//!
//! # Traversal
//! Mutating operations descend root-to-leaf recording an explicit stack of
//! ancestors (address, decoded node, and the child slot that was followed).
//! Rebalancing then pops that stack to walk back up an arbitrary number of
//! levels — no language recursion, no parent pointers on disk.

use std::path::Path;

use crate::common::{Error, NodeAddr, Result, RowAddr};
use crate::storage::node::{InternalNode, LeafNode, Node};
use crate::storage::NodeFile;

/// One ancestor on the descent path.
struct PathEntry {
    addr: NodeAddr,
    node: InternalNode,
    /// Index of the child slot the descent followed.
    child_idx: usize,
}

/// A disk-resident B+Tree index.
///
/// Keys are unique `i32` values; the stored "value" for each key is a
/// [`RowAddr`]. Leaves are chained in ascending key order, which is what
/// makes [`BTree::range_search`] a single forward scan.
///
/// # Occupancy
/// Every non-root node holds at least `ceil(order / 2) - 1` keys; the root
/// may hold as few as one. Borrowing from a sibling is always preferred over
/// merging, to minimize restructuring.
///
/// # Ownership
/// Single-threaded with exclusive ownership of the backing file. Callers
/// must not open the same file through two instances at once.
pub struct BTree {
    file: NodeFile,
}

impl BTree {
    /// Create a new, empty tree, truncating any existing file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, block_size: u32) -> Result<Self> {
        Ok(Self {
            file: NodeFile::create(path, block_size)?,
        })
    }

    /// Open an existing tree, recomputing the order from the stored block
    /// size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            file: NodeFile::open(path)?,
        })
    }

    /// Open an existing tree and fail fast if it was created with a
    /// different block size.
    pub fn open_expecting<P: AsRef<Path>>(path: P, block_size: u32) -> Result<Self> {
        Ok(Self {
            file: NodeFile::open_expecting(path, block_size)?,
        })
    }

    /// Maximum number of children per internal node.
    #[inline]
    pub fn order(&self) -> usize {
        self.file.order()
    }

    #[inline]
    pub fn block_size(&self) -> u32 {
        self.file.block_size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.file.root().is_nil()
    }

    /// Minimum keys for any non-root node: `ceil(order / 2) - 1`.
    #[inline]
    fn min_keys(&self) -> usize {
        (self.order() + 1) / 2 - 1
    }

    /// Leaf capacity (= internal-node key capacity).
    #[inline]
    fn capacity(&self) -> usize {
        self.order() - 1
    }

    /// Number of levels, 0 for an empty tree.
    pub fn height(&mut self) -> Result<usize> {
        let mut height = 0;
        let mut addr = self.file.root();
        while !addr.is_nil() {
            height += 1;
            match self.file.read_node(addr)? {
                Node::Internal(node) => addr = node.children[0],
                Node::Leaf(_) => break,
            }
        }
        Ok(height)
    }

    /// Point search: the row address stored for `key`, or `None`.
    ///
    /// O(depth): one node read per level.
    pub fn search(&mut self, key: i32) -> Result<Option<RowAddr>> {
        let mut addr = self.file.root();
        if addr.is_nil() {
            return Ok(None);
        }
        loop {
            match self.file.read_node(addr)? {
                Node::Internal(node) => {
                    // Branch: last key <= search key decides, ties go right.
                    addr = node.children[node.keys.partition_point(|k| *k <= key)];
                }
                Node::Leaf(leaf) => {
                    return Ok(leaf.keys.binary_search(&key).ok().map(|i| leaf.rows[i]));
                }
            }
        }
    }

    /// Row addresses for all keys in `low..=high`, in ascending key order.
    ///
    /// Descends once to the leaf that would hold `low`, then follows the
    /// leaf chain; internal nodes are never revisited.
    ///
    /// # Errors
    /// [`Error::InvalidRange`] when `low > high`, before any file I/O.
    pub fn range_search(&mut self, low: i32, high: i32) -> Result<Vec<RowAddr>> {
        if low > high {
            return Err(Error::InvalidRange { low, high });
        }

        let mut out = Vec::new();
        let mut addr = self.file.root();
        if addr.is_nil() {
            return Ok(out);
        }

        let mut leaf = loop {
            match self.file.read_node(addr)? {
                Node::Internal(node) => {
                    addr = node.children[node.keys.partition_point(|k| *k <= low)];
                }
                Node::Leaf(leaf) => break leaf,
            }
        };

        loop {
            for (i, &k) in leaf.keys.iter().enumerate() {
                if k > high {
                    return Ok(out);
                }
                if k >= low {
                    out.push(leaf.rows[i]);
                }
            }
            if leaf.next.is_nil() {
                return Ok(out);
            }
            leaf = self.read_leaf(leaf.next)?;
        }
    }

    /// Insert `(key, row)`. Returns `false` without mutating anything when
    /// the key is already present.
    pub fn insert(&mut self, key: i32, row: RowAddr) -> Result<bool> {
        if self.file.root().is_nil() {
            let addr = self.file.allocate()?;
            let leaf = LeafNode {
                keys: vec![key],
                rows: vec![row],
                next: NodeAddr::NIL,
            };
            self.file.write_node(addr, &Node::Leaf(leaf))?;
            self.file.set_root(addr);
            return Ok(true);
        }

        let (mut path, leaf_addr, mut leaf) = self.descend(key)?;
        let pos = match leaf.keys.binary_search(&key) {
            Ok(_) => return Ok(false),
            Err(pos) => pos,
        };

        leaf.keys.insert(pos, key);
        leaf.rows.insert(pos, row);
        if leaf.keys.len() <= self.capacity() {
            self.file.write_node(leaf_addr, &Node::Leaf(leaf))?;
            return Ok(true);
        }

        // Leaf overflow: divide at the midpoint, link the new right leaf
        // into the chain, and push the right half's first key up.
        let mid = leaf.keys.len() / 2;
        let right = LeafNode {
            keys: leaf.keys.split_off(mid),
            rows: leaf.rows.split_off(mid),
            next: leaf.next,
        };
        let mut sep = right.keys[0];
        let right_addr = self.file.allocate()?;
        leaf.next = right_addr;
        self.file.write_node(right_addr, &Node::Leaf(right))?;
        self.file.write_node(leaf_addr, &Node::Leaf(leaf))?;
        let mut carried = right_addr;

        // Propagate: each ancestor absorbs the (separator, child) pair or
        // splits in turn. An internal split consumes its middle key.
        while let Some(PathEntry {
            addr,
            node: mut parent,
            child_idx,
        }) = path.pop()
        {
            parent.keys.insert(child_idx, sep);
            parent.children.insert(child_idx + 1, carried);
            if parent.keys.len() <= self.capacity() {
                self.file.write_node(addr, &Node::Internal(parent))?;
                return Ok(true);
            }

            let mid = parent.keys.len() / 2;
            let promoted = parent.keys[mid];
            let right = InternalNode {
                keys: parent.keys.split_off(mid + 1),
                children: parent.children.split_off(mid + 1),
            };
            parent.keys.pop(); // the promoted key moves up, not right
            let right_addr = self.file.allocate()?;
            self.file.write_node(right_addr, &Node::Internal(right))?;
            self.file.write_node(addr, &Node::Internal(parent))?;
            sep = promoted;
            carried = right_addr;
        }

        // The root itself split: grow the tree by one level.
        let old_root = self.file.root();
        let new_root = InternalNode {
            keys: vec![sep],
            children: vec![old_root, carried],
        };
        let root_addr = self.file.allocate()?;
        self.file.write_node(root_addr, &Node::Internal(new_root))?;
        self.file.set_root(root_addr);
        Ok(true)
    }

    /// Remove `key`. Returns the row address it mapped to, or `None` (with
    /// no mutation) when absent.
    pub fn remove(&mut self, key: i32) -> Result<Option<RowAddr>> {
        if self.file.root().is_nil() {
            return Ok(None);
        }

        let (mut path, leaf_addr, mut leaf) = self.descend(key)?;
        let pos = match leaf.keys.binary_search(&key) {
            Ok(pos) => pos,
            Err(_) => return Ok(None),
        };
        leaf.keys.remove(pos);
        let removed = leaf.rows.remove(pos);

        // A root leaf never rebalances; a drained root empties the tree.
        if path.is_empty() {
            if leaf.keys.is_empty() {
                self.file.release(leaf_addr)?;
                self.file.set_root(NodeAddr::NIL);
            } else {
                self.file.write_node(leaf_addr, &Node::Leaf(leaf))?;
            }
            return Ok(Some(removed));
        }

        // If the leaf's first key went away, the ancestor using it as a
        // separator must track the new minimum. Deferred: applied at the
        // first ancestor that actually holds the key. When the leaf drained
        // completely (possible only at order 3) there is no new minimum and
        // the stale separator still satisfies the separation invariant.
        let new_min = leaf.keys.first().copied();
        let mut fix_pending = pos == 0 && new_min.is_some();

        let mut child_underfull = leaf.keys.len() < self.min_keys();
        self.file.write_node(leaf_addr, &Node::Leaf(leaf))?;

        while let Some(PathEntry {
            addr,
            node: mut parent,
            child_idx,
        }) = path.pop()
        {
            let mut parent_dirty = false;
            if fix_pending {
                if let Some(i) = parent.keys.iter().position(|&k| k == key) {
                    parent.keys[i] = new_min.unwrap_or(key);
                    fix_pending = false;
                    parent_dirty = true;
                }
            }

            if child_underfull {
                self.repair_underfull(&mut parent, child_idx)?;
                parent_dirty = true;
            }

            let parent_is_root = path.is_empty();
            if parent_is_root && parent.keys.is_empty() {
                // The root lost its last separator: its single remaining
                // child becomes the new root and the tree shrinks a level.
                self.file.set_root(parent.children[0]);
                self.file.release(addr)?;
                return Ok(Some(removed));
            }

            child_underfull = !parent_is_root && parent.keys.len() < self.min_keys();
            if parent_dirty {
                self.file.write_node(addr, &Node::Internal(parent))?;
            }
            if !child_underfull && !fix_pending {
                return Ok(Some(removed));
            }
        }

        Ok(Some(removed))
    }

    /// Flush the header (root + free-list head) and sync, without giving up
    /// the tree.
    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()
    }

    /// Flush the header (root + free-list head) and close the file. The
    /// tree must not be used afterwards.
    pub fn close(self) -> Result<()> {
        self.file.close()
    }

    /// Descend from the root to the leaf that covers `key`, recording every
    /// internal node passed through.
    ///
    /// Each entry is an independently owned copy; nothing aliases between
    /// levels.
    fn descend(&mut self, key: i32) -> Result<(Vec<PathEntry>, NodeAddr, LeafNode)> {
        let mut path = Vec::new();
        let mut addr = self.file.root();
        debug_assert!(!addr.is_nil());
        loop {
            match self.file.read_node(addr)? {
                Node::Internal(node) => {
                    let child_idx = node.keys.partition_point(|k| *k <= key);
                    let child = node.children[child_idx];
                    path.push(PathEntry {
                        addr,
                        node,
                        child_idx,
                    });
                    addr = child;
                }
                Node::Leaf(leaf) => return Ok((path, addr, leaf)),
            }
        }
    }

    /// Read a node that must be a leaf (leaf-chain traversal).
    fn read_leaf(&mut self, addr: NodeAddr) -> Result<LeafNode> {
        match self.file.read_node(addr)? {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(Error::CorruptNode {
                addr: addr.0,
                tag: Node::TAG_INTERNAL,
            }),
        }
    }

    /// Repair the under-full child at `parent.children[child_idx]`.
    ///
    /// Borrow from a sibling with surplus keys when possible (left first,
    /// then right), otherwise combine with a sibling. The parent is mutated
    /// in memory only; the caller writes it back (or releases it, for a
    /// shrinking root).
    fn repair_underfull(&mut self, parent: &mut InternalNode, child_idx: usize) -> Result<()> {
        let min = self.min_keys();

        if child_idx > 0 {
            let left_addr = parent.children[child_idx - 1];
            let left = self.file.read_node(left_addr)?;
            if left.key_count() > min {
                return self.borrow_from_left(parent, child_idx, left_addr, left);
            }
        }
        if child_idx + 1 < parent.children.len() {
            let right_addr = parent.children[child_idx + 1];
            let right = self.file.read_node(right_addr)?;
            if right.key_count() > min {
                return self.borrow_from_right(parent, child_idx, right_addr, right);
            }
        }

        // No surplus anywhere adjacent: merge with the left sibling when one
        // exists, otherwise with the right.
        if child_idx > 0 {
            self.combine(parent, child_idx - 1)
        } else {
            self.combine(parent, 0)
        }
    }

    /// Move one entry from the left sibling into the child.
    fn borrow_from_left(
        &mut self,
        parent: &mut InternalNode,
        child_idx: usize,
        left_addr: NodeAddr,
        left: Node,
    ) -> Result<()> {
        let child_addr = parent.children[child_idx];
        let child = self.file.read_node(child_addr)?;
        let sep_idx = child_idx - 1;

        match (left, child) {
            (Node::Leaf(mut left), Node::Leaf(mut child)) => {
                // The sibling's greatest entry becomes the child's least,
                // and the parent separator drops to the new boundary key.
                let k = left.keys.pop().expect("surplus sibling is non-empty");
                let r = left.rows.pop().expect("keys and rows stay aligned");
                child.keys.insert(0, k);
                child.rows.insert(0, r);
                parent.keys[sep_idx] = k;
                self.file.write_node(left_addr, &Node::Leaf(left))?;
                self.file.write_node(child_addr, &Node::Leaf(child))?;
            }
            (Node::Internal(mut left), Node::Internal(mut child)) => {
                // Rotate through the parent: separator comes down, the
                // sibling's greatest key goes up, its last child crosses.
                child.keys.insert(0, parent.keys[sep_idx]);
                child
                    .children
                    .insert(0, left.children.pop().expect("internal node has children"));
                parent.keys[sep_idx] = left.keys.pop().expect("surplus sibling is non-empty");
                self.file.write_node(left_addr, &Node::Internal(left))?;
                self.file.write_node(child_addr, &Node::Internal(child))?;
            }
            _ => {
                return Err(Error::CorruptNode {
                    addr: child_addr.0,
                    tag: 0,
                })
            }
        }
        Ok(())
    }

    /// Move one entry from the right sibling into the child.
    fn borrow_from_right(
        &mut self,
        parent: &mut InternalNode,
        child_idx: usize,
        right_addr: NodeAddr,
        right: Node,
    ) -> Result<()> {
        let child_addr = parent.children[child_idx];
        let child = self.file.read_node(child_addr)?;

        match (child, right) {
            (Node::Leaf(mut child), Node::Leaf(mut right)) => {
                let k = right.keys.remove(0);
                let r = right.rows.remove(0);
                child.keys.push(k);
                child.rows.push(r);
                // Separator tracks the right sibling's new first key.
                parent.keys[child_idx] = right.keys[0];
                self.file.write_node(right_addr, &Node::Leaf(right))?;
                self.file.write_node(child_addr, &Node::Leaf(child))?;
            }
            (Node::Internal(mut child), Node::Internal(mut right)) => {
                child.keys.push(parent.keys[child_idx]);
                child.children.push(right.children.remove(0));
                parent.keys[child_idx] = right.keys.remove(0);
                self.file.write_node(right_addr, &Node::Internal(right))?;
                self.file.write_node(child_addr, &Node::Internal(child))?;
            }
            _ => {
                return Err(Error::CorruptNode {
                    addr: child_addr.0,
                    tag: 0,
                })
            }
        }
        Ok(())
    }

    /// Merge `parent.children[left_idx + 1]` into `parent.children[left_idx]`
    /// and drop the separator between them.
    ///
    /// Both nodes sit at or below minimum occupancy (borrowing was ruled
    /// out), so the merged node always fits. The emptied right node goes
    /// back on the free list.
    fn combine(&mut self, parent: &mut InternalNode, left_idx: usize) -> Result<()> {
        let left_addr = parent.children[left_idx];
        let right_addr = parent.children[left_idx + 1];
        let left = self.file.read_node(left_addr)?;
        let right = self.file.read_node(right_addr)?;

        match (left, right) {
            (Node::Leaf(mut left), Node::Leaf(right)) => {
                left.keys.extend(right.keys);
                left.rows.extend(right.rows);
                left.next = right.next;
                self.file.write_node(left_addr, &Node::Leaf(left))?;
            }
            (Node::Internal(mut left), Node::Internal(right)) => {
                // The separator comes down into the merged node; for leaves
                // it simply disappears (leaf keys are the real data).
                left.keys.push(parent.keys[left_idx]);
                left.keys.extend(right.keys);
                left.children.extend(right.children);
                self.file.write_node(left_addr, &Node::Internal(left))?;
            }
            _ => {
                return Err(Error::CorruptNode {
                    addr: right_addr.0,
                    tag: 0,
                })
            }
        }

        self.file.release(right_addr)?;
        parent.keys.remove(left_idx);
        parent.children.remove(left_idx + 1);
        Ok(())
    }

    /// Verify the structural invariants of the whole tree.
    ///
    /// Checks key ordering and separation bounds, minimum occupancy, uniform
    /// leaf depth, and that the leaf chain yields every key in strictly
    /// ascending order.
    ///
    /// A debugging and test aid: structural violations panic with a
    /// description; `Err` is returned only for I/O failures.
    pub fn check_invariants(&mut self) -> Result<()> {
        let root = self.file.root();
        if root.is_nil() {
            return Ok(());
        }
        let min = self.min_keys();
        let cap = self.capacity();

        // (addr, depth, lower inclusive bound, upper exclusive bound)
        let mut stack: Vec<(NodeAddr, usize, Option<i32>, Option<i32>)> =
            vec![(root, 0, None, None)];
        let mut leaf_depth: Option<usize> = None;
        let mut leftmost_leaf: Option<NodeAddr> = None;
        let mut tree_key_count = 0usize;

        while let Some((addr, depth, lower, upper)) = stack.pop() {
            let node = self.file.read_node(addr)?;
            let keys = node.keys();

            assert!(keys.len() <= cap, "{} holds {} keys, capacity {}", addr, keys.len(), cap);
            if addr != root {
                assert!(
                    keys.len() >= min,
                    "{} under-full: {} keys, minimum {}",
                    addr,
                    keys.len(),
                    min
                );
            } else {
                assert!(!keys.is_empty(), "root {} has no keys", addr);
            }
            for pair in keys.windows(2) {
                assert!(pair[0] < pair[1], "{} keys not strictly increasing", addr);
            }
            if let Some(lo) = lower {
                assert!(keys[0] >= lo, "{} violates lower bound {}", addr, lo);
            }
            if let Some(hi) = upper {
                assert!(keys[keys.len() - 1] < hi, "{} violates upper bound {}", addr, hi);
            }

            match node {
                Node::Internal(internal) => {
                    assert_eq!(
                        internal.children.len(),
                        internal.keys.len() + 1,
                        "{} child count mismatch",
                        addr
                    );
                    for (i, &child) in internal.children.iter().enumerate() {
                        assert!(!child.is_nil(), "{} has a nil child", addr);
                        let lo = if i == 0 { lower } else { Some(internal.keys[i - 1]) };
                        let hi = if i == internal.keys.len() {
                            upper
                        } else {
                            Some(internal.keys[i])
                        };
                        stack.push((child, depth + 1, lo, hi));
                    }
                }
                Node::Leaf(leaf) => {
                    assert_eq!(leaf.keys.len(), leaf.rows.len(), "{} rows misaligned", addr);
                    tree_key_count += leaf.keys.len();
                    match leaf_depth {
                        None => leaf_depth = Some(depth),
                        Some(d) => assert_eq!(d, depth, "leaves at unequal depth"),
                    }
                    if lower.is_none() {
                        leftmost_leaf = Some(addr);
                    }
                }
            }
        }

        // Walk the chain: it must visit every key, strictly ascending.
        let mut chained = 0usize;
        let mut prev: Option<i32> = None;
        let mut cursor = leftmost_leaf.expect("non-empty tree has a leftmost leaf");
        loop {
            let leaf = self.read_leaf(cursor)?;
            for &k in &leaf.keys {
                if let Some(p) = prev {
                    assert!(p < k, "leaf chain out of order at key {}", k);
                }
                prev = Some(k);
                chained += 1;
            }
            if leaf.next.is_nil() {
                break;
            }
            cursor = leaf.next;
        }
        assert_eq!(chained, tree_key_count, "leaf chain misses keys");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Order-5 tree (block size 60): 4 keys per node, minimum 2.
    fn create_tree(name: &str) -> (BTree, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let tree = BTree::create(dir.path().join(name), 60).unwrap();
        (tree, dir)
    }

    fn row(n: u64) -> RowAddr {
        RowAddr::new(n)
    }

    #[test]
    fn test_empty_tree() {
        let (mut tree, _dir) = create_tree("t.idx");
        assert!(tree.is_empty());
        assert_eq!(tree.order(), 5);
        assert_eq!(tree.search(1).unwrap(), None);
        assert_eq!(tree.range_search(0, 100).unwrap(), vec![]);
        assert_eq!(tree.remove(1).unwrap(), None);
        assert_eq!(tree.height().unwrap(), 0);
    }

    #[test]
    fn test_single_insert_and_search() {
        let (mut tree, _dir) = create_tree("t.idx");
        assert!(tree.insert(7, row(100)).unwrap());
        assert_eq!(tree.search(7).unwrap(), Some(row(100)));
        assert_eq!(tree.search(8).unwrap(), None);
        assert_eq!(tree.height().unwrap(), 1);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let (mut tree, _dir) = create_tree("t.idx");
        assert!(tree.insert(7, row(100)).unwrap());
        assert!(!tree.insert(7, row(999)).unwrap());
        // Original mapping untouched.
        assert_eq!(tree.search(7).unwrap(), Some(row(100)));
    }

    #[test]
    fn test_leaf_split_grows_height() {
        let (mut tree, _dir) = create_tree("t.idx");
        // Order 5: a leaf holds 4 keys, the fifth insert splits it.
        for k in 1..=4 {
            assert!(tree.insert(k, row(k as u64 * 10)).unwrap());
        }
        assert_eq!(tree.height().unwrap(), 1);
        assert!(tree.insert(5, row(50)).unwrap());
        assert_eq!(tree.height().unwrap(), 2);

        for k in 1..=5 {
            assert_eq!(tree.search(k).unwrap(), Some(row(k as u64 * 10)));
        }
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_many_inserts_ascending_and_descending() {
        let (mut tree, _dir) = create_tree("t.idx");
        for k in 0..200 {
            assert!(tree.insert(k, row(1000 + k as u64)).unwrap());
        }
        for k in (-200..0).rev() {
            assert!(tree.insert(k, row(5000 + (-k) as u64)).unwrap());
        }
        tree.check_invariants().unwrap();
        for k in 0..200 {
            assert_eq!(tree.search(k).unwrap(), Some(row(1000 + k as u64)));
        }
        for k in -200..0 {
            assert_eq!(tree.search(k).unwrap(), Some(row(5000 + (-k) as u64)));
        }
        assert!(tree.height().unwrap() >= 3);
    }

    #[test]
    fn test_range_search_spans_leaves() {
        let (mut tree, _dir) = create_tree("t.idx");
        for k in (0..100).step_by(2) {
            tree.insert(k, row(k as u64 + 1)).unwrap();
        }
        // Bounds that fall between stored keys.
        let got = tree.range_search(11, 29).unwrap();
        let want: Vec<RowAddr> = (12..=28).step_by(2).map(|k| row(k as u64 + 1)).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_range_search_rejects_inverted_bounds() {
        let (mut tree, _dir) = create_tree("t.idx");
        tree.insert(1, row(10)).unwrap();
        match tree.range_search(5, 2) {
            Err(Error::InvalidRange { low: 5, high: 2 }) => {}
            other => panic!("expected InvalidRange, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_from_root_leaf() {
        let (mut tree, _dir) = create_tree("t.idx");
        tree.insert(1, row(10)).unwrap();
        tree.insert(2, row(20)).unwrap();

        assert_eq!(tree.remove(1).unwrap(), Some(row(10)));
        assert_eq!(tree.search(1).unwrap(), None);
        assert_eq!(tree.search(2).unwrap(), Some(row(20)));

        // Draining the root leaf empties the tree entirely.
        assert_eq!(tree.remove(2).unwrap(), Some(row(20)));
        assert!(tree.is_empty());
        assert_eq!(tree.height().unwrap(), 0);
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let (mut tree, _dir) = create_tree("t.idx");
        for k in 0..20 {
            tree.insert(k, row(k as u64 + 1)).unwrap();
        }
        assert_eq!(tree.remove(99).unwrap(), None);
        tree.check_invariants().unwrap();
        assert_eq!(tree.range_search(0, 19).unwrap().len(), 20);
    }

    #[test]
    fn test_remove_cascades_to_empty() {
        let (mut tree, _dir) = create_tree("t.idx");
        for k in 0..100 {
            tree.insert(k, row(k as u64 + 1)).unwrap();
        }
        for k in 0..100 {
            assert_eq!(tree.remove(k).unwrap(), Some(row(k as u64 + 1)), "key {}", k);
            tree.check_invariants().unwrap();
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_remove_interleaved_orders() {
        let (mut tree, _dir) = create_tree("t.idx");
        for k in 0..150 {
            tree.insert(k, row(k as u64 + 1)).unwrap();
        }
        // Evens from the front, odds from the back, exercising both borrow
        // directions and combines at several levels.
        for k in (0..150).step_by(2) {
            assert!(tree.remove(k).unwrap().is_some());
            tree.check_invariants().unwrap();
        }
        for k in (1..150).step_by(2).rev() {
            assert!(tree.remove(k).unwrap().is_some());
            tree.check_invariants().unwrap();
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_order_three_smallest_tree() {
        let dir = tempdir().unwrap();
        let mut tree = BTree::create(dir.path().join("t.idx"), 36).unwrap();
        assert_eq!(tree.order(), 3);

        for k in 0..50 {
            assert!(tree.insert(k, row(k as u64 + 1)).unwrap());
            tree.check_invariants().unwrap();
        }
        for k in 0..50 {
            assert_eq!(tree.remove(k).unwrap(), Some(row(k as u64 + 1)));
            tree.check_invariants().unwrap();
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_released_nodes_are_reused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.idx");

        let mut tree = BTree::create(&path, 60).unwrap();
        for k in 0..100 {
            tree.insert(k, row(k as u64 + 1)).unwrap();
        }
        for k in 0..100 {
            tree.remove(k).unwrap();
        }
        tree.close().unwrap();
        let len_drained = std::fs::metadata(&path).unwrap().len();

        // Every node slot is on the free list; rebuilding the same tree must
        // recycle them all instead of growing the file.
        let mut tree = BTree::open(&path).unwrap();
        for k in 0..100 {
            tree.insert(k, row(k as u64 + 1)).unwrap();
        }
        tree.check_invariants().unwrap();
        tree.close().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), len_drained);
    }
}
