//! Index-file manager: header, node I/O, and slot allocation.
//!
//! The [`NodeFile`] owns the index file exclusively for its lifetime and is
//! the only code that touches it. It knows the block size (and therefore the
//! tree order), tracks the root address, and recycles node slots through an
//! intrusive [`FreeList`].

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::{
    order_for_block_size, INDEX_HEADER_SIZE, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE,
};
use crate::common::{Error, NodeAddr, Result};
use crate::storage::freelist::FreeList;
use crate::storage::node::Node;

/// Manages the single file backing a B+Tree.
///
/// # File Layout
/// ```text
/// ┌──────────────────────┬─────────┬─────────┬─────────┐
/// │ Header (20 bytes)    │ Block   │ Block   │  ...    │
/// │ root │ free │ bsize  │         │         │         │
/// └──────────────────────┴─────────┴─────────┴─────────┘
/// Offset: 0              20        20+bsize  ...
/// ```
/// Each block holds one node record, addressed by absolute file offset.
/// Offset 0 always lands inside the header, so 0 doubles as the "no node"
/// sentinel.
///
/// # Durability
/// The header (root + free-list head) is rewritten on [`NodeFile::close`]
/// and best-effort on drop. There is no write-ahead log; a crash mid-split
/// can corrupt the tree, which is outside this crate's contract.
pub struct NodeFile {
    file: File,
    block_size: u32,
    order: usize,
    root: NodeAddr,
    free: FreeList,
    /// Reused block buffer. Decoded nodes are always independently owned,
    /// so reusing the raw buffer cannot alias two nodes.
    buf: Vec<u8>,
}

impl NodeFile {
    /// Create a new index file, truncating any existing file at `path`.
    ///
    /// # Errors
    /// Fails fast with [`Error::BlockSizeOutOfRange`] before touching the
    /// file when `block_size` cannot hold an order-3 node.
    pub fn create<P: AsRef<Path>>(path: P, block_size: u32) -> Result<Self> {
        validate_block_size(block_size)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let mut nf = Self {
            file,
            block_size,
            order: order_for_block_size(block_size),
            root: NodeAddr::NIL,
            free: FreeList::new(0, block_size as u64),
            buf: vec![0u8; block_size as usize],
        };
        nf.flush_header()?;
        Ok(nf)
    }

    /// Open an existing index file, recomputing the order from the stored
    /// block size.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or its header holds a
    /// block size outside the accepted range.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        let mut header = [0u8; INDEX_HEADER_SIZE as usize];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut header)?;

        let root = u64::from_le_bytes(header[0..8].try_into().unwrap());
        let free_head = u64::from_le_bytes(header[8..16].try_into().unwrap());
        let block_size = u32::from_le_bytes(header[16..20].try_into().unwrap());
        validate_block_size(block_size)?;

        Ok(Self {
            file,
            block_size,
            order: order_for_block_size(block_size),
            root: NodeAddr::new(root),
            free: FreeList::new(free_head, block_size as u64),
            buf: vec![0u8; block_size as usize],
        })
    }

    /// Open an existing index file and verify it was created with the given
    /// block size.
    ///
    /// Silently reopening with the wrong order would corrupt the structure,
    /// so a mismatch fails with [`Error::BlockSizeMismatch`] before any node
    /// is touched.
    pub fn open_expecting<P: AsRef<Path>>(path: P, block_size: u32) -> Result<Self> {
        let nf = Self::open(path)?;
        if nf.block_size != block_size {
            return Err(Error::BlockSizeMismatch {
                stored: nf.block_size,
                expected: block_size,
            });
        }
        Ok(nf)
    }

    /// Maximum number of children per internal node.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Current root address (nil = empty tree).
    #[inline]
    pub fn root(&self) -> NodeAddr {
        self.root
    }

    pub fn set_root(&mut self, root: NodeAddr) {
        self.root = root;
    }

    /// Read the node at `addr`.
    ///
    /// # Panics
    /// Panics in debug builds if `addr` is nil; callers check for nil before
    /// descending.
    pub fn read_node(&mut self, addr: NodeAddr) -> Result<Node> {
        debug_assert!(!addr.is_nil(), "read at nil address");
        self.file.seek(SeekFrom::Start(addr.0))?;
        self.file.read_exact(&mut self.buf)?;
        Node::decode(&self.buf, self.order, addr)
    }

    /// Write `node` at `addr`, rewriting the whole block.
    pub fn write_node(&mut self, addr: NodeAddr, node: &Node) -> Result<()> {
        debug_assert!(!addr.is_nil(), "write at nil address");
        node.encode(&mut self.buf, self.order);
        self.file.seek(SeekFrom::Start(addr.0))?;
        self.file.write_all(&self.buf)?;
        Ok(())
    }

    /// Claim a block for a new node: recycled from the free list when
    /// possible, otherwise a fresh zeroed block at the end of the file.
    pub fn allocate(&mut self) -> Result<NodeAddr> {
        Ok(NodeAddr::new(self.free.allocate(&mut self.file)?))
    }

    /// Return the block at `addr` to the free list.
    pub fn release(&mut self, addr: NodeAddr) -> Result<()> {
        self.free.release(&mut self.file, addr.0)
    }

    /// Persist root address, free-list head and block size.
    pub fn flush_header(&mut self) -> Result<()> {
        let mut header = [0u8; INDEX_HEADER_SIZE as usize];
        header[0..8].copy_from_slice(&self.root.0.to_le_bytes());
        header[8..16].copy_from_slice(&self.free.head().to_le_bytes());
        header[16..20].copy_from_slice(&self.block_size.to_le_bytes());
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header)?;
        Ok(())
    }

    /// Flush the header and sync file contents to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_header()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Flush the header and sync the file. The `NodeFile` must not be used
    /// afterwards.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }
}

impl Drop for NodeFile {
    fn drop(&mut self) {
        // An early drop should not silently lose the root; errors here have
        // nowhere to go, so they are ignored. close() is the supported path.
        let _ = self.flush_header();
    }
}

fn validate_block_size(block_size: u32) -> Result<()> {
    if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
        return Err(Error::BlockSizeOutOfRange(block_size));
    }
    Ok(())
}
