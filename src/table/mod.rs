//! Table layer: fixed-width rows indexed by a B+Tree.
//!
//! A [`Table`] owns two files: the row file (given path) holding the
//! fixed-width records, and the index file (same path with `.idx` appended)
//! holding the B+Tree that maps each key to its row address. The tree is
//! consulted for every mutation and lookup; the table itself never scans.

pub mod schema;

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::{Error, Result, RowAddr};
use crate::index::BTree;
use crate::storage::FreeList;

pub use schema::Schema;

/// A disk-resident table of fixed-width rows with unique `i32` keys.
///
/// # File Layout (row file)
/// ```text
/// ┌───────────────────────────────────┬───────┬───────┬────────┐
/// │ Header                            │ Row 0 │ Row 1 │  ...   │
/// │ count │ widths... │ free head     │       │       │        │
/// └───────────────────────────────────┴───────┴───────┴────────┘
/// Offset: 0                           4+4n+8
/// ```
/// Rows are written once and never mutated; removing one pushes its slot
/// onto the row free list. Row addresses are absolute file offsets, always
/// past the header, so 0 doubles as the "no row" sentinel.
///
/// # Consistency
/// `insert` asks the tree first and writes the row only on success, so a
/// rejected duplicate key never leaves an orphaned row behind.
pub struct Table {
    rows: File,
    schema: Schema,
    free: FreeList,
    header_size: u64,
    tree: BTree,
}

impl Table {
    /// Create a new table, truncating any existing files at `path` and
    /// `path.idx`.
    ///
    /// # Errors
    /// Fails fast on an unusable schema or block size before creating
    /// either file.
    pub fn create<P: AsRef<Path>>(path: P, widths: &[u32], block_size: u32) -> Result<Self> {
        let schema = Schema::new(widths)?;
        let tree = BTree::create(index_path(path.as_ref()), block_size)?;

        let mut rows = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let mut header = Vec::with_capacity(12 + 4 * schema.field_count());
        header.extend_from_slice(&(schema.field_count() as u32).to_le_bytes());
        for &w in schema.widths() {
            header.extend_from_slice(&w.to_le_bytes());
        }
        header.extend_from_slice(&0u64.to_le_bytes()); // free-list head
        rows.write_all(&header)?;

        let header_size = header.len() as u64;
        Ok(Self {
            rows,
            free: FreeList::new(0, schema.row_size()),
            schema,
            header_size,
            tree,
        })
    }

    /// Open an existing table, reading the schema back from the row-file
    /// header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut rows = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())?;

        let mut count_buf = [0u8; 4];
        rows.seek(SeekFrom::Start(0))?;
        rows.read_exact(&mut count_buf)?;
        let count = u32::from_le_bytes(count_buf);
        if count == 0 || count > u16::MAX as u32 {
            return Err(Error::InvalidSchema(format!(
                "implausible field count {} in header",
                count
            )));
        }

        let mut widths = vec![0u32; count as usize];
        let mut w_buf = [0u8; 4];
        for w in &mut widths {
            rows.read_exact(&mut w_buf)?;
            *w = u32::from_le_bytes(w_buf);
        }
        let schema = Schema::new(&widths)?;

        let mut head_buf = [0u8; 8];
        rows.read_exact(&mut head_buf)?;
        let free_head = u64::from_le_bytes(head_buf);

        let tree = BTree::open(index_path(path.as_ref()))?;
        Ok(Self {
            rows,
            free: FreeList::new(free_head, schema.row_size()),
            header_size: 4 + 4 * count as u64 + 8,
            schema,
            tree,
        })
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Insert a row. Returns `false` when the key already exists; the row
    /// file is untouched in that case.
    ///
    /// # Errors
    /// Field-count and width violations fail fast before either file is
    /// touched.
    pub fn insert(&mut self, key: i32, fields: &[&str]) -> Result<bool> {
        self.schema.validate_fields(fields)?;

        // The address this row *would* occupy. Nothing is claimed until the
        // tree accepts the key.
        let candidate = self.free.peek(&self.rows)?;
        if !self.tree.insert(key, RowAddr::new(candidate))? {
            return Ok(false);
        }

        let addr = self.free.allocate(&mut self.rows)?;
        debug_assert_eq!(addr, candidate, "row landed at an unexpected address");

        let buf = self.schema.encode_row(key, fields);
        self.rows.seek(SeekFrom::Start(addr))?;
        self.rows.write_all(&buf)?;
        Ok(true)
    }

    /// Field values for `key`, with null padding trimmed, or `None`.
    pub fn search(&mut self, key: i32) -> Result<Option<Vec<String>>> {
        match self.tree.search(key)? {
            None => Ok(None),
            Some(addr) => {
                let (stored_key, fields) = self.read_row(addr)?;
                debug_assert_eq!(stored_key, key, "index points at the wrong row");
                Ok(Some(fields))
            }
        }
    }

    /// All rows with keys in `low..=high`, ascending by key.
    ///
    /// # Errors
    /// [`Error::InvalidRange`] when `low > high`.
    pub fn range_search(&mut self, low: i32, high: i32) -> Result<Vec<(i32, Vec<String>)>> {
        let addrs = self.tree.range_search(low, high)?;
        let mut out = Vec::with_capacity(addrs.len());
        for addr in addrs {
            out.push(self.read_row(addr)?);
        }
        Ok(out)
    }

    /// Remove the row for `key`. Returns `false` when no such row exists.
    ///
    /// The row's slot goes on the row free list for reuse; its bytes are not
    /// scrubbed.
    pub fn remove(&mut self, key: i32) -> Result<bool> {
        match self.tree.remove(key)? {
            None => Ok(false),
            Some(addr) => {
                self.free.release(&mut self.rows, addr.0)?;
                Ok(true)
            }
        }
    }

    /// Flush both file headers and close. The table must not be used
    /// afterwards.
    pub fn close(mut self) -> Result<()> {
        self.flush_row_header()?;
        self.rows.sync_all()?;
        self.tree.flush()
    }

    fn read_row(&mut self, addr: RowAddr) -> Result<(i32, Vec<String>)> {
        debug_assert!(addr.0 >= self.header_size, "row address inside header");
        let mut buf = vec![0u8; self.schema.row_size() as usize];
        self.rows.seek(SeekFrom::Start(addr.0))?;
        self.rows.read_exact(&mut buf)?;
        Ok(self.schema.decode_row(&buf))
    }

    /// Persist the row free-list head (the only mutable header field).
    fn flush_row_header(&mut self) -> Result<()> {
        let at = self.header_size - 8;
        self.rows.seek(SeekFrom::Start(at))?;
        self.rows.write_all(&self.free.head().to_le_bytes())?;
        Ok(())
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        // Best effort; close() is the supported path. The tree flushes its
        // own header on drop.
        let _ = self.flush_row_header();
    }
}

/// The index file lives next to the row file: `<path>.idx`.
fn index_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".idx");
    PathBuf::from(os)
}
