//! rowstore - an embedded row store indexed by a disk-resident B+Tree.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                        rowstore                         │
//! ├─────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────┐   │
//! │  │            Table Layer (table/)                  │   │
//! │  │   Schema + fixed-width rows + row free list      │   │
//! │  └─────────────────────────────────────────────────┘   │
//! │                         ↓                               │
//! │  ┌─────────────────────────────────────────────────┐   │
//! │  │          B+Tree Engine (index/btree/)            │   │
//! │  │  search │ range via leaf chain │ split │ merge   │   │
//! │  └─────────────────────────────────────────────────┘   │
//! │                         ↓                               │
//! │  ┌─────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)               │   │
//! │  │    NodeFile + Node codec + intrusive FreeList    │   │
//! │  └─────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The table maps unique `i32` keys to fixed-width rows. Every mutation and
//! lookup goes through the B+Tree, which stores one row address per key in
//! variable-occupancy fixed-size nodes inside a single index file. Leaves
//! are chained in key order for range scans; reclaimed node and row slots
//! are recycled through intrusive in-file free lists.
//!
//! # Modules
//! - [`common`] - Shared primitives (addresses, Error, config)
//! - [`storage`] - Node codec, free list, index-file management
//! - [`index`] - The B+Tree engine
//! - [`table`] - Row storage keyed through the tree
//!
//! # Concurrency
//! Single-threaded, synchronous, blocking I/O throughout. A tree or table
//! exclusively owns its backing files; callers must serialize access and
//! must never open the same file through two instances at once.
//!
//! # Quick Start
//! ```no_run
//! use rowstore::Table;
//!
//! // Two fields: 10 and 20 bytes wide; block size 60 gives an order-5 tree.
//! let mut table = Table::create("people.db", &[10, 20], 60).unwrap();
//! table.insert(1, &["alice", "engineering"]).unwrap();
//! assert!(table.search(1).unwrap().is_some());
//! table.close().unwrap();
//! ```

pub mod common;
pub mod index;
pub mod storage;
pub mod table;

// Re-export commonly used items at crate root for convenience
pub use common::{Error, NodeAddr, Result, RowAddr};
pub use index::BTree;
pub use table::{Schema, Table};
