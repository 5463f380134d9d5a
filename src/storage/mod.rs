//! On-disk storage: node codec, slot allocation, and index-file management.

pub mod freelist;
pub mod node;
pub mod node_file;

pub use freelist::FreeList;
pub use node::{InternalNode, LeafNode, Node};
pub use node_file::NodeFile;
