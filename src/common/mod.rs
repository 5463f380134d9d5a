//! Common types and utilities shared across rowstore.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants
//! - Error types
//! - File-address newtypes (NodeAddr, RowAddr)

mod addr;
pub mod config;
pub mod error;

pub use addr::{NodeAddr, RowAddr};
pub use error::{Error, Result};
