//! Error types for rowstore.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in rowstore.
///
/// Logical rejections (duplicate key on insert, absent key on search or
/// remove) are *not* errors; they are reported through `bool`/`Option`
/// results and never mutate state. This enum covers I/O failures,
/// precondition violations and file-validation failures only.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    ///
    /// Fatal for the current call: with no transaction log there is no way
    /// to roll back a partially written split or merge.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Block size below [`MIN_BLOCK_SIZE`](crate::common::config::MIN_BLOCK_SIZE)
    /// or above [`MAX_BLOCK_SIZE`](crate::common::config::MAX_BLOCK_SIZE).
    #[error("block size {0} is out of range")]
    BlockSizeOutOfRange(u32),

    /// The block size stored in an index file does not match the one the
    /// caller asked for on reopen.
    ///
    /// Opening a tree with the wrong order would silently corrupt it, so
    /// this is checked up front.
    #[error("index file has block size {stored}, expected {expected}")]
    BlockSizeMismatch { stored: u32, expected: u32 },

    /// A node block holds an unknown tag byte.
    #[error("corrupt node at address {addr}: unknown tag {tag}")]
    CorruptNode { addr: u64, tag: u8 },

    /// Range search called with `low > high`.
    #[error("invalid key range: low {low} > high {high}")]
    InvalidRange { low: i32, high: i32 },

    /// A row was supplied with the wrong number of fields.
    #[error("expected {expected} fields, got {got}")]
    FieldCountMismatch { expected: usize, got: usize },

    /// A field value is longer than its declared fixed width.
    #[error("field {index} is {len} bytes, exceeds declared width {width}")]
    FieldTooLong {
        index: usize,
        len: usize,
        width: usize,
    },

    /// The table schema itself is unusable.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidRange { low: 9, high: 3 };
        assert_eq!(format!("{}", err), "invalid key range: low 9 > high 3");

        let err = Error::BlockSizeMismatch {
            stored: 60,
            expected: 48,
        };
        assert_eq!(
            format!("{}", err),
            "index file has block size 60, expected 48"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(err.source().is_some());
    }
}
