//! Fixed-width row schema and row codec.
//!
//! A row is one `i32` key followed by N character fields, each null-padded
//! to its declared byte width. Widths are fixed when the table is created
//! and persisted in the row-file header, so every row occupies exactly the
//! same number of bytes.

use crate::common::{Error, Result};

/// The fixed field layout of a table's rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    widths: Vec<u32>,
}

impl Schema {
    /// Build a schema from field widths, failing fast on an unusable layout.
    ///
    /// # Errors
    /// [`Error::InvalidSchema`] when there are no fields, any field has zero
    /// width, or the row is too small to hold an 8-byte free-list link once
    /// its slot is reclaimed (`4 + sum(widths) >= 8`).
    pub fn new(widths: &[u32]) -> Result<Self> {
        if widths.is_empty() {
            return Err(Error::InvalidSchema("a row needs at least one field".into()));
        }
        if let Some(i) = widths.iter().position(|&w| w == 0) {
            return Err(Error::InvalidSchema(format!("field {} has zero width", i)));
        }
        let total: u64 = widths.iter().map(|&w| w as u64).sum();
        if total < 4 {
            return Err(Error::InvalidSchema(
                "fields must total at least 4 bytes so freed rows can hold a free-list link"
                    .into(),
            ));
        }
        Ok(Self {
            widths: widths.to_vec(),
        })
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.widths.len()
    }

    #[inline]
    pub fn widths(&self) -> &[u32] {
        &self.widths
    }

    /// Bytes per row: a 4-byte key plus every field at full width.
    #[inline]
    pub fn row_size(&self) -> u64 {
        4 + self.widths.iter().map(|&w| w as u64).sum::<u64>()
    }

    /// Check a caller-supplied row against the schema, before any file I/O.
    pub fn validate_fields(&self, fields: &[&str]) -> Result<()> {
        if fields.len() != self.widths.len() {
            return Err(Error::FieldCountMismatch {
                expected: self.widths.len(),
                got: fields.len(),
            });
        }
        for (i, (field, &width)) in fields.iter().zip(&self.widths).enumerate() {
            if field.len() > width as usize {
                return Err(Error::FieldTooLong {
                    index: i,
                    len: field.len(),
                    width: width as usize,
                });
            }
        }
        Ok(())
    }

    /// Serialize a row. `fields` must already be validated.
    pub fn encode_row(&self, key: i32, fields: &[&str]) -> Vec<u8> {
        debug_assert!(self.validate_fields(fields).is_ok());
        let mut buf = Vec::with_capacity(self.row_size() as usize);
        buf.extend_from_slice(&key.to_le_bytes());
        for (field, &width) in fields.iter().zip(&self.widths) {
            buf.extend_from_slice(field.as_bytes());
            // Null-pad out to the declared width.
            buf.resize(buf.len() + width as usize - field.len(), 0);
        }
        debug_assert_eq!(buf.len() as u64, self.row_size());
        buf
    }

    /// Deserialize a row, trimming each field at its first NUL byte.
    pub fn decode_row(&self, buf: &[u8]) -> (i32, Vec<String>) {
        debug_assert_eq!(buf.len() as u64, self.row_size());
        let key = i32::from_le_bytes(buf[0..4].try_into().unwrap());

        let mut fields = Vec::with_capacity(self.widths.len());
        let mut at = 4usize;
        for &width in &self.widths {
            let raw = &buf[at..at + width as usize];
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            fields.push(String::from_utf8_lossy(&raw[..end]).into_owned());
            at += width as usize;
        }
        (key, fields)
    }
}
