//! Git object identifier (SHA-1 hash)
//!
//! Object identifiers are 20 raw bytes, presented to users as 40 lowercase
//! hexadecimal characters. They uniquely identify all objects in the
//! database (blobs, trees, commits, tags).
//!
//! ## Storage
//!
//! Objects are stored in `objects/<first-2-chars>/<remaining-38-chars>`.

use crate::artifacts::hash::{parse_hex, to_hex};
use crate::artifacts::objects::{OBJECT_ID_HEX_LENGTH, OBJECT_ID_RAW_LENGTH};
use crate::errors::{GitError, Result};
use std::io;
use std::path::PathBuf;

/// Fixed-width binary object identifier.
///
/// Two identifiers are equal exactly when their byte arrays are equal;
/// ordering is byte-lexicographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_RAW_LENGTH]);

impl ObjectId {
    /// Parse and validate an object identifier from its hex form.
    ///
    /// The input must be exactly 40 hex characters; case is tolerated on
    /// input, output is always lowercase.
    pub fn try_parse(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref();
        if id.len() != OBJECT_ID_HEX_LENGTH {
            return Err(GitError::InvalidHexLength {
                expected: OBJECT_ID_HEX_LENGTH,
                actual: id.len(),
            });
        }

        let mut raw = [0u8; OBJECT_ID_RAW_LENGTH];
        parse_hex(id, &mut raw)?;
        Ok(Self(raw))
    }

    /// Wrap a raw 20-byte digest.
    pub fn from_raw(raw: [u8; OBJECT_ID_RAW_LENGTH]) -> Self {
        Self(raw)
    }

    /// Wrap a digest slice, failing unless it is exactly 20 bytes.
    pub fn try_from_slice(raw: &[u8]) -> Result<Self> {
        let raw: [u8; OBJECT_ID_RAW_LENGTH] =
            raw.try_into().map_err(|_| GitError::InvalidBufferLength {
                expected: OBJECT_ID_RAW_LENGTH,
                actual: raw.len(),
            })?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_RAW_LENGTH] {
        &self.0
    }

    /// Write the identifier in binary form (20 bytes).
    ///
    /// Used when serializing tree entries and index entries.
    pub fn write_raw_to<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.0)?;
        Ok(())
    }

    /// Read an identifier from binary form (20 bytes).
    pub fn read_raw_from<R: io::Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; OBJECT_ID_RAW_LENGTH];
        reader
            .read_exact(&mut raw)
            .map_err(|_| GitError::UnexpectedEndOfFile)?;
        Ok(Self(raw))
    }

    /// Convert to the sharded file system path for object storage.
    ///
    /// Splits the hex form as `xx/yyyy…` where `xx` is the first 2 chars.
    pub fn to_path(&self) -> PathBuf {
        let hex = self.to_hex();
        let (dir, file) = hex.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// Render the identifier as 40 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
