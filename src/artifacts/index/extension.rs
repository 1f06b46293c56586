//! Index extensions
//!
//! Extensions follow the entries section: a 4-byte signature, a big-endian
//! payload size, and the payload. The only typed extension here is `sdir`,
//! the sparse-directory marker. An unknown extension is tolerated and
//! round-tripped opaquely when its signature starts with an ASCII
//! uppercase letter (Git's "optional extension" convention); anything else
//! is a hard error.

use crate::errors::{GitError, Result};
use byteorder::WriteBytesExt;
use bytes::Bytes;

/// Signature of the sparse-directory marker extension.
pub const SPARSE_DIR_SIGNATURE: &[u8; 4] = b"sdir";

/// One extension block of the index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexExtension {
    /// `sdir`: the index contains sparse-directory entries. Empty payload.
    SparseDirectories,
    /// An optional extension this implementation does not interpret.
    Unknown { signature: [u8; 4], payload: Bytes },
}

impl IndexExtension {
    /// Interpret a raw `(signature, payload)` block.
    pub fn from_raw(signature: [u8; 4], payload: Bytes) -> Result<Self> {
        if &signature == SPARSE_DIR_SIGNATURE {
            if !payload.is_empty() {
                return Err(GitError::InvalidFormat(format!(
                    "sdir extension carries {} bytes of payload",
                    payload.len()
                )));
            }
            return Ok(IndexExtension::SparseDirectories);
        }

        if signature[0].is_ascii_uppercase() {
            return Ok(IndexExtension::Unknown { signature, payload });
        }

        Err(GitError::UnknownExtension(
            String::from_utf8_lossy(&signature).into_owned(),
        ))
    }

    pub fn signature(&self) -> [u8; 4] {
        match self {
            IndexExtension::SparseDirectories => *SPARSE_DIR_SIGNATURE,
            IndexExtension::Unknown { signature, .. } => *signature,
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            IndexExtension::SparseDirectories => &[],
            IndexExtension::Unknown { payload, .. } => payload,
        }
    }

    /// Serialize as signature + big-endian size + payload.
    pub fn serialize(&self) -> Result<Bytes> {
        let payload = self.payload();
        let mut bytes = Vec::with_capacity(8 + payload.len());
        bytes.extend_from_slice(&self.signature());
        bytes.write_u32::<byteorder::NetworkEndian>(payload.len() as u32)?;
        bytes.extend_from_slice(payload);

        Ok(Bytes::from(bytes))
    }
}
