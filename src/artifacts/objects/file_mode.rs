//! File modes for tree entries and index entries
//!
//! Tree entries carry the mode as octal text (`100644 name\0…`); index
//! entries carry it as a 16-bit value packing a 4-bit object type and a
//! 9-bit Unix permission. The obsolete group-writable mode `100664` decodes
//! as a regular file and is never written back.

use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{GitError, Result};

/// The modes a tree or index entry may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum FileMode {
    /// Directory (sub-tree), `040000`.
    Tree,
    /// Regular file, `100644`.
    #[default]
    Regular,
    /// Executable file, `100755`.
    Executable,
    /// Symbolic link, `120000`.
    Symlink,
    /// Git-link (submodule commit), `160000`.
    Submodule,
}

impl FileMode {
    /// The octal text written into tree entries.
    ///
    /// Trees serialize without a leading zero, matching the on-disk format.
    pub fn as_octal(&self) -> &'static str {
        match self {
            FileMode::Tree => "40000",
            FileMode::Regular => "100644",
            FileMode::Executable => "100755",
            FileMode::Symlink => "120000",
            FileMode::Submodule => "160000",
        }
    }

    /// Parse the octal text of a tree entry.
    pub fn from_octal(text: &[u8]) -> Result<Self> {
        match text {
            b"40000" | b"040000" => Ok(FileMode::Tree),
            b"100644" | b"100664" => Ok(FileMode::Regular),
            b"100755" => Ok(FileMode::Executable),
            b"120000" => Ok(FileMode::Symlink),
            b"160000" => Ok(FileMode::Submodule),
            _ => Err(GitError::InvalidFormat(format!(
                "invalid file mode {:?}",
                String::from_utf8_lossy(text)
            ))),
        }
    }

    /// The 16-bit index encoding: 4-bit type, 3 zero bits, 9-bit permission.
    pub fn as_index_bits(&self) -> u16 {
        match self {
            FileMode::Tree => 0o040000,
            FileMode::Regular => 0o100644,
            FileMode::Executable => 0o100755,
            FileMode::Symlink => 0o120000,
            FileMode::Submodule => 0o160000,
        }
    }

    /// Decode the 16-bit index encoding; unrecognised combinations fail.
    pub fn from_index_bits(bits: u16) -> Result<Self> {
        match bits {
            0o040000 => Ok(FileMode::Tree),
            0o100644 | 0o100664 => Ok(FileMode::Regular),
            0o100755 => Ok(FileMode::Executable),
            0o120000 => Ok(FileMode::Symlink),
            0o160000 => Ok(FileMode::Submodule),
            _ => Err(GitError::InvalidFormat(format!(
                "invalid file mode {bits:#o}"
            ))),
        }
    }

    /// The object type an entry with this mode references.
    pub fn object_type(&self) -> ObjectType {
        match self {
            FileMode::Tree => ObjectType::Tree,
            FileMode::Submodule => ObjectType::Commit,
            _ => ObjectType::Blob,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, FileMode::Tree)
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // zero-padded to six digits, the way listings print modes
        write!(f, "{:0>6}", self.as_octal())
    }
}
