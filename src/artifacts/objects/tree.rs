//! Tree object: a directory snapshot
//!
//! Each entry is `"<octal-mode> <name>\0<20-byte-id>"`, concatenated with
//! no separators. Entries are kept in the modified lexicographic order Git
//! requires: a sub-tree compares as if its name ended in `/`, so `lib.rs`
//! sorts before the directory `lib`.

use crate::artifacts::objects::file_mode::FileMode;
use crate::artifacts::objects::object::{GitObject, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{GitError, Result};
use bytes::Bytes;
use std::cmp::Ordering;
use std::io::{BufRead, Write};

/// One row of a tree: mode, name and the referenced object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    mode: FileMode,
    name: Bytes,
    oid: ObjectId,
}

impl TreeEntry {
    /// Build an entry; the name must be non-empty and NUL-free.
    pub fn new(mode: FileMode, name: impl Into<Bytes>, oid: ObjectId) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains(&0) {
            return Err(GitError::InvalidFormat(format!(
                "invalid tree entry name {:?}",
                String::from_utf8_lossy(&name)
            )));
        }

        Ok(TreeEntry { mode, name, oid })
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn name(&self) -> &Bytes {
        &self.name
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    /// The byte key the sort order compares: the name, with `/` appended
    /// for sub-trees.
    fn effective_key(&self) -> Vec<u8> {
        let mut key = self.name.to_vec();
        if self.mode.is_tree() {
            key.push(b'/');
        }
        key
    }

    /// Git's tree ordering: effective keys byte-wise, equal keys broken by
    /// the shorter name first.
    pub fn order(a: &TreeEntry, b: &TreeEntry) -> Ordering {
        a.effective_key()
            .cmp(&b.effective_key())
            .then(a.name.len().cmp(&b.name.len()))
    }
}

/// Ordered list of tree entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(entries: Vec<TreeEntry>) -> Self {
        Tree { entries }
    }

    pub fn push(&mut self, entry: TreeEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// The entries in serialization order.
    fn sorted_entries(&self) -> Vec<&TreeEntry> {
        let mut sorted: Vec<&TreeEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| TreeEntry::order(a, b));
        sorted
    }
}

impl Packable for Tree {
    fn serialize(&self) -> Result<Bytes> {
        let mut tree_bytes = Vec::new();

        for entry in self.sorted_entries() {
            tree_bytes.write_all(entry.mode.as_octal().as_bytes())?;
            tree_bytes.push(b' ');
            tree_bytes.write_all(&entry.name)?;
            tree_bytes.push(0);
            entry.oid.write_raw_to(&mut tree_bytes)?;
        }

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> Result<Self> {
        let mut reader = reader;
        let mut entries = Vec::new();

        // scratch buffers reused across entries
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.last() != Some(&b' ') {
                return Err(GitError::UnexpectedEndOfFile);
            }
            mode_bytes.pop();
            let mode = FileMode::from_octal(&mode_bytes)?;

            name_bytes.clear();
            let n = reader.read_until(0, &mut name_bytes)?;
            if n == 0 || name_bytes.last() != Some(&0) {
                return Err(GitError::UnexpectedEndOfFile);
            }
            name_bytes.pop();

            let oid = ObjectId::read_raw_from(&mut reader)?;

            entries.push(TreeEntry::new(
                mode,
                Bytes::copy_from_slice(&name_bytes),
                oid,
            )?);
        }

        Ok(Tree { entries })
    }
}

impl GitObject for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> Result<Bytes> {
        let mut lines = Vec::new();

        for entry in self.sorted_entries() {
            lines.write_all(
                format!("{} {} {}\t", entry.mode, entry.mode.object_type(), entry.oid).as_bytes(),
            )?;
            lines.write_all(&entry.name)?;
            lines.push(b'\n');
        }

        Ok(Bytes::from(lines))
    }
}
