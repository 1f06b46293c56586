//! Commit object
//!
//! A commit snapshots a tree together with its ancestry and authorship:
//!
//! ```text
//! tree <tree-sha>
//! parent <parent-sha>       (zero or more)
//! author <signature>
//! committer <signature>
//!
//! <message>
//! ```
//!
//! `gpgsig` headers (and their space-prefixed continuation lines) are
//! skipped on parse, as are headers this implementation does not know.

use crate::artifacts::objects::object::{GitObject, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use crate::errors::{GitError, Result};
use bytes::Bytes;
use std::io::{BufRead, Write};

/// A snapshot of the repository with metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    tree_oid: ObjectId,
    parents: Vec<ObjectId>,
    author: Signature,
    committer: Signature,
    message: Bytes,
}

impl Commit {
    pub fn new(
        tree_oid: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        committer: Signature,
        message: impl Into<Bytes>,
    ) -> Self {
        Commit {
            tree_oid,
            parents,
            author,
            committer,
            message: message.into(),
        }
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    /// Parent commits in recorded order; empty for a root commit.
    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    pub fn message(&self) -> &Bytes {
        &self.message
    }
}

impl Packable for Commit {
    fn serialize(&self) -> Result<Bytes> {
        let mut content = Vec::new();

        writeln!(content, "tree {}", self.tree_oid)?;
        for parent in &self.parents {
            writeln!(content, "parent {parent}")?;
        }
        writeln!(content, "author {}", self.author)?;
        writeln!(content, "committer {}", self.committer)?;
        writeln!(content)?;
        content.write_all(&self.message)?;

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> Result<Self> {
        let content = reader
            .bytes()
            .collect::<std::result::Result<Vec<u8>, std::io::Error>>()?;

        let (headers, message) = split_headers(&content);
        let headers = std::str::from_utf8(headers)
            .map_err(|_| GitError::InvalidCommitFormat("headers are not valid UTF-8".into()))?;

        let mut tree_oid = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            if line.starts_with(' ') {
                continue; // continuation of a multi-line header such as gpgsig
            }

            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            match key {
                "tree" => {
                    tree_oid = Some(ObjectId::try_parse(value).map_err(|_| {
                        GitError::InvalidCommitFormat(format!("invalid 'tree' header {value:?}"))
                    })?)
                }
                "parent" => parents.push(ObjectId::try_parse(value).map_err(|_| {
                    GitError::InvalidCommitFormat(format!("invalid 'parent' header {value:?}"))
                })?),
                "author" => {
                    author = Some(Signature::parse(value).map_err(|_| {
                        GitError::InvalidCommitFormat("malformed 'author' header".into())
                    })?)
                }
                "committer" => {
                    committer = Some(Signature::parse(value).map_err(|_| {
                        GitError::InvalidCommitFormat("malformed 'committer' header".into())
                    })?)
                }
                // gpgsig and anything unrecognised
                _ => {}
            }
        }

        Ok(Commit {
            tree_oid: tree_oid
                .ok_or_else(|| GitError::InvalidCommitFormat("missing 'tree' header".into()))?,
            parents,
            author: author
                .ok_or_else(|| GitError::InvalidCommitFormat("missing 'author' header".into()))?,
            committer: committer.ok_or_else(|| {
                GitError::InvalidCommitFormat("missing 'committer' header".into())
            })?,
            message,
        })
    }
}

impl GitObject for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> Result<Bytes> {
        self.serialize()
    }
}

/// Split at the first empty line: headers before it, message verbatim
/// after it. Without a blank line the whole content is headers.
fn split_headers(content: &[u8]) -> (&[u8], Bytes) {
    match content.windows(2).position(|window| window == b"\n\n") {
        Some(position) => (
            &content[..position + 1],
            Bytes::copy_from_slice(&content[position + 2..]),
        ),
        None => (content, Bytes::new()),
    }
}
