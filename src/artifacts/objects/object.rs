//! Core object traits and the object sum type
//!
//! All four object kinds implement:
//! - `Packable`: serialization to the canonical payload bytes
//! - `Unpackable`: deserialization from payload bytes
//! - `GitObject`: common operations (type tag, encoded frame, identifier)
//!
//! ## On-disk pipeline
//!
//! ```text
//! serialize() -> "<type> <len>\0<payload>" -> SHA-1 = id -> zlib -> objects/xx/yy…
//! ```

use crate::artifacts::hash::Hasher;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::loose;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::errors::Result;
use bytes::Bytes;
use sha1::Sha1;
use std::io::BufRead;

/// Serialization to the canonical payload bytes (no header framing).
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

/// Deserialization from payload bytes (header already stripped).
pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

/// Operations shared by every object kind.
pub trait GitObject: Packable {
    /// The object's type tag.
    fn object_type(&self) -> ObjectType;

    /// A human-readable rendering, used by pretty printing.
    fn display(&self) -> Result<Bytes>;

    /// The encoded loose-object frame: `"<type> <len>\0<payload>"`.
    fn encode(&self) -> Result<Bytes> {
        Ok(loose::encode(
            self.object_type().as_str(),
            &self.serialize()?,
        ))
    }

    /// Compute the object identifier.
    ///
    /// The identifier is the SHA-1 of the encoded frame, not of the
    /// payload alone.
    fn object_id(&self) -> Result<ObjectId> {
        let encoded = self.encode()?;
        ObjectId::try_from_slice(&Hasher::<Sha1>::hash_data(&encoded))
    }
}

/// Tagged union over the four object kinds.
///
/// Owns the variant payload; used when the concrete type is only known at
/// run time (reading from the database, CLI dispatch).
#[derive(Debug, Clone)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    /// Deserialize payload bytes through the parser for `object_type`.
    pub fn deserialize(object_type: ObjectType, reader: impl BufRead) -> Result<Self> {
        match object_type {
            ObjectType::Blob => Ok(Object::Blob(Blob::deserialize(reader)?)),
            ObjectType::Tree => Ok(Object::Tree(Tree::deserialize(reader)?)),
            ObjectType::Commit => Ok(Object::Commit(Commit::deserialize(reader)?)),
            ObjectType::Tag => Ok(Object::Tag(Tag::deserialize(reader)?)),
        }
    }
}

impl Packable for Object {
    fn serialize(&self) -> Result<Bytes> {
        match self {
            Object::Blob(blob) => blob.serialize(),
            Object::Tree(tree) => tree.serialize(),
            Object::Commit(commit) => commit.serialize(),
            Object::Tag(tag) => tag.serialize(),
        }
    }
}

impl GitObject for Object {
    fn object_type(&self) -> ObjectType {
        match self {
            Object::Blob(_) => ObjectType::Blob,
            Object::Tree(_) => ObjectType::Tree,
            Object::Commit(_) => ObjectType::Commit,
            Object::Tag(_) => ObjectType::Tag,
        }
    }

    fn display(&self) -> Result<Bytes> {
        match self {
            Object::Blob(blob) => blob.display(),
            Object::Tree(tree) => tree.display(),
            Object::Commit(commit) => commit.display(),
            Object::Tag(tag) => tag.display(),
        }
    }
}
