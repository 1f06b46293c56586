//! Annotated tag object
//!
//! A tag names another object and records who tagged it:
//!
//! ```text
//! object <sha>
//! type <object-type>
//! tag <name>
//! tagger <signature>
//!
//! <message>
//! ```
//!
//! All four headers are required.

use crate::artifacts::objects::object::{GitObject, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use crate::errors::{GitError, Result};
use bytes::Bytes;
use std::io::{BufRead, Write};

/// A named, signed pointer to another object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    object_id: ObjectId,
    object_type: ObjectType,
    name: Bytes,
    tagger: Signature,
    message: Bytes,
}

impl Tag {
    pub fn new(
        object_id: ObjectId,
        object_type: ObjectType,
        name: impl Into<Bytes>,
        tagger: Signature,
        message: impl Into<Bytes>,
    ) -> Self {
        Tag {
            object_id,
            object_type,
            name: name.into(),
            tagger,
            message: message.into(),
        }
    }

    /// The tagged object.
    pub fn target(&self) -> &ObjectId {
        &self.object_id
    }

    /// The type of the tagged object.
    pub fn target_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn name(&self) -> &Bytes {
        &self.name
    }

    pub fn tagger(&self) -> &Signature {
        &self.tagger
    }

    pub fn message(&self) -> &Bytes {
        &self.message
    }
}

impl Packable for Tag {
    fn serialize(&self) -> Result<Bytes> {
        let mut content = Vec::new();

        writeln!(content, "object {}", self.object_id)?;
        writeln!(content, "type {}", self.object_type)?;
        content.write_all(b"tag ")?;
        content.write_all(&self.name)?;
        writeln!(content)?;
        writeln!(content, "tagger {}", self.tagger)?;
        writeln!(content)?;
        content.write_all(&self.message)?;

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Tag {
    fn deserialize(reader: impl BufRead) -> Result<Self> {
        let content = reader
            .bytes()
            .collect::<std::result::Result<Vec<u8>, std::io::Error>>()?;

        let (headers, message) = match content.windows(2).position(|window| window == b"\n\n") {
            Some(position) => (
                &content[..position + 1],
                Bytes::copy_from_slice(&content[position + 2..]),
            ),
            None => (&content[..], Bytes::new()),
        };
        let headers = std::str::from_utf8(headers)
            .map_err(|_| GitError::InvalidTagFormat("headers are not valid UTF-8".into()))?;

        let mut object_id = None;
        let mut object_type = None;
        let mut name = None;
        let mut tagger = None;

        for line in headers.lines() {
            if line.starts_with(' ') {
                continue;
            }

            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            match key {
                "object" => {
                    object_id = Some(ObjectId::try_parse(value).map_err(|_| {
                        GitError::InvalidTagFormat(format!("invalid 'object' header {value:?}"))
                    })?)
                }
                "type" => {
                    object_type = Some(ObjectType::from_name(value).ok_or_else(|| {
                        GitError::InvalidTagFormat(format!("invalid 'type' header {value:?}"))
                    })?)
                }
                "tag" => name = Some(Bytes::copy_from_slice(value.as_bytes())),
                "tagger" => {
                    tagger = Some(Signature::parse(value).map_err(|_| {
                        GitError::InvalidTagFormat("malformed 'tagger' header".into())
                    })?)
                }
                _ => {}
            }
        }

        Ok(Tag {
            object_id: object_id
                .ok_or_else(|| GitError::InvalidTagFormat("missing 'object' header".into()))?,
            object_type: object_type
                .ok_or_else(|| GitError::InvalidTagFormat("missing 'type' header".into()))?,
            name: name.ok_or_else(|| GitError::InvalidTagFormat("missing 'tag' header".into()))?,
            tagger: tagger
                .ok_or_else(|| GitError::InvalidTagFormat("missing 'tagger' header".into()))?,
            message,
        })
    }
}

impl GitObject for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn display(&self) -> Result<Bytes> {
        self.serialize()
    }
}
