//! Loose-object frame codec
//!
//! Every object is persisted as `"<type> <decimal-length>\0<payload>"`,
//! zlib-compressed. The object identifier is the SHA-1 of this frame, not
//! of the payload alone, so the codec is the single place identifiers are
//! recomputed and verified.

use crate::artifacts::hash::Hasher;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{GitError, Result};
use bytes::Bytes;
use sha1::Sha1;

/// The type tag of a decoded frame.
///
/// Unknown tags only ever come out of the codec when the caller opted into
/// them; typed deserialization never sees one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Known(ObjectType),
    Unknown(String),
}

impl ObjectKind {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectKind::Known(object_type) => object_type.as_str(),
            ObjectKind::Unknown(tag) => tag,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What `decode` should check while taking the frame apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions<'a> {
    /// Require this type tag, failing with `TypeMismatch` otherwise.
    pub expected_type: Option<ObjectType>,
    /// Recompute the identifier over the whole frame and require equality.
    pub expected_id: Option<&'a ObjectId>,
    /// Keep unrecognised type tags instead of rejecting them.
    pub allow_unknown_type: bool,
}

/// A decoded frame: the payload slice plus what the header declared.
#[derive(Debug, Clone)]
pub struct LooseObject {
    pub kind: ObjectKind,
    pub size: usize,
    pub data: Bytes,
}

/// Build the encoded frame for a payload.
pub fn encode(type_name: &str, payload: &[u8]) -> Bytes {
    let mut encoded = Vec::with_capacity(type_name.len() + 16 + payload.len());
    encoded.extend_from_slice(type_name.as_bytes());
    encoded.push(b' ');
    encoded.extend_from_slice(payload.len().to_string().as_bytes());
    encoded.push(0);
    encoded.extend_from_slice(payload);

    Bytes::from(encoded)
}

/// Take a frame apart, verifying whatever the options request.
///
/// The payload is returned as a zero-copy slice of the input.
pub fn decode(encoded: &Bytes, options: &DecodeOptions) -> Result<LooseObject> {
    let nul = encoded
        .iter()
        .position(|&byte| byte == 0)
        .ok_or(GitError::MissingHeader)?;
    let space = encoded
        .iter()
        .position(|&byte| byte == b' ')
        .filter(|&space| space < nul)
        .ok_or(GitError::MalformedHeader)?;

    let data = encoded.slice(nul + 1..);

    if let Some(expected) = options.expected_id {
        let actual = ObjectId::try_from_slice(&Hasher::<Sha1>::hash_data(encoded))?;
        if actual != *expected {
            return Err(GitError::ObjectIdMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }

    let type_name =
        std::str::from_utf8(&encoded[..space]).map_err(|_| GitError::MalformedHeader)?;
    let kind = match ObjectType::from_name(type_name) {
        Some(object_type) => ObjectKind::Known(object_type),
        None if options.allow_unknown_type => ObjectKind::Unknown(type_name.to_string()),
        None => return Err(GitError::UnknownType(type_name.to_string())),
    };

    if let Some(expected) = options.expected_type {
        if kind != ObjectKind::Known(expected) {
            return Err(GitError::TypeMismatch {
                expected: expected.to_string(),
                actual: kind.to_string(),
            });
        }
    }

    let size = std::str::from_utf8(&encoded[space + 1..nul])
        .ok()
        .filter(|text| !text.is_empty())
        .and_then(|text| text.parse::<usize>().ok())
        .ok_or(GitError::BadLength)?;
    if size != data.len() {
        return Err(GitError::LengthMismatch {
            declared: size,
            actual: data.len(),
        });
    }

    Ok(LooseObject { kind, size, data })
}
