use crate::errors::{GitError, Result};

/// The four kinds of objects the database stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Commit,
    Tag,
    Tree,
}

impl ObjectType {
    /// The textual tag used in loose-object headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Commit => "commit",
            ObjectType::Tag => "tag",
            ObjectType::Tree => "tree",
        }
    }

    /// Look up a type from its textual tag; tags must match exactly.
    pub fn from_name(name: &str) -> Option<ObjectType> {
        match name {
            "blob" => Some(ObjectType::Blob),
            "commit" => Some(ObjectType::Commit),
            "tag" => Some(ObjectType::Tag),
            "tree" => Some(ObjectType::Tree),
            _ => None,
        }
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = GitError;

    fn try_from(value: &str) -> Result<Self> {
        Self::from_name(value).ok_or_else(|| GitError::InvalidType(value.to_string()))
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
