//! Error types for the plumbing library
//!
//! Every failure is surfaced to the caller as a [`GitError`]; the library
//! recovers nothing on its own. The CLI layer maps these to user-facing
//! diagnostics, library callers match on them structurally.

/// Result alias used throughout the library core.
pub type Result<T> = std::result::Result<T, GitError>;

/// Errors produced by object, index and repository operations.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    // ---- format errors ----
    #[error("invalid hex length: expected {expected} characters, got {actual}")]
    InvalidHexLength { expected: usize, actual: usize },

    #[error("invalid hex character {character:?} at offset {offset}")]
    InvalidHexCharacter { character: char, offset: usize },

    #[error("invalid buffer length: expected {expected} bytes, got {actual}")]
    InvalidBufferLength { expected: usize, actual: usize },

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("invalid index signature: {0:?}")]
    InvalidSignature(String),

    #[error("unsupported index version: {0}")]
    UnsupportedVersion(u32),

    #[error("index checksum does not match value stored on disk")]
    InvalidChecksum,

    #[error("invalid commit: {0}")]
    InvalidCommitFormat(String),

    #[error("invalid tag: {0}")]
    InvalidTagFormat(String),

    #[error("missing NUL separator in object header")]
    MissingHeader,

    #[error("malformed object header")]
    MalformedHeader,

    #[error("unexpected end of file")]
    UnexpectedEndOfFile,

    #[error("invalid length field in object header")]
    BadLength,

    #[error("object length mismatch: header declares {declared} bytes, payload has {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    // ---- semantic errors ----
    #[error("invalid object type {0:?}")]
    InvalidType(String),

    #[error("unknown object type {0:?}")]
    UnknownType(String),

    #[error("unknown index extension {0:?}")]
    UnknownExtension(String),

    #[error("object type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("object id mismatch: expected {expected}, computed {actual}")]
    ObjectIdMismatch { expected: String, actual: String },

    #[error("invalid object: {0}")]
    InvalidObject(String),

    // ---- resource errors ----
    #[error("not a git repository (or any of the parent directories)")]
    GitDirNotFound,

    #[error("this operation must be run in a work tree")]
    MissingWorktree,

    #[error("environment variable {0} is set but empty")]
    EmptyValue(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
