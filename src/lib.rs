//! Git plumbing: the content-addressed object database, the index binary
//! format, and the repository layout that ties them together.
//!
//! The crate deliberately stops at the plumbing line: no history
//! traversal, no refs beyond `HEAD` initialisation, no packfiles, no
//! transports. What it does cover is bit-exact with Git's on-disk
//! structures:
//!
//! - loose objects (`blob`, `tree`, `commit`, `tag`), their framing,
//!   identity and zlib storage
//! - the index file, versions 2 through 4, extensions included
//! - repository discovery, setup and the file-listing queries over the
//!   index and worktree

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;

pub use errors::{GitError, Result};
