//! Data model: objects, index records, hashing, file listings
//!
//! - `hash`: streaming digests and hex conversion
//! - `objects`: the four object kinds, their codecs and value objects
//! - `index`: the staging-area binary format building blocks
//! - `listing`: tracked/untracked/modified file enumeration

pub mod hash;
pub mod index;
pub mod listing;
pub mod objects;
