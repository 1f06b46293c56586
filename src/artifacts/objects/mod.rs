//! Object types and their codecs
//!
//! - `blob`, `tree`, `commit`, `tag`: the four object kinds
//! - `object`: the shared traits and the sum type over the kinds
//! - `loose`: the `"<type> <len>\0<payload>"` frame codec
//! - `object_id`, `object_type`, `file_mode`, `signature`: value objects

pub mod blob;
pub mod commit;
pub mod file_mode;
pub mod loose;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod signature;
pub mod tag;
pub mod tree;

/// Raw length of an object identifier in bytes (SHA-1).
pub const OBJECT_ID_RAW_LENGTH: usize = 20;

/// Length of an object identifier in hex characters.
pub const OBJECT_ID_HEX_LENGTH: usize = OBJECT_ID_RAW_LENGTH * 2;
