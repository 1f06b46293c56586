//! Command implementations
//!
//! Only the plumbing surface exists here: low-level commands operating
//! directly on objects, the index and the repository layout.

pub mod plumbing;
