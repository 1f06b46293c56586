//! Digest-accumulating writer for the index trailer
//!
//! The index file ends with a checksum over everything that precedes it.
//! Wrapping the output stream keeps the digest in lockstep with the bytes
//! actually written.

use crate::errors::Result;
use digest::Digest;
use sha1::Sha1;
use std::io::Write;

/// Writer wrapper that hashes every byte passing through it.
#[derive(Debug)]
pub struct Checksum<W, D: Digest = Sha1> {
    writer: W,
    digest: D,
}

impl<W: Write, D: Digest> Checksum<W, D> {
    pub fn new(writer: W) -> Self {
        Checksum {
            writer,
            digest: D::new(),
        }
    }

    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    /// Append the accumulated digest and return the inner writer.
    pub fn write_checksum(mut self) -> Result<W> {
        let checksum = self.digest.finalize();
        self.writer.write_all(&checksum)?;
        Ok(self.writer)
    }
}
