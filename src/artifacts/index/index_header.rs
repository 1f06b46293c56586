use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, SUPPORTED_VERSIONS};
use crate::errors::{GitError, Result};
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;

/// The 12-byte index header: signature, version and entry count.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexHeader {
    pub version: u32,
    pub entry_count: u32,
}

impl IndexHeader {
    pub fn serialize(&self) -> Result<Bytes> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.extend_from_slice(SIGNATURE);
        bytes.write_u32::<byteorder::NetworkEndian>(self.version)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.entry_count)?;

        Ok(Bytes::from(bytes))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(GitError::UnexpectedEndOfFile);
        }

        if &bytes[0..4] != SIGNATURE {
            return Err(GitError::InvalidSignature(
                String::from_utf8_lossy(&bytes[0..4]).into_owned(),
            ));
        }

        let version = byteorder::NetworkEndian::read_u32(&bytes[4..8]);
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(GitError::UnsupportedVersion(version));
        }

        let entry_count = byteorder::NetworkEndian::read_u32(&bytes[8..12]);

        Ok(IndexHeader {
            version,
            entry_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn round_trip() {
        let header = IndexHeader::new(2, 7);
        let bytes = header.serialize().unwrap();

        pretty_assertions::assert_eq!(bytes.as_ref(), b"DIRC\x00\x00\x00\x02\x00\x00\x00\x07");
        pretty_assertions::assert_eq!(IndexHeader::deserialize(&bytes).unwrap(), header);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        assert!(matches!(
            IndexHeader::deserialize(b"LINK\x00\x00\x00\x02\x00\x00\x00\x00").unwrap_err(),
            GitError::InvalidSignature(signature) if signature == "LINK"
        ));
    }

    #[rstest]
    #[case(1)]
    #[case(5)]
    #[case(0)]
    fn out_of_range_versions_are_rejected(#[case] version: u32) {
        let bytes = IndexHeader::new(version, 0).serialize().unwrap();
        assert!(matches!(
            IndexHeader::deserialize(&bytes).unwrap_err(),
            GitError::UnsupportedVersion(v) if v == version
        ));
    }

    #[test]
    fn truncated_header_is_rejected() {
        assert!(matches!(
            IndexHeader::deserialize(b"DIRC\x00\x00").unwrap_err(),
            GitError::UnexpectedEndOfFile
        ));
    }
}
