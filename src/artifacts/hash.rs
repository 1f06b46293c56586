//! Streaming hashing and hex conversion
//!
//! All on-disk formats are pinned to SHA-1, but the hasher is generic over
//! the digest so SHA-256 repositories only need a different type parameter.

use crate::errors::{GitError, Result};
use digest::Digest;
use sha1::Sha1;

/// Streaming hasher over a pluggable digest algorithm.
///
/// The default instantiation is SHA-1, which every Git on-disk structure
/// in this crate uses.
#[derive(Debug, Clone)]
pub struct Hasher<D: Digest = Sha1> {
    digest: D,
}

impl<D: Digest> Hasher<D> {
    pub fn new() -> Self {
        Hasher { digest: D::new() }
    }

    /// Feed more input into the running digest.
    pub fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    /// Consume the hasher and return the finished digest bytes.
    pub fn finalize(self) -> Vec<u8> {
        self.digest.finalize().to_vec()
    }

    /// Number of bytes the finished digest occupies (20 for SHA-1).
    pub fn digest_length() -> usize {
        <D as digest::Digest>::output_size()
    }

    /// One-shot convenience over `new` + `update` + `finalize`.
    pub fn hash_data(data: &[u8]) -> Vec<u8> {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

impl<D: Digest> Default for Hasher<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a digest as lowercase hex, two characters per byte.
pub fn to_hex(digest: &[u8]) -> String {
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// Parse a hex string into `out`, which must be exactly half its length.
///
/// On any failure the output buffer is zero-filled before returning, so a
/// caller never observes a half-written digest.
pub fn parse_hex(hex: &str, out: &mut [u8]) -> Result<()> {
    if hex.len() != out.len() * 2 {
        out.fill(0);
        return Err(GitError::InvalidBufferLength {
            expected: out.len() * 2,
            actual: hex.len(),
        });
    }

    if let Some((offset, character)) = hex.chars().enumerate().find(|(_, c)| !c.is_ascii_hexdigit())
    {
        out.fill(0);
        return Err(GitError::InvalidHexCharacter { character, offset });
    }

    for (index, byte) in out.iter_mut().enumerate() {
        // the pair is pre-validated, so the radix parse cannot fail
        *byte = u8::from_str_radix(&hex[index * 2..index * 2 + 2], 16).unwrap_or(0);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use sha2::Sha256;

    #[rstest]
    fn hex_round_trips_through_hash(
        #[values(b"".as_slice(), b"abc", b"sample content\n")] data: &[u8],
    ) {
        let digest = Hasher::<Sha1>::hash_data(data);
        let hex = to_hex(&digest);

        let mut parsed = [0u8; 20];
        parse_hex(&hex, &mut parsed).unwrap();
        pretty_assertions::assert_eq!(parsed.as_slice(), digest.as_slice());
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut hasher = Hasher::<Sha1>::new();
        hasher.update(b"sample ");
        hasher.update(b"content\n");

        pretty_assertions::assert_eq!(
            hasher.finalize(),
            Hasher::<Sha1>::hash_data(b"sample content\n")
        );
    }

    #[test]
    fn sha256_digest_length() {
        assert_eq!(Hasher::<Sha256>::digest_length(), 32);
        assert_eq!(Hasher::<Sha256>::hash_data(b"x").len(), 32);
    }

    #[test]
    fn parse_hex_rejects_wrong_length() {
        let mut out = [0xffu8; 20];
        let err = parse_hex("abc", &mut out).unwrap_err();

        assert!(matches!(
            err,
            GitError::InvalidBufferLength {
                expected: 40,
                actual: 3
            }
        ));
        assert_eq!(out, [0u8; 20]);
    }

    #[test]
    fn parse_hex_rejects_bad_character_and_zero_fills() {
        let mut out = [0xffu8; 2];
        let err = parse_hex("abzd", &mut out).unwrap_err();

        assert!(matches!(
            err,
            GitError::InvalidHexCharacter {
                character: 'z',
                offset: 2
            }
        ));
        assert_eq!(out, [0u8; 2]);
    }

    #[test]
    fn parse_hex_accepts_uppercase() {
        let mut out = [0u8; 2];
        parse_hex("ABCD", &mut out).unwrap();
        assert_eq!(out, [0xab, 0xcd]);
    }
}
