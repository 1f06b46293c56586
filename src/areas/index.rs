//! The index (staging area) container
//!
//! The index file records the files staged for the next commit together
//! with cached stat metadata. On disk:
//!
//! - Header: `DIRC`, version, entry count
//! - Entries: sorted by path bytes, ties broken by merge stage
//! - Extensions: optional typed or opaque blocks
//! - Trailer: a checksum over everything preceding it
//!
//! Parsing verifies the trailer; writing recomputes it. A parse-then-write
//! round trip reproduces the input byte for byte.

use crate::artifacts::hash::Hasher;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::extension::IndexExtension;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{HEADER_SIZE, SUPPORTED_VERSIONS};
use crate::errors::{GitError, Result};
use byteorder::ByteOrder;
use bytes::Bytes;
use digest::Digest;
use sha1::Sha1;
use std::marker::PhantomData;

/// In-memory form of the index file.
///
/// Entries are kept in stored order, which callers maintain as ascending
/// `(path bytes, stage)`. The digest parameter fixes the trailer length;
/// SHA-1 matches Git's on-disk format.
#[derive(Debug, Clone)]
pub struct Index<D: Digest = Sha1> {
    version: u32,
    entries: Vec<IndexEntry>,
    extensions: Vec<IndexExtension>,
    _digest: PhantomData<D>,
}

impl<D: Digest> Index<D> {
    /// An empty index of the given version.
    pub fn new(version: u32) -> Result<Self> {
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(GitError::UnsupportedVersion(version));
        }

        Ok(Index {
            version,
            entries: Vec::new(),
            extensions: Vec::new(),
            _digest: PhantomData,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn extensions(&self) -> &[IndexExtension] {
        &self.extensions
    }

    /// True when an `sdir` extension marks sparse-directory contents.
    pub fn has_sparse_directories(&self) -> bool {
        self.extensions
            .iter()
            .any(|extension| matches!(extension, IndexExtension::SparseDirectories))
    }

    /// Parse a complete index file image.
    pub fn parse(data: &Bytes) -> Result<Self> {
        let digest_length = <D as Digest>::output_size();
        if data.len() < HEADER_SIZE + digest_length {
            return Err(GitError::UnexpectedEndOfFile);
        }
        let trailer_start = data.len() - digest_length;

        let header = IndexHeader::deserialize(&data[..HEADER_SIZE])?;
        let mut position = HEADER_SIZE;

        let mut entries = Vec::with_capacity(header.entry_count as usize);
        for _ in 0..header.entry_count {
            let (entry, consumed) =
                IndexEntry::parse(&data[position..trailer_start], header.version)?;
            position += consumed;
            entries.push(entry);
        }

        let mut extensions = Vec::new();
        while position < trailer_start {
            if trailer_start - position < 8 {
                return Err(GitError::InvalidFormat(
                    "truncated extension header before index trailer".into(),
                ));
            }

            let mut signature = [0u8; 4];
            signature.copy_from_slice(&data[position..position + 4]);
            let size =
                byteorder::NetworkEndian::read_u32(&data[position + 4..position + 8]) as usize;
            position += 8;

            if trailer_start - position < size {
                return Err(GitError::InvalidFormat(format!(
                    "extension {:?} overruns the index trailer",
                    String::from_utf8_lossy(&signature)
                )));
            }
            let payload = data.slice(position..position + size);
            position += size;

            extensions.push(IndexExtension::from_raw(signature, payload)?);
        }

        let actual = Hasher::<D>::hash_data(&data[..trailer_start]);
        if actual.as_slice() != &data[trailer_start..] {
            return Err(GitError::InvalidChecksum);
        }

        Ok(Index {
            version: header.version,
            entries,
            extensions,
            _digest: PhantomData,
        })
    }

    /// Serialize the index, recomputing the trailing checksum.
    pub fn write(&self) -> Result<Bytes> {
        let mut writer: Checksum<Vec<u8>, D> = Checksum::new(Vec::new());

        let header = IndexHeader::new(self.version, self.entries.len() as u32);
        writer.write(&header.serialize()?)?;

        for entry in &self.entries {
            writer.write(&entry.serialize(self.version)?)?;
        }

        for extension in &self.extensions {
            writer.write(&extension.serialize()?)?;
        }

        Ok(Bytes::from(writer.write_checksum()?))
    }

    /// Look up the stage-0 entry for a path.
    pub fn entry_by_path(&self, path: &[u8]) -> Option<&IndexEntry> {
        self.entries
            .iter()
            .find(|entry| entry.path.as_ref() == path)
    }

    /// True when any entry (any stage) tracks exactly this path.
    pub fn contains(&self, path: &[u8]) -> bool {
        self.entries
            .binary_search_by(|entry| entry.path.as_ref().cmp(path))
            .is_ok()
    }

    /// True when `path` is a directory prefix of some tracked entry.
    ///
    /// This is the "killed file" predicate: a file on disk at `path`
    /// blocks materialising the entries underneath it. With
    /// `tracked_only`, conflicted entries (stage != 0) are ignored.
    pub fn contains_prefix(&self, path: &[u8], tracked_only: bool) -> bool {
        let mut prefix = path.to_vec();
        prefix.push(b'/');

        let start = self
            .entries
            .partition_point(|entry| entry.path.as_ref() < prefix.as_slice());
        self.entries[start..]
            .iter()
            .take_while(|entry| entry.path.starts_with(&prefix))
            .any(|entry| !tracked_only || entry.stage.as_bits() == 0)
    }

    /// Insert or replace an entry, keeping the sort invariant.
    pub fn add(&mut self, entry: IndexEntry) {
        match self.entries.binary_search(&entry) {
            Ok(existing) => self.entries[existing] = entry,
            Err(slot) => self.entries.insert(slot, entry),
        }
    }

    /// Remove all stages of a path. Returns true when something went away.
    pub fn remove(&mut self, path: &[u8]) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.path.as_ref() != path);
        before != self.entries.len()
    }

    /// Attach an extension block.
    pub fn add_extension(&mut self, extension: IndexExtension) {
        self.extensions.push(extension);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::file_mode::FileMode;
    use crate::artifacts::objects::object_id::ObjectId;
    use crate::artifacts::index::index_entry::Stage;
    use byteorder::WriteBytesExt;
    use rstest::{fixture, rstest};

    fn entry(path: &[u8]) -> IndexEntry {
        IndexEntry::new(
            Bytes::copy_from_slice(path),
            ObjectId::from_raw([0x42; 20]),
            FileMode::Regular,
        )
    }

    #[fixture]
    fn sample_index() -> Index {
        let mut index = Index::new(2).unwrap();
        index.add(entry(b"README"));
        index.add(entry(b"src/lib.rs"));
        index.add(entry(b"src/main.rs"));
        index
    }

    /// The canonical single-entry sample: one `test.txt` entry with
    /// `assume_valid` set, written as index version 2.
    fn single_entry_image() -> Bytes {
        let mut entry = entry(b"test.txt");
        entry.oid = ObjectId::try_parse("0123456789abcdeffedcba98765432100f1e2d3c").unwrap();
        entry.file_size = 2;
        entry.assume_valid = true;

        let mut index = Index::<Sha1>::new(2).unwrap();
        index.add(entry);
        index.write().unwrap()
    }

    #[test]
    fn single_entry_sample_layout() {
        let image = single_entry_image();

        // 12 header + 72 entry + 20 trailer
        assert_eq!(image.len(), 104);
        let parsed = Index::<Sha1>::parse(&image).unwrap();
        assert_eq!(parsed.entries().len(), 1);

        let entry = &parsed.entries()[0];
        pretty_assertions::assert_eq!(entry.path.as_ref(), b"test.txt");
        assert_eq!(entry.file_size, 2);
        assert_eq!(entry.mode, FileMode::Regular);
        assert!(entry.assume_valid);
        pretty_assertions::assert_eq!(
            entry.oid.to_string(),
            "0123456789abcdeffedcba98765432100f1e2d3c"
        );

        pretty_assertions::assert_eq!(
            crate::artifacts::hash::to_hex(&image[84..]),
            "6352c0839c74a97089c08761e42b180d62a9dad6"
        );
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    fn write_parse_round_trip_is_byte_identical(#[case] version: u32) {
        let mut index = Index::<Sha1>::new(version).unwrap();
        index.add(entry(b"README"));
        index.add(entry(b"src/lib.rs"));
        let mut conflicted = entry(b"src/lib.rs");
        conflicted.stage = Stage::Theirs;
        index.add(conflicted);
        index.add_extension(IndexExtension::Unknown {
            signature: *b"TREE",
            payload: Bytes::from_static(b"\x01\x02"),
        });

        let image = index.write().unwrap();
        let reparsed = Index::<Sha1>::parse(&image).unwrap();

        pretty_assertions::assert_eq!(reparsed.write().unwrap(), image);
        assert_eq!(reparsed.version(), version);
        assert_eq!(reparsed.entries().len(), 3);
        assert_eq!(reparsed.extensions().len(), 1);
    }

    #[test]
    fn corrupted_trailer_is_rejected() {
        let image = single_entry_image();
        let mut corrupted = image.to_vec();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xff;

        assert!(matches!(
            Index::<Sha1>::parse(&Bytes::from(corrupted)).unwrap_err(),
            GitError::InvalidChecksum
        ));
    }

    #[test]
    fn flipped_content_byte_fails_the_checksum() {
        let image = single_entry_image();
        let mut corrupted = image.to_vec();
        corrupted[40] ^= 0x01;

        // stat fields are not structurally validated, so the damage only
        // shows up in the trailer comparison
        assert!(matches!(
            Index::<Sha1>::parse(&Bytes::from(corrupted)).unwrap_err(),
            GitError::InvalidChecksum
        ));
    }

    #[test]
    fn sdir_extension_marks_sparse_directories() {
        let mut index = Index::<Sha1>::new(3).unwrap();
        index.add_extension(IndexExtension::SparseDirectories);

        let image = index.write().unwrap();
        let reparsed = Index::<Sha1>::parse(&image).unwrap();

        assert!(reparsed.has_sparse_directories());
        pretty_assertions::assert_eq!(reparsed.write().unwrap(), image);
    }

    #[test]
    fn lowercase_extension_aborts_the_parse() {
        let mut image = Vec::new();
        image.extend_from_slice(&IndexHeader::new(2, 0).serialize().unwrap());
        image.extend_from_slice(b"link");
        image.write_u32::<byteorder::NetworkEndian>(0).unwrap();
        let digest = Hasher::<Sha1>::hash_data(&image);
        image.extend_from_slice(&digest);

        assert!(matches!(
            Index::<Sha1>::parse(&Bytes::from(image)).unwrap_err(),
            GitError::UnknownExtension(signature) if signature == "link"
        ));
    }

    #[test]
    fn extension_overrunning_the_trailer_is_rejected() {
        let mut image = Vec::new();
        image.extend_from_slice(&IndexHeader::new(2, 0).serialize().unwrap());
        image.extend_from_slice(b"TREE");
        image.write_u32::<byteorder::NetworkEndian>(1000).unwrap();
        let digest = Hasher::<Sha1>::hash_data(&image);
        image.extend_from_slice(&digest);

        assert!(matches!(
            Index::<Sha1>::parse(&Bytes::from(image)).unwrap_err(),
            GitError::InvalidFormat(_)
        ));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let image = single_entry_image();
        assert!(matches!(
            Index::<Sha1>::parse(&image.slice(..40)).unwrap_err(),
            GitError::UnexpectedEndOfFile
        ));
    }

    #[rstest]
    fn contains_matches_exact_paths_only(sample_index: Index) {
        assert!(sample_index.contains(b"src/lib.rs"));
        assert!(!sample_index.contains(b"src"));
        assert!(!sample_index.contains(b"src/lib"));
    }

    #[rstest]
    fn contains_prefix_finds_tracked_directories(sample_index: Index) {
        assert!(sample_index.contains_prefix(b"src", true));
        assert!(!sample_index.contains_prefix(b"README", true));
        assert!(!sample_index.contains_prefix(b"sr", true));
    }

    #[test]
    fn contains_prefix_honours_tracked_only() {
        let mut index = Index::<Sha1>::new(2).unwrap();
        let mut conflicted = entry(b"dir/file");
        conflicted.stage = Stage::Ours;
        index.add(conflicted);

        assert!(index.contains_prefix(b"dir", false));
        assert!(!index.contains_prefix(b"dir", true));
    }

    #[rstest]
    fn add_keeps_entries_sorted(sample_index: Index) {
        let mut index = sample_index;
        index.add(entry(b"a.txt"));
        index.add(entry(b"zebra"));

        let paths: Vec<&[u8]> = index.entries().iter().map(|e| e.path.as_ref()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        pretty_assertions::assert_eq!(paths, sorted);
    }

    #[rstest]
    fn add_replaces_same_path_and_stage(sample_index: Index) {
        let mut index = sample_index;
        let count = index.entries().len();

        let mut replacement = entry(b"README");
        replacement.file_size = 99;
        index.add(replacement);

        assert_eq!(index.entries().len(), count);
        assert_eq!(index.entry_by_path(b"README").unwrap().file_size, 99);
    }

    #[rstest]
    fn remove_drops_every_stage(sample_index: Index) {
        let mut index = sample_index;
        assert!(index.remove(b"src/lib.rs"));
        assert!(!index.remove(b"src/lib.rs"));
        assert!(!index.contains(b"src/lib.rs"));
    }
}
