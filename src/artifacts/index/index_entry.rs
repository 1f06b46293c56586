//! Index entry representation
//!
//! Each entry records one tracked file: its path, content hash, and the
//! cached stat metadata that makes change detection cheap. The on-disk
//! layout is bit-exact with Git's index versions 2, 3 and 4:
//!
//! - a 62-byte fixed prefix (stat fields, hash, flags), big-endian
//! - two extended-flag bytes when the `extended` bit is set (version ≥ 3)
//! - the NUL-terminated path, padded to an 8-byte boundary with 1–8 NULs
//!   in versions 2/3, or followed by exactly one NUL in version 4

use crate::artifacts::index::{ENTRY_BLOCK, ENTRY_FIXED_SIZE, SUPPORTED_VERSIONS};
use crate::artifacts::objects::file_mode::FileMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{GitError, Result};
use bitflags::bitflags;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use is_executable::IsExecutable;
use std::cmp::Ordering;
use std::fs::Metadata;
use std::path::Path;

/// Names at least this long store the saturated length and are read up to
/// the NUL terminator instead.
pub const MAX_NAME_LENGTH: usize = 0xFFF;

bitflags! {
    /// Single-bit fields of the 16-bit flags word; the remaining bits hold
    /// the merge stage and the name length.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct EntryFlags: u16 {
        const ASSUME_VALID = 0x8000;
        const EXTENDED = 0x4000;
    }
}

bitflags! {
    /// Single-bit fields of the extended-flags word (version ≥ 3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct ExtendedFlags: u16 {
        const SKIP_WORKTREE = 0x4000;
        const INTENT_TO_ADD = 0x2000;
    }
}

const STAGE_SHIFT: u16 = 12;
const STAGE_MASK: u16 = 0b11;
const NAME_LENGTH_MASK: u16 = 0x0FFF;

/// Merge stage of an entry: 0 for a normally staged file, 1–3 for the
/// base/ours/theirs versions of a conflicted path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Stage {
    #[default]
    None,
    Base,
    Ours,
    Theirs,
}

impl Stage {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            1 => Stage::Base,
            2 => Stage::Ours,
            3 => Stage::Theirs,
            _ => Stage::None,
        }
    }

    pub fn as_bits(&self) -> u8 {
        match self {
            Stage::None => 0,
            Stage::Base => 1,
            Stage::Ours => 2,
            Stage::Theirs => 3,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_bits())
    }
}

/// A stat snapshot of a worktree file, in the shape the index caches.
///
/// Timestamps are 64-bit nanosecond ticks; on disk they split into
/// big-endian (seconds, nanoseconds) pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStat {
    pub ctime: u64,
    pub mtime: u64,
    pub dev: u32,
    pub ino: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub mode: FileMode,
}

impl TryFrom<(&Path, &Metadata)> for FileStat {
    type Error = GitError;

    fn try_from((file_path, metadata): (&Path, &Metadata)) -> Result<Self> {
        use std::os::unix::prelude::MetadataExt;

        let mode = if metadata.is_dir() {
            FileMode::Tree
        } else if metadata.file_type().is_symlink() {
            FileMode::Symlink
        } else if file_path.is_executable() {
            FileMode::Executable
        } else {
            FileMode::Regular
        };

        Ok(FileStat {
            ctime: tick(metadata.ctime(), metadata.ctime_nsec()),
            mtime: tick(metadata.mtime(), metadata.mtime_nsec()),
            dev: metadata.dev() as u32,
            ino: metadata.ino() as u32,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
            mode,
        })
    }
}

fn tick(seconds: i64, nanoseconds: i64) -> u64 {
    seconds.max(0) as u64 * 1_000_000_000 + nanoseconds.max(0) as u64
}

/// One tracked file in the index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub ctime: u64,
    pub mtime: u64,
    pub dev: u32,
    pub ino: u32,
    pub mode: FileMode,
    pub uid: u32,
    pub gid: u32,
    pub file_size: u32,
    pub oid: ObjectId,
    pub assume_valid: bool,
    pub stage: Stage,
    pub skip_worktree: bool,
    pub intent_to_add: bool,
    /// Path relative to the repository root, as raw bytes.
    pub path: Bytes,
}

impl IndexEntry {
    /// A minimal entry with zeroed stat fields.
    pub fn new(path: impl Into<Bytes>, oid: ObjectId, mode: FileMode) -> Self {
        IndexEntry {
            ctime: 0,
            mtime: 0,
            dev: 0,
            ino: 0,
            mode,
            uid: 0,
            gid: 0,
            file_size: 0,
            oid,
            assume_valid: false,
            stage: Stage::None,
            skip_worktree: false,
            intent_to_add: false,
            path: path.into(),
        }
    }

    /// An entry whose stat cache is filled from a worktree snapshot.
    pub fn from_stat(path: impl Into<Bytes>, oid: ObjectId, stat: &FileStat) -> Self {
        IndexEntry {
            ctime: stat.ctime,
            mtime: stat.mtime,
            dev: stat.dev,
            ino: stat.ino,
            mode: stat.mode,
            uid: stat.uid,
            gid: stat.gid,
            file_size: stat.size as u32,
            oid,
            assume_valid: false,
            stage: Stage::None,
            skip_worktree: false,
            intent_to_add: false,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Bytes {
        &self.path
    }

    /// The path as a `Path`, for file system access.
    pub fn fs_path(&self) -> &Path {
        use std::os::unix::ffi::OsStrExt;
        Path::new(std::ffi::OsStr::from_bytes(&self.path))
    }

    /// True when mode and size still match the given stat.
    pub fn stat_match(&self, stat: &FileStat) -> bool {
        self.mode == stat.mode && u64::from(self.file_size) == stat.size
    }

    /// True when the cached timestamps still match the given stat.
    pub fn times_match(&self, stat: &FileStat) -> bool {
        self.ctime == stat.ctime && self.mtime == stat.mtime
    }

    /// Serialize with the padding rules of the given index version.
    pub fn serialize(&self, version: u32) -> Result<Bytes> {
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(GitError::UnsupportedVersion(version));
        }
        if self.path.is_empty() || self.path.contains(&0) {
            return Err(GitError::InvalidFormat(format!(
                "invalid index entry path {:?}",
                String::from_utf8_lossy(&self.path)
            )));
        }

        let extended = self.skip_worktree || self.intent_to_add;
        if extended && version < 3 {
            return Err(GitError::InvalidFormat(
                "extended entry flags require index version 3".into(),
            ));
        }

        let mut bytes = Vec::new();
        bytes.write_u32::<byteorder::NetworkEndian>((self.ctime / 1_000_000_000) as u32)?;
        bytes.write_u32::<byteorder::NetworkEndian>((self.ctime % 1_000_000_000) as u32)?;
        bytes.write_u32::<byteorder::NetworkEndian>((self.mtime / 1_000_000_000) as u32)?;
        bytes.write_u32::<byteorder::NetworkEndian>((self.mtime % 1_000_000_000) as u32)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.dev)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.ino)?;
        bytes.write_u32::<byteorder::NetworkEndian>(u32::from(self.mode.as_index_bits()))?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.uid)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.gid)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.file_size)?;
        self.oid.write_raw_to(&mut bytes)?;

        let mut flag_bits = self.path.len().min(MAX_NAME_LENGTH) as u16 & NAME_LENGTH_MASK;
        flag_bits |= u16::from(self.stage.as_bits()) << STAGE_SHIFT;
        if self.assume_valid {
            flag_bits |= EntryFlags::ASSUME_VALID.bits();
        }
        if extended {
            flag_bits |= EntryFlags::EXTENDED.bits();
        }
        bytes.write_u16::<byteorder::NetworkEndian>(flag_bits)?;

        if extended {
            let mut extended_bits = ExtendedFlags::empty();
            extended_bits.set(ExtendedFlags::SKIP_WORKTREE, self.skip_worktree);
            extended_bits.set(ExtendedFlags::INTENT_TO_ADD, self.intent_to_add);
            bytes.write_u16::<byteorder::NetworkEndian>(extended_bits.bits())?;
        }

        bytes.extend_from_slice(&self.path);

        if version == 4 {
            bytes.push(0);
        } else {
            // terminator plus up to seven more NULs to the next block
            let padding = ENTRY_BLOCK - bytes.len() % ENTRY_BLOCK;
            bytes.resize(bytes.len() + padding, 0);
        }

        Ok(Bytes::from(bytes))
    }

    /// Parse one entry from the start of `data`, returning it along with
    /// the number of bytes consumed (including padding).
    pub fn parse(data: &[u8], version: u32) -> Result<(IndexEntry, usize)> {
        if data.len() < ENTRY_FIXED_SIZE {
            return Err(GitError::UnexpectedEndOfFile);
        }

        let ctime = tick(
            i64::from(byteorder::NetworkEndian::read_u32(&data[0..4])),
            i64::from(byteorder::NetworkEndian::read_u32(&data[4..8])),
        );
        let mtime = tick(
            i64::from(byteorder::NetworkEndian::read_u32(&data[8..12])),
            i64::from(byteorder::NetworkEndian::read_u32(&data[12..16])),
        );
        let dev = byteorder::NetworkEndian::read_u32(&data[16..20]);
        let ino = byteorder::NetworkEndian::read_u32(&data[20..24]);

        let mode_raw = byteorder::NetworkEndian::read_u32(&data[24..28]);
        if mode_raw > u32::from(u16::MAX) {
            return Err(GitError::InvalidFormat(format!(
                "invalid file mode {mode_raw:#o}"
            )));
        }
        let mode = FileMode::from_index_bits(mode_raw as u16)?;

        let uid = byteorder::NetworkEndian::read_u32(&data[28..32]);
        let gid = byteorder::NetworkEndian::read_u32(&data[32..36]);
        let file_size = byteorder::NetworkEndian::read_u32(&data[36..40]);
        let oid = ObjectId::try_from_slice(&data[40..60])?;

        let flag_bits = byteorder::NetworkEndian::read_u16(&data[60..62]);
        let flags = EntryFlags::from_bits_truncate(flag_bits);
        let stage = Stage::from_bits(((flag_bits >> STAGE_SHIFT) & STAGE_MASK) as u8);
        let name_length = usize::from(flag_bits & NAME_LENGTH_MASK);

        let mut position = ENTRY_FIXED_SIZE;
        let (skip_worktree, intent_to_add) = if flags.contains(EntryFlags::EXTENDED) {
            if version < 3 {
                return Err(GitError::InvalidFormat(
                    "extended entry flags require index version 3".into(),
                ));
            }
            if data.len() < position + 2 {
                return Err(GitError::UnexpectedEndOfFile);
            }
            let extended_bits = ExtendedFlags::from_bits_truncate(
                byteorder::NetworkEndian::read_u16(&data[position..position + 2]),
            );
            position += 2;
            (
                extended_bits.contains(ExtendedFlags::SKIP_WORKTREE),
                extended_bits.contains(ExtendedFlags::INTENT_TO_ADD),
            )
        } else {
            (false, false)
        };

        let path = if name_length < MAX_NAME_LENGTH {
            if data.len() < position + name_length {
                return Err(GitError::UnexpectedEndOfFile);
            }
            let path = &data[position..position + name_length];
            if path.contains(&0) {
                return Err(GitError::InvalidFormat(
                    "NUL byte inside index entry path".into(),
                ));
            }
            position += name_length;
            Bytes::copy_from_slice(path)
        } else {
            let nul = data[position..]
                .iter()
                .position(|&byte| byte == 0)
                .ok_or(GitError::UnexpectedEndOfFile)?;
            let path = Bytes::copy_from_slice(&data[position..position + nul]);
            position += nul;
            path
        };

        // `position` sits on the NUL terminator now
        if version == 4 {
            if data.len() < position + 1 {
                return Err(GitError::UnexpectedEndOfFile);
            }
            if data[position] != 0 {
                return Err(GitError::InvalidFormat(
                    "missing NUL terminator after index entry path".into(),
                ));
            }
            position += 1;
        } else {
            let padding = ENTRY_BLOCK - position % ENTRY_BLOCK;
            if data.len() < position + padding {
                return Err(GitError::UnexpectedEndOfFile);
            }
            if data[position..position + padding].iter().any(|&b| b != 0) {
                return Err(GitError::InvalidFormat(
                    "non-NUL padding after index entry path".into(),
                ));
            }
            position += padding;
        }

        let entry = IndexEntry {
            ctime,
            mtime,
            dev,
            ino,
            mode,
            uid,
            gid,
            file_size,
            oid,
            assume_valid: flags.contains(EntryFlags::ASSUME_VALID),
            stage,
            skip_worktree,
            intent_to_add,
            path,
        };

        Ok((entry, position))
    }
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.stage == other.stage
    }
}

impl Eq for IndexEntry {}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    /// Paths compare as unsigned bytes; equal paths order by stage.
    fn cmp(&self, other: &Self) -> Ordering {
        self.path
            .cmp(&other.path)
            .then(self.stage.cmp(&other.stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn oid() -> ObjectId {
        ObjectId::try_parse("0123456789abcdeffedcba98765432100f1e2d3c").unwrap()
    }

    #[rstest]
    fn version_2_entries_pad_to_block_size(oid: ObjectId) {
        let entry = IndexEntry::new(Bytes::from_static(b"test.txt"), oid, FileMode::Regular);
        let bytes = entry.serialize(2).unwrap();

        // 62 fixed + 8 name -> 72 with two NULs of padding
        assert_eq!(bytes.len(), 72);
        assert_eq!(bytes.len() % ENTRY_BLOCK, 0);
        assert_eq!(&bytes[70..], &[0, 0]);
    }

    #[rstest]
    fn version_4_entries_end_at_the_terminator(oid: ObjectId) {
        let entry = IndexEntry::new(Bytes::from_static(b"test.txt"), oid, FileMode::Regular);
        let bytes = entry.serialize(4).unwrap();

        assert_eq!(bytes.len(), ENTRY_FIXED_SIZE + 8 + 1);
        assert_eq!(bytes[bytes.len() - 1], 0);
        assert_ne!(bytes[bytes.len() - 2], 0);
    }

    #[rstest]
    fn block_aligned_name_still_gets_a_full_padding_block(oid: ObjectId) {
        // 62 + 2 = 64: already aligned before the terminator, so the
        // padding is a full block of eight NULs
        let entry = IndexEntry::new(Bytes::from_static(b"ab"), oid, FileMode::Regular);
        let bytes = entry.serialize(2).unwrap();

        assert_eq!(bytes.len(), 72);
        assert!(bytes[64..].iter().all(|&b| b == 0));
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    fn parse_round_trip(#[case] version: u32, oid: ObjectId) {
        let mut entry = IndexEntry::new(
            Bytes::from_static(b"src/lib.rs"),
            oid,
            FileMode::Executable,
        );
        entry.ctime = 1_640_995_200_123_456_789;
        entry.mtime = 1_640_995_201_000_000_002;
        entry.dev = 66311;
        entry.ino = 8675309;
        entry.uid = 1000;
        entry.gid = 1000;
        entry.file_size = 1234;
        entry.stage = Stage::Ours;

        let bytes = entry.serialize(version).unwrap();
        let (parsed, consumed) = IndexEntry::parse(&bytes, version).unwrap();

        assert_eq!(consumed, bytes.len());
        pretty_assertions::assert_eq!(parsed.serialize(version).unwrap(), bytes);
        assert_eq!(parsed.ctime, entry.ctime);
        assert_eq!(parsed.mtime, entry.mtime);
        assert_eq!(parsed.stage, Stage::Ours);
        assert_eq!(parsed.mode, FileMode::Executable);
        pretty_assertions::assert_eq!(parsed.path.as_ref(), b"src/lib.rs");
    }

    #[rstest]
    fn extended_flags_round_trip_in_version_3(oid: ObjectId) {
        let mut entry = IndexEntry::new(Bytes::from_static(b"vendor/big"), oid, FileMode::Regular);
        entry.skip_worktree = true;
        entry.intent_to_add = true;

        let bytes = entry.serialize(3).unwrap();
        let (parsed, consumed) = IndexEntry::parse(&bytes, 3).unwrap();

        assert_eq!(consumed, bytes.len());
        assert!(parsed.skip_worktree);
        assert!(parsed.intent_to_add);
    }

    #[rstest]
    fn extended_flags_are_rejected_in_version_2(oid: ObjectId) {
        let mut entry = IndexEntry::new(Bytes::from_static(b"x"), oid, FileMode::Regular);
        entry.skip_worktree = true;

        assert!(matches!(
            entry.serialize(2).unwrap_err(),
            GitError::InvalidFormat(_)
        ));
    }

    #[rstest]
    fn name_length_field_saturates(oid: ObjectId) {
        let short = IndexEntry::new(Bytes::from(vec![b'a'; 0xFFE]), oid, FileMode::Regular);
        let bytes = short.serialize(2).unwrap();
        let flag_bits = byteorder::NetworkEndian::read_u16(&bytes[60..62]);
        assert_eq!(flag_bits & NAME_LENGTH_MASK, 0xFFE);

        let long = IndexEntry::new(Bytes::from(vec![b'b'; 0x1000]), oid, FileMode::Regular);
        let bytes = long.serialize(2).unwrap();
        let flag_bits = byteorder::NetworkEndian::read_u16(&bytes[60..62]);
        assert_eq!(flag_bits & NAME_LENGTH_MASK, 0xFFF);

        // the saturated name is recovered by scanning to the terminator
        let (parsed, consumed) = IndexEntry::parse(&bytes, 2).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(parsed.path.len(), 0x1000);
    }

    #[rstest]
    fn assume_valid_bit_round_trips(oid: ObjectId) {
        let mut entry = IndexEntry::new(Bytes::from_static(b"test.txt"), oid, FileMode::Regular);
        entry.assume_valid = true;

        let bytes = entry.serialize(2).unwrap();
        let (parsed, _) = IndexEntry::parse(&bytes, 2).unwrap();
        assert!(parsed.assume_valid);
    }

    #[rstest]
    fn truncation_is_detected(oid: ObjectId) {
        let entry = IndexEntry::new(Bytes::from_static(b"test.txt"), oid, FileMode::Regular);
        let bytes = entry.serialize(2).unwrap();

        for cut in [10, ENTRY_FIXED_SIZE, bytes.len() - 1] {
            assert!(matches!(
                IndexEntry::parse(&bytes[..cut], 2).unwrap_err(),
                GitError::UnexpectedEndOfFile
            ));
        }
    }

    #[rstest]
    fn ordering_is_by_path_bytes_then_stage(oid: ObjectId) {
        let mut conflicted = IndexEntry::new(Bytes::from_static(b"a.txt"), oid, FileMode::Regular);
        conflicted.stage = Stage::Theirs;
        let plain = IndexEntry::new(Bytes::from_static(b"a.txt"), oid, FileMode::Regular);
        let other = IndexEntry::new(Bytes::from_static(b"b.txt"), oid, FileMode::Regular);

        assert!(plain < conflicted);
        assert!(conflicted < other);
    }
}
