//! Object database (loose-object store)
//!
//! Content-addressed storage keyed by the full hex object name. Objects
//! live at `<objects>/<first-2-chars>/<remaining-38-chars>` as
//! zlib-compressed encoded frames.
//!
//! Writes go through a temporary file with a random suffix and commit with
//! a single rename, so readers either see nothing or a complete object.
//! Because names are content hashes, an existing target already holds the
//! right bytes and the write short-circuits.

use crate::artifacts::hash::{to_hex, Hasher};
use crate::artifacts::objects::loose::{self, DecodeOptions};
use crate::artifacts::objects::object::{GitObject, Object};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::OBJECT_ID_HEX_LENGTH;
use crate::errors::{GitError, Result};
use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Both read and write paths refuse anything above this size.
pub const MAX_FILE_SIZE: u64 = 1 << 30;

const INFO_DIR: &str = "info";
const PACK_DIR: &str = "pack";
const TEMP_PREFIX: &str = "tmp_obj_";
const TEMP_SUFFIX_LENGTH: usize = 6;

/// Loose-object database rooted at an `objects` directory.
#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Create the `info` and `pack` directories. Idempotent.
    pub fn setup(&self) -> Result<()> {
        std::fs::create_dir_all(self.path.join(INFO_DIR))?;
        std::fs::create_dir_all(self.path.join(PACK_DIR))?;
        Ok(())
    }

    /// Read and inflate the object stored under `name`.
    ///
    /// A missing object surfaces the file system's not-found error.
    pub fn read(&self, name: &str) -> Result<Bytes> {
        let object_path = self.path.join(Self::shard(name)?);
        let file = std::fs::File::open(&object_path)?;

        // take one byte past the cap so an oversized object is detected
        // instead of silently truncated
        let mut content = Vec::new();
        flate2::read::ZlibDecoder::new(BufReader::new(file))
            .take(MAX_FILE_SIZE + 1)
            .read_to_end(&mut content)?;
        if content.len() as u64 > MAX_FILE_SIZE {
            return Err(GitError::InvalidObject(format!(
                "refusing to read object {name} of more than {MAX_FILE_SIZE} bytes"
            )));
        }

        debug!(name, bytes = content.len(), "read object");
        Ok(Bytes::from(content))
    }

    /// Deflate `bytes` and store them under `name`, atomically.
    ///
    /// An existing target is a silent no-op; losing a rename race to a
    /// concurrent writer of the same name is success, since both payloads
    /// are identical by construction.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        if bytes.len() as u64 > MAX_FILE_SIZE {
            return Err(GitError::InvalidObject(format!(
                "refusing to write object of {} bytes",
                bytes.len()
            )));
        }

        let object_path = self.path.join(Self::shard(name)?);
        if object_path.exists() {
            return Ok(());
        }

        let object_dir = object_path
            .parent()
            .ok_or_else(|| GitError::InvalidObject(format!("invalid object name {name:?}")))?;
        std::fs::create_dir_all(object_dir)?;

        let temp_path = object_dir.join(Self::temp_name());
        // exclusive create: a colliding temporary name fails loudly
        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;

        let result = Self::deflate_into(file, bytes);
        if let Err(error) = result {
            let _ = std::fs::remove_file(&temp_path);
            return Err(error);
        }

        match std::fs::rename(&temp_path, &object_path) {
            Ok(()) => {
                debug!(name, bytes = bytes.len(), "wrote object");
                Ok(())
            }
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {
                // lost the race: the winner wrote identical content
                let _ = std::fs::remove_file(&temp_path);
                Ok(())
            }
            Err(error) => {
                let _ = std::fs::remove_file(&temp_path);
                Err(error.into())
            }
        }
    }

    fn deflate_into(file: std::fs::File, bytes: &[u8]) -> Result<()> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(file, flate2::Compression::default());
        encoder.write_all(bytes)?;
        let mut file = encoder.finish()?;
        file.flush()?;
        Ok(())
    }

    /// Split a full hex name into its sharded relative path.
    fn shard(name: &str) -> Result<PathBuf> {
        if name.len() != OBJECT_ID_HEX_LENGTH {
            return Err(GitError::InvalidHexLength {
                expected: OBJECT_ID_HEX_LENGTH,
                actual: name.len(),
            });
        }

        let (dir, file) = name.split_at(2);
        Ok(PathBuf::from(dir).join(file))
    }

    fn temp_name() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TEMP_SUFFIX_LENGTH)
            .map(char::from)
            .collect();
        format!("{TEMP_PREFIX}{suffix}")
    }
}

// Object-level operations: the layer between raw storage and typed objects.
impl Database {
    /// Hash (and optionally persist) content read from `reader`.
    ///
    /// The content is framed as `type_name`, hashed over the frame, and
    /// written to the store when `persist` is set. With `check_format` the
    /// payload must parse through the canonical parser for its type first.
    /// Returns the hex object name.
    pub fn hash_object(
        &self,
        reader: impl Read,
        type_name: &str,
        check_format: bool,
        persist: bool,
    ) -> Result<String> {
        let mut content = Vec::new();
        reader.take(MAX_FILE_SIZE + 1).read_to_end(&mut content)?;
        if content.len() as u64 > MAX_FILE_SIZE {
            return Err(GitError::InvalidObject(format!(
                "refusing to hash content of more than {MAX_FILE_SIZE} bytes"
            )));
        }

        let object_type = ObjectType::try_from(type_name)?;
        if check_format {
            Object::deserialize(object_type, std::io::Cursor::new(&content[..]))?;
        }

        let encoded = loose::encode(object_type.as_str(), &content);
        let name = to_hex(&Hasher::<Sha1>::hash_data(&encoded));

        if persist {
            self.write(&name, &encoded)?;
        }

        Ok(name)
    }

    /// Read, decode and deserialize the object stored under `name`.
    pub fn read_object(&self, name: &str, expected_type: Option<ObjectType>) -> Result<Object> {
        ObjectId::try_parse(name)?;

        let encoded = self.read(name)?;
        if encoded.is_empty() {
            return Err(GitError::InvalidObject(format!(
                "object file for {name} is empty"
            )));
        }

        let decoded = loose::decode(
            &encoded,
            &DecodeOptions {
                expected_type,
                ..Default::default()
            },
        )?;
        let object_type = match decoded.kind {
            loose::ObjectKind::Known(object_type) => object_type,
            loose::ObjectKind::Unknown(tag) => return Err(GitError::UnknownType(tag)),
        };

        Object::deserialize(object_type, std::io::Cursor::new(&decoded.data[..]))
    }

    /// Report the type tag and payload size without decoding the body.
    pub fn read_type_and_size(
        &self,
        name: &str,
        allow_unknown_type: bool,
    ) -> Result<(String, usize)> {
        ObjectId::try_parse(name)?;

        let encoded = self.read(name)?;
        if encoded.is_empty() {
            return Err(GitError::InvalidObject(format!(
                "object file for {name} is empty"
            )));
        }

        let decoded = loose::decode(
            &encoded,
            &DecodeOptions {
                allow_unknown_type,
                ..Default::default()
            },
        )?;

        Ok((decoded.kind.as_str().to_string(), decoded.size))
    }

    /// The raw encoded frame (post-inflate) stored under `name`.
    pub fn read_encoded_data(&self, name: &str) -> Result<Bytes> {
        ObjectId::try_parse(name)?;
        self.read(name)
    }

    /// Encode, hash and persist a typed object; returns its identifier.
    pub fn store(&self, object: &impl GitObject) -> Result<ObjectId> {
        let encoded = object.encode()?;
        let oid = ObjectId::try_from_slice(&Hasher::<Sha1>::hash_data(&encoded))?;
        self.write(&oid.to_hex(), &encoded)?;
        Ok(oid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::blob::Blob;
    use rstest::{fixture, rstest};

    #[fixture]
    fn database() -> (assert_fs::TempDir, Database) {
        let dir = assert_fs::TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        database.setup().unwrap();
        (dir, database)
    }

    #[rstest]
    fn setup_is_idempotent(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;
        database.setup().unwrap();

        assert!(database.objects_path().join("info").is_dir());
        assert!(database.objects_path().join("pack").is_dir());
    }

    #[rstest]
    fn write_then_read_round_trips(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;
        let encoded = loose::encode("blob", b"sample content\n");
        let name = "4b4f223d5c2b7c88abd487b3eaf5de2000755cc3";

        database.write(name, &encoded).unwrap();
        assert!(database
            .objects_path()
            .join("4b")
            .join("4f223d5c2b7c88abd487b3eaf5de2000755cc3")
            .is_file());

        pretty_assertions::assert_eq!(database.read(name).unwrap(), encoded);
    }

    #[rstest]
    fn repeated_writes_leave_a_single_valid_object(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;
        let encoded = loose::encode("blob", b"sample content\n");
        let name = "4b4f223d5c2b7c88abd487b3eaf5de2000755cc3";

        for _ in 0..3 {
            database.write(name, &encoded).unwrap();
        }

        let shard_dir = database.objects_path().join("4b");
        let files: Vec<_> = std::fs::read_dir(&shard_dir).unwrap().collect();
        assert_eq!(files.len(), 1);
        pretty_assertions::assert_eq!(database.read(name).unwrap(), encoded);
    }

    #[rstest]
    fn missing_objects_surface_not_found(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;
        let error = database
            .read("4b4f223d5c2b7c88abd487b3eaf5de2000755cc3")
            .unwrap_err();

        assert!(matches!(
            error,
            GitError::Io(io) if io.kind() == std::io::ErrorKind::NotFound
        ));
    }

    #[rstest]
    fn hash_object_matches_known_blob_identifier(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;
        let name = database
            .hash_object(&b"sample content\n"[..], "blob", true, true)
            .unwrap();

        pretty_assertions::assert_eq!(name, "4b4f223d5c2b7c88abd487b3eaf5de2000755cc3");
        assert!(database
            .objects_path()
            .join("4b")
            .join("4f223d5c2b7c88abd487b3eaf5de2000755cc3")
            .is_file());
    }

    #[rstest]
    fn hash_object_without_persist_writes_nothing(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;
        database
            .hash_object(&b"sample content\n"[..], "blob", false, false)
            .unwrap();

        assert!(!database.objects_path().join("4b").exists());
    }

    #[rstest]
    fn hash_object_rejects_unknown_types(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;
        assert!(matches!(
            database
                .hash_object(&b"x"[..], "wibble", false, false)
                .unwrap_err(),
            GitError::InvalidType(name) if name == "wibble"
        ));
    }

    #[rstest]
    fn hash_object_check_format_rejects_malformed_commits(
        database: (assert_fs::TempDir, Database),
    ) {
        let (_dir, database) = database;
        assert!(matches!(
            database
                .hash_object(&b"not a commit"[..], "commit", true, false)
                .unwrap_err(),
            GitError::InvalidCommitFormat(_)
        ));
    }

    #[rstest]
    fn read_object_validates_the_name(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;

        assert!(matches!(
            database.read_object("abc", None).unwrap_err(),
            GitError::InvalidHexLength { .. }
        ));
        assert!(matches!(
            database
                .read_object("zb4f223d5c2b7c88abd487b3eaf5de2000755cc3", None)
                .unwrap_err(),
            GitError::InvalidHexCharacter { .. }
        ));
    }

    #[rstest]
    fn read_object_round_trips_a_stored_blob(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;
        let blob = Blob::new(Bytes::from_static(b"sample content\n"));
        let oid = database.store(&blob).unwrap();

        let object = database
            .read_object(&oid.to_hex(), Some(ObjectType::Blob))
            .unwrap();
        match object {
            Object::Blob(read) => {
                pretty_assertions::assert_eq!(read.content().as_ref(), b"sample content\n")
            }
            other => panic!("expected a blob, got {}", other.object_type()),
        }
    }

    #[rstest]
    fn read_object_enforces_the_expected_type(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;
        let blob = Blob::new(Bytes::from_static(b"x"));
        let oid = database.store(&blob).unwrap();

        assert!(matches!(
            database
                .read_object(&oid.to_hex(), Some(ObjectType::Tree))
                .unwrap_err(),
            GitError::TypeMismatch { .. }
        ));
    }

    #[rstest]
    fn read_type_and_size_preserves_unknown_tags(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;
        let encoded = loose::encode("wibble", b"xyz");
        let name = to_hex(&Hasher::<Sha1>::hash_data(&encoded));
        database.write(&name, &encoded).unwrap();

        assert!(matches!(
            database.read_type_and_size(&name, false).unwrap_err(),
            GitError::UnknownType(_)
        ));

        let (tag, size) = database.read_type_and_size(&name, true).unwrap();
        pretty_assertions::assert_eq!(tag, "wibble");
        assert_eq!(size, 3);
    }

    #[rstest]
    fn read_encoded_data_returns_the_raw_frame(database: (assert_fs::TempDir, Database)) {
        let (_dir, database) = database;
        let blob = Blob::new(Bytes::from_static(b"sample content\n"));
        let oid = database.store(&blob).unwrap();

        pretty_assertions::assert_eq!(
            database.read_encoded_data(&oid.to_hex()).unwrap().as_ref(),
            b"blob 15\0sample content\n"
        );
    }

    #[test]
    fn temp_names_have_the_documented_shape() {
        let name = Database::temp_name();
        assert!(name.starts_with(TEMP_PREFIX));
        assert_eq!(name.len(), TEMP_PREFIX.len() + TEMP_SUFFIX_LENGTH);
        assert!(name[TEMP_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
    }
}
