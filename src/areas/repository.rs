//! Repository discovery, setup and wiring
//!
//! The repository binds together the git directory, the optional worktree
//! and the object database. Discovery honours `GIT_DIR`, walks upward
//! looking for a `.git` entry otherwise, and gives up at the file system
//! root or the user's home directory. Setup lays down the directory
//! skeleton and `HEAD` without ever overwriting existing data.
//!
//! Environment variables are read per operation at the call site and never
//! cached; discovery takes them as an explicit record so it stays
//! testable.

use crate::areas::database::Database;
use crate::areas::database::MAX_FILE_SIZE;
use crate::areas::index::Index;
use crate::areas::workspace::Workspace;
use crate::errors::{GitError, Result};
use bytes::Bytes;
use digest::Digest;
use sha1::Sha1;
use std::cell::{RefCell, RefMut};
use std::ffi::OsString;
use std::io::{Read, Write};
use std::marker::PhantomData;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Git directory name searched for during discovery.
pub const GIT_DIR_NAME: &str = ".git";

const OBJECTS_DIR: &str = "objects";
const INDEX_FILE: &str = "index";
const HEAD_FILE: &str = "HEAD";

const GIT_DIR_VAR: &str = "GIT_DIR";
const OBJECT_DIR_VAR: &str = "GIT_OBJECT_DIRECTORY";
#[cfg(not(windows))]
const HOME_VAR: &str = "HOME";
#[cfg(windows)]
const HOME_VAR: &str = "USERPROFILE";

/// Environment inputs affecting discovery and setup.
///
/// Collected once per operation; a variable set to the empty string is an
/// error rather than an override.
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub git_dir: Option<OsString>,
    pub object_dir: Option<OsString>,
    pub home: Option<OsString>,
}

impl Env {
    pub fn from_process() -> Result<Self> {
        Ok(Env {
            git_dir: Self::var(GIT_DIR_VAR)?,
            object_dir: Self::var(OBJECT_DIR_VAR)?,
            home: Self::var(HOME_VAR)?,
        })
    }

    fn var(name: &str) -> Result<Option<OsString>> {
        match std::env::var_os(name) {
            Some(value) if value.is_empty() => Err(GitError::EmptyValue(name.to_string())),
            other => Ok(other),
        }
    }
}

/// Options for laying down a new repository.
#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Directory to create and initialise; the working directory if unset.
    pub name: Option<PathBuf>,
    /// Branch `HEAD` will reference.
    pub initial_branch: String,
    /// Make the target directory the git directory itself.
    pub bare: bool,
}

impl Default for SetupOptions {
    fn default() -> Self {
        SetupOptions {
            name: None,
            initial_branch: String::from("main"),
            bare: false,
        }
    }
}

/// An opened repository: git directory, optional worktree, object store.
///
/// The digest parameter flows into the index; SHA-1 is the on-disk
/// default. Output produced by commands goes through the injected writer.
pub struct Repository<D: Digest = Sha1> {
    git_dir: PathBuf,
    worktree: Option<PathBuf>,
    database: Database,
    writer: RefCell<Box<dyn Write>>,
    _digest: PhantomData<D>,
}

impl<D: Digest> std::fmt::Debug for Repository<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("git_dir", &self.git_dir)
            .field("worktree", &self.worktree)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl<D: Digest> Repository<D> {
    /// Open an existing repository, discovering it from `start_dir` (or
    /// the current directory) unless `GIT_DIR` overrides the search.
    pub fn open(start_dir: Option<&Path>, writer: Box<dyn Write>) -> Result<Self> {
        let env = Env::from_process()?;
        Self::open_with_env(start_dir, &env, writer)
    }

    pub fn open_with_env(
        start_dir: Option<&Path>,
        env: &Env,
        writer: Box<dyn Write>,
    ) -> Result<Self> {
        let git_dir = match &env.git_dir {
            Some(git_dir) => PathBuf::from(git_dir),
            None => {
                let start = match start_dir {
                    Some(start) => start.to_path_buf(),
                    None => std::env::current_dir()?,
                };
                Self::discover(&start, env.home.as_deref().map(Path::new))?
            }
        };

        // the located directory must actually open
        std::fs::read_dir(&git_dir)?;
        let git_dir = git_dir.canonicalize()?;

        debug!(git_dir = %git_dir.display(), "opened repository");
        Ok(Self::wire(git_dir, env, writer))
    }

    /// Walk upward from `start` looking for a `.git` entry, halting at the
    /// file system root or at `home`.
    fn discover(start: &Path, home: Option<&Path>) -> Result<PathBuf> {
        let start = start.canonicalize()?;
        let home = home.and_then(|home| home.canonicalize().ok());

        let mut current = start.as_path();
        loop {
            let candidate = current.join(GIT_DIR_NAME);
            if candidate.exists() {
                return Ok(candidate);
            }

            if home.as_deref() == Some(current) {
                return Err(GitError::GitDirNotFound);
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return Err(GitError::GitDirNotFound),
            }
        }
    }

    /// Create a repository skeleton, never touching existing data.
    pub fn setup(options: &SetupOptions, writer: Box<dyn Write>) -> Result<Self> {
        let env = Env::from_process()?;
        Self::setup_with_env(options, &env, writer)
    }

    pub fn setup_with_env(
        options: &SetupOptions,
        env: &Env,
        writer: Box<dyn Write>,
    ) -> Result<Self> {
        let base = match &options.name {
            Some(name) => {
                std::fs::create_dir_all(name)?;
                name.clone()
            }
            None => std::env::current_dir()?,
        };

        let git_dir = if options.bare {
            base.clone()
        } else {
            match &env.git_dir {
                Some(git_dir) => PathBuf::from(git_dir),
                None => base.join(GIT_DIR_NAME),
            }
        };

        std::fs::create_dir_all(&git_dir)?;
        std::fs::create_dir_all(git_dir.join("refs").join("heads"))?;
        std::fs::create_dir_all(git_dir.join("refs").join("tags"))?;

        let git_dir = git_dir.canonicalize()?;
        let repository = Self::wire(git_dir, env, writer);
        repository.database.setup()?;
        repository.write_head(&options.initial_branch)?;

        debug!(git_dir = %repository.git_dir.display(), "set up repository");
        Ok(repository)
    }

    /// Create `HEAD` exclusively; an existing file is left untouched.
    fn write_head(&self, initial_branch: &str) -> Result<()> {
        let head_path = self.git_dir.join(HEAD_FILE);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&head_path)
        {
            Ok(mut head) => {
                head.write_all(format!("ref: refs/heads/{initial_branch}\n").as_bytes())?;
                Ok(())
            }
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn wire(git_dir: PathBuf, env: &Env, writer: Box<dyn Write>) -> Self {
        let worktree = match git_dir.file_name() {
            Some(name) if name == GIT_DIR_NAME => git_dir.parent().map(Path::to_path_buf),
            _ => None,
        };

        let objects_path = match &env.object_dir {
            Some(object_dir) => PathBuf::from(object_dir),
            None => git_dir.join(OBJECTS_DIR),
        };

        Repository {
            git_dir,
            worktree,
            database: Database::new(objects_path.into_boxed_path()),
            writer: RefCell::new(writer),
            _digest: PhantomData,
        }
    }

    /// The canonical absolute path of the git directory.
    pub fn name(&self) -> &Path {
        &self.git_dir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// The working-copy root; absent for bare repositories.
    pub fn worktree(&self) -> Option<Workspace> {
        self.worktree
            .as_ref()
            .map(|path| Workspace::new(path.clone().into_boxed_path()))
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn writer(&self) -> RefMut<'_, Box<dyn Write>> {
        self.writer.borrow_mut()
    }

    /// Read and parse `<git_dir>/index` under a shared lock.
    pub fn load_index(&self) -> Result<Index<D>> {
        let index_path = self.git_dir.join(INDEX_FILE);
        let mut index_file = std::fs::File::open(&index_path)?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        let mut data = Vec::new();
        lock.deref_mut()
            .take(MAX_FILE_SIZE)
            .read_to_end(&mut data)?;

        debug!(bytes = data.len(), "loaded index");
        Index::parse(&Bytes::from(data))
    }

    /// Persist an index under an exclusive lock.
    pub fn write_index(&self, index: &Index<D>) -> Result<()> {
        let data = index.write()?;

        let index_path = self.git_dir.join(INDEX_FILE);
        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&index_path)?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(&data)?;

        Ok(())
    }
}
