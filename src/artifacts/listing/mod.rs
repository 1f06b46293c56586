//! File-listing operations
//!
//! Enumerates files the way `ls-files` reports them, by combining the
//! index with a worktree scan:
//!
//! - `cached`: every index entry
//! - `others`: on disk but not in the index
//! - `deleted`: in the index but gone from disk
//! - `modified`: stat differs from the cached metadata
//! - `unmerged`: conflicted entries (stage != 0)
//! - `killed`: untracked files whose path shadows tracked entries

use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::{IndexEntry, Stage};
use crate::artifacts::objects::file_mode::FileMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{GitError, Result};
use digest::Digest;
use std::path::PathBuf;

/// Which sets of files to report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub cached: bool,
    pub others: bool,
    pub deleted: bool,
    pub modified: bool,
    pub unmerged: bool,
    pub killed: bool,
    pub stage_info: bool,
}

impl ListOptions {
    /// Apply the defaulting rules: `unmerged` implies `stage_info`, and
    /// with no set selected at all, `cached` is the default.
    fn normalize(mut self) -> Self {
        if self.unmerged {
            self.stage_info = true;
        }

        let any_set = self.cached
            || self.others
            || self.deleted
            || self.modified
            || self.unmerged
            || self.killed;
        if !any_set {
            self.cached = true;
        }

        self
    }

    fn needs_worktree(&self) -> bool {
        self.others || self.killed || self.deleted || self.modified
    }
}

/// One reported file. The optional fields are filled for tracked entries
/// when stage information was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub path: PathBuf,
    pub oid: Option<ObjectId>,
    pub mode: Option<FileMode>,
    pub stage: Option<Stage>,
}

impl ListedFile {
    fn untracked(path: PathBuf) -> Self {
        ListedFile {
            path,
            oid: None,
            mode: None,
            stage: None,
        }
    }

    fn tracked(entry: &IndexEntry, stage_info: bool) -> Self {
        ListedFile {
            path: entry.fs_path().to_path_buf(),
            oid: stage_info.then_some(entry.oid),
            mode: stage_info.then_some(entry.mode),
            stage: stage_info.then_some(entry.stage),
        }
    }
}

/// Enumerate files per `options`, sorted by path.
pub fn list_files<D: Digest>(
    repository: &Repository<D>,
    options: ListOptions,
) -> Result<Vec<ListedFile>> {
    let options = options.normalize();

    let workspace = match repository.worktree() {
        Some(workspace) => Some(workspace),
        None if options.needs_worktree() => return Err(GitError::MissingWorktree),
        None => None,
    };

    // a repository without an index simply tracks nothing yet
    let index: Index<D> = match repository.load_index() {
        Ok(index) => index,
        Err(GitError::Io(error)) if error.kind() == std::io::ErrorKind::NotFound => Index::new(2)?,
        Err(error) => return Err(error),
    };

    let mut listed = Vec::new();

    if options.others || options.killed {
        let workspace = workspace
            .as_ref()
            .ok_or(GitError::MissingWorktree)?;

        for path in workspace.list_files()? {
            let path_bytes = path_to_bytes(&path);
            let tracked = index.contains(&path_bytes);

            if options.others && !tracked {
                listed.push(ListedFile::untracked(path.clone()));
            }
            if options.killed && index.contains_prefix(&path_bytes, true) {
                listed.push(ListedFile::untracked(path.clone()));
            }
        }
    }

    for entry in index.entries() {
        if options.deleted || options.modified {
            let workspace = workspace
                .as_ref()
                .ok_or(GitError::MissingWorktree)?;

            match workspace.stat_file(entry.fs_path()) {
                Ok(stat) => {
                    if options.modified && !(entry.stat_match(&stat) && entry.times_match(&stat)) {
                        listed.push(ListedFile::tracked(entry, options.stage_info));
                    }
                }
                Err(GitError::Io(error)) if error.kind() == std::io::ErrorKind::NotFound => {
                    if options.deleted {
                        listed.push(ListedFile::tracked(entry, options.stage_info));
                    }
                }
                Err(error) => return Err(error),
            }
        } else if (options.cached || options.stage_info)
            && (!options.unmerged || entry.stage != Stage::None)
        {
            listed.push(ListedFile::tracked(entry, options.stage_info));
        }
    }

    listed.sort_by(|a, b| a.path.cmp(&b.path).then(a.stage.cmp(&b.stage)));
    Ok(listed)
}

fn path_to_bytes(path: &std::path::Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::repository::{Env, SetupOptions};
    use assert_fs::fixture::{FileWriteStr, PathChild};
    use bytes::Bytes;
    use rstest::{fixture, rstest};
    use sha1::Sha1;
    use std::path::Path;

    struct World {
        dir: assert_fs::TempDir,
        repository: Repository<Sha1>,
    }

    fn entry(path: &[u8]) -> IndexEntry {
        IndexEntry::new(
            Bytes::copy_from_slice(path),
            ObjectId::from_raw([0x42; 20]),
            FileMode::Regular,
        )
    }

    #[fixture]
    fn world() -> World {
        let dir = assert_fs::TempDir::new().unwrap();
        let repository = Repository::setup_with_env(
            &SetupOptions {
                name: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
            &Env::default(),
            Box::new(std::io::sink()),
        )
        .unwrap();

        World { dir, repository }
    }

    fn stage_file(world: &World, name: &str, content: &str) {
        world.dir.child(name).write_str(content).unwrap();

        let workspace = world.repository.worktree().unwrap();
        let stat = workspace.stat_file(Path::new(name)).unwrap();
        let oid = ObjectId::from_raw([0x42; 20]);

        let mut index = match world.repository.load_index() {
            Ok(index) => index,
            Err(_) => Index::new(2).unwrap(),
        };
        index.add(IndexEntry::from_stat(
            Bytes::copy_from_slice(name.as_bytes()),
            oid,
            &stat,
        ));
        world.repository.write_index(&index).unwrap();
    }

    fn paths(listed: &[ListedFile]) -> Vec<String> {
        listed
            .iter()
            .map(|file| file.path.display().to_string())
            .collect()
    }

    #[rstest]
    fn default_is_the_cached_set(world: World) {
        stage_file(&world, "a.txt", "a");
        stage_file(&world, "b.txt", "b");

        let listed = list_files(&world.repository, ListOptions::default()).unwrap();
        pretty_assertions::assert_eq!(paths(&listed), vec!["a.txt", "b.txt"]);
        assert!(listed[0].oid.is_none());
    }

    #[rstest]
    fn stage_info_fills_the_optional_fields(world: World) {
        stage_file(&world, "a.txt", "a");

        let listed = list_files(
            &world.repository,
            ListOptions {
                stage_info: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].mode, Some(FileMode::Regular));
        assert_eq!(listed[0].stage, Some(Stage::None));
        assert!(listed[0].oid.is_some());
    }

    #[rstest]
    fn others_reports_untracked_files_only(world: World) {
        stage_file(&world, "tracked.txt", "x");
        world.dir.child("untracked.txt").write_str("y").unwrap();

        let listed = list_files(
            &world.repository,
            ListOptions {
                others: true,
                ..Default::default()
            },
        )
        .unwrap();

        pretty_assertions::assert_eq!(paths(&listed), vec!["untracked.txt"]);
    }

    #[rstest]
    fn deleted_reports_index_entries_missing_on_disk(world: World) {
        stage_file(&world, "gone.txt", "x");
        stage_file(&world, "kept.txt", "y");
        std::fs::remove_file(world.dir.path().join("gone.txt")).unwrap();

        let listed = list_files(
            &world.repository,
            ListOptions {
                deleted: true,
                ..Default::default()
            },
        )
        .unwrap();

        pretty_assertions::assert_eq!(paths(&listed), vec!["gone.txt"]);
    }

    #[rstest]
    fn modified_reports_stat_changes(world: World) {
        stage_file(&world, "stable.txt", "x");
        stage_file(&world, "touched.txt", "yy");
        world.dir.child("touched.txt").write_str("yyy").unwrap();

        let listed = list_files(
            &world.repository,
            ListOptions {
                modified: true,
                ..Default::default()
            },
        )
        .unwrap();

        pretty_assertions::assert_eq!(paths(&listed), vec!["touched.txt"]);
    }

    #[rstest]
    fn unmerged_reports_conflicted_stages_with_info(world: World) {
        stage_file(&world, "clean.txt", "x");

        let mut index = world.repository.load_index().unwrap();
        let mut ours = entry(b"conflicted.txt");
        ours.stage = Stage::Ours;
        let mut theirs = entry(b"conflicted.txt");
        theirs.stage = Stage::Theirs;
        index.add(ours);
        index.add(theirs);
        world.repository.write_index(&index).unwrap();

        let listed = list_files(
            &world.repository,
            ListOptions {
                unmerged: true,
                ..Default::default()
            },
        )
        .unwrap();

        pretty_assertions::assert_eq!(paths(&listed), vec!["conflicted.txt", "conflicted.txt"]);
        assert_eq!(listed[0].stage, Some(Stage::Ours));
        assert_eq!(listed[1].stage, Some(Stage::Theirs));
    }

    #[rstest]
    fn killed_reports_paths_shadowing_tracked_directories(world: World) {
        // the index tracks dir/file, but `dir` exists on disk as a file
        let mut index = Index::new(2).unwrap();
        index.add(entry(b"dir/file"));
        world.repository.write_index(&index).unwrap();
        world.dir.child("dir").write_str("in the way").unwrap();

        let listed = list_files(
            &world.repository,
            ListOptions {
                killed: true,
                ..Default::default()
            },
        )
        .unwrap();

        pretty_assertions::assert_eq!(paths(&listed), vec!["dir"]);
    }

    #[rstest]
    fn missing_index_lists_nothing(world: World) {
        let listed = list_files(&world.repository, ListOptions::default()).unwrap();
        assert!(listed.is_empty());
    }

    #[test]
    fn others_requires_a_worktree() {
        let dir = assert_fs::TempDir::new().unwrap();
        let repository: Repository<Sha1> = Repository::setup_with_env(
            &SetupOptions {
                name: Some(dir.path().to_path_buf()),
                initial_branch: String::from("main"),
                bare: true,
            },
            &Env::default(),
            Box::new(std::io::sink()),
        )
        .unwrap();

        assert!(matches!(
            list_files(
                &repository,
                ListOptions {
                    others: true,
                    ..Default::default()
                }
            )
            .unwrap_err(),
            GitError::MissingWorktree
        ));
    }
}
