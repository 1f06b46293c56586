use crate::areas::repository::Repository;
use crate::artifacts::listing::{list_files, ListOptions};
use std::io::Write;

/// Flags of the `ls-files` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct LsFilesOptions {
    pub cached: bool,
    pub others: bool,
    pub deleted: bool,
    pub modified: bool,
    pub unmerged: bool,
    pub killed: bool,
    pub stage: bool,
    /// Terminate lines with NUL instead of newline.
    pub zero: bool,
}

impl Repository {
    /// `ls-files`: print the selected file sets, one path per line.
    ///
    /// With `-s` (or `-u`, which implies it) each line carries the mode,
    /// object name and merge stage ahead of the path.
    pub fn ls_files(&self, options: &LsFilesOptions) -> anyhow::Result<()> {
        let listed = list_files(
            self,
            ListOptions {
                cached: options.cached,
                others: options.others,
                deleted: options.deleted,
                modified: options.modified,
                unmerged: options.unmerged,
                killed: options.killed,
                stage_info: options.stage,
            },
        )?;

        let terminator = if options.zero { '\0' } else { '\n' };
        for file in listed {
            match (file.mode, file.oid, file.stage) {
                (Some(mode), Some(oid), Some(stage)) => write!(
                    self.writer(),
                    "{mode} {oid} {stage}\t{}{terminator}",
                    file.path.display()
                )?,
                _ => write!(self.writer(), "{}{terminator}", file.path.display())?,
            }
        }

        Ok(())
    }
}
