use crate::areas::repository::Repository;
use anyhow::Context;
use std::io::Write;
use std::path::PathBuf;

/// Flags of the `hash-object` command.
#[derive(Debug, Clone)]
pub struct HashObjectOptions {
    /// Object type to frame the content as.
    pub object_type: String,
    /// Persist the object into the database.
    pub write: bool,
    /// Hash content from standard input before any files.
    pub stdin: bool,
    /// Skip the canonical-format check for the chosen type.
    pub literally: bool,
}

impl Default for HashObjectOptions {
    fn default() -> Self {
        HashObjectOptions {
            object_type: String::from("blob"),
            write: false,
            stdin: false,
            literally: false,
        }
    }
}

impl Repository {
    /// `hash-object`: hash (and optionally store) stdin and/or files,
    /// printing one hex name per input.
    pub fn hash_object(
        &self,
        files: &[PathBuf],
        options: &HashObjectOptions,
    ) -> anyhow::Result<()> {
        if options.stdin {
            let name = self.database().hash_object(
                std::io::stdin().lock(),
                &options.object_type,
                !options.literally,
                options.write,
            )?;
            writeln!(self.writer(), "{name}")?;
        }

        for file in files {
            let reader = std::fs::File::open(file)
                .with_context(|| format!("unable to open {}", file.display()))?;
            let name = self.database().hash_object(
                reader,
                &options.object_type,
                !options.literally,
                options.write,
            )?;
            writeln!(self.writer(), "{name}")?;
        }

        Ok(())
    }
}
