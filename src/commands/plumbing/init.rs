use crate::areas::repository::{Repository, SetupOptions};
use std::io::Write;

impl Repository {
    /// `init`: lay down the repository skeleton and report where.
    pub fn init(options: &SetupOptions, writer: Box<dyn Write>) -> anyhow::Result<()> {
        let repository = Self::setup(options, writer)?;

        writeln!(
            repository.writer(),
            "Initialized empty Git repository in {}",
            repository.name().display()
        )?;

        Ok(())
    }
}
