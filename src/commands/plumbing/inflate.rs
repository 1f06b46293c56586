use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    /// `inflate`: print the raw encoded frame of an object, exactly as it
    /// sits in the store after decompression.
    pub fn inflate(&self, name: &str) -> anyhow::Result<()> {
        let encoded = self.database().read_encoded_data(name)?;
        self.writer().write_all(&encoded)?;

        Ok(())
    }
}
