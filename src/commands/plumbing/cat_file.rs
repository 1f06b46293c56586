use crate::areas::repository::Repository;
use crate::artifacts::objects::object::{GitObject, Packable};
use crate::artifacts::objects::object_type::ObjectType;
use std::io::Write;

/// What `cat-file` should do with the object.
#[derive(Debug, Clone)]
pub enum CatFileOperation {
    /// Print the payload, requiring the given type.
    Typed(String),
    /// Exit successfully iff the object exists and is well-formed.
    Exists,
    /// Pretty-print the payload (trees become listings).
    Pretty,
    /// Print the type tag.
    Type { allow_unknown: bool },
    /// Print the payload size.
    Size { allow_unknown: bool },
}

impl Repository {
    /// `cat-file`: inspect or print an object. The name must be the full
    /// 40-hex form.
    pub fn cat_file(&self, operation: &CatFileOperation, name: &str) -> anyhow::Result<()> {
        match operation {
            CatFileOperation::Typed(type_name) => {
                let expected = ObjectType::try_from(type_name.as_str())?;
                let object = self.database().read_object(name, Some(expected))?;
                self.writer().write_all(&object.serialize()?)?;
            }
            CatFileOperation::Exists => {
                self.database().read_object(name, None)?;
            }
            CatFileOperation::Pretty => {
                let object = self.database().read_object(name, None)?;
                self.writer().write_all(&object.display()?)?;
            }
            CatFileOperation::Type { allow_unknown } => {
                let (type_name, _) = self.database().read_type_and_size(name, *allow_unknown)?;
                writeln!(self.writer(), "{type_name}")?;
            }
            CatFileOperation::Size { allow_unknown } => {
                let (_, size) = self.database().read_type_and_size(name, *allow_unknown)?;
                writeln!(self.writer(), "{size}")?;
            }
        }

        Ok(())
    }
}
