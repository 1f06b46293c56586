#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::predicate;

/// Create a temp directory with an initialized repository inside.
pub fn init_repository() -> Result<TempDir, Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let mut cmd = Command::cargo_bin("mingit")?;
    cmd.current_dir(dir.path()).arg("init");

    cmd.assert().success().stdout(predicate::str::contains(
        "Initialized empty Git repository in",
    ));

    Ok(dir)
}

/// A command ready to run inside the given repository.
pub fn repo_command(dir: &TempDir) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("mingit")?;
    cmd.current_dir(dir.path());
    Ok(cmd)
}
