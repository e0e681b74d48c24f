//! Project prefix resolution.
//!
//! kcov writes filenames relative to the common source root, so a file in the
//! project shows up as `<project path below root>/src/...`. The prefix is that
//! project path with a trailing `/`; it scopes the summary to project files and
//! is stripped from the displayed names.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrefixError {
    #[error("working directory {working_dir:?} is not inside root {root:?}")]
    NotUnderRoot { working_dir: PathBuf, root: PathBuf },
    #[error(
        "working directory {0:?} is not nested two levels below a project root; pass --root explicitly"
    )]
    TooShallow(PathBuf),
}

/// The grandparent of `working_dir`, the layout the tool assumes when no root
/// is given.
pub fn default_root(working_dir: &Path) -> Result<PathBuf, PrefixError> {
    working_dir
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| PrefixError::TooShallow(working_dir.to_path_buf()))
}

/// Path of `working_dir` relative to `root`, `/`-separated, with exactly one
/// trailing separator. Empty when both are the same directory.
pub fn resolve_prefix(working_dir: &Path, root: &Path) -> Result<String, PrefixError> {
    let relative = working_dir
        .strip_prefix(root)
        .map_err(|_| PrefixError::NotUnderRoot {
            working_dir: working_dir.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let mut prefix = String::new();
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            prefix.push_str(&segment.to_string_lossy());
            prefix.push('/');
        }
    }
    Ok(prefix)
}
