//! Coverage producer: locating `zig` and `kcov` and running them.
//!
//! Both steps run with inherited stdio and block until the child exits. A
//! non-zero exit stops the pipeline and carries the child's exit code.

use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Build,
    Kcov,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => write!(f, "zig build"),
            Self::Kcov => write!(f, "kcov"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("{tool} not found in PATH ({hint})")]
    ToolNotFound {
        tool: &'static str,
        hint: &'static str,
        #[source]
        source: which::Error,
    },
    #[error("failed to launch {step}: {source}")]
    Spawn {
        step: Step,
        #[source]
        source: io::Error,
    },
    #[error("{step} failed with {}", describe_exit(.code))]
    Failed { step: Step, code: Option<i32> },
}

impl ProducerError {
    /// Exit code the tool should terminate with, if the failure came from a
    /// child process.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { code, .. } => Some(code.unwrap_or(1)),
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}

/// Resolved locations of the external tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub zig: PathBuf,
    pub kcov: PathBuf,
}

impl Toolchain {
    /// Find both tools on the process `PATH`.
    pub fn detect() -> Result<Self, ProducerError> {
        Self::from_lookup(|name| which::which(name))
    }

    /// Find both tools in an explicit search path.
    pub fn detect_in(paths: impl AsRef<OsStr>, cwd: &Path) -> Result<Self, ProducerError> {
        Self::from_lookup(|name| which::which_in(name, Some(paths.as_ref()), cwd))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ProducerError>
    where
        F: Fn(&str) -> Result<PathBuf, which::Error>,
    {
        let zig = lookup("zig").map_err(|source| ProducerError::ToolNotFound {
            tool: "zig",
            hint: "install it from https://ziglang.org/download",
            source,
        })?;
        let kcov = lookup("kcov").map_err(|source| ProducerError::ToolNotFound {
            tool: "kcov",
            hint: "install it with `apt install kcov` or `brew install kcov`",
            source,
        })?;

        debug!(zig = %zig.display(), kcov = %kcov.display(), "Found coverage toolchain");
        Ok(Self { zig, kcov })
    }

    /// `zig build <build_step>` in `project_dir`.
    pub fn build_test_binary(
        &self,
        project_dir: &Path,
        build_step: &str,
    ) -> Result<(), ProducerError> {
        let mut cmd = Command::new(&self.zig);
        cmd.arg("build").arg(build_step).current_dir(project_dir);
        run(Step::Build, cmd)
    }

    /// `kcov <out_dir> <test_binary>` in `project_dir`.
    pub fn run_kcov(
        &self,
        project_dir: &Path,
        out_dir: &Path,
        test_binary: &Path,
    ) -> Result<(), ProducerError> {
        let mut cmd = Command::new(&self.kcov);
        cmd.arg(out_dir).arg(test_binary).current_dir(project_dir);
        run(Step::Kcov, cmd)
    }
}

fn run(step: Step, mut cmd: Command) -> Result<(), ProducerError> {
    info!(%step, "Running {:?}", cmd);

    let status = cmd
        .status()
        .map_err(|source| ProducerError::Spawn { step, source })?;

    if !status.success() {
        return Err(ProducerError::Failed {
            step,
            code: status.code(),
        });
    }
    Ok(())
}
