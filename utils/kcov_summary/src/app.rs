use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    prefix::{default_root, resolve_prefix},
    producer::Toolchain,
    report::CoverageReport,
    summary::{OutputFormat, Summary},
};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "kcov_summary",
    author,
    version,
    about = "Build the zig test binary, run kcov on it and print per-file line coverage",
    long_about = None
)]
pub struct Args {
    /// Project root that report filenames are relative to [default: grandparent of the working directory]
    #[arg(long, value_name = "PATH", env = "KCOV_SUMMARY_ROOT")]
    pub root: Option<PathBuf>,

    /// Coverage report to analyze
    #[arg(
        long,
        value_name = "PATH",
        env = "KCOV_SUMMARY_REPORT",
        default_value = "kcov_out/cov.xml"
    )]
    pub report: PathBuf,

    /// Directory kcov writes its output into
    #[arg(
        long,
        value_name = "DIR",
        env = "KCOV_SUMMARY_OUT",
        default_value = "kcov_out"
    )]
    pub kcov_out: PathBuf,

    /// Test binary run under kcov
    #[arg(long, value_name = "PATH", default_value = "./zig-out/bin/test")]
    pub test_binary: PathBuf,

    /// zig build step that produces the test binary
    #[arg(long, value_name = "NAME", default_value = "test:build")]
    pub build_step: String,

    /// Skip the build and kcov run, analyze the existing report
    #[arg(long)]
    pub no_run: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub root: Option<PathBuf>,
    pub report: PathBuf,
    pub kcov_out: PathBuf,
    pub test_binary: PathBuf,
    pub build_step: String,
    pub run_producer: bool,
    pub format: OutputFormat,
}

impl From<Args> for AppConfig {
    fn from(value: Args) -> Self {
        Self {
            root: value.root,
            report: value.report,
            kcov_out: value.kcov_out,
            test_binary: value.test_binary,
            build_step: value.build_step,
            run_producer: !value.no_run,
            format: value.format,
        }
    }
}

pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build, run kcov and summarize the report, all relative to `working_dir`.
/// Returns the rendered summary.
pub fn run(config: &AppConfig, working_dir: &Path) -> Result<String> {
    let start = Instant::now();
    let working_dir = fs::canonicalize(working_dir).with_context(|| {
        format!(
            "failed to resolve working directory {}",
            working_dir.display()
        )
    })?;

    let root = match &config.root {
        Some(root) => fs::canonicalize(working_dir.join(root))
            .with_context(|| format!("failed to resolve project root {}", root.display()))?,
        None => default_root(&working_dir)?,
    };
    let prefix = resolve_prefix(&working_dir, &root)?;
    debug!(root = %root.display(), prefix = %prefix, "Resolved project prefix");

    if config.run_producer {
        produce_report(config, &working_dir)?;
    } else {
        debug!("Skipping build and kcov run");
    }

    let report_path = working_dir.join(&config.report);
    let report = CoverageReport::load(&report_path)
        .with_context(|| format!("failed to read coverage report {}", report_path.display()))?;
    let summary = Summary::from_report(&report, &prefix)?;

    if summary.is_empty() {
        warn!(prefix = %prefix, "No report entries under the project prefix");
    }
    info!(
        files = summary.files.len(),
        elapsed_secs = start.elapsed().as_secs_f32(),
        "Coverage summary ready"
    );

    summary
        .render(config.format)
        .context("failed to render coverage summary")
}

fn produce_report(config: &AppConfig, working_dir: &Path) -> Result<()> {
    let toolchain = Toolchain::detect()?;

    let build_start = Instant::now();
    toolchain.build_test_binary(working_dir, &config.build_step)?;
    info!(
        elapsed_secs = build_start.elapsed().as_secs_f32(),
        "Test binary built"
    );

    let kcov_start = Instant::now();
    toolchain.run_kcov(working_dir, &config.kcov_out, &config.test_binary)?;
    info!(
        elapsed_secs = kcov_start.elapsed().as_secs_f32(),
        out_dir = %config.kcov_out.display(),
        "kcov run completed"
    );

    Ok(())
}
