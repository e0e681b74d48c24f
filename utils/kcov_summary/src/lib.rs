//! # kcov summary
//!
//! Builds the zig test binary, runs `kcov` against it and prints the line
//! coverage of every project file found in the resulting Cobertura report:
//!
//! ```text
//! 70.0%  - src/parser.zig
//! 100.0% - src/main.zig
//! 0.0%   - src/unused.zig
//! ```
//!
//! Only report entries whose filename starts with the project prefix (the
//! working directory relative to the project root) are shown, with that
//! prefix stripped.

pub mod app;
pub mod error;
pub mod prefix;
pub mod producer;
pub mod report;
pub mod summary;

pub use error::{ReportError, ReportResult};
pub use prefix::{default_root, resolve_prefix, PrefixError};
pub use producer::{ProducerError, Toolchain};
pub use report::{ClassRecord, CoverageReport, LineRecord};
pub use summary::{FileCoverage, OutputFormat, Summary};
