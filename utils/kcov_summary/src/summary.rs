//! Per-file coverage summary and its text/json renderings.

use std::fmt;

use serde::Serialize;

use crate::error::{ReportError, ReportResult};
use crate::report::{ClassRecord, CoverageReport};

/// Reference width every rendered percentage is padded to.
const PERCENT_COLUMN: &str = "100.0%";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format '{}'. Use 'text' or 'json'", s)),
        }
    }
}

/// Line coverage of one project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCoverage {
    pub filename: String,
    pub total_lines: usize,
    pub covered_lines: usize,
}

impl FileCoverage {
    /// Build from an in-scope report record, with `filename` already made
    /// relative. Hit counts are parsed here, not while decoding.
    pub fn from_record(filename: &str, record: &ClassRecord) -> ReportResult<Self> {
        let total_lines = record.lines.len();
        if total_lines == 0 {
            return Err(ReportError::EmptyRecord {
                filename: record.filename.clone(),
            });
        }
        let mut covered_lines = 0;
        for line in &record.lines {
            if line.hits(&record.filename)? > 0 {
                covered_lines += 1;
            }
        }

        Ok(Self {
            filename: filename.to_string(),
            total_lines,
            covered_lines,
        })
    }

    /// Covered share in percent, rounded to two decimals.
    pub fn percent(&self) -> f64 {
        let ratio = (100 * self.covered_lines) as f64 / self.total_lines as f64;
        round_to_hundredths(ratio)
    }

    /// `70.0%`, `33.33%`, `100.0%`: always at least one fractional digit.
    pub fn percent_label(&self) -> String {
        let mut label = self.percent().to_string();
        if !label.contains('.') {
            label.push_str(".0");
        }
        label.push('%');
        label
    }
}

impl fmt::Display for FileCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.percent_label();
        let padding = PERCENT_COLUMN.len().saturating_sub(label.len());
        write!(f, "{label}{:padding$} - {}", "", self.filename)
    }
}

// Formatting with a fixed precision rounds the exact binary value half to
// even, which is what the two-decimal ratio must reproduce.
fn round_to_hundredths(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Coverage of every project file, in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: Vec<FileCoverage>,
}

impl Summary {
    /// Keep the records whose filename starts with `prefix`, strip it and
    /// count their lines. A kept record without line records is an error.
    pub fn from_report(report: &CoverageReport, prefix: &str) -> ReportResult<Self> {
        let files = report
            .classes
            .iter()
            .filter_map(|record| {
                record
                    .filename
                    .strip_prefix(prefix)
                    .map(|relative| FileCoverage::from_record(relative, record))
            })
            .collect::<ReportResult<Vec<_>>>()?;

        Ok(Self { files })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_string()),
            OutputFormat::Json => self.to_json(),
        }
    }

    fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct JsonFile<'a> {
            filename: &'a str,
            total_lines: usize,
            covered_lines: usize,
            percent: f64,
        }

        let files: Vec<JsonFile<'_>> = self
            .files
            .iter()
            .map(|file| JsonFile {
                filename: &file.filename,
                total_lines: file.total_lines,
                covered_lines: file.covered_lines,
                percent: file.percent(),
            })
            .collect();

        let mut json = serde_json::to_string_pretty(&files)?;
        json.push('\n');
        Ok(json)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f, "{file}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::report::LineRecord;

    fn record(filename: &str, line_hits: &[i64]) -> ClassRecord {
        ClassRecord {
            filename: filename.to_string(),
            lines: line_hits
                .iter()
                .map(|hits| LineRecord::new(hits.to_string()))
                .collect(),
        }
    }

    fn coverage(total_lines: usize, covered_lines: usize) -> FileCoverage {
        FileCoverage {
            filename: "a.zig".to_string(),
            total_lines,
            covered_lines,
        }
    }

    #[test]
    fn from_report__seven_of_ten_hit__then_seventy_percent_line() {
        let report = CoverageReport {
            classes: vec![record("src/a.zig", &[1, 2, 3, 4, 5, 6, 7, 0, 0, 0])],
        };

        let summary = Summary::from_report(&report, "src/").expect("summary");

        assert_eq!(
            summary.files,
            vec![FileCoverage {
                filename: "a.zig".to_string(),
                total_lines: 10,
                covered_lines: 7,
            }]
        );
        assert_eq!(summary.to_string(), "70.0%  - a.zig\n");
    }

    #[test]
    fn from_report__all_lines_hit__then_full_width_without_padding() {
        let report = CoverageReport {
            classes: vec![record("src/b.zig", &[1, 1, 1, 1, 1])],
        };

        let summary = Summary::from_report(&report, "src/").expect("summary");
        assert_eq!(summary.to_string(), "100.0% - b.zig\n");
    }

    #[test]
    fn from_report__no_lines_hit__then_zero_padded_by_two() {
        let report = CoverageReport {
            classes: vec![record("src/c.zig", &[0, 0, 0, 0])],
        };

        let summary = Summary::from_report(&report, "src/").expect("summary");
        assert_eq!(summary.to_string(), "0.0%   - c.zig\n");
    }

    #[test]
    fn from_report__entry_outside_prefix__then_skipped() {
        let report = CoverageReport {
            classes: vec![record("lib/std/std.zig", &[1, 0])],
        };

        let summary = Summary::from_report(&report, "src/").expect("summary");
        assert!(summary.is_empty());
        assert_eq!(summary.to_string(), "");
    }

    #[test]
    fn from_report__empty_record_outside_prefix__then_ignored() {
        let report = CoverageReport {
            classes: vec![record("lib/empty.zig", &[]), record("src/a.zig", &[1])],
        };

        let summary = Summary::from_report(&report, "src/").expect("summary");
        assert_eq!(summary.files.len(), 1);
    }

    #[test]
    fn from_report__matched_record_without_lines__then_empty_record_error() {
        let report = CoverageReport {
            classes: vec![record("src/a.zig", &[1]), record("src/empty.zig", &[])],
        };

        let err = Summary::from_report(&report, "src/").unwrap_err();
        match err {
            ReportError::EmptyRecord { filename } => assert_eq!(filename, "src/empty.zig"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_report__mixed_entries__then_report_order_preserved() {
        let report = CoverageReport {
            classes: vec![
                record("src/z.zig", &[1]),
                record("other/x.zig", &[1]),
                record("src/a.zig", &[0]),
                record("src/m/n.zig", &[1, 0]),
            ],
        };

        let summary = Summary::from_report(&report, "src/").expect("summary");
        let names: Vec<&str> = summary.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["z.zig", "a.zig", "m/n.zig"]);
    }

    #[test]
    fn from_report__malformed_hits_outside_prefix__then_in_prefix_summary_kept() {
        let report = CoverageReport {
            classes: vec![
                record("proj/zig/src/a.zig", &[1, 1, 1, 1, 1, 1, 1, 0, 0, 0]),
                ClassRecord {
                    filename: "lib/std/x.zig".to_string(),
                    lines: vec![LineRecord::new("n/a"), LineRecord { hits: None }],
                },
            ],
        };

        let summary = Summary::from_report(&report, "proj/zig/").expect("summary");
        assert_eq!(summary.to_string(), "70.0%  - src/a.zig\n");
    }

    #[test]
    fn from_report__malformed_hits_in_prefix__then_invalid_hits() {
        let report = CoverageReport {
            classes: vec![ClassRecord {
                filename: "src/a.zig".to_string(),
                lines: vec![LineRecord::new("1"), LineRecord::new("n/a")],
            }],
        };

        let err = Summary::from_report(&report, "src/").unwrap_err();
        match err {
            ReportError::InvalidHits { filename, value } => {
                assert_eq!(filename, "src/a.zig");
                assert_eq!(value, "n/a");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_report__missing_hits_in_prefix__then_missing_attribute() {
        let report = CoverageReport {
            classes: vec![ClassRecord {
                filename: "src/a.zig".to_string(),
                lines: vec![LineRecord { hits: None }],
            }],
        };

        let err = Summary::from_report(&report, "src/").unwrap_err();
        assert!(matches!(
            err,
            ReportError::MissingAttribute {
                element: "line",
                attribute: "hits"
            }
        ));
    }

    #[test]
    fn from_report__negative_hits__then_not_covered() {
        let report = CoverageReport {
            classes: vec![record("src/a.zig", &[-1, 1])],
        };

        let summary = Summary::from_report(&report, "src/").expect("summary");
        assert_eq!(summary.files[0].covered_lines, 1);
    }

    #[test]
    fn from_report__empty_prefix__then_every_record_kept_unchanged() {
        let report = CoverageReport {
            classes: vec![record("proj/a.zig", &[1]), record("lib/b.zig", &[0])],
        };

        let summary = Summary::from_report(&report, "").expect("summary");
        let names: Vec<&str> = summary.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["proj/a.zig", "lib/b.zig"]);
    }

    #[test]
    fn percent_label__repeating_fractions__then_rounded_to_two_decimals() {
        assert_eq!(coverage(3, 1).percent_label(), "33.33%");
        assert_eq!(coverage(3, 2).percent_label(), "66.67%");
        assert_eq!(coverage(8, 1).percent_label(), "12.5%");
        assert_eq!(coverage(7, 1).percent_label(), "14.29%");
    }

    #[test]
    fn display__two_decimal_label__then_padding_fills_to_reference_width() {
        assert_eq!(coverage(3, 1).to_string(), "33.33% - a.zig");
        assert_eq!(coverage(8, 1).to_string(), "12.5%  - a.zig");
        assert_eq!(coverage(100, 5).to_string(), "5.0%   - a.zig");
    }

    #[test]
    fn render__json__then_array_with_rounded_percent() {
        let summary = Summary {
            files: vec![coverage(3, 1)],
        };

        let rendered = summary.render(OutputFormat::Json).expect("render");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(
            value,
            serde_json::json!([{
                "filename": "a.zig",
                "total_lines": 3,
                "covered_lines": 1,
                "percent": 33.33,
            }])
        );
    }

    #[test]
    fn render__json_empty_summary__then_empty_array() {
        assert_eq!(
            Summary::default()
                .render(OutputFormat::Json)
                .expect("render"),
            "[]\n"
        );
    }

    #[test]
    fn output_format__from_str__then_accepts_known_names() {
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("TXT".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("html".parse::<OutputFormat>().is_err());
    }
}
