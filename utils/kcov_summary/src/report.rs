//! Cobertura report decoding.
//!
//! kcov writes one `<class>` element per source file:
//!
//! ```xml
//! <coverage>
//!   <packages><package name="test"><classes>
//!     <class name="main_zig" filename="src/main.zig">
//!       <methods/>
//!       <lines>
//!         <line number="3" hits="1"/>
//!         <line number="4" hits="0"/>
//!       </lines>
//!     </class>
//!   </classes></package></packages>
//! </coverage>
//! ```
//!
//! Only the `line` children of the first `lines` element directly under a
//! `class` are line records. Everything else in the document is skipped.
//! Hit counts stay as written until a record is known to be in scope, so a
//! malformed entry for a file outside the project never fails the run.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::{ReportError, ReportResult};

/// One file-level record as written in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    pub filename: String,
    /// Line records in document order.
    pub lines: Vec<LineRecord>,
}

/// One `<line>` element; `hits` is the raw attribute text, if present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub hits: Option<String>,
}

impl LineRecord {
    pub fn new(hits: impl Into<String>) -> Self {
        Self {
            hits: Some(hits.into()),
        }
    }

    /// Parsed hit count. `filename` names the owning record in errors.
    pub fn hits(&self, filename: &str) -> ReportResult<i64> {
        let value = self.hits.as_deref().ok_or(ReportError::MissingAttribute {
            element: "line",
            attribute: "hits",
        })?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| ReportError::InvalidHits {
                filename: filename.to_string(),
                value: value.to_string(),
            })
    }
}

/// The decoded report: file-level records in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    pub classes: Vec<ClassRecord>,
}

impl CoverageReport {
    pub fn load(path: &Path) -> ReportResult<Self> {
        let bytes = fs::read(path).map_err(|err| ReportError::io(path, err))?;
        let report = Self::from_xml(&bytes)?;
        debug!(
            path = %path.display(),
            classes = report.classes.len(),
            "Decoded coverage report"
        );
        Ok(report)
    }

    pub fn from_xml(bytes: &[u8]) -> ReportResult<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut decoder = Decoder::default();
        let mut depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(tag) => {
                    decoder.open(&tag, depth, false)?;
                    depth += 1;
                }
                Event::Empty(tag) => decoder.open(&tag, depth, true)?,
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    decoder.close(depth);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if decoder.current.is_some() {
            return Err(ReportError::xml("document ended inside a <class> element"));
        }

        Ok(Self {
            classes: decoder.classes,
        })
    }
}

#[derive(Debug)]
struct OpenClass {
    depth: usize,
    filename: String,
    lines_seen: usize,
    in_lines: bool,
    lines: Vec<LineRecord>,
}

#[derive(Debug, Default)]
struct Decoder {
    current: Option<OpenClass>,
    classes: Vec<ClassRecord>,
}

impl Decoder {
    fn open(&mut self, tag: &BytesStart<'_>, depth: usize, empty: bool) -> ReportResult<()> {
        match tag.name().as_ref() {
            b"class" => {
                // Cobertura never nests classes; an inner one is ignored.
                if self.current.is_some() {
                    return Ok(());
                }
                let filename =
                    attribute(tag, "filename")?.ok_or(ReportError::MissingAttribute {
                        element: "class",
                        attribute: "filename",
                    })?;
                self.current = Some(OpenClass {
                    depth,
                    filename,
                    lines_seen: 0,
                    in_lines: false,
                    lines: Vec::new(),
                });
                if empty {
                    self.finish();
                }
            }
            b"lines" => {
                if let Some(class) = self.current.as_mut() {
                    if depth == class.depth + 1 {
                        class.lines_seen += 1;
                        class.in_lines = class.lines_seen == 1 && !empty;
                    }
                }
            }
            b"line" => {
                if let Some(class) = self.current.as_mut() {
                    if class.in_lines && depth == class.depth + 2 {
                        let hits = attribute(tag, "hits")?;
                        class.lines.push(LineRecord { hits });
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, depth: usize) {
        let Some(class) = self.current.as_mut() else {
            return;
        };
        if depth == class.depth + 1 {
            class.in_lines = false;
        } else if depth == class.depth {
            self.finish();
        }
    }

    fn finish(&mut self) {
        if let Some(class) = self.current.take() {
            self.classes.push(ClassRecord {
                filename: class.filename,
                lines: class.lines,
            });
        }
    }
}

fn attribute(tag: &BytesStart<'_>, name: &str) -> ReportResult<Option<String>> {
    match tag.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}
