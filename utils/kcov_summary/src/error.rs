use std::{fmt, io, path::PathBuf};

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("coverage xml error: {0}")]
    Xml(String),
    #[error("<{element}> element is missing the `{attribute}` attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("line record in {filename} has a non-integer hit count {value:?}")]
    InvalidHits { filename: String, value: String },
    #[error("coverage record for {filename} has no line records")]
    EmptyRecord { filename: String },
}

pub type ReportResult<T> = Result<T, ReportError>;

impl ReportError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn xml(details: impl fmt::Display) -> Self {
        Self::Xml(details.to_string())
    }
}

impl From<quick_xml::Error> for ReportError {
    fn from(err: quick_xml::Error) -> Self {
        ReportError::Xml(err.to_string())
    }
}

impl From<AttrError> for ReportError {
    fn from(err: AttrError) -> Self {
        ReportError::Xml(err.to_string())
    }
}
