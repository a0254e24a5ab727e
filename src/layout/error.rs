//! Error types for loading and querying key layouts

use super::tokenizer::Location;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Category of a parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Malformed directive, bad number or unexpected token
    Syntax,
    /// Second mapping for an already mapped code, flag or config name
    DuplicateEntry,
    /// A symbolic label the resolver does not know
    UnknownLabel,
}

/// A diagnostic pinned to a line in the source file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {message}")]
pub struct ParseError {
    pub location: Location,
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    pub fn new(location: Location, kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            location,
            kind,
            message: message.into(),
        }
    }

    pub fn line(&self) -> usize {
        self.location.line
    }

    pub fn is_duplicate(&self) -> bool {
        self.kind == ParseErrorKind::DuplicateEntry
    }

    pub fn is_unknown_label(&self) -> bool {
        self.kind == ParseErrorKind::UnknownLabel
    }
}

/// Failure of a whole load
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Error opening key layout map file {}: {source}", .path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Not loading {filename} because required kernel config {config} is not enabled")]
    MissingKernelConfig {
        filename: String,
        config: String,
        /// Value reported by the host, `None` if the option is absent
        value: Option<String>,
    },

    #[error("Internal error loading key layout map: {0}")]
    Internal(String),
}

impl LayoutError {
    /// The parse diagnostic, if this load failed while parsing
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            LayoutError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Failure of a read-only query on a loaded layout
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Can't find abs code {0}.")]
    AbsCodeNotFound(i32),
}
