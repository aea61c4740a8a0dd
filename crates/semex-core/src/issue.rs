//! Issues reported while extracting a document
//!
//! Recoverable problems never unwind the extraction: extractors and the
//! orchestrator append [`Issue`]s to a report instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::ExtractionContext;

/// Severity of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Warning,
    Error,
    /// Fatal to the extractor that raised it, never to the whole run
    Fatal,
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
            Self::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Position of an issue inside the document, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// A single reported issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub level: IssueLevel,
    pub message: String,
    /// Context the issue was raised under
    pub context: ExtractionContext,
    pub location: Option<Location>,
}

impl Issue {
    pub fn new(level: IssueLevel, message: impl Into<String>, context: ExtractionContext) -> Self {
        Self {
            level,
            message: message.into(),
            context,
            location: None,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = Some(Location { line, column });
        self
    }

    pub fn extractor_name(&self) -> &str {
        self.context.extractor_name()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.context.unique_id(), self.message)?;
        if let Some(loc) = self.location {
            write!(f, " (line {}, column {})", loc.line, loc.column)?;
        }
        Ok(())
    }
}
