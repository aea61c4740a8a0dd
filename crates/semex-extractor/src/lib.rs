//! Semex Extractor - extraction orchestration
//!
//! Drives documents through the registered extractors:
//! - [`Extractor`] trait and the descriptors/factories they register with
//! - [`ExtractorRegistry`] and MIME-filtered [`ExtractorGroup`]s
//! - [`ExtractionResult`], the sink an extractor writes into
//! - [`DocumentSource`] implementations and the [`MimeDetector`] seam
//! - [`SingleDocumentExtraction`] for one document, and ZIP / WARC batch
//!   extraction on top of it
//! - [`Semex`], the shareable facade

use semex_core::SemexError;
use semex_writer::HandlerError;
use thiserror::Error;

pub mod archive;
pub mod detect;
pub mod extractor;
pub mod facade;
pub mod orchestrator;
pub mod registry;
pub mod result;
pub mod source;

pub use archive::{BatchItem, BatchOutcome, BatchReport, WarcArchiveExtraction, ZipArchiveExtraction};
pub use detect::{HeuristicMimeDetector, MimeDetector};
pub use extractor::{ExtractionInput, Extractor, ExtractorDescription, ExtractorKind};
pub use facade::Semex;
pub use orchestrator::{ExtractionReport, ExtractorOutcome, ExtractorStatus, SingleDocumentExtraction};
pub use registry::{ExtractorFactory, ExtractorGroup, ExtractorRegistry};
pub use result::ExtractionResult;
pub use source::{
    ByteArrayDocumentSource, DocumentSource, FileDocumentSource, MemCopyDocumentSource,
    StreamDocumentSource, StringDocumentSource,
};

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while extracting
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The document source could not be opened or read
    #[error("IO error reading document: {0}")]
    Io(#[from] std::io::Error),

    /// The output pipeline failed; always fatal
    #[error("Output handler failed: {0}")]
    Handler(#[from] HandlerError),

    /// An extractor gave up on the document
    #[error("Extractor {extractor} failed: {message}")]
    Extractor { extractor: String, message: String },

    /// An extractor built an invalid term from its input
    #[error("Invalid term: {0}")]
    Term(#[from] SemexError),

    #[error("Context already closed: {0}")]
    ContextClosed(String),

    #[error("Duplicate context: {0}")]
    DuplicateContext(String),

    #[error("Invalid document IRI {0:?}")]
    InvalidDocumentIri(String),

    #[error("An extractor named {0:?} is already registered")]
    DuplicateName(String),

    #[error("Unknown extractor: {0}")]
    UnknownExtractor(String),

    /// Malformed archive container
    #[error("Archive error: {0}")]
    Archive(String),
}

impl ExtractionError {
    /// Shorthand for an extractor-level failure
    pub fn extractor(extractor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extractor {
            extractor: extractor.into(),
            message: message.into(),
        }
    }

    /// Failures that must abort the whole run rather than a single extractor
    /// or archive item
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Handler(_))
    }
}

impl From<zip::result::ZipError> for ExtractionError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => Self::Io(io),
            other => Self::Archive(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
