//! Semex Core - RDF model, extraction contexts and shared types
//!
//! This crate defines the core abstractions used throughout semex:
//! - RDF terms, triples and quads
//! - Extraction contexts
//! - MIME types and accept-header reduction
//! - Issues reported during extraction
//! - Configuration management

pub mod config;
pub mod context;
pub mod issue;
pub mod mime;
pub mod model;

pub use config::{
    AppConfig, ConfigError, EnvOverrides, ExtractionParameters, FilterConfig, LoggingConfig,
    OutputConfig,
    OutputFormat,
};
pub use context::ExtractionContext;
pub use issue::{Issue, IssueLevel, Location};
pub use mime::{accept_header, MimeType, OCTET_STREAM};
pub use model::{is_absolute_iri, BlankNode, Iri, Literal, LiteralKind, Quad, Subject, Term, Triple};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for semex values
#[derive(Error, Debug)]
pub enum SemexError {
    #[error("Invalid IRI {value:?}: {reason}")]
    InvalidIri { value: String, reason: String },

    #[error("Invalid blank node label: {0:?}")]
    InvalidBlankNode(String),

    #[error("Invalid language tag: {0:?}")]
    InvalidLanguageTag(String),

    #[error("Unsupported RDF term: {0}")]
    UnsupportedTerm(String),

    #[error("Cannot parse MIME type (expected type/subtype[;q=x.y]): {0}")]
    InvalidMimeType(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, SemexError>;
