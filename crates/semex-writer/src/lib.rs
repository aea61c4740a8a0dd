//! Semex Writer - triple handler pipeline
//!
//! Everything downstream of an extractor implements [`TripleHandler`]:
//! - Decorators: counting, reporting, logging, context blocking and the two
//!   output filters built on top of the blocker
//! - Fan-out: [`CompositeTripleHandler`]
//! - Writers: N-Quads, N-Triples and JSON serializers
//!
//! Decorators own the handler they wrap, so a pipeline is a linear chain that
//! ends in a writer.

use semex_core::{ExtractionContext, Iri, Issue, Triple};
use thiserror::Error;

pub mod blocker;
pub mod composite;
pub mod counting;
pub mod filter;
pub mod json;
pub mod logging;
pub mod nquads;
pub mod registry;
pub mod reporting;

pub use blocker::ExtractionContextBlocker;
pub use composite::CompositeTripleHandler;
pub use counting::CountingTripleHandler;
pub use filter::{IgnoreAccidentalRdfa, IgnoreTitlesOfEmptyDocuments, XHTML_VOCAB};
pub use json::JsonWriter;
pub use logging::LoggingTripleHandler;
pub use nquads::{
    format_statement, parse_nquads, parse_nquads_line, parse_ntriples_line, NQuadsWriter,
    NTriplesWriter,
};
pub use registry::{create_writer, format_for_mime_type, writer_formats, WriterFormat};
pub use reporting::ReportingTripleHandler;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by triple handlers
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Writing to the underlying output failed
    #[error("IO error while writing output: {0}")]
    Io(#[from] std::io::Error),

    /// A triple or namespace arrived for a context that was never opened
    #[error("Context not open: {0}")]
    ContextNotOpen(String),

    /// A triple or namespace arrived for a context that was already closed
    #[error("Context already closed: {0}")]
    ContextClosed(String),

    #[error("Document not started")]
    DocumentNotStarted,

    #[error("Document already started: {0}")]
    DocumentAlreadyStarted(String),

    /// Malformed N-Quads / N-Triples input
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HandlerError>;

// ============================================================================
// Handler Traits
// ============================================================================

/// Consumer of the triple stream produced by an extraction run.
///
/// Calls for one document follow `start_document`, then for each context
/// `open_context`, its namespaces and triples, `close_context`, and finally
/// `end_document`. `close` releases the handler after the last document.
pub trait TripleHandler: Send {
    fn start_document(&mut self, document: &Iri) -> Result<()>;

    fn open_context(&mut self, context: &ExtractionContext) -> Result<()>;

    /// Receive a triple. `graph` is an explicit graph chosen by the extractor;
    /// writers fall back to the context's document IRI.
    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        context: &ExtractionContext,
    ) -> Result<()>;

    fn receive_namespace(
        &mut self,
        prefix: &str,
        namespace: &str,
        context: &ExtractionContext,
    ) -> Result<()>;

    fn close_context(&mut self, context: &ExtractionContext) -> Result<()>;

    fn end_document(&mut self, document: &Iri) -> Result<()>;

    /// Issue raised while extracting the current document
    fn receive_issue(&mut self, _issue: &Issue) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()>;
}

/// A handler that serializes the stream to a concrete syntax
pub trait FormatWriter: TripleHandler {
    /// MIME type of the produced output
    fn mime_type(&self) -> &'static str;

    /// Whether graph names survive serialization
    fn supports_quads(&self) -> bool;
}

impl<H: TripleHandler + ?Sized> TripleHandler for &mut H {
    fn start_document(&mut self, document: &Iri) -> Result<()> {
        (**self).start_document(document)
    }

    fn open_context(&mut self, context: &ExtractionContext) -> Result<()> {
        (**self).open_context(context)
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        context: &ExtractionContext,
    ) -> Result<()> {
        (**self).receive_triple(triple, graph, context)
    }

    fn receive_namespace(
        &mut self,
        prefix: &str,
        namespace: &str,
        context: &ExtractionContext,
    ) -> Result<()> {
        (**self).receive_namespace(prefix, namespace, context)
    }

    fn close_context(&mut self, context: &ExtractionContext) -> Result<()> {
        (**self).close_context(context)
    }

    fn end_document(&mut self, document: &Iri) -> Result<()> {
        (**self).end_document(document)
    }

    fn receive_issue(&mut self, issue: &Issue) -> Result<()> {
        (**self).receive_issue(issue)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<H: TripleHandler + ?Sized> TripleHandler for Box<H> {
    fn start_document(&mut self, document: &Iri) -> Result<()> {
        (**self).start_document(document)
    }

    fn open_context(&mut self, context: &ExtractionContext) -> Result<()> {
        (**self).open_context(context)
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        context: &ExtractionContext,
    ) -> Result<()> {
        (**self).receive_triple(triple, graph, context)
    }

    fn receive_namespace(
        &mut self,
        prefix: &str,
        namespace: &str,
        context: &ExtractionContext,
    ) -> Result<()> {
        (**self).receive_namespace(prefix, namespace, context)
    }

    fn close_context(&mut self, context: &ExtractionContext) -> Result<()> {
        (**self).close_context(context)
    }

    fn end_document(&mut self, document: &Iri) -> Result<()> {
        (**self).end_document(document)
    }

    fn receive_issue(&mut self, issue: &Issue) -> Result<()> {
        (**self).receive_issue(issue)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTripleHandler;

impl TripleHandler for NullTripleHandler {
    fn start_document(&mut self, _document: &Iri) -> Result<()> {
        Ok(())
    }

    fn open_context(&mut self, _context: &ExtractionContext) -> Result<()> {
        Ok(())
    }

    fn receive_triple(
        &mut self,
        _triple: &Triple,
        _graph: Option<&Iri>,
        _context: &ExtractionContext,
    ) -> Result<()> {
        Ok(())
    }

    fn receive_namespace(
        &mut self,
        _prefix: &str,
        _namespace: &str,
        _context: &ExtractionContext,
    ) -> Result<()> {
        Ok(())
    }

    fn close_context(&mut self, _context: &ExtractionContext) -> Result<()> {
        Ok(())
    }

    fn end_document(&mut self, _document: &Iri) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Test support
// ============================================================================

/// Recording handler shared by the unit tests of this crate
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        StartDocument(String),
        Open(String),
        Triple(String, String),
        Namespace(String, String),
        Close(String),
        EndDocument(String),
        Closed,
    }

    #[derive(Debug, Default)]
    pub struct Recorder {
        pub events: Vec<Event>,
    }

    impl Recorder {
        pub fn triples(&self) -> Vec<String> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Triple(_, p) => Some(p.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl TripleHandler for Recorder {
        fn start_document(&mut self, document: &Iri) -> Result<()> {
            self.events.push(Event::StartDocument(document.to_string()));
            Ok(())
        }

        fn open_context(&mut self, context: &ExtractionContext) -> Result<()> {
            self.events.push(Event::Open(context.unique_id()));
            Ok(())
        }

        fn receive_triple(
            &mut self,
            triple: &Triple,
            _graph: Option<&Iri>,
            context: &ExtractionContext,
        ) -> Result<()> {
            self.events
                .push(Event::Triple(context.unique_id(), triple.predicate.to_string()));
            Ok(())
        }

        fn receive_namespace(
            &mut self,
            prefix: &str,
            _namespace: &str,
            context: &ExtractionContext,
        ) -> Result<()> {
            self.events
                .push(Event::Namespace(context.unique_id(), prefix.to_string()));
            Ok(())
        }

        fn close_context(&mut self, context: &ExtractionContext) -> Result<()> {
            self.events.push(Event::Close(context.unique_id()));
            Ok(())
        }

        fn end_document(&mut self, document: &Iri) -> Result<()> {
            self.events.push(Event::EndDocument(document.to_string()));
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.events.push(Event::Closed);
            Ok(())
        }
    }

    pub fn iri(value: &str) -> Iri {
        Iri::new(value).unwrap()
    }

    pub fn doc() -> Iri {
        iri("http://example.org/doc")
    }

    pub fn ctx(extractor: &str) -> ExtractionContext {
        ExtractionContext::new(extractor, doc())
    }

    pub fn triple(predicate: &str) -> Triple {
        Triple::new(doc(), iri(predicate), iri("http://example.org/o"))
    }
}
