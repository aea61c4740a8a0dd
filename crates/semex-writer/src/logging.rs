//! Per-document tracing summary

use std::collections::BTreeMap;

use semex_core::{ExtractionContext, Iri, Issue, Triple};

use crate::{Result, TripleHandler};

/// Logs, at the end of every document, how many triples each extractor
/// contributed and how many contexts it opened.
pub struct LoggingTripleHandler<H> {
    wrapped: H,
    triples: BTreeMap<String, usize>,
    contexts: BTreeMap<String, usize>,
}

impl<H: TripleHandler> LoggingTripleHandler<H> {
    pub fn new(wrapped: H) -> Self {
        Self {
            wrapped,
            triples: BTreeMap::new(),
            contexts: BTreeMap::new(),
        }
    }

    /// Triples seen per extractor in the current document
    pub fn triples_per_extractor(&self) -> &BTreeMap<String, usize> {
        &self.triples
    }

    pub fn get_ref(&self) -> &H {
        &self.wrapped
    }

    pub fn into_inner(self) -> H {
        self.wrapped
    }

    fn summary(&self) -> String {
        self.triples
            .iter()
            .map(|(name, count)| {
                let contexts = self.contexts.get(name).copied().unwrap_or(0);
                format!("{name}={count} ({contexts} contexts)")
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<H: TripleHandler> TripleHandler for LoggingTripleHandler<H> {
    fn start_document(&mut self, document: &Iri) -> Result<()> {
        self.triples.clear();
        self.contexts.clear();
        tracing::debug!("Start document {}", document);
        self.wrapped.start_document(document)
    }

    fn open_context(&mut self, context: &ExtractionContext) -> Result<()> {
        *self
            .contexts
            .entry(context.extractor_name().to_string())
            .or_default() += 1;
        self.wrapped.open_context(context)
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        context: &ExtractionContext,
    ) -> Result<()> {
        *self
            .triples
            .entry(context.extractor_name().to_string())
            .or_default() += 1;
        self.wrapped.receive_triple(triple, graph, context)
    }

    fn receive_namespace(
        &mut self,
        prefix: &str,
        namespace: &str,
        context: &ExtractionContext,
    ) -> Result<()> {
        self.wrapped.receive_namespace(prefix, namespace, context)
    }

    fn close_context(&mut self, context: &ExtractionContext) -> Result<()> {
        self.wrapped.close_context(context)
    }

    fn end_document(&mut self, document: &Iri) -> Result<()> {
        let total: usize = self.triples.values().sum();
        if total == 0 {
            tracing::info!("Document {}: no triples", document);
        } else {
            tracing::info!("Document {}: {} triples [{}]", document, total, self.summary());
        }
        self.wrapped.end_document(document)
    }

    fn receive_issue(&mut self, issue: &Issue) -> Result<()> {
        tracing::warn!("{}", issue);
        self.wrapped.receive_issue(issue)
    }

    fn close(&mut self) -> Result<()> {
        self.wrapped.close()
    }
}
