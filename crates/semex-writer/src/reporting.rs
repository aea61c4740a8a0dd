//! Run report collector

use std::collections::BTreeSet;

use semex_core::{ExtractionContext, Iri, Issue, IssueLevel, Triple};

use crate::{Result, TripleHandler};

/// Records totals, contributing extractors and issues across documents.
pub struct ReportingTripleHandler<H> {
    wrapped: H,
    total_triples: usize,
    total_documents: usize,
    extractors: BTreeSet<String>,
    issues: Vec<Issue>,
}

impl<H: TripleHandler> ReportingTripleHandler<H> {
    pub fn new(wrapped: H) -> Self {
        Self {
            wrapped,
            total_triples: 0,
            total_documents: 0,
            extractors: BTreeSet::new(),
            issues: Vec::new(),
        }
    }

    pub fn total_triples(&self) -> usize {
        self.total_triples
    }

    pub fn total_documents(&self) -> usize {
        self.total_documents
    }

    /// Names of the extractors that produced at least one triple
    pub fn extractors(&self) -> &BTreeSet<String> {
        &self.extractors
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Issues at or above `level`
    pub fn issues_at_least(&self, level: IssueLevel) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.level >= level)
    }

    /// One-line summary
    pub fn print_report(&self) -> String {
        format!(
            "Total Documents: {}, Total Triples: {}",
            self.total_documents, self.total_triples
        )
    }

    pub fn get_ref(&self) -> &H {
        &self.wrapped
    }

    pub fn into_inner(self) -> H {
        self.wrapped
    }
}

impl<H: TripleHandler> TripleHandler for ReportingTripleHandler<H> {
    fn start_document(&mut self, document: &Iri) -> Result<()> {
        self.total_documents += 1;
        self.wrapped.start_document(document)
    }

    fn open_context(&mut self, context: &ExtractionContext) -> Result<()> {
        self.wrapped.open_context(context)
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        context: &ExtractionContext,
    ) -> Result<()> {
        self.total_triples += 1;
        if !self.extractors.contains(context.extractor_name()) {
            self.extractors.insert(context.extractor_name().to_string());
        }
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
        self.wrapped.end_document(document)
    }

    fn receive_issue(&mut self, issue: &Issue) -> Result<()> {
        self.issues.push(issue.clone());
        self.wrapped.receive_issue(issue)
    }

    fn close(&mut self) -> Result<()> {
        self.wrapped.close()
    }
}
