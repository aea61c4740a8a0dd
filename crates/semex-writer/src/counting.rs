//! Triple counter

use semex_core::{ExtractionContext, Iri, Issue, Triple};

use crate::{Result, TripleHandler};

/// Counts the triples flowing through without altering the stream
pub struct CountingTripleHandler<H> {
    wrapped: H,
    count: usize,
}

impl<H: TripleHandler> CountingTripleHandler<H> {
    pub fn new(wrapped: H) -> Self {
        Self { wrapped, count: 0 }
    }

    /// Triples received so far
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn get_ref(&self) -> &H {
        &self.wrapped
    }

    pub fn into_inner(self) -> H {
        self.wrapped
    }
}

impl<H: TripleHandler> TripleHandler for CountingTripleHandler<H> {
    fn start_document(&mut self, document: &Iri) -> Result<()> {
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
        self.count += 1;
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
        self.wrapped.receive_issue(issue)
    }

    fn close(&mut self) -> Result<()> {
        self.wrapped.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ctx, doc, triple, Recorder};

    #[test]
    fn test_counts_without_altering_stream() {
        let mut counter = CountingTripleHandler::new(Recorder::default());
        let c = ctx("x");
        counter.start_document(&doc()).unwrap();
        counter.open_context(&c).unwrap();
        counter.receive_namespace("ex", "http://ex/", &c).unwrap();
        counter.receive_triple(&triple("http://p/1"), None, &c).unwrap();
        counter.receive_triple(&triple("http://p/2"), None, &c).unwrap();
        counter.close_context(&c).unwrap();
        counter.end_document(&doc()).unwrap();

        assert_eq!(counter.count(), 2);
        assert_eq!(counter.get_ref().events.len(), 7);
        counter.reset();
        assert_eq!(counter.count(), 0);
    }
}
