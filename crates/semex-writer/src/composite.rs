//! Fan-out handler

use semex_core::{ExtractionContext, Iri, Issue, Triple};

use crate::{Result, TripleHandler};

/// Forwards every call to each child, in the order the children were added.
///
/// Stream calls stop at the first failing child. `close` is attempted on every
/// child and the first error is returned once all of them were tried.
#[derive(Default)]
pub struct CompositeTripleHandler {
    children: Vec<Box<dyn TripleHandler>>,
}

impl CompositeTripleHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(children: Vec<Box<dyn TripleHandler>>) -> Self {
        Self { children }
    }

    pub fn add_child(&mut self, child: Box<dyn TripleHandler>) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Box<dyn TripleHandler>] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn each(&mut self, mut f: impl FnMut(&mut dyn TripleHandler) -> Result<()>) -> Result<()> {
        for child in &mut self.children {
            f(child.as_mut())?;
        }
        Ok(())
    }
}

impl TripleHandler for CompositeTripleHandler {
    fn start_document(&mut self, document: &Iri) -> Result<()> {
        self.each(|h| h.start_document(document))
    }

    fn open_context(&mut self, context: &ExtractionContext) -> Result<()> {
        self.each(|h| h.open_context(context))
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        context: &ExtractionContext,
    ) -> Result<()> {
        self.each(|h| h.receive_triple(triple, graph, context))
    }

    fn receive_namespace(
        &mut self,
        prefix: &str,
        namespace: &str,
        context: &ExtractionContext,
    ) -> Result<()> {
        self.each(|h| h.receive_namespace(prefix, namespace, context))
    }

    fn close_context(&mut self, context: &ExtractionContext) -> Result<()> {
        self.each(|h| h.close_context(context))
    }

    fn end_document(&mut self, document: &Iri) -> Result<()> {
        self.each(|h| h.end_document(document))
    }

    fn receive_issue(&mut self, issue: &Issue) -> Result<()> {
        self.each(|h| h.receive_issue(issue))
    }

    fn close(&mut self) -> Result<()> {
        let mut first_error = None;
        for (index, child) in self.children.iter_mut().enumerate() {
            if let Err(e) = child.close() {
                tracing::warn!("Child handler {} failed to close: {}", index, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
