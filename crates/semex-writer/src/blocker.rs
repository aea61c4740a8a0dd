//! Context blocker
//!
//! Buffers the output of selected contexts until a later decision either
//! flushes it downstream or discards it with the document.
//!
//! Downstream `open_context` is sent lazily, right before the first triple or
//! namespace that actually leaves the blocker, and `close_context` only for
//! contexts that sent something. A context that stays blocked until the end of
//! the document is dropped without any downstream event.

use std::collections::HashMap;

use semex_core::{ExtractionContext, Iri, Issue, Triple};

use crate::{HandlerError, Result, TripleHandler};

#[derive(Debug, Default)]
struct ValvedPipe {
    triples: Vec<(Triple, Option<Iri>)>,
    namespaces: Vec<(String, String)>,
    blocked: bool,
    sent: bool,
    closed_upstream: bool,
    closed_downstream: bool,
}

impl ValvedPipe {
    fn ensure_open<H: TripleHandler>(
        &mut self,
        wrapped: &mut H,
        context: &ExtractionContext,
    ) -> Result<()> {
        if !self.sent {
            wrapped.open_context(context)?;
            self.sent = true;
        }
        Ok(())
    }

    fn send_triple<H: TripleHandler>(
        &mut self,
        wrapped: &mut H,
        context: &ExtractionContext,
        triple: &Triple,
        graph: Option<&Iri>,
    ) -> Result<()> {
        self.ensure_open(wrapped, context)?;
        wrapped.receive_triple(triple, graph, context)
    }

    fn send_namespace<H: TripleHandler>(
        &mut self,
        wrapped: &mut H,
        context: &ExtractionContext,
        prefix: &str,
        namespace: &str,
    ) -> Result<()> {
        self.ensure_open(wrapped, context)?;
        wrapped.receive_namespace(prefix, namespace, context)
    }

    /// Close downstream if the context sent anything and was not closed yet
    fn finish<H: TripleHandler>(
        &mut self,
        wrapped: &mut H,
        context: &ExtractionContext,
    ) -> Result<()> {
        if self.sent && !self.closed_downstream {
            self.closed_downstream = true;
            wrapped.close_context(context)?;
        }
        Ok(())
    }

    /// Flush buffered namespaces, then triples, and switch to passthrough
    fn unblock<H: TripleHandler>(
        &mut self,
        wrapped: &mut H,
        context: &ExtractionContext,
    ) -> Result<()> {
        if !self.blocked {
            return Ok(());
        }
        self.blocked = false;

        for (prefix, namespace) in std::mem::take(&mut self.namespaces) {
            self.send_namespace(wrapped, context, &prefix, &namespace)?;
        }
        for (triple, graph) in std::mem::take(&mut self.triples) {
            self.send_triple(wrapped, context, &triple, graph.as_ref())?;
        }

        if self.closed_upstream {
            self.finish(wrapped, context)?;
        }
        Ok(())
    }
}

/// Per-context buffering decorator
pub struct ExtractionContextBlocker<H> {
    wrapped: H,
    pipes: HashMap<ExtractionContext, ValvedPipe>,
    /// Contexts in opening order
    order: Vec<ExtractionContext>,
    document_unblocked: bool,
}

impl<H: TripleHandler> ExtractionContextBlocker<H> {
    pub fn new(wrapped: H) -> Self {
        Self {
            wrapped,
            pipes: HashMap::new(),
            order: Vec::new(),
            document_unblocked: false,
        }
    }

    /// True until `unblock_document` is called for the current document
    pub fn is_document_blocked(&self) -> bool {
        !self.document_unblocked
    }

    /// Start buffering `context`. Ignored once the document is unblocked.
    pub fn block_context(&mut self, context: &ExtractionContext) -> Result<()> {
        if self.document_unblocked {
            return Ok(());
        }
        self.pipe_mut(context)?.blocked = true;
        Ok(())
    }

    /// Flush `context` and let its future output pass straight through
    pub fn unblock_context(&mut self, context: &ExtractionContext) -> Result<()> {
        let pipe = self
            .pipes
            .get_mut(context)
            .ok_or_else(|| HandlerError::ContextNotOpen(context.unique_id()))?;
        pipe.unblock(&mut self.wrapped, context)
    }

    /// Unblock every context of the current document; later calls are no-ops
    pub fn unblock_document(&mut self) -> Result<()> {
        if self.document_unblocked {
            return Ok(());
        }
        self.document_unblocked = true;
        for context in &self.order {
            if let Some(pipe) = self.pipes.get_mut(context) {
                pipe.unblock(&mut self.wrapped, context)?;
            }
        }
        Ok(())
    }

    pub fn get_ref(&self) -> &H {
        &self.wrapped
    }

    pub fn get_mut(&mut self) -> &mut H {
        &mut self.wrapped
    }

    pub fn into_inner(self) -> H {
        self.wrapped
    }

    fn pipe_mut(&mut self, context: &ExtractionContext) -> Result<&mut ValvedPipe> {
        let pipe = self
            .pipes
            .get_mut(context)
            .ok_or_else(|| HandlerError::ContextNotOpen(context.unique_id()))?;
        if pipe.closed_upstream {
            return Err(HandlerError::ContextClosed(context.unique_id()));
        }
        Ok(pipe)
    }

    /// Close every context that sent data, discard the rest
    fn close_document(&mut self) -> Result<()> {
        let order = std::mem::take(&mut self.order);
        let mut pipes = std::mem::take(&mut self.pipes);
        self.document_unblocked = false;

        for context in &order {
            if let Some(pipe) = pipes.get_mut(context) {
                if pipe.blocked && !pipe.triples.is_empty() {
                    tracing::debug!(
                        "Discarding {} blocked triples of {}",
                        pipe.triples.len(),
                        context.unique_id()
                    );
                }
                pipe.finish(&mut self.wrapped, context)?;
            }
        }
        Ok(())
    }
}

impl<H: TripleHandler> TripleHandler for ExtractionContextBlocker<H> {
    fn start_document(&mut self, document: &Iri) -> Result<()> {
        self.close_document()?;
        self.wrapped.start_document(document)
    }

    fn open_context(&mut self, context: &ExtractionContext) -> Result<()> {
        match self.pipes.get(context) {
            Some(pipe) if pipe.closed_upstream => {
                Err(HandlerError::ContextClosed(context.unique_id()))
            }
            Some(_) => Ok(()),
            None => {
                self.pipes.insert(context.clone(), ValvedPipe::default());
                self.order.push(context.clone());
                Ok(())
            }
        }
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        context: &ExtractionContext,
    ) -> Result<()> {
        let pipe = self
            .pipes
            .get_mut(context)
            .ok_or_else(|| HandlerError::ContextNotOpen(context.unique_id()))?;
        if pipe.closed_upstream {
            return Err(HandlerError::ContextClosed(context.unique_id()));
        }
        if pipe.blocked {
            pipe.triples.push((triple.clone(), graph.cloned()));
            Ok(())
        } else {
            pipe.send_triple(&mut self.wrapped, context, triple, graph)
        }
    }

    fn receive_namespace(
        &mut self,
        prefix: &str,
        namespace: &str,
        context: &ExtractionContext,
    ) -> Result<()> {
        let pipe = self
            .pipes
            .get_mut(context)
            .ok_or_else(|| HandlerError::ContextNotOpen(context.unique_id()))?;
        if pipe.closed_upstream {
            return Err(HandlerError::ContextClosed(context.unique_id()));
        }
        if pipe.blocked {
            pipe.namespaces
                .push((prefix.to_string(), namespace.to_string()));
            Ok(())
        } else {
            pipe.send_namespace(&mut self.wrapped, context, prefix, namespace)
        }
    }

    fn close_context(&mut self, context: &ExtractionContext) -> Result<()> {
        let pipe = self
            .pipes
            .get_mut(context)
            .ok_or_else(|| HandlerError::ContextNotOpen(context.unique_id()))?;
        pipe.closed_upstream = true;
        if !pipe.blocked {
            pipe.finish(&mut self.wrapped, context)?;
        }
        Ok(())
    }

    fn end_document(&mut self, document: &Iri) -> Result<()> {
        self.close_document()?;
        self.wrapped.end_document(document)
    }

    fn receive_issue(&mut self, issue: &Issue) -> Result<()> {
        self.wrapped.receive_issue(issue)
    }

    fn close(&mut self) -> Result<()> {
        self.close_document()?;
        self.wrapped.close()
    }
}
