//! The sink an extractor writes into
//!
//! An [`ExtractionResult`] is bound to one extractor's document context and
//! to the output pipeline. Contexts are opened on the output lazily, right
//! before their first triple or namespace, and the extractor's prefixes are
//! announced at that point. Nested contexts come from
//! [`ExtractionResult::open_sub_result`]; closing a scope closes the scopes
//! nested in it first.

use semex_core::{
    ExtractionContext, Iri, Issue, IssueLevel, Quad, Subject, Term, Triple,
};
use semex_writer::TripleHandler;

use crate::{ExtractionError, Result};

#[derive(Debug)]
struct Scope {
    context: ExtractionContext,
    parent: Option<usize>,
    opened: bool,
    closed: bool,
}

pub struct ExtractionResult<'h> {
    output: &'h mut dyn TripleHandler,
    prefixes: Vec<(String, String)>,
    /// Index 0 is the document context
    scopes: Vec<Scope>,
    issues: Vec<Issue>,
    triples: usize,
}

impl<'h> ExtractionResult<'h> {
    pub fn new(
        context: ExtractionContext,
        prefixes: &[(String, String)],
        output: &'h mut dyn TripleHandler,
    ) -> Self {
        Self {
            output,
            prefixes: prefixes.to_vec(),
            scopes: vec![Scope {
                context,
                parent: None,
                opened: false,
                closed: false,
            }],
            issues: Vec::new(),
            triples: 0,
        }
    }

    /// The document context this result is bound to
    pub fn context(&self) -> &ExtractionContext {
        &self.scopes[0].context
    }

    pub fn write_triple(
        &mut self,
        subject: impl Into<Subject>,
        predicate: Iri,
        object: impl Into<Term>,
    ) -> Result<()> {
        let triple = Triple::new(subject, predicate, object);
        self.write_in(0, &triple, None)
    }

    /// Write a triple into an explicit graph
    pub fn write_quad(&mut self, quad: &Quad) -> Result<()> {
        self.write_in(0, &quad.triple, quad.graph.as_ref())
    }

    pub fn write_namespace(&mut self, prefix: &str, namespace: &str) -> Result<()> {
        self.namespace_in(0, prefix, namespace)
    }

    pub fn notify_issue(&mut self, level: IssueLevel, message: impl Into<String>) {
        let issue = Issue::new(level, message, self.context().clone());
        self.issues.push(issue);
    }

    /// Report an issue at a 1-based position
    pub fn notify_issue_at(
        &mut self,
        level: IssueLevel,
        message: impl Into<String>,
        line: u32,
        column: u32,
    ) {
        let issue = Issue::new(level, message, self.context().clone()).at(line, column);
        self.issues.push(issue);
    }

    /// Open a nested scope; `local_id` must be unique within the result
    pub fn open_sub_result(&mut self, local_id: &str) -> Result<SubResult<'_, 'h>> {
        let index = self.add_scope(0, local_id)?;
        Ok(SubResult {
            result: self,
            index,
        })
    }

    /// Close every scope, nested ones first. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        self.close_scope(0)
    }

    pub fn is_closed(&self) -> bool {
        self.scopes[0].closed
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn take_issues(&mut self) -> Vec<Issue> {
        std::mem::take(&mut self.issues)
    }

    /// Triples written through this result and its sub results
    pub fn triple_count(&self) -> usize {
        self.triples
    }

    fn add_scope(&mut self, parent: usize, local_id: &str) -> Result<usize> {
        let parent_scope = &self.scopes[parent];
        if parent_scope.closed {
            return Err(ExtractionError::ContextClosed(parent_scope.context.unique_id()));
        }
        let context = parent_scope.context.nested(local_id);
        if self.scopes.iter().any(|s| s.context == context) {
            return Err(ExtractionError::DuplicateContext(context.unique_id()));
        }
        self.scopes.push(Scope {
            context,
            parent: Some(parent),
            opened: false,
            closed: false,
        });
        Ok(self.scopes.len() - 1)
    }

    fn ensure_open(&mut self, index: usize) -> Result<()> {
        let scope = &mut self.scopes[index];
        if scope.closed {
            return Err(ExtractionError::ContextClosed(scope.context.unique_id()));
        }
        if !scope.opened {
            scope.opened = true;
            self.output.open_context(&scope.context)?;
            for (prefix, namespace) in &self.prefixes {
                self.output
                    .receive_namespace(prefix, namespace, &scope.context)?;
            }
        }
        Ok(())
    }

    fn write_in(&mut self, index: usize, triple: &Triple, graph: Option<&Iri>) -> Result<()> {
        self.ensure_open(index)?;
        self.output
            .receive_triple(triple, graph, &self.scopes[index].context)?;
        self.triples += 1;
        Ok(())
    }

    fn namespace_in(&mut self, index: usize, prefix: &str, namespace: &str) -> Result<()> {
        self.ensure_open(index)?;
        self.output
            .receive_namespace(prefix, namespace, &self.scopes[index].context)?;
        Ok(())
    }

    fn close_scope(&mut self, index: usize) -> Result<()> {
        if self.scopes[index].closed {
            return Ok(());
        }
        let children: Vec<usize> = (index + 1..self.scopes.len())
            .filter(|&i| self.scopes[i].parent == Some(index))
            .collect();
        for child in children.into_iter().rev() {
            self.close_scope(child)?;
        }

        let scope = &mut self.scopes[index];
        scope.closed = true;
        if scope.opened {
            self.output.close_context(&scope.context)?;
        }
        Ok(())
    }
}

/// A nested scope borrowed from its [`ExtractionResult`]
pub struct SubResult<'r, 'h> {
    result: &'r mut ExtractionResult<'h>,
    index: usize,
}

impl<'r, 'h> SubResult<'r, 'h> {
    pub fn context(&self) -> &ExtractionContext {
        &self.result.scopes[self.index].context
    }

    pub fn write_triple(
        &mut self,
        subject: impl Into<Subject>,
        predicate: Iri,
        object: impl Into<Term>,
    ) -> Result<()> {
        let triple = Triple::new(subject, predicate, object);
        self.result.write_in(self.index, &triple, None)
    }

    pub fn write_quad(&mut self, quad: &Quad) -> Result<()> {
        self.result
            .write_in(self.index, &quad.triple, quad.graph.as_ref())
    }

    pub fn write_namespace(&mut self, prefix: &str, namespace: &str) -> Result<()> {
        self.result.namespace_in(self.index, prefix, namespace)
    }

    /// Issues land in the parent result's list
    pub fn notify_issue(&mut self, level: IssueLevel, message: impl Into<String>) {
        let issue = Issue::new(level, message, self.context().clone());
        self.result.issues.push(issue);
    }

    pub fn open_sub_result(&mut self, local_id: &str) -> Result<SubResult<'_, 'h>> {
        let index = self.result.add_scope(self.index, local_id)?;
        Ok(SubResult {
            result: &mut *self.result,
            index,
        })
    }

    pub fn close(self) -> Result<()> {
        self.result.close_scope(self.index)
    }
}
