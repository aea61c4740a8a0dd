//! Shared test doubles: a recording handler and a few scripted extractors

#![allow(dead_code)]

use std::io::Read;

use semex_core::{
    ExtractionContext, ExtractionParameters, Iri, Issue, IssueLevel, Literal, MimeType, Triple,
};
use semex_extractor::{
    ExtractionError, ExtractionInput, ExtractionResult, Extractor, ExtractorDescription,
    ExtractorFactory, ExtractorKind, ExtractorRegistry,
};
use semex_writer::{format_statement, HandlerError, TripleHandler};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StartDocument(String),
    Open(ExtractionContext),
    Triple(ExtractionContext, String),
    Namespace(ExtractionContext, String),
    Close(ExtractionContext),
    EndDocument(String),
    Issue(IssueLevel, ExtractionContext),
    Closed,
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    /// Fail on the n-th triple, 1-based
    pub fail_on_triple: Option<usize>,
    triples: usize,
}

impl Recorder {
    pub fn failing_on_triple(n: usize) -> Self {
        Self {
            fail_on_triple: Some(n),
            ..Self::default()
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Triple(_, s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn contexts_with_triples(&self) -> Vec<ExtractionContext> {
        let mut out: Vec<ExtractionContext> = Vec::new();
        for event in &self.events {
            if let Event::Triple(ctx, _) = event {
                if !out.contains(ctx) {
                    out.push(ctx.clone());
                }
            }
        }
        out
    }

    pub fn count(&self, wanted: fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| wanted(e)).count()
    }
}

impl TripleHandler for Recorder {
    fn start_document(&mut self, document: &Iri) -> semex_writer::Result<()> {
        self.events.push(Event::StartDocument(document.to_string()));
        Ok(())
    }

    fn open_context(&mut self, context: &ExtractionContext) -> semex_writer::Result<()> {
        self.events.push(Event::Open(context.clone()));
        Ok(())
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        context: &ExtractionContext,
    ) -> semex_writer::Result<()> {
        self.triples += 1;
        if self.fail_on_triple == Some(self.triples) {
            return Err(HandlerError::Io(std::io::Error::other("disk full")));
        }
        self.events.push(Event::Triple(
            context.clone(),
            format_statement(triple, graph),
        ));
        Ok(())
    }

    fn receive_namespace(
        &mut self,
        prefix: &str,
        _namespace: &str,
        context: &ExtractionContext,
    ) -> semex_writer::Result<()> {
        self.events
            .push(Event::Namespace(context.clone(), prefix.to_string()));
        Ok(())
    }

    fn close_context(&mut self, context: &ExtractionContext) -> semex_writer::Result<()> {
        self.events.push(Event::Close(context.clone()));
        Ok(())
    }

    fn end_document(&mut self, document: &Iri) -> semex_writer::Result<()> {
        self.events.push(Event::EndDocument(document.to_string()));
        Ok(())
    }

    fn receive_issue(&mut self, issue: &Issue) -> semex_writer::Result<()> {
        self.events
            .push(Event::Issue(issue.level, issue.context.clone()));
        Ok(())
    }

    fn close(&mut self) -> semex_writer::Result<()> {
        self.events.push(Event::Closed);
        Ok(())
    }
}

pub fn iri(value: &str) -> Iri {
    Iri::new(value).unwrap()
}

pub const EX: &str = "http://example.org/vocab#";

/// Writes `<doc> ex:{name} "{byte count}"`, then one triple in a nested scope
pub struct Emit {
    name: &'static str,
}

impl Extractor for Emit {
    fn run(
        &mut self,
        _parameters: &ExtractionParameters,
        context: &ExtractionContext,
        input: ExtractionInput<'_>,
        result: &mut ExtractionResult<'_>,
    ) -> semex_extractor::Result<()> {
        let length = match input {
            ExtractionInput::Content(stream) => {
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf)?;
                buf.len()
            }
            ExtractionInput::Markup(text) => text.chars().count(),
            ExtractionInput::Blind => 0,
        };
        let doc = context.document_iri().clone();
        result.write_triple(
            doc.clone(),
            iri(&format!("{EX}{}", self.name)),
            Literal::new(length.to_string()),
        )?;
        let mut item = result.open_sub_result("item")?;
        item.write_triple(doc, iri(&format!("{EX}{}-item", self.name)), iri(EX))?;
        Ok(())
    }
}

/// Writes one triple, then gives up
pub struct Failing;

impl Extractor for Failing {
    fn run(
        &mut self,
        _parameters: &ExtractionParameters,
        context: &ExtractionContext,
        _input: ExtractionInput<'_>,
        result: &mut ExtractionResult<'_>,
    ) -> semex_extractor::Result<()> {
        result.write_triple(
            context.document_iri().clone(),
            iri(&format!("{EX}partial")),
            Literal::new("x"),
        )?;
        Err(ExtractionError::extractor(
            context.extractor_name(),
            "unexpected token",
        ))
    }
}

pub fn emit(name: &'static str, kind: ExtractorKind, types: &[&str]) -> ExtractorFactory {
    let description = types.iter().fold(
        ExtractorDescription::new(name, kind).with_prefix("ex", EX),
        |d, t| d.with_type(MimeType::parse(t).unwrap()),
    );
    ExtractorFactory::new(description, move || Box::new(Emit { name }))
}

pub fn failing(name: &'static str, types: &[&str]) -> ExtractorFactory {
    let description = types.iter().fold(
        ExtractorDescription::new(name, ExtractorKind::Content),
        |d, t| d.with_type(MimeType::parse(t).unwrap()),
    );
    ExtractorFactory::new(description, || Box::new(Failing))
}

/// first (content), second (failing), third (markup), all for text/plain
pub fn three_extractors() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();
    registry
        .register(emit("first", ExtractorKind::Content, &["text/plain"]))
        .unwrap();
    registry.register(failing("second", &["text/plain"])).unwrap();
    registry
        .register(emit("third", ExtractorKind::Markup, &["text/plain"]))
        .unwrap();
    registry
}
