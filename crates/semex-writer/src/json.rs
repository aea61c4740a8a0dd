//! JSON quad-array writer
//!
//! One JSON object per document, on its own line:
//!
//! ```text
//! {"quads":[[{"type":"uri","value":"http://s"},"http://p",{"type":"literal","value":"v","lang":null,"datatype":null},null]]}
//! ```
//!
//! The fourth element of each quad is the explicit graph, or `null`.

use std::io::Write;

use serde::Serialize;

use semex_core::{ExtractionContext, Iri, Subject, Term, Triple};

use crate::{FormatWriter, HandlerError, Result, TripleHandler};

pub const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum JsonNode {
    Uri {
        value: String,
    },
    Bnode {
        value: String,
    },
    Literal {
        value: String,
        lang: Option<String>,
        datatype: Option<String>,
    },
}

impl From<&Subject> for JsonNode {
    fn from(subject: &Subject) -> Self {
        match subject {
            Subject::Iri(iri) => Self::Uri {
                value: iri.to_string(),
            },
            Subject::Blank(node) => Self::Bnode {
                value: node.label().to_string(),
            },
        }
    }
}

impl From<&Term> for JsonNode {
    fn from(term: &Term) -> Self {
        match term {
            Term::Iri(iri) => Self::Uri {
                value: iri.to_string(),
            },
            Term::Blank(node) => Self::Bnode {
                value: node.label().to_string(),
            },
            Term::Literal(literal) => Self::Literal {
                value: literal.value().to_string(),
                lang: literal.language().map(str::to_string),
                datatype: literal.datatype().map(Iri::to_string),
            },
        }
    }
}

type JsonQuad = (JsonNode, String, JsonNode, Option<String>);

#[derive(Debug, Serialize)]
struct JsonDocument {
    quads: Vec<JsonQuad>,
}

/// Buffers a document's quads and writes them as one JSON object at
/// `end_document`.
pub struct JsonWriter<W> {
    out: W,
    current: Option<JsonDocument>,
}

impl<W: Write + Send> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, current: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn document_mut(&mut self) -> Result<&mut JsonDocument> {
        self.current.as_mut().ok_or(HandlerError::DocumentNotStarted)
    }
}

impl<W: Write + Send> TripleHandler for JsonWriter<W> {
    fn start_document(&mut self, document: &Iri) -> Result<()> {
        if self.current.is_some() {
            return Err(HandlerError::DocumentAlreadyStarted(document.to_string()));
        }
        self.current = Some(JsonDocument { quads: Vec::new() });
        Ok(())
    }

    fn open_context(&mut self, _context: &ExtractionContext) -> Result<()> {
        Ok(())
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        _context: &ExtractionContext,
    ) -> Result<()> {
        let quad = (
            JsonNode::from(&triple.subject),
            triple.predicate.to_string(),
            JsonNode::from(&triple.object),
            graph.map(Iri::to_string),
        );
        self.document_mut()?.quads.push(quad);
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
        let document = self.current.take().ok_or(HandlerError::DocumentNotStarted)?;
        serde_json::to_writer(&mut self.out, &document)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(document) = self.current.take() {
            serde_json::to_writer(&mut self.out, &document)?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> FormatWriter for JsonWriter<W> {
    fn mime_type(&self) -> &'static str {
        JSON_MIME_TYPE
    }

    fn supports_quads(&self) -> bool {
        true
    }
}
