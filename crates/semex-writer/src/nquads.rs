//! N-Triples / N-Quads serialization and line parsing on `oxttl`
//!
//! One statement per line: `<s> <p> <o> [<g>] .`, blank nodes as `_:label`,
//! literals as `"value"` with an optional `@lang` or `^^<datatype>`.

use std::io::Write;

use oxttl::{NQuadsParser, NQuadsSerializer, NTriplesParser, NTriplesSerializer, TurtleParseError};
use semex_core::{ExtractionContext, Iri, Quad, Triple};

use crate::{FormatWriter, HandlerError, Result, TripleHandler};

pub const NQUADS_MIME_TYPE: &str = "application/n-quads";
pub const NTRIPLES_MIME_TYPE: &str = "application/n-triples";

// ============================================================================
// Serialization
// ============================================================================

fn serialize_quad(out: &mut impl Write, quad: &oxrdf::Quad) -> std::io::Result<()> {
    let mut serializer = NQuadsSerializer::new().for_writer(out);
    serializer.serialize_quad(quad)?;
    let _ = serializer.finish();
    Ok(())
}

fn serialize_triple(out: &mut impl Write, triple: &oxrdf::Triple) -> std::io::Result<()> {
    let mut serializer = NTriplesSerializer::new().for_writer(out);
    serializer.serialize_triple(triple)?;
    let _ = serializer.finish();
    Ok(())
}

/// Format one statement, including the trailing ` .` but no newline
pub fn format_statement(triple: &Triple, graph: Option<&Iri>) -> String {
    let mut buffer = Vec::with_capacity(128);
    let written = match graph {
        Some(graph) => serialize_quad(
            &mut buffer,
            &Quad::new(triple.clone(), Some(graph.clone())).to_oxrdf(),
        ),
        None => serialize_triple(&mut buffer, &triple.to_oxrdf()),
    };
    if written.is_err() {
        return String::new();
    }
    let mut line = String::from_utf8_lossy(&buffer).into_owned();
    line.truncate(line.trim_end().len());
    line
}

// ============================================================================
// Writers
// ============================================================================

/// Writes N-Quads; the graph is the explicit graph or the document IRI
pub struct NQuadsWriter<W> {
    out: W,
}

impl<W: Write + Send> NQuadsWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> TripleHandler for NQuadsWriter<W> {
    fn start_document(&mut self, _document: &Iri) -> Result<()> {
        Ok(())
    }

    fn open_context(&mut self, _context: &ExtractionContext) -> Result<()> {
        Ok(())
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        context: &ExtractionContext,
    ) -> Result<()> {
        let graph = graph.unwrap_or(context.document_iri());
        let quad = Quad::new(triple.clone(), Some(graph.clone()));
        serialize_quad(&mut self.out, &quad.to_oxrdf())?;
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
        self.out.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> FormatWriter for NQuadsWriter<W> {
    fn mime_type(&self) -> &'static str {
        NQUADS_MIME_TYPE
    }

    fn supports_quads(&self) -> bool {
        true
    }
}

/// Writes N-Triples; graph names are dropped
pub struct NTriplesWriter<W> {
    out: W,
}

impl<W: Write + Send> NTriplesWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> TripleHandler for NTriplesWriter<W> {
    fn start_document(&mut self, _document: &Iri) -> Result<()> {
        Ok(())
    }

    fn open_context(&mut self, _context: &ExtractionContext) -> Result<()> {
        Ok(())
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        _graph: Option<&Iri>,
        _context: &ExtractionContext,
    ) -> Result<()> {
        serialize_triple(&mut self.out, &triple.to_oxrdf())?;
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
        self.out.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> FormatWriter for NTriplesWriter<W> {
    fn mime_type(&self) -> &'static str {
        NTRIPLES_MIME_TYPE
    }

    fn supports_quads(&self) -> bool {
        false
    }
}

// ============================================================================
// Parsing
// ============================================================================

fn parse_error(error: TurtleParseError, line: u32) -> HandlerError {
    match error {
        TurtleParseError::Syntax(e) => HandlerError::Parse {
            line,
            column: u32::try_from(e.location().start.column + 1).unwrap_or(u32::MAX),
            message: e.to_string(),
        },
        TurtleParseError::Io(e) => HandlerError::Io(e),
    }
}

fn term_error(error: semex_core::SemexError, line: u32) -> HandlerError {
    HandlerError::Parse {
        line,
        column: 1,
        message: error.to_string(),
    }
}

/// The single statement of `line`, if any
fn single<T>(
    mut statements: impl Iterator<Item = std::result::Result<T, TurtleParseError>>,
    line: u32,
) -> Result<Option<T>> {
    let Some(first) = statements.next() else {
        return Ok(None);
    };
    let first = first.map_err(|e| parse_error(e, line))?;
    if statements.next().is_some() {
        return Err(HandlerError::Parse {
            line,
            column: 1,
            message: "more than one statement on a line".to_string(),
        });
    }
    Ok(Some(first))
}

/// Parse one N-Quads line; `None` for blank and comment lines
pub fn parse_nquads_line(line: &str, line_number: u32) -> Result<Option<Quad>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let parsed = single(NQuadsParser::new().for_reader(line.as_bytes()), line_number)?;
    parsed
        .map(|quad| Quad::try_from(quad).map_err(|e| term_error(e, line_number)))
        .transpose()
}

/// Parse one N-Triples line; graph names are syntax errors
pub fn parse_ntriples_line(line: &str, line_number: u32) -> Result<Option<Triple>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let parsed = single(NTriplesParser::new().for_reader(line.as_bytes()), line_number)?;
    parsed
        .map(|triple| Triple::try_from(triple).map_err(|e| term_error(e, line_number)))
        .transpose()
}

/// Parse a whole N-Quads (or N-Triples) document, failing on the first error
pub fn parse_nquads(text: &str) -> Result<Vec<Quad>> {
    let mut quads = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
        if let Some(quad) = parse_nquads_line(line, line_number)? {
            quads.push(quad);
        }
    }
    Ok(quads)
}
