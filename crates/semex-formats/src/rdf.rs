//! N-Quads and N-Triples extractors
//!
//! Both read the document line by line and hand each line to the `oxttl`
//! parser of their syntax. A malformed statement becomes an ERROR issue at
//! its line and column and the line is skipped; with stop-at-first-error the
//! extractor gives up instead.

use std::io::{BufRead, BufReader};

use semex_core::{ExtractionContext, ExtractionParameters, IssueLevel, MimeType, Quad};
use semex_extractor::{
    ExtractionError, ExtractionInput, ExtractionResult, Extractor, ExtractorDescription,
    ExtractorFactory, ExtractorKind, Result,
};
use semex_writer::{parse_nquads_line, parse_ntriples_line, HandlerError};

pub const NQUADS_EXTRACTOR: &str = "rdf-nq";
pub const NTRIPLES_EXTRACTOR: &str = "rdf-nt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    NQuads,
    NTriples,
}

/// Line-based RDF statement extractor
#[derive(Debug)]
pub struct StatementExtractor {
    syntax: Syntax,
    stop_at_first_error: bool,
}

impl StatementExtractor {
    pub fn nquads() -> Self {
        Self {
            syntax: Syntax::NQuads,
            stop_at_first_error: false,
        }
    }

    pub fn ntriples() -> Self {
        Self {
            syntax: Syntax::NTriples,
            stop_at_first_error: false,
        }
    }

    pub fn nquads_factory() -> ExtractorFactory {
        let description = ExtractorDescription::new(NQUADS_EXTRACTOR, ExtractorKind::Content)
            .with_type(mime("application/n-quads"))
            .with_type(mime("text/x-nquads;q=0.1"))
            .with_type(mime("text/nquads;q=0.1"));
        ExtractorFactory::new(description, || Box::new(Self::nquads()))
    }

    pub fn ntriples_factory() -> ExtractorFactory {
        let description = ExtractorDescription::new(NTRIPLES_EXTRACTOR, ExtractorKind::Content)
            .with_type(mime("application/n-triples"))
            .with_type(mime("text/nt;q=0.1"))
            .with_type(mime("text/ntriples;q=0.1"))
            .with_type(mime("text/plain;q=0.1"));
        ExtractorFactory::new(description, || Box::new(Self::ntriples()))
    }

    fn name(&self) -> &'static str {
        match self.syntax {
            Syntax::NQuads => NQUADS_EXTRACTOR,
            Syntax::NTriples => NTRIPLES_EXTRACTOR,
        }
    }

    /// Record a bad line, or give up when stopping at the first error
    fn bad_line(
        &self,
        result: &mut ExtractionResult<'_>,
        message: String,
        line: u32,
        column: u32,
    ) -> Result<()> {
        if self.stop_at_first_error {
            return Err(ExtractionError::extractor(
                self.name(),
                format!("line {line}, column {column}: {message}"),
            ));
        }
        result.notify_issue_at(IssueLevel::Error, message, line, column);
        Ok(())
    }
}

pub(crate) fn mime(value: &str) -> MimeType {
    MimeType::parse(value).unwrap_or_else(|_| MimeType::octet_stream())
}

impl Extractor for StatementExtractor {
    fn run(
        &mut self,
        _parameters: &ExtractionParameters,
        context: &ExtractionContext,
        input: ExtractionInput<'_>,
        result: &mut ExtractionResult<'_>,
    ) -> Result<()> {
        let ExtractionInput::Content(stream) = input else {
            return Err(ExtractionError::extractor(self.name(), "expected a byte stream"));
        };

        let mut statements = 0usize;
        for (index, line) in BufReader::new(stream).lines().enumerate() {
            let line_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let line = match line {
                Ok(line) => line,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    self.bad_line(result, "invalid UTF-8".to_string(), line_number, 1)?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let parsed = match self.syntax {
                Syntax::NQuads => parse_nquads_line(&line, line_number),
                Syntax::NTriples => parse_ntriples_line(&line, line_number)
                    .map(|triple| triple.map(|triple| Quad::new(triple, None))),
            };
            match parsed {
                Ok(None) => {}
                Ok(Some(quad)) => {
                    result.write_quad(&quad)?;
                    statements += 1;
                }
                Err(HandlerError::Parse {
                    line,
                    column,
                    message,
                }) => self.bad_line(result, message, line, column)?,
                Err(other) => return Err(ExtractionError::extractor(self.name(), other.to_string())),
            }
        }

        tracing::debug!(
            "{} read {} statements from {}",
            self.name(),
            statements,
            context.document_iri()
        );
        Ok(())
    }

    fn set_stop_at_first_error(&mut self, stop: bool) {
        self.stop_at_first_error = stop;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semex_core::Iri;
    use semex_writer::{CountingTripleHandler, NullTripleHandler};
    use std::io::Cursor;

    fn run(
        extractor: &mut StatementExtractor,
        text: &str,
    ) -> (Result<()>, Vec<semex_core::Issue>, usize) {
        let context = ExtractionContext::new(
            extractor.name(),
            Iri::new("http://example.org/data").unwrap(),
        );
        let mut counting = CountingTripleHandler::new(NullTripleHandler);
        let mut stream = Cursor::new(text.as_bytes().to_vec());
        let mut result = ExtractionResult::new(context.clone(), &[], &mut counting);
        let outcome = extractor.run(
            &ExtractionParameters::default(),
            &context,
            ExtractionInput::Content(&mut stream),
            &mut result,
        );
        result.close().unwrap();
        let issues = result.take_issues();
        drop(result);
        (outcome, issues, counting.count())
    }

    const MIXED: &str = "<http://s> <http://p> \"a\" .\n\
                         this is not a statement\n\
                         # comment\n\
                         _:b <http://p> <http://o> <http://g> .\n";

    #[test]
    fn test_nquads_skips_bad_lines() {
        let (outcome, issues, count) = run(&mut StatementExtractor::nquads(), MIXED);
        assert!(outcome.is_ok());
        assert_eq!(count, 2);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].level, IssueLevel::Error);
        assert_eq!(issues[0].location.map(|l| l.line), Some(2));
    }

    #[test]
    fn test_ntriples_rejects_graph_names() {
        let (outcome, issues, count) = run(&mut StatementExtractor::ntriples(), MIXED);
        assert!(outcome.is_ok());
        assert_eq!(count, 1);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[1].location.map(|l| l.line), Some(4));
    }

    #[test]
    fn test_stop_at_first_error() {
        let mut extractor = StatementExtractor::nquads();
        extractor.set_stop_at_first_error(true);
        let (outcome, issues, count) = run(&mut extractor, MIXED);
        let err = outcome.unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("line 2"));
        assert!(issues.is_empty());
        assert_eq!(count, 1);
    }

    #[test]
    fn test_factories() {
        let nq = StatementExtractor::nquads_factory();
        assert_eq!(nq.name(), "rdf-nq");
        let nt = StatementExtractor::ntriples_factory();
        assert!(nt
            .description()
            .supported_types()
            .iter()
            .any(|t| t.full_type() == "text/plain" && t.quality() < 1.0));
    }
}
