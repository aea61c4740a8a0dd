//! Extractor contract

use std::io::Read;

use semex_core::{ExtractionContext, ExtractionParameters, MimeType};

use crate::result::ExtractionResult;
use crate::Result;

/// What an extractor consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorKind {
    /// Reads the raw byte stream
    Content,
    /// Reads the decoded markup text
    Markup,
    /// Sees only the document IRI
    Blind,
}

impl std::fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Content => write!(f, "content"),
            Self::Markup => write!(f, "markup"),
            Self::Blind => write!(f, "blind"),
        }
    }
}

/// Immutable registration data of an extractor
#[derive(Debug, Clone)]
pub struct ExtractorDescription {
    name: String,
    kind: ExtractorKind,
    supported_types: Vec<MimeType>,
    /// Namespace prefixes announced when one of its contexts opens
    prefixes: Vec<(String, String)>,
}

impl ExtractorDescription {
    pub fn new(name: impl Into<String>, kind: ExtractorKind) -> Self {
        Self {
            name: name.into(),
            kind,
            supported_types: Vec::new(),
            prefixes: Vec::new(),
        }
    }

    pub fn with_type(mut self, mime_type: MimeType) -> Self {
        self.supported_types.push(mime_type);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.push((prefix.into(), namespace.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ExtractorKind {
        self.kind
    }

    pub fn supported_types(&self) -> &[MimeType] {
        &self.supported_types
    }

    pub fn prefixes(&self) -> &[(String, String)] {
        &self.prefixes
    }

    /// Best `(rank, quality)` among the supported types matching `mime_type`
    pub(crate) fn best_match(&self, mime_type: &MimeType) -> Option<(u8, f64)> {
        self.supported_types
            .iter()
            .filter_map(|t| t.match_rank(mime_type).map(|rank| (rank, t.quality())))
            .max_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)))
    }
}

/// Input handed to [`Extractor::run`], by extractor kind
pub enum ExtractionInput<'a> {
    Content(&'a mut dyn Read),
    Markup(&'a str),
    Blind,
}

impl std::fmt::Debug for ExtractionInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Content(_) => f.write_str("Content(..)"),
            Self::Markup(text) => write!(f, "Markup({} chars)", text.len()),
            Self::Blind => f.write_str("Blind"),
        }
    }
}

/// A pluggable converter from one document format to triples.
///
/// `run` writes through `result` only; the orchestrator opens and closes the
/// contexts. Recoverable problems go to `result.notify_issue`; an `Err`
/// abandons this extractor for the current document without affecting the
/// others.
pub trait Extractor: Send {
    fn run(
        &mut self,
        parameters: &ExtractionParameters,
        context: &ExtractionContext,
        input: ExtractionInput<'_>,
        result: &mut ExtractionResult<'_>,
    ) -> Result<()>;

    /// Halt the extractor's own parse loop at the first error
    fn set_stop_at_first_error(&mut self, _stop: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_match_prefers_rank_then_quality() {
        let description = ExtractorDescription::new("x", ExtractorKind::Content)
            .with_type(MimeType::any().with_quality(0.9))
            .with_type(MimeType::parse("text/*;q=0.2").unwrap())
            .with_type(MimeType::parse("text/html;q=0.1").unwrap());

        let html = MimeType::parse("text/html").unwrap();
        assert_eq!(description.best_match(&html), Some((2, 0.1)));

        let plain = MimeType::parse("text/plain").unwrap();
        assert_eq!(description.best_match(&plain), Some((1, 0.2)));

        let png = MimeType::parse("image/png").unwrap();
        assert_eq!(description.best_match(&png), Some((0, 0.9)));

        let none = ExtractorDescription::new("y", ExtractorKind::Blind);
        assert_eq!(none.best_match(&png), None);
    }
}
