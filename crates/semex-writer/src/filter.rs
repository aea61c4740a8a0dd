//! Output filters built on [`ExtractionContextBlocker`]
//!
//! - [`IgnoreAccidentalRdfa`] hides the output of a generic markup extractor
//!   until it produces a predicate outside a reserved vocabulary.
//! - [`IgnoreTitlesOfEmptyDocuments`] hides a document whose only output is
//!   its title.
//!
//! Both match extractors by exact name.

use semex_core::{ExtractionContext, FilterConfig, Iri, Issue, Triple};

use crate::blocker::ExtractionContextBlocker;
use crate::{Result, TripleHandler};

/// Default name of the accidental-markup extractor
pub const DEFAULT_ACCIDENTAL_EXTRACTOR: &str = "html-rdfa11";

/// Default name of the title extractor
pub const DEFAULT_TITLE_EXTRACTOR: &str = "html-head-title";

/// XHTML vocabulary namespace
pub const XHTML_VOCAB: &str = "http://www.w3.org/1999/xhtml/vocab#";

// ============================================================================
// Accidental markup
// ============================================================================

pub struct IgnoreAccidentalRdfa<H> {
    blocker: ExtractionContextBlocker<H>,
    extractor_name: String,
    reserved_namespace: String,
    stylesheet_predicate: String,
    always_suppress_css: bool,
}

impl<H: TripleHandler> IgnoreAccidentalRdfa<H> {
    pub fn new(
        wrapped: H,
        extractor_name: impl Into<String>,
        reserved_namespace: impl Into<String>,
        always_suppress_css: bool,
    ) -> Self {
        let reserved_namespace = reserved_namespace.into();
        Self {
            blocker: ExtractionContextBlocker::new(wrapped),
            extractor_name: extractor_name.into(),
            stylesheet_predicate: format!("{reserved_namespace}stylesheet"),
            reserved_namespace,
            always_suppress_css,
        }
    }

    /// Defaults: `html-rdfa11`, the XHTML vocabulary
    pub fn with_defaults(wrapped: H, always_suppress_css: bool) -> Self {
        Self::new(
            wrapped,
            DEFAULT_ACCIDENTAL_EXTRACTOR,
            XHTML_VOCAB,
            always_suppress_css,
        )
    }

    pub fn from_config(wrapped: H, config: &FilterConfig) -> Self {
        Self::new(
            wrapped,
            config.accidental_extractor.clone(),
            config.reserved_namespace.clone(),
            config.always_suppress_css_triples,
        )
    }

    pub fn get_ref(&self) -> &H {
        self.blocker.get_ref()
    }

    pub fn into_inner(self) -> H {
        self.blocker.into_inner()
    }

    fn is_accidental(&self, context: &ExtractionContext) -> bool {
        context.extractor_name() == self.extractor_name
    }
}

impl<H: TripleHandler> TripleHandler for IgnoreAccidentalRdfa<H> {
    fn start_document(&mut self, document: &Iri) -> Result<()> {
        self.blocker.start_document(document)
    }

    fn open_context(&mut self, context: &ExtractionContext) -> Result<()> {
        self.blocker.open_context(context)?;
        if self.is_accidental(context) {
            self.blocker.block_context(context)?;
        }
        Ok(())
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        context: &ExtractionContext,
    ) -> Result<()> {
        let predicate = triple.predicate.as_str();
        if self.is_accidental(context) && !predicate.starts_with(&self.reserved_namespace) {
            self.blocker.unblock_context(context)?;
        }
        if self.always_suppress_css && predicate == self.stylesheet_predicate {
            return Ok(());
        }
        self.blocker.receive_triple(triple, graph, context)
    }

    fn receive_namespace(
        &mut self,
        prefix: &str,
        namespace: &str,
        context: &ExtractionContext,
    ) -> Result<()> {
        self.blocker.receive_namespace(prefix, namespace, context)
    }

    fn close_context(&mut self, context: &ExtractionContext) -> Result<()> {
        self.blocker.close_context(context)
    }

    fn end_document(&mut self, document: &Iri) -> Result<()> {
        self.blocker.end_document(document)
    }

    fn receive_issue(&mut self, issue: &Issue) -> Result<()> {
        self.blocker.receive_issue(issue)
    }

    fn close(&mut self) -> Result<()> {
        self.blocker.close()
    }
}

// ============================================================================
// Titles of empty documents
// ============================================================================

pub struct IgnoreTitlesOfEmptyDocuments<H> {
    blocker: ExtractionContextBlocker<H>,
    title_extractor: String,
}

impl<H: TripleHandler> IgnoreTitlesOfEmptyDocuments<H> {
    pub fn new(wrapped: H, title_extractor: impl Into<String>) -> Self {
        Self {
            blocker: ExtractionContextBlocker::new(wrapped),
            title_extractor: title_extractor.into(),
        }
    }

    pub fn with_defaults(wrapped: H) -> Self {
        Self::new(wrapped, DEFAULT_TITLE_EXTRACTOR)
    }

    pub fn from_config(wrapped: H, config: &FilterConfig) -> Self {
        Self::new(wrapped, config.title_extractor.clone())
    }

    pub fn get_ref(&self) -> &H {
        self.blocker.get_ref()
    }

    pub fn into_inner(self) -> H {
        self.blocker.into_inner()
    }

    fn is_title(&self, context: &ExtractionContext) -> bool {
        context.extractor_name() == self.title_extractor
    }
}

impl<H: TripleHandler> TripleHandler for IgnoreTitlesOfEmptyDocuments<H> {
    fn start_document(&mut self, document: &Iri) -> Result<()> {
        self.blocker.start_document(document)
    }

    fn open_context(&mut self, context: &ExtractionContext) -> Result<()> {
        self.blocker.open_context(context)?;
        if self.is_title(context) {
            self.blocker.block_context(context)?;
        }
        Ok(())
    }

    fn receive_triple(
        &mut self,
        triple: &Triple,
        graph: Option<&Iri>,
        context: &ExtractionContext,
    ) -> Result<()> {
        if !self.is_title(context) {
            self.blocker.unblock_document()?;
        }
        self.blocker.receive_triple(triple, graph, context)
    }

    fn receive_namespace(
        &mut self,
        prefix: &str,
        namespace: &str,
        context: &ExtractionContext,
    ) -> Result<()> {
        self.blocker.receive_namespace(prefix, namespace, context)
    }

    fn close_context(&mut self, context: &ExtractionContext) -> Result<()> {
        self.blocker.close_context(context)
    }

    fn end_document(&mut self, document: &Iri) -> Result<()> {
        self.blocker.end_document(document)
    }

    fn receive_issue(&mut self, issue: &Issue) -> Result<()> {
        self.blocker.receive_issue(issue)
    }

    fn close(&mut self) -> Result<()> {
        self.blocker.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ctx, doc, triple, Event, Recorder};
    use crate::CountingTripleHandler;

    fn emit<H: TripleHandler>(handler: &mut H, context: &ExtractionContext, predicates: &[&str]) {
        handler.open_context(context).unwrap();
        for p in predicates {
            handler.receive_triple(&triple(p), None, context).unwrap();
        }
        handler.close_context(context).unwrap();
    }

    fn vocab(term: &str) -> String {
        format!("{XHTML_VOCAB}{term}")
    }

    #[test]
    fn test_reserved_only_accidental_output_is_dropped() {
        let mut filter = IgnoreAccidentalRdfa::with_defaults(
            CountingTripleHandler::new(Recorder::default()),
            false,
        );
        filter.start_document(&doc()).unwrap();
        emit(&mut filter, &ctx("html-rdfa11"), &[vocab("license").as_str(), vocab("next").as_str()]);
        filter.end_document(&doc()).unwrap();

        assert_eq!(filter.get_ref().count(), 0);
        assert!(!filter
            .get_ref()
            .get_ref()
            .events
            .iter()
            .any(|e| matches!(e, Event::Open(_))));
    }

    #[test]
    fn test_non_reserved_predicate_releases_whole_context() {
        let mut filter = IgnoreAccidentalRdfa::with_defaults(Recorder::default(), false);
        let license = vocab("license");
        filter.start_document(&doc()).unwrap();
        emit(
            &mut filter,
            &ctx("html-rdfa11"),
            &[license.as_str(), "http://purl.org/dc/terms/creator"],
        );
        filter.end_document(&doc()).unwrap();

        assert_eq!(
            filter.get_ref().triples(),
            vec![license, "http://purl.org/dc/terms/creator".to_string()]
        );
    }

    #[test]
    fn test_other_extractors_pass_through() {
        let mut filter = IgnoreAccidentalRdfa::with_defaults(Recorder::default(), true);
        filter.start_document(&doc()).unwrap();
        emit(&mut filter, &ctx("test-extractor"), &[vocab("license").as_str()]);
        filter.end_document(&doc()).unwrap();
        assert_eq!(filter.get_ref().triples(), vec![vocab("license")]);
    }

    #[test]
    fn test_stylesheet_triples_suppressed() {
        let mut filter = IgnoreAccidentalRdfa::with_defaults(Recorder::default(), true);
        filter.start_document(&doc()).unwrap();
        emit(
            &mut filter,
            &ctx("test-extractor"),
            &[vocab("stylesheet").as_str(), "http://example.org/p"],
        );
        filter.end_document(&doc()).unwrap();
        assert_eq!(filter.get_ref().triples(), vec!["http://example.org/p".to_string()]);
    }

    #[test]
    fn test_config_names_the_extractor() {
        let config = FilterConfig {
            accidental_extractor: "generic-markup".to_string(),
            ..FilterConfig::default()
        };
        let mut filter = IgnoreAccidentalRdfa::from_config(Recorder::default(), &config);
        filter.start_document(&doc()).unwrap();
        emit(&mut filter, &ctx("generic-markup"), &[vocab("license").as_str()]);
        emit(&mut filter, &ctx("html-rdfa11"), &[vocab("next").as_str()]);
        filter.end_document(&doc()).unwrap();
        assert_eq!(filter.get_ref().triples(), vec![vocab("next")]);
    }

    #[test]
    fn test_title_only_document_yields_nothing() {
        let mut filter =
            IgnoreTitlesOfEmptyDocuments::with_defaults(CountingTripleHandler::new(Recorder::default()));
        filter.start_document(&doc()).unwrap();
        emit(&mut filter, &ctx("html-head-title"), &["http://purl.org/dc/terms/title"]);
        filter.end_document(&doc()).unwrap();

        assert_eq!(filter.get_ref().count(), 0);
        assert_eq!(
            filter.get_ref().get_ref().events,
            vec![
                Event::StartDocument(doc().to_string()),
                Event::EndDocument(doc().to_string()),
            ]
        );
    }

    #[test]
    fn test_title_released_by_other_extractor() {
        let mut filter = IgnoreTitlesOfEmptyDocuments::with_defaults(Recorder::default());
        filter.start_document(&doc()).unwrap();
        emit(
            &mut filter,
            &ctx("html-head-title"),
            &["http://purl.org/dc/terms/title"],
        );
        emit(
            &mut filter,
            &ctx("csv"),
            &["http://p/1", "http://p/2"],
        );
        filter.end_document(&doc()).unwrap();

        assert_eq!(
            filter.get_ref().triples(),
            vec![
                "http://purl.org/dc/terms/title".to_string(),
                "http://p/1".to_string(),
                "http://p/2".to_string(),
            ]
        );

        // the next document is filtered again
        filter.start_document(&doc()).unwrap();
        emit(&mut filter, &ctx("html-head-title"), &["http://purl.org/dc/terms/title"]);
        filter.end_document(&doc()).unwrap();
        assert_eq!(filter.get_ref().triples().len(), 3);
    }

    #[test]
    fn test_filters_compose() {
        let inner = IgnoreTitlesOfEmptyDocuments::with_defaults(Recorder::default());
        let mut chain = IgnoreAccidentalRdfa::with_defaults(inner, true);
        chain.start_document(&doc()).unwrap();
        emit(&mut chain, &ctx("html-head-title"), &["http://purl.org/dc/terms/title"]);
        emit(&mut chain, &ctx("html-rdfa11"), &[vocab("license").as_str()]);
        chain.end_document(&doc()).unwrap();

        assert!(chain.get_ref().get_ref().triples().is_empty());
    }
}
