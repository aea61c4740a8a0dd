//! The `Semex` facade

use std::sync::Arc;

use semex_core::ExtractionParameters;
use semex_writer::TripleHandler;

use crate::archive::{BatchReport, WarcArchiveExtraction, ZipArchiveExtraction};
use crate::detect::{HeuristicMimeDetector, MimeDetector};
use crate::orchestrator::{ExtractionReport, SingleDocumentExtraction};
use crate::registry::{ExtractorGroup, ExtractorRegistry};
use crate::source::DocumentSource;
use crate::Result;

/// Entry point for extracting documents against a shared registry.
///
/// `Semex` is `Send + Sync`; clone it or share it behind an `Arc` to extract
/// documents from several threads.
#[derive(Clone)]
pub struct Semex {
    registry: Arc<ExtractorRegistry>,
    detector: Option<Arc<dyn MimeDetector>>,
    parameters: ExtractionParameters,
    /// Restricts extraction to these extractors when set
    selection: Option<ExtractorGroup>,
}

impl Semex {
    /// Facade over `registry` using the heuristic MIME detector
    pub fn new(registry: Arc<ExtractorRegistry>) -> Self {
        Self {
            registry,
            detector: Some(Arc::new(HeuristicMimeDetector::new())),
            parameters: ExtractionParameters::default(),
            selection: None,
        }
    }

    pub fn with_parameters(mut self, parameters: ExtractionParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_detector(mut self, detector: Arc<dyn MimeDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Skip detection; only declared content types select extractors
    pub fn without_detector(mut self) -> Self {
        self.detector = None;
        self
    }

    /// Only run the named extractors
    pub fn with_extractors<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        self.selection = Some(self.registry.group_by_names(names)?);
        Ok(self)
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    pub fn parameters(&self) -> &ExtractionParameters {
        &self.parameters
    }

    /// Extract `source` into `output`; true if any extractor matched.
    ///
    /// `output` is not closed.
    pub fn extract(
        &self,
        source: &dyn DocumentSource,
        output: &mut dyn TripleHandler,
    ) -> Result<bool> {
        Ok(self.extract_with_report(source, output)?.has_matching_extractors())
    }

    /// Like [`Semex::extract`], decoding markup with `encoding`
    pub fn extract_with_encoding(
        &self,
        source: &dyn DocumentSource,
        output: &mut dyn TripleHandler,
        encoding: &str,
    ) -> Result<bool> {
        let parameters = ExtractionParameters {
            default_encoding: Some(encoding.to_string()),
            ..self.parameters.clone()
        };
        let report = self
            .single_document(parameters)
            .run(source, output)?;
        Ok(report.has_matching_extractors())
    }

    pub fn extract_with_report(
        &self,
        source: &dyn DocumentSource,
        output: &mut dyn TripleHandler,
    ) -> Result<ExtractionReport> {
        self.single_document(self.parameters.clone())
            .run(source, output)
    }

    pub fn extract_zip(
        &self,
        archive: &dyn DocumentSource,
        output: &mut dyn TripleHandler,
    ) -> Result<BatchReport> {
        ZipArchiveExtraction::new(self.single_document(self.parameters.clone()))
            .run(archive, output)
    }

    pub fn extract_warc(
        &self,
        warc: &dyn DocumentSource,
        output: &mut dyn TripleHandler,
    ) -> Result<BatchReport> {
        WarcArchiveExtraction::new(self.single_document(self.parameters.clone()))
            .run(warc, output)
    }

    fn single_document(&self, parameters: ExtractionParameters) -> SingleDocumentExtraction {
        let group = self
            .selection
            .clone()
            .unwrap_or_else(|| self.registry.group());
        let extraction = SingleDocumentExtraction::new(group).with_parameters(parameters);
        match &self.detector {
            Some(detector) => extraction.with_detector(Arc::clone(detector)),
            None => extraction,
        }
    }
}

impl std::fmt::Debug for Semex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semex")
            .field("extractors", &self.registry.names())
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
