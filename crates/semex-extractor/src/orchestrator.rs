//! Single-document extraction
//!
//! Drives one document through MIME detection, extractor selection and the
//! selected extractors, in order. Each extractor writes through its own
//! [`ExtractionResult`]; an extractor failure is recorded as a FATAL issue on
//! its document context and the run moves on to the next one. Only source IO
//! failures and output handler failures end the run with an error.

use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use semex_core::{
    ExtractionContext, ExtractionParameters, Iri, Issue, IssueLevel, Literal, MimeType, Triple,
};
use semex_writer::TripleHandler;
use uuid::Uuid;

use crate::detect::MimeDetector;
use crate::extractor::{ExtractionInput, Extractor, ExtractorDescription, ExtractorKind};
use crate::registry::{ExtractorFactory, ExtractorGroup};
use crate::result::ExtractionResult;
use crate::source::{DocumentSource, MemCopyDocumentSource};
use crate::{ExtractionError, Result};

/// Context name of the extraction date / size meta triples
pub const CONSOLIDATION_EXTRACTOR: &str = "consolidation-extractor";

const ANY23_DATE: &str = "http://vocab.sindice.net/any23#date";
const ANY23_SIZE: &str = "http://vocab.sindice.net/any23#size";
const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

/// How an extractor's run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractorStatus {
    Done,
    /// Abandoned with the given message; a FATAL issue was recorded
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ExtractorOutcome {
    pub name: String,
    pub status: ExtractorStatus,
    pub elapsed: Duration,
    pub triples: usize,
}

impl ExtractorOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, ExtractorStatus::Failed(_))
    }
}

/// Summary of one document run
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub document: Iri,
    pub detected_mime_type: MimeType,
    /// Selected extractors, in run order
    pub matching_extractors: Vec<String>,
    pub issues: Vec<Issue>,
    pub outcomes: Vec<ExtractorOutcome>,
}

impl ExtractionReport {
    pub fn has_matching_extractors(&self) -> bool {
        !self.matching_extractors.is_empty()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Issues raised under one extractor's contexts
    pub fn issues_for(&self, extractor: &str) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.extractor_name() == extractor)
            .collect()
    }

    /// Triples written by the extractors, meta triples excluded
    pub fn total_triples(&self) -> usize {
        self.outcomes.iter().map(|o| o.triples).sum()
    }
}

/// Runs a group of extractors over one document at a time.
///
/// The extraction holds no per-document state and can be reused for any
/// number of sources.
#[derive(Clone)]
pub struct SingleDocumentExtraction {
    group: ExtractorGroup,
    detector: Option<Arc<dyn MimeDetector>>,
    parameters: ExtractionParameters,
}

impl SingleDocumentExtraction {
    pub fn new(group: ExtractorGroup) -> Self {
        Self {
            group,
            detector: None,
            parameters: ExtractionParameters::default(),
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn MimeDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_parameters(mut self, parameters: ExtractionParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn parameters(&self) -> &ExtractionParameters {
        &self.parameters
    }

    pub fn group(&self) -> &ExtractorGroup {
        &self.group
    }

    /// Extract `source` into `output`.
    ///
    /// `start_document` and `end_document` are called once each when at least
    /// one extractor matches; nothing reaches `output` otherwise. `output` is
    /// left open.
    pub fn run(
        &self,
        source: &dyn DocumentSource,
        output: &mut dyn TripleHandler,
    ) -> Result<ExtractionReport> {
        let copy;
        let source: &dyn DocumentSource = if source.is_local() {
            source
        } else {
            copy = MemCopyDocumentSource::copy(source)?;
            &copy
        };

        let document = self.document_iri(source)?;
        tracing::info!("Processing {}", document);

        let mime_type = self.detect_mime_type(source)?;
        let selected = self.group.filter_by_mime_type(&mime_type);
        let mut report = ExtractionReport {
            document: document.clone(),
            detected_mime_type: mime_type,
            matching_extractors: selected.names().into_iter().map(str::to_string).collect(),
            issues: Vec::new(),
            outcomes: Vec::new(),
        };

        if selected.is_empty() {
            tracing::debug!(
                "No extractor matches {} ({})",
                document,
                report.detected_mime_type
            );
            return Ok(report);
        }
        tracing::debug!(
            "Extracting {} as {} with {:?}",
            document,
            report.detected_mime_type.full_type(),
            report.matching_extractors
        );

        output.start_document(&document)?;

        let mut markup: Option<String> = None;
        for factory in &selected {
            let outcome =
                self.run_extractor(factory, source, &document, &mut markup, output, &mut report.issues)?;
            report.outcomes.push(outcome);
        }

        if self.parameters.metadata_timesize {
            write_metadata(&document, report.total_triples(), output)?;
        }

        output.end_document(&document)?;
        Ok(report)
    }

    fn document_iri(&self, source: &dyn DocumentSource) -> Result<Iri> {
        let value = self
            .parameters
            .document_context_iri
            .as_deref()
            .unwrap_or_else(|| source.document_uri());
        Iri::new(value).map_err(|_| ExtractionError::InvalidDocumentIri(value.to_string()))
    }

    fn detect_mime_type(&self, source: &dyn DocumentSource) -> Result<MimeType> {
        let declared = source
            .content_type()
            .and_then(|value| MimeType::parse(value).ok());

        let detected = match &self.detector {
            Some(detector) if self.parameters.mime_detection => {
                let mut sample = Vec::new();
                source
                    .open_stream()?
                    .take(self.parameters.mime_sample_size as u64)
                    .read_to_end(&mut sample)?;
                detector.guess_type(source.file_name(), &sample, declared.as_ref())
            }
            _ => None,
        };

        Ok(detected
            .or(declared)
            .unwrap_or_else(MimeType::octet_stream))
    }

    fn run_extractor(
        &self,
        factory: &ExtractorFactory,
        source: &dyn DocumentSource,
        document: &Iri,
        markup: &mut Option<String>,
        output: &mut dyn TripleHandler,
        issues: &mut Vec<Issue>,
    ) -> Result<ExtractorOutcome> {
        let description = factory.description();
        let context = ExtractionContext::new(description.name(), document.clone());
        let mut extractor = factory.create_extractor();
        extractor.set_stop_at_first_error(self.parameters.stop_at_first_error);

        let started = Instant::now();
        let mut pending = Vec::new();
        let execution = match description.kind() {
            ExtractorKind::Content => {
                let mut stream = source.open_stream()?;
                self.execute(
                    extractor.as_mut(),
                    description,
                    &context,
                    ExtractionInput::Content(&mut stream),
                    output,
                )?
            }
            ExtractorKind::Markup => {
                if markup.is_none() {
                    let (text, warning) =
                        decode_markup(source, self.parameters.default_encoding.as_deref())?;
                    if let Some(warning) = warning {
                        pending.push(Issue::new(IssueLevel::Warning, warning, context.clone()));
                    }
                    *markup = Some(text);
                }
                let text = markup.as_deref().unwrap_or_default();
                self.execute(
                    extractor.as_mut(),
                    description,
                    &context,
                    ExtractionInput::Markup(text),
                    output,
                )?
            }
            ExtractorKind::Blind => self.execute(
                extractor.as_mut(),
                description,
                &context,
                ExtractionInput::Blind,
                output,
            )?,
        };
        let elapsed = started.elapsed();

        pending.extend(execution.issues);
        let status = match execution.failure {
            None => ExtractorStatus::Done,
            Some(e) => {
                tracing::warn!("Extractor {} failed on {}: {}", description.name(), document, e);
                let message = e.to_string();
                pending.push(Issue::new(IssueLevel::Fatal, message.clone(), context.clone()));
                ExtractorStatus::Failed(message)
            }
        };
        for issue in &pending {
            output.receive_issue(issue)?;
        }
        issues.extend(pending);

        tracing::debug!(
            "{} produced {} triples on {} in {:?}",
            description.name(),
            execution.triples,
            document,
            elapsed
        );

        Ok(ExtractorOutcome {
            name: description.name().to_string(),
            status,
            elapsed,
            triples: execution.triples,
        })
    }

    /// Run one extractor and close its result. Handler failures are returned
    /// as errors; anything else the extractor raised becomes `failure`.
    fn execute(
        &self,
        extractor: &mut dyn Extractor,
        description: &ExtractorDescription,
        context: &ExtractionContext,
        input: ExtractionInput<'_>,
        output: &mut dyn TripleHandler,
    ) -> Result<Execution> {
        let mut result = ExtractionResult::new(context.clone(), description.prefixes(), output);
        let run = extractor.run(&self.parameters, context, input, &mut result);
        let closed = result.close();
        let triples = result.triple_count();
        let issues = result.take_issues();

        let failure = match (run, closed) {
            (_, Err(e)) if e.is_fatal() => return Err(e),
            (Err(e), _) if e.is_fatal() => return Err(e),
            (Err(e), _) | (Ok(()), Err(e)) => Some(e),
            (Ok(()), Ok(())) => None,
        };
        Ok(Execution {
            failure,
            issues,
            triples,
        })
    }
}

impl std::fmt::Debug for SingleDocumentExtraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleDocumentExtraction")
            .field("extractors", &self.group.names())
            .field("mime_detection", &self.detector.is_some())
            .field("parameters", &self.parameters)
            .finish()
    }
}

struct Execution {
    failure: Option<ExtractionError>,
    issues: Vec<Issue>,
    triples: usize,
}

/// Decode the whole document for markup extractors.
///
/// UTF-8, US-ASCII and ISO-8859-1 are decoded natively; anything else, and
/// invalid UTF-8, is decoded lossily with a warning.
fn decode_markup(
    source: &dyn DocumentSource,
    encoding: Option<&str>,
) -> Result<(String, Option<String>)> {
    let mut bytes = Vec::new();
    source.open_stream()?.read_to_end(&mut bytes)?;

    let label = encoding.map(|e| e.trim().to_ascii_lowercase());
    let (text, warning): (String, Option<String>) = match label.as_deref() {
        Some("iso-8859-1" | "latin1" | "latin-1" | "l1") => {
            (bytes.iter().map(|&b| char::from(b)).collect(), None)
        }
        None | Some("utf-8" | "utf8" | "us-ascii" | "ascii") => match String::from_utf8(bytes) {
            Ok(text) => (text, None),
            Err(e) => (
                String::from_utf8_lossy(e.as_bytes()).into_owned(),
                Some("Document is not valid UTF-8, invalid sequences were replaced".to_string()),
            ),
        },
        Some(other) => (
            String::from_utf8_lossy(&bytes).into_owned(),
            Some(format!("Unsupported encoding {other}, decoded as UTF-8")),
        ),
    };

    let text = match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    };
    Ok((text, warning))
}

/// Extraction date and size meta triples, in their own context
fn write_metadata(document: &Iri, triples: usize, output: &mut dyn TripleHandler) -> Result<()> {
    let context = ExtractionContext::with_local_id(
        CONSOLIDATION_EXTRACTOR,
        document.clone(),
        Uuid::new_v4().to_string(),
    );
    let date = Literal::typed(
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        Iri::new(XSD_DATE_TIME)?,
    );
    // the size triple counts itself
    let size = Literal::typed((triples + 1).to_string(), Iri::new(XSD_INTEGER)?);

    output.open_context(&context)?;
    output.receive_triple(
        &Triple::new(document.clone(), Iri::new(ANY23_DATE)?, date),
        None,
        &context,
    )?;
    output.receive_triple(
        &Triple::new(document.clone(), Iri::new(ANY23_SIZE)?, size),
        None,
        &context,
    )?;
    output.close_context(&context)?;
    Ok(())
}
