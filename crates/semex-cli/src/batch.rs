//! Concurrent extraction of several inputs
//!
//! Every input runs on the blocking pool with its own orchestrator and
//! writer; all of them share one `Semex` (and so one registry). Results are
//! returned in input order.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use semex_extractor::{DocumentSource, FileDocumentSource, Semex, StreamDocumentSource};

use crate::output::{run_with_output, OutputOptions, OutputSummary, SharedBuffer};

/// Document IRI given to standard input
pub const STDIN_URI: &str = "urn:semex:stdin";

/// Output of one input
#[derive(Debug, Clone)]
pub struct DocumentRun {
    pub input: String,
    /// Serialized statements; empty when only counting
    pub output: Vec<u8>,
    pub matched: bool,
    pub summary: OutputSummary,
}

/// `-` reads standard input, anything else is a file path
pub fn open_source(input: &str) -> anyhow::Result<Box<dyn DocumentSource>> {
    if input == "-" {
        return Ok(Box::new(StreamDocumentSource::new(
            Box::new(std::io::stdin()),
            STDIN_URI,
        )));
    }
    let path = Path::new(input);
    if !path.is_file() {
        anyhow::bail!("Not a readable file: {input}");
    }
    let path = std::fs::canonicalize(path).with_context(|| format!("Cannot resolve {input}"))?;
    Ok(Box::new(FileDocumentSource::new(path)))
}

/// Extract a single input into an in-memory buffer
pub fn extract_input(
    semex: &Semex,
    input: &str,
    options: &OutputOptions,
) -> anyhow::Result<DocumentRun> {
    let source = open_source(input)?;
    let buffer = SharedBuffer::new();
    let (report, summary) = run_with_output(options, Box::new(buffer.clone()), |output| {
        semex.extract_with_report(source.as_ref(), output)
    })
    .with_context(|| format!("Extraction of {input} failed"))?;

    if !report.has_matching_extractors() {
        tracing::warn!(
            "No extractor accepts {} ({})",
            input,
            report.detected_mime_type
        );
    }
    Ok(DocumentRun {
        input: input.to_string(),
        output: buffer.take(),
        matched: report.has_matching_extractors(),
        summary,
    })
}

/// Extract `inputs` with at most `jobs` running at once
pub async fn extract_all(
    semex: Arc<Semex>,
    inputs: Vec<String>,
    options: OutputOptions,
    jobs: usize,
) -> anyhow::Result<Vec<(String, anyhow::Result<DocumentRun>)>> {
    if inputs.is_empty() {
        return Ok(Vec::new());
    }

    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let options = Arc::new(options);
    let mut tasks = JoinSet::new();

    for (index, input) in inputs.iter().cloned().enumerate() {
        let semex = Arc::clone(&semex);
        let options = Arc::clone(&options);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let run =
                tokio::task::spawn_blocking(move || extract_input(&semex, &input, &options)).await;
            (index, run)
        });
    }

    let mut results: Vec<Option<anyhow::Result<DocumentRun>>> =
        inputs.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (index, run) = joined.map_err(|e| anyhow!("Extraction task failed: {e}"))?;
        results[index] = Some(run.unwrap_or_else(|e| Err(anyhow!("Extraction panicked: {e}"))));
    }

    Ok(inputs
        .into_iter()
        .zip(results)
        .map(|(input, run)| {
            let run = run.unwrap_or_else(|| Err(anyhow!("{input} was not processed")));
            (input, run)
        })
        .collect())
}
