//! Output handler chain
//!
//! ```text
//! IgnoreAccidentalRdfa -> IgnoreTitlesOfEmptyDocuments -> Reporting -> Logging -> writer
//! ```
//!
//! The filters are optional; the writer is replaced by a null sink when only
//! counting.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use semex_core::{FilterConfig, Issue, OutputFormat};
use semex_writer::{
    create_writer, IgnoreAccidentalRdfa, IgnoreTitlesOfEmptyDocuments, LoggingTripleHandler,
    NullTripleHandler, ReportingTripleHandler, TripleHandler,
};

#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub count_only: bool,
    pub filters: FilterConfig,
    /// Wrap the writer in the configured filters
    pub apply_filters: bool,
}

/// What went through the chain, after filtering
#[derive(Debug, Clone, Default)]
pub struct OutputSummary {
    pub documents: usize,
    pub triples: usize,
    pub triples_per_extractor: BTreeMap<String, usize>,
    pub issues: Vec<Issue>,
}

impl OutputSummary {
    pub fn report_line(&self) -> String {
        let extractors = self
            .triples_per_extractor
            .iter()
            .map(|(name, count)| format!("{name}={count}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Total Documents: {}, Total Triples: {}, Issues: {} [{}]",
            self.documents,
            self.triples,
            self.issues.len(),
            extractors
        )
    }
}

/// `Write` into a buffer shared with the caller
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the buffered bytes out
    pub fn take(&self) -> Vec<u8> {
        match self.0.lock() {
            Ok(mut buffer) => std::mem::take(&mut *buffer),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self
            .0
            .lock()
            .map_err(|_| io::Error::other("output buffer lock poisoned"))?;
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Build the chain over `out`, hand it to `run`, then close it.
///
/// The chain is closed even when `run` fails so buffered output is flushed.
pub fn run_with_output<T>(
    options: &OutputOptions,
    out: Box<dyn Write + Send>,
    run: impl FnOnce(&mut dyn TripleHandler) -> semex_extractor::Result<T>,
) -> anyhow::Result<(T, OutputSummary)> {
    let sink: Box<dyn TripleHandler> = if options.count_only {
        Box::new(NullTripleHandler)
    } else {
        Box::new(create_writer(options.format, out))
    };
    let mut reporting = ReportingTripleHandler::new(LoggingTripleHandler::new(sink));

    let value = {
        let mut handler: Box<dyn TripleHandler + '_> = Box::new(&mut reporting);
        if options.apply_filters && options.filters.ignore_empty_titles {
            handler = Box::new(IgnoreTitlesOfEmptyDocuments::from_config(
                handler,
                &options.filters,
            ));
        }
        if options.apply_filters && options.filters.ignore_accidental_rdfa {
            handler = Box::new(IgnoreAccidentalRdfa::from_config(handler, &options.filters));
        }

        let value = run(&mut *handler);
        let closed = handler.close();
        let value = value?;
        closed?;
        value
    };

    let summary = OutputSummary {
        documents: reporting.total_documents(),
        triples: reporting.total_triples(),
        triples_per_extractor: reporting.get_ref().triples_per_extractor().clone(),
        issues: reporting.issues().to_vec(),
    };
    Ok((value, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_buffer() {
        let buffer = SharedBuffer::new();
        let mut writer = buffer.clone();
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        assert_eq!(buffer.take(), b"hello world");
        assert!(buffer.take().is_empty());
    }

    #[test]
    fn test_report_line() {
        let summary = OutputSummary {
            documents: 2,
            triples: 5,
            triples_per_extractor: BTreeMap::from([
                ("csv".to_string(), 4),
                ("html-head-title".to_string(), 1),
            ]),
            issues: Vec::new(),
        };
        assert_eq!(
            summary.report_line(),
            "Total Documents: 2, Total Triples: 5, Issues: 0 [csv=4, html-head-title=1]"
        );
    }
}
