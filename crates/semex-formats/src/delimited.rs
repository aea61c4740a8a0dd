//! Delimiter-separated values (CSV, TSV)

use std::io::{Cursor, Read};

use semex_core::{ExtractionContext, ExtractionParameters, IssueLevel};
use semex_extractor::{
    ExtractionError, ExtractionInput, ExtractionResult, Extractor, ExtractorDescription,
    ExtractorFactory, ExtractorKind, Result,
};

use crate::rdf::mime;
use crate::tabular::TableWriter;
use crate::vocab::CSV;

pub const CSV_EXTRACTOR: &str = "csv";

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Turns the first record into column properties and every following
/// record into a `csv:Row`
#[derive(Debug, Default)]
pub struct CsvExtractor {
    stop_at_first_error: bool,
}

impl CsvExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> ExtractorFactory {
        let description = ExtractorDescription::new(CSV_EXTRACTOR, ExtractorKind::Content)
            .with_type(mime("text/csv"))
            .with_type(mime("text/tab-separated-values;q=0.5"))
            .with_prefix("csv", CSV);
        ExtractorFactory::new(description, || Box::new(Self::new()))
    }
}

/// Most frequent candidate delimiter on the first non-comment line
pub(crate) fn sniff_delimiter(content: &[u8]) -> u8 {
    let first = content
        .split(|b| *b == b'\n')
        .find(|line| !line.starts_with(b"#"))
        .unwrap_or_default();
    DELIMITERS
        .iter()
        .map(|d| (*d, first.iter().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

impl Extractor for CsvExtractor {
    fn run(
        &mut self,
        _parameters: &ExtractionParameters,
        context: &ExtractionContext,
        input: ExtractionInput<'_>,
        result: &mut ExtractionResult<'_>,
    ) -> Result<()> {
        let ExtractionInput::Content(stream) = input else {
            return Err(ExtractionError::extractor(CSV_EXTRACTOR, "expected a byte stream"));
        };
        let mut content = Vec::new();
        stream.read_to_end(&mut content)?;

        let delimiter = sniff_delimiter(&content);
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .comment(Some(b'#'))
            .from_reader(Cursor::new(content));

        let mut table: Option<TableWriter> = None;
        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    let line = e
                        .position()
                        .map(|p| u32::try_from(p.line()).unwrap_or(u32::MAX))
                        .unwrap_or(0);
                    if self.stop_at_first_error {
                        return Err(ExtractionError::extractor(
                            CSV_EXTRACTOR,
                            format!("line {line}: {e}"),
                        ));
                    }
                    result.notify_issue_at(IssueLevel::Error, e.to_string(), line, 1);
                    continue;
                }
            };
            let cells: Vec<String> = record.iter().map(|cell| cell.trim().to_string()).collect();
            match table.as_mut() {
                Some(table) => table.row(result, &cells)?,
                None => {
                    table = Some(TableWriter::start(
                        result,
                        context.document_iri().clone(),
                        &cells,
                    )?)
                }
            }
        }

        match table {
            Some(table) => {
                let rows = table.finish(result)?;
                tracing::debug!("csv: {} rows in {}", rows, context.document_iri());
            }
            None => tracing::debug!("csv: {} has no header", context.document_iri()),
        }
        Ok(())
    }

    fn set_stop_at_first_error(&mut self, stop: bool) {
        self.stop_at_first_error = stop;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter(b"a;b;c\n1;2;3"), b';');
        assert_eq!(sniff_delimiter(b"# note, with comma\na\tb\n"), b'\t');
        assert_eq!(sniff_delimiter(b"a,b|c,d"), b',');
        assert_eq!(sniff_delimiter(b"single"), b',');
        assert_eq!(sniff_delimiter(b""), b',');
    }
}
