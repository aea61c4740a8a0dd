//! Spreadsheet workbooks (XLSX, XLS, ODS) through calamine
//!
//! Each sheet is written in its own sub context and laid out with the same
//! row/column model as CSV, rooted at `{doc}/sheet/{name}/`.

use std::io::{Cursor, Read};

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use semex_core::{ExtractionContext, ExtractionParameters, IssueLevel, Literal};
use semex_extractor::{
    ExtractionError, ExtractionInput, ExtractionResult, Extractor, ExtractorDescription,
    ExtractorFactory, ExtractorKind, Result,
};

use crate::rdf::mime;
use crate::tabular::TableWriter;
use crate::vocab::{self, CSV, EXCEL};

pub const SPREADSHEET_EXTRACTOR: &str = "excel";

#[derive(Debug, Default)]
pub struct SpreadsheetExtractor {
    stop_at_first_error: bool,
}

impl SpreadsheetExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> ExtractorFactory {
        let description =
            ExtractorDescription::new(SPREADSHEET_EXTRACTOR, ExtractorKind::Content)
                .with_type(mime(
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                ))
                .with_type(mime("application/vnd.ms-excel"))
                .with_type(mime("application/vnd.oasis.opendocument.spreadsheet"))
                .with_prefix("excel", EXCEL)
                .with_prefix("csv", CSV);
        ExtractorFactory::new(description, || Box::new(Self::new()))
    }
}

/// Convert a cell to its text; whole floats print without decimals
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                format!("{f}")
            }
        }
        Data::Int(i) => format!("{i}"),
        Data::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Data::Error(e) => format!("#ERROR: {e:?}"),
        Data::DateTime(dt) => format!("{dt}"),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Percent-encode a sheet name for use as an IRI path segment
fn encode_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

impl Extractor for SpreadsheetExtractor {
    fn run(
        &mut self,
        _parameters: &ExtractionParameters,
        context: &ExtractionContext,
        input: ExtractionInput<'_>,
        result: &mut ExtractionResult<'_>,
    ) -> Result<()> {
        let ExtractionInput::Content(stream) = input else {
            return Err(ExtractionError::extractor(
                SPREADSHEET_EXTRACTOR,
                "expected a byte stream",
            ));
        };
        let mut content = Vec::new();
        stream.read_to_end(&mut content)?;

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(content))
            .map_err(|e| ExtractionError::extractor(SPREADSHEET_EXTRACTOR, e.to_string()))?;
        let document = context.document_iri().clone();
        let sheet_names = workbook.sheet_names().to_vec();

        for (index, sheet_name) in sheet_names.iter().enumerate() {
            let range = match workbook.worksheet_range(sheet_name) {
                Ok(range) => range,
                Err(e) if self.stop_at_first_error => {
                    return Err(ExtractionError::extractor(
                        SPREADSHEET_EXTRACTOR,
                        format!("sheet {sheet_name:?}: {e}"),
                    ))
                }
                Err(e) => {
                    result.notify_issue(
                        IssueLevel::Error,
                        format!("Cannot read sheet {sheet_name:?}: {e}"),
                    );
                    continue;
                }
            };

            let sheet = document.join(&format!("/sheet/{}/", encode_segment(sheet_name)))?;
            let mut scope = result.open_sub_result(&format!("sheet-{index}"))?;
            scope.write_triple(
                document.clone(),
                vocab::term(EXCEL, "containsSheet")?,
                sheet.clone(),
            )?;
            scope.write_triple(
                sheet.clone(),
                vocab::rdf_type()?,
                vocab::term(EXCEL, "Sheet")?,
            )?;
            scope.write_triple(
                sheet.clone(),
                vocab::term(EXCEL, "sheetName")?,
                Literal::new(sheet_name.as_str()),
            )?;
            if let (Some((first, _)), Some((last, _))) = (range.start(), range.end()) {
                let integer = vocab::xsd("integer")?;
                scope.write_triple(
                    sheet.clone(),
                    vocab::term(EXCEL, "firstRow")?,
                    Literal::typed(first.to_string(), integer.clone()),
                )?;
                scope.write_triple(
                    sheet.clone(),
                    vocab::term(EXCEL, "lastRow")?,
                    Literal::typed(last.to_string(), integer),
                )?;
            }

            let mut rows = range
                .rows()
                .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
                .filter(|row| !row.iter().all(|cell| cell.is_empty()));
            if let Some(header) = rows.next() {
                let mut table = TableWriter::start(&mut scope, sheet, &header)?;
                for row in rows {
                    table.row(&mut scope, &row)?;
                }
                let written = table.finish(&mut scope)?;
                tracing::debug!("excel: sheet {} has {} rows", sheet_name, written);
            }
            scope.close()?;
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
    use semex_core::Iri;
    use semex_writer::NullTripleHandler;

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(3.0)), "3");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Bool(true)), "true");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("Sheet 1"), "Sheet%201");
        assert_eq!(encode_segment("Q1/Q2"), "Q1%2FQ2");
    }

    #[test]
    fn test_not_a_workbook() {
        let context = ExtractionContext::new(
            SPREADSHEET_EXTRACTOR,
            Iri::new("http://example.org/book.xlsx").unwrap(),
        );
        let mut output = NullTripleHandler;
        let mut result = ExtractionResult::new(context.clone(), &[], &mut output);
        let mut stream = Cursor::new(b"plain text, not a workbook".to_vec());
        let outcome = SpreadsheetExtractor::new().run(
            &ExtractionParameters::default(),
            &context,
            ExtractionInput::Content(&mut stream),
            &mut result,
        );
        let err = outcome.unwrap_err();
        assert!(matches!(err, ExtractionError::Extractor { .. }));
        assert!(!err.is_fatal());
    }
}
