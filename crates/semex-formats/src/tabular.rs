//! Row and column model shared by the CSV and spreadsheet extractors
//!
//! A table rooted at IRI `T` produces:
//! - one property per column: the header itself when it is an absolute IRI,
//!   otherwise `T` followed by the camel-cased header, labelled with the
//!   original header text
//! - `T/row/{n}` subjects typed `csv:Row`, linked from `T` with `csv:row`
//! - row and column counts on `T`

use semex_core::{is_absolute_iri, Iri, Literal, Subject, Term};
use semex_extractor::result::SubResult;
use semex_extractor::{ExtractionResult, Result};

use crate::vocab::{self, CSV, RDFS};

/// Where table triples go: the document result or one of its sub results
pub(crate) trait TableSink {
    fn emit(&mut self, subject: Subject, predicate: Iri, object: Term) -> Result<()>;
}

impl TableSink for ExtractionResult<'_> {
    fn emit(&mut self, subject: Subject, predicate: Iri, object: Term) -> Result<()> {
        self.write_triple(subject, predicate, object)
    }
}

impl TableSink for SubResult<'_, '_> {
    fn emit(&mut self, subject: Subject, predicate: Iri, object: Term) -> Result<()> {
        self.write_triple(subject, predicate, object)
    }
}

/// Streams one table into a sink; the header comes first, then rows
pub(crate) struct TableWriter {
    root: Iri,
    columns: Vec<Iri>,
    rows: usize,
}

impl TableWriter {
    /// Write the column properties for `header`
    pub fn start(sink: &mut dyn TableSink, root: Iri, header: &[String]) -> Result<Self> {
        let columns = header
            .iter()
            .map(|h| column_iri(&root, h))
            .collect::<Result<Vec<_>>>()?;

        let label = vocab::term(RDFS, "label")?;
        let position = vocab::term(CSV, "columnPosition")?;
        let integer = vocab::xsd("integer")?;
        for (index, (column, text)) in columns.iter().zip(header).enumerate() {
            if !is_absolute_iri(text.trim()) {
                sink.emit(
                    column.clone().into(),
                    label.clone(),
                    Literal::new(text.as_str()).into(),
                )?;
            }
            sink.emit(
                column.clone().into(),
                position.clone(),
                Literal::typed(index.to_string(), integer.clone()).into(),
            )?;
        }

        Ok(Self {
            root,
            columns,
            rows: 0,
        })
    }

    /// Cells beyond the header and empty cells are skipped
    pub fn row(&mut self, sink: &mut dyn TableSink, cells: &[String]) -> Result<()> {
        let row = self.root.join(&format!("row/{}", self.rows))?;
        sink.emit(
            row.clone().into(),
            vocab::rdf_type()?,
            vocab::term(CSV, "Row")?.into(),
        )?;
        for (column, cell) in self.columns.iter().zip(cells) {
            if cell.is_empty() {
                continue;
            }
            sink.emit(row.clone().into(), column.clone(), cell_value(cell)?)?;
        }
        sink.emit(
            self.root.clone().into(),
            vocab::term(CSV, "row")?,
            row.clone().into(),
        )?;
        sink.emit(
            row.into(),
            vocab::term(CSV, "rowPosition")?,
            Literal::new(self.rows.to_string()).into(),
        )?;
        self.rows += 1;
        Ok(())
    }

    /// Row and column counts
    pub fn finish(self, sink: &mut dyn TableSink) -> Result<usize> {
        let integer = vocab::xsd("integer")?;
        sink.emit(
            self.root.clone().into(),
            vocab::term(CSV, "numberOfRows")?,
            Literal::typed(self.rows.to_string(), integer.clone()).into(),
        )?;
        sink.emit(
            self.root.into(),
            vocab::term(CSV, "numberOfColumns")?,
            Literal::typed(self.columns.len().to_string(), integer).into(),
        )?;
        Ok(self.rows)
    }
}

/// Property IRI for a header cell
fn column_iri(root: &Iri, header: &str) -> Result<Iri> {
    let header = header.trim();
    if is_absolute_iri(header) {
        if let Ok(iri) = Iri::new(header) {
            return Ok(iri);
        }
    }
    Ok(root.join(&normalize_header(header))?)
}

/// `"Zip Code?"` becomes `"ZipCode"`
pub(crate) fn normalize_header(header: &str) -> String {
    let lowered: String = header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c == ' ' || c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
        .collect();
    lowered
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// IRI for absolute IRIs, otherwise an integer, float or string literal
pub(crate) fn cell_value(cell: &str) -> Result<Term> {
    let cell = cell.trim();
    if is_absolute_iri(cell) {
        if let Ok(iri) = Iri::new(cell) {
            return Ok(iri.into());
        }
    }
    let datatype = if cell.parse::<i32>().is_ok() {
        "integer"
    } else if cell.parse::<f32>().is_ok() {
        "float"
    } else {
        "string"
    };
    Ok(Literal::typed(cell, vocab::xsd(datatype)?).into())
}
