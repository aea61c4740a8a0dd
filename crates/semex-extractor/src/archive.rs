//! Batch extraction over ZIP archives and WARC files
//!
//! Every contained document becomes an in-memory source that goes through
//! the single-document orchestrator against the same output. A failing item
//! is recorded in the [`BatchReport`] and the batch continues; output handler
//! failures still abort it.

use std::io::{BufRead, BufReader, Cursor, ErrorKind, Read};

use flate2::read::MultiGzDecoder;

use crate::orchestrator::SingleDocumentExtraction;
use crate::source::{ByteArrayDocumentSource, DocumentSource};
use crate::{ExtractionError, Result};
use semex_writer::TripleHandler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Extracted { matched: bool, issues: usize },
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub uri: String,
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, BatchOutcome::Extracted { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn push(&mut self, uri: String, outcome: BatchOutcome) {
        self.items.push(BatchItem { uri, outcome });
    }
}

/// Run one contained document, converting non-fatal failures into a
/// `Failed` item
fn extract_item(
    extraction: &SingleDocumentExtraction,
    source: &ByteArrayDocumentSource,
    output: &mut dyn TripleHandler,
    report: &mut BatchReport,
) -> Result<()> {
    let uri = source.document_uri().to_string();
    match extraction.run(source, output) {
        Ok(run) => {
            report.push(
                uri,
                BatchOutcome::Extracted {
                    matched: run.has_matching_extractors(),
                    issues: run.issues.len(),
                },
            );
            Ok(())
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::warn!("Skipping archive item {}: {}", uri, e);
            report.push(uri, BatchOutcome::Failed(e.to_string()));
            Ok(())
        }
    }
}

// ============================================================================
// ZIP
// ============================================================================

/// Extracts every file entry of a ZIP archive.
///
/// Entries are identified as `{archive uri}!/{entry name}`.
#[derive(Debug, Clone)]
pub struct ZipArchiveExtraction {
    extraction: SingleDocumentExtraction,
}

impl ZipArchiveExtraction {
    pub fn new(extraction: SingleDocumentExtraction) -> Self {
        Self { extraction }
    }

    pub fn run(
        &self,
        archive: &dyn DocumentSource,
        output: &mut dyn TripleHandler,
    ) -> Result<BatchReport> {
        let mut bytes = Vec::new();
        archive.open_stream()?.read_to_end(&mut bytes)?;
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;
        tracing::info!(
            "Processing archive {} ({} entries)",
            archive.document_uri(),
            zip.len()
        );

        let mut report = BatchReport::default();
        for index in 0..zip.len() {
            let (name, content) = match read_entry(&mut zip, index) {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(e) => {
                    let uri = format!("{}!/#{}", archive.document_uri(), index);
                    tracing::warn!("Cannot read archive entry {}: {}", uri, e);
                    report.push(uri, BatchOutcome::Failed(e.to_string()));
                    continue;
                }
            };
            let source =
                ByteArrayDocumentSource::new(content, entry_uri(archive.document_uri(), &name));
            extract_item(&self.extraction, &source, output, &mut report)?;
        }
        Ok(report)
    }
}

/// Name and content of a file entry, `None` for directories
fn read_entry(
    zip: &mut zip::ZipArchive<Cursor<Vec<u8>>>,
    index: usize,
) -> Result<Option<(String, Vec<u8>)>> {
    let mut file = zip.by_index(index)?;
    if file.is_dir() {
        return Ok(None);
    }
    let name = file.name().to_string();
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(Some((name, content)))
}

fn entry_uri(archive: &str, entry: &str) -> String {
    let mut uri = format!("{archive}!/");
    for c in entry.chars() {
        if c.is_whitespace()
            || c.is_control()
            || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | '%')
        {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                uri.push_str(&format!("%{byte:02X}"));
            }
        } else {
            uri.push(c);
        }
    }
    uri
}

// ============================================================================
// WARC
// ============================================================================

/// Extracts the HTTP response records of a WARC file.
///
/// Gzip-compressed files (one member per record or a single member) are
/// decompressed on the fly. A malformed record ends the batch with a
/// failed item; records read before it keep their outcomes.
///
/// The record's `WARC-Target-URI` names the document and the HTTP
/// `Content-Type` header is passed on as its declared type.
#[derive(Debug, Clone)]
pub struct WarcArchiveExtraction {
    extraction: SingleDocumentExtraction,
}

impl WarcArchiveExtraction {
    pub fn new(extraction: SingleDocumentExtraction) -> Self {
        Self { extraction }
    }

    pub fn run(
        &self,
        warc: &dyn DocumentSource,
        output: &mut dyn TripleHandler,
    ) -> Result<BatchReport> {
        tracing::info!("Processing WARC {}", warc.document_uri());
        let mut stream = BufReader::new(warc.open_stream()?);
        let mut reader: Box<dyn BufRead + '_> = if stream.fill_buf()?.starts_with(&GZIP_MAGIC) {
            tracing::debug!("Decompressing gzip WARC {}", warc.document_uri());
            Box::new(BufReader::new(MultiGzDecoder::new(stream)))
        } else {
            Box::new(stream)
        };

        let mut report = BatchReport::default();
        let mut records = 0usize;
        loop {
            let record = match read_record(&mut reader) {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) if is_container_error(&e) => {
                    tracing::warn!(
                        "Stopping WARC {} after {} records: {}",
                        warc.document_uri(),
                        records,
                        e
                    );
                    report.push(
                        format!("{}#record-{}", warc.document_uri(), records + 1),
                        BatchOutcome::Failed(e.to_string()),
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            records += 1;
            if !record.is_response() {
                continue;
            }
            let Some(target) = record.header("warc-target-uri").map(str::to_string) else {
                report.push(
                    format!("{}#record", warc.document_uri()),
                    BatchOutcome::Failed("response record without WARC-Target-URI".to_string()),
                );
                continue;
            };
            let source = match split_http_response(&record.block) {
                Some((content_type, body)) => {
                    let source = ByteArrayDocumentSource::new(body.to_vec(), target);
                    match content_type {
                        Some(content_type) => source.with_content_type(content_type),
                        None => source,
                    }
                }
                None => {
                    tracing::warn!("Malformed HTTP response in record for {}", target);
                    report.push(
                        target,
                        BatchOutcome::Failed("malformed HTTP response block".to_string()),
                    );
                    continue;
                }
            };
            extract_item(&self.extraction, &source, output, &mut report)?;
        }
        Ok(report)
    }
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors in the WARC container itself, as opposed to the source stream
fn is_container_error(error: &ExtractionError) -> bool {
    match error {
        ExtractionError::Archive(_) => true,
        ExtractionError::Io(e) => matches!(
            e.kind(),
            ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}

struct WarcRecord {
    /// Lowercased header names
    headers: Vec<(String, String)>,
    block: Vec<u8>,
}

impl WarcRecord {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn is_response(&self) -> bool {
        self.header("warc-type")
            .is_some_and(|t| t.eq_ignore_ascii_case("response"))
    }
}

fn read_line(reader: &mut impl BufRead) -> Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn read_record(reader: &mut impl BufRead) -> Result<Option<WarcRecord>> {
    // records are separated by blank lines
    let version = loop {
        match read_line(reader)? {
            None => return Ok(None),
            Some(line) if line.is_empty() => continue,
            Some(line) => break line,
        }
    };
    if !version.starts_with("WARC/") {
        return Err(ExtractionError::Archive(format!(
            "expected a WARC version line, found {version:?}"
        )));
    }

    let mut headers = Vec::new();
    loop {
        match read_line(reader)? {
            None => {
                return Err(ExtractionError::Archive(
                    "unexpected end of WARC headers".to_string(),
                ))
            }
            Some(line) if line.is_empty() => break,
            Some(line) => {
                if let Some((name, value)) = line.split_once(':') {
                    headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
                }
            }
        }
    }

    let length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .and_then(|(_, value)| value.parse::<u64>().ok())
        .ok_or_else(|| ExtractionError::Archive("WARC record without Content-Length".to_string()))?;

    let mut block = Vec::new();
    reader.take(length).read_to_end(&mut block)?;
    if (block.len() as u64) < length {
        return Err(ExtractionError::Archive("truncated WARC record".to_string()));
    }
    Ok(Some(WarcRecord { headers, block }))
}

/// Content type and body of an HTTP response block
fn split_http_response(block: &[u8]) -> Option<(Option<String>, &[u8])> {
    if !block.starts_with(b"HTTP/") {
        return None;
    }
    let (head_len, sep_len) = find(block, b"\r\n\r\n")
        .map(|i| (i, 4))
        .or_else(|| find(block, b"\n\n").map(|i| (i, 2)))?;
    let head = String::from_utf8_lossy(&block[..head_len]);
    let content_type = head.lines().skip(1).find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-type")
            .then(|| value.trim().to_string())
    });
    Some((content_type, &block[head_len + sep_len..]))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_uri_escapes() {
        assert_eq!(
            entry_uri("file:///tmp/a.zip", "dir/my file.nt"),
            "file:///tmp/a.zip!/dir/my%20file.nt"
        );
        assert_eq!(entry_uri("http://x/a.zip", "b<c>"), "http://x/a.zip!/b%3Cc%3E");
    }

    #[test]
    fn test_read_records() {
        let warc = "WARC/1.0\r\nWARC-Type: warcinfo\r\nContent-Length: 4\r\n\r\ninfo\r\n\r\n\
                    WARC/1.0\r\nWARC-Type: response\r\nWARC-Target-URI: http://example.org/\r\n\
                    Content-Length: 10\r\n\r\nHTTP/1.1 2\r\n\r\n";
        let mut reader = BufReader::new(warc.as_bytes());
        let first = read_record(&mut reader).unwrap().unwrap();
        assert!(!first.is_response());
        assert_eq!(first.block, b"info");

        let second = read_record(&mut reader).unwrap().unwrap();
        assert!(second.is_response());
        assert_eq!(second.header("warc-target-uri"), Some("http://example.org/"));
        assert!(read_record(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_read_record_errors() {
        let mut garbage = BufReader::new("hello\n".as_bytes());
        assert!(matches!(read_record(&mut garbage), Err(ExtractionError::Archive(_))));

        let mut truncated =
            BufReader::new("WARC/1.0\r\nContent-Length: 99\r\n\r\nshort".as_bytes());
        assert!(matches!(read_record(&mut truncated), Err(ExtractionError::Archive(_))));
    }

    #[test]
    fn test_split_http_response() {
        let block = b"HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nServer: x\r\n\r\n<html/>";
        let (content_type, body) = split_http_response(block).unwrap();
        assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert_eq!(body, b"<html/>");

        let (content_type, body) = split_http_response(b"HTTP/1.0 200 OK\n\nbody").unwrap();
        assert_eq!(content_type, None);
        assert_eq!(body, b"body");

        assert!(split_http_response(b"GET / HTTP/1.1\r\n\r\n").is_none());
    }
}
