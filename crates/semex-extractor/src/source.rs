//! Document sources
//!
//! A [`DocumentSource`] may be opened several times: once for the MIME sample
//! and once per extractor. Remote sources (`is_local() == false`) are read
//! once into a [`MemCopyDocumentSource`] by the orchestrator.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait DocumentSource: Send + Sync {
    /// URI of the document; becomes the document IRI unless overridden
    fn document_uri(&self) -> &str;

    fn open_stream(&self) -> io::Result<Box<dyn Read + Send + '_>>;

    /// Declared content type, e.g. from an HTTP header
    fn content_type(&self) -> Option<&str> {
        None
    }

    fn content_length(&self) -> Option<u64> {
        None
    }

    /// File name used by MIME detection
    fn file_name(&self) -> Option<&str> {
        let uri = self.document_uri();
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        path.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Local sources can be reopened cheaply
    fn is_local(&self) -> bool;
}

// ============================================================================
// In-memory sources
// ============================================================================

#[derive(Debug, Clone)]
pub struct StringDocumentSource {
    uri: String,
    content: String,
    content_type: Option<String>,
}

impl StringDocumentSource {
    pub fn new(content: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            content: content.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl DocumentSource for StringDocumentSource {
    fn document_uri(&self) -> &str {
        &self.uri
    }

    fn open_stream(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(self.content.as_bytes()))
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn content_length(&self) -> Option<u64> {
        Some(self.content.len() as u64)
    }

    fn is_local(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct ByteArrayDocumentSource {
    uri: String,
    content: Vec<u8>,
    content_type: Option<String>,
}

impl ByteArrayDocumentSource {
    pub fn new(content: impl Into<Vec<u8>>, uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            content: content.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

impl DocumentSource for ByteArrayDocumentSource {
    fn document_uri(&self) -> &str {
        &self.uri
    }

    fn open_stream(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(self.content.as_slice()))
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn content_length(&self) -> Option<u64> {
        Some(self.content.len() as u64)
    }

    fn is_local(&self) -> bool {
        true
    }
}

// ============================================================================
// Files
// ============================================================================

#[derive(Debug, Clone)]
pub struct FileDocumentSource {
    path: PathBuf,
    uri: String,
}

impl FileDocumentSource {
    /// Source for `path`, identified by its `file://` URI
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let uri = file_uri(&path);
        Self { path, uri }
    }

    /// Source for `path` identified by an explicit URI
    pub fn with_uri(path: impl Into<PathBuf>, uri: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            uri: uri.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn file_uri(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut uri = String::from("file://");
    for c in absolute.to_string_lossy().chars() {
        match c {
            ' ' => uri.push_str("%20"),
            '\\' => uri.push('/'),
            '"' | '<' | '>' | '{' | '}' | '|' | '^' | '`' | '%' | '#' | '?' | '[' | ']' => {
                uri.push_str(&format!("%{:02X}", c as u32));
            }
            c => uri.push(c),
        }
    }
    uri
}

impl DocumentSource for FileDocumentSource {
    fn document_uri(&self) -> &str {
        &self.uri
    }

    fn open_stream(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(BufReader::new(File::open(&self.path)?)))
    }

    fn content_length(&self) -> Option<u64> {
        std::fs::metadata(&self.path).ok().map(|m| m.len())
    }

    fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    fn is_local(&self) -> bool {
        true
    }
}

// ============================================================================
// Streams
// ============================================================================

/// A one-shot, non-local stream such as an HTTP response body.
///
/// The stream can be opened once; the orchestrator copies it to memory
/// before running extractors.
pub struct StreamDocumentSource {
    uri: String,
    content_type: Option<String>,
    stream: Mutex<Option<Box<dyn Read + Send>>>,
}

impl StreamDocumentSource {
    pub fn new(stream: Box<dyn Read + Send>, uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            content_type: None,
            stream: Mutex::new(Some(stream)),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl DocumentSource for StreamDocumentSource {
    fn document_uri(&self) -> &str {
        &self.uri
    }

    fn open_stream(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        let mut slot = self
            .stream
            .lock()
            .map_err(|_| io::Error::other("stream lock poisoned"))?;
        let stream = slot.take().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream for {} was already consumed", self.uri),
            )
        })?;
        Ok(stream)
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn is_local(&self) -> bool {
        false
    }
}

// ============================================================================
// Local copy
// ============================================================================

/// In-memory copy of another source, owned by a single extraction run
#[derive(Debug, Clone)]
pub struct MemCopyDocumentSource {
    uri: String,
    content_type: Option<String>,
    file_name: Option<String>,
    content: Vec<u8>,
}

impl MemCopyDocumentSource {
    pub fn copy(source: &dyn DocumentSource) -> io::Result<Self> {
        let mut content = Vec::new();
        source.open_stream()?.read_to_end(&mut content)?;
        Ok(Self {
            uri: source.document_uri().to_string(),
            content_type: source.content_type().map(str::to_string),
            file_name: source.file_name().map(str::to_string),
            content,
        })
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

impl DocumentSource for MemCopyDocumentSource {
    fn document_uri(&self) -> &str {
        &self.uri
    }

    fn open_stream(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(Cursor::new(self.content.as_slice())))
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn content_length(&self) -> Option<u64> {
        Some(self.content.len() as u64)
    }

    fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    fn is_local(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn read_all(source: &dyn DocumentSource) -> String {
        let mut out = String::new();
        source.open_stream().unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_in_memory_sources_reopen() {
        let source = StringDocumentSource::new("hello", "http://example.org/a.txt")
            .with_content_type("text/plain");
        assert_eq!(read_all(&source), "hello");
        assert_eq!(read_all(&source), "hello");
        assert_eq!(source.content_type(), Some("text/plain"));
        assert_eq!(source.file_name(), Some("a.txt"));
        assert_eq!(source.content_length(), Some(5));

        let bytes = ByteArrayDocumentSource::new(b"abc".to_vec(), "http://example.org/dir/");
        assert_eq!(read_all(&bytes), "abc");
        assert_eq!(bytes.file_name(), None);
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data file.csv");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"a,b\n1,2\n")
            .unwrap();

        let source = FileDocumentSource::new(&path);
        assert!(source.document_uri().starts_with("file://"));
        assert!(source.document_uri().ends_with("data%20file.csv"));
        assert_eq!(source.file_name(), Some("data file.csv"));
        assert_eq!(source.content_length(), Some(8));
        assert_eq!(read_all(&source), "a,b\n1,2\n");

        let missing = FileDocumentSource::new(dir.path().join("missing.csv"));
        assert!(missing.open_stream().is_err());
    }

    #[test]
    fn test_stream_source_needs_local_copy() {
        let stream = StreamDocumentSource::new(
            Box::new(Cursor::new(b"payload".to_vec())),
            "http://example.org/remote",
        )
        .with_content_type("text/html");
        assert!(!stream.is_local());

        let copy = MemCopyDocumentSource::copy(&stream).unwrap();
        assert!(stream.open_stream().is_err());
        assert!(copy.is_local());
        assert_eq!(read_all(&copy), "payload");
        assert_eq!(read_all(&copy), "payload");
        assert_eq!(copy.content_type(), Some("text/html"));
        assert_eq!(copy.document_uri(), "http://example.org/remote");
    }
}
