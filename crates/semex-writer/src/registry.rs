//! Writer lookup by format identifier

use std::io::Write;

use semex_core::OutputFormat;

use crate::json::{JsonWriter, JSON_MIME_TYPE};
use crate::nquads::{NQuadsWriter, NTriplesWriter, NQUADS_MIME_TYPE, NTRIPLES_MIME_TYPE};
use crate::FormatWriter;

/// Static description of a built-in writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterFormat {
    pub format: OutputFormat,
    pub identifier: &'static str,
    pub mime_type: &'static str,
    pub supports_quads: bool,
}

const FORMATS: [WriterFormat; 3] = [
    WriterFormat {
        format: OutputFormat::NQuads,
        identifier: "nquads",
        mime_type: NQUADS_MIME_TYPE,
        supports_quads: true,
    },
    WriterFormat {
        format: OutputFormat::NTriples,
        identifier: "ntriples",
        mime_type: NTRIPLES_MIME_TYPE,
        supports_quads: false,
    },
    WriterFormat {
        format: OutputFormat::Json,
        identifier: "json",
        mime_type: JSON_MIME_TYPE,
        supports_quads: true,
    },
];

pub fn writer_formats() -> &'static [WriterFormat] {
    &FORMATS
}

/// Look a writer up by its MIME type
pub fn format_for_mime_type(mime_type: &str) -> Option<&'static WriterFormat> {
    FORMATS
        .iter()
        .find(|f| f.mime_type.eq_ignore_ascii_case(mime_type.trim()))
}

pub fn create_writer(format: OutputFormat, out: Box<dyn Write + Send>) -> Box<dyn FormatWriter> {
    match format {
        OutputFormat::NQuads => Box::new(NQuadsWriter::new(out)),
        OutputFormat::NTriples => Box::new(NTriplesWriter::new(out)),
        OutputFormat::Json => Box::new(JsonWriter::new(out)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_match_writers() {
        for descriptor in writer_formats() {
            let writer = create_writer(descriptor.format, Box::new(std::io::sink()));
            assert_eq!(writer.mime_type(), descriptor.mime_type);
            assert_eq!(writer.supports_quads(), descriptor.supports_quads);
            assert_eq!(descriptor.format.identifier(), descriptor.identifier);
        }
    }

    #[test]
    fn test_lookup_by_mime_type() {
        assert_eq!(
            format_for_mime_type("application/n-triples").map(|f| f.format),
            Some(OutputFormat::NTriples)
        );
        assert!(format_for_mime_type("text/turtle").is_none());
    }
}
