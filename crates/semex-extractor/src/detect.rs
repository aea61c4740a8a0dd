//! MIME type detection

use semex_core::MimeType;
use semex_writer::parse_nquads_line;

/// Guesses the MIME type of a document from a bounded content prefix.
///
/// `None` means inconclusive; the caller then falls back to
/// `application/octet-stream`.
pub trait MimeDetector: Send + Sync {
    fn guess_type(
        &self,
        file_name: Option<&str>,
        sample: &[u8],
        declared: Option<&MimeType>,
    ) -> Option<MimeType>;
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Signature, declared type and extension based detector
#[derive(Debug, Clone, Default)]
pub struct HeuristicMimeDetector;

impl HeuristicMimeDetector {
    pub fn new() -> Self {
        Self
    }

    fn by_extension(file_name: &str) -> Option<&'static str> {
        let (_, ext) = file_name.rsplit_once('.')?;
        let mime = match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => "text/html",
            "xhtml" => "application/xhtml+xml",
            "xml" => "application/xml",
            "nq" => "application/n-quads",
            "nt" => "application/n-triples",
            "csv" => "text/csv",
            "tsv" => "text/tab-separated-values",
            "yaml" | "yml" => "text/yaml",
            "json" => "application/json",
            "txt" => "text/plain",
            "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "xls" => "application/vnd.ms-excel",
            "ods" => "application/vnd.oasis.opendocument.spreadsheet",
            "zip" => "application/zip",
            "warc" => "application/warc",
            _ => return None,
        };
        Some(mime)
    }

    fn by_signature(sample: &[u8], extension: Option<&'static str>) -> Option<&'static str> {
        if sample.starts_with(ZIP_MAGIC) {
            // spreadsheets are zip containers too
            return Some(match extension {
                Some(ext) if ext.contains("spreadsheet") => ext,
                _ => "application/zip",
            });
        }
        if sample.starts_with(OLE_MAGIC) {
            return Some("application/vnd.ms-excel");
        }
        if sample.starts_with(b"WARC/") {
            return Some("application/warc");
        }
        None
    }

    fn by_text(sample: &[u8]) -> Option<&'static str> {
        let text = String::from_utf8_lossy(sample);
        let text = text.trim_start_matches('\u{feff}').trim_start();
        let head: String = text.chars().take(512).collect::<String>().to_ascii_lowercase();

        if head.starts_with("<!doctype html") || head.starts_with("<html") || head.contains("<html") {
            return Some("text/html");
        }
        if head.starts_with("<?xml") {
            return Some("application/xml");
        }
        if head.starts_with("{") || head.starts_with("[") {
            return Some("application/json");
        }

        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .take(8)
            .collect();
        if lines.is_empty() {
            return None;
        }
        if let Some(mime) = Self::statements(&lines) {
            return Some(mime);
        }
        if head.starts_with("---") || lines.iter().all(|l| is_yaml_line(l)) {
            return Some("text/yaml");
        }
        if lines.len() >= 2 {
            let commas = lines[0].matches(',').count();
            if commas > 0 && lines.iter().all(|l| l.matches(',').count() == commas) {
                return Some("text/csv");
            }
        }
        None
    }

    /// N-Quads when any statement names a graph, N-Triples otherwise
    fn statements(lines: &[&str]) -> Option<&'static str> {
        let mut graph = false;
        // the sample may cut the last line short
        let complete = if lines.len() > 1 { &lines[..lines.len() - 1] } else { lines };
        for line in complete {
            match parse_nquads_line(line, 1) {
                Ok(Some(quad)) => graph |= quad.graph.is_some(),
                _ => return None,
            }
        }
        Some(if graph {
            "application/n-quads"
        } else {
            "application/n-triples"
        })
    }
}

fn is_yaml_line(line: &str) -> bool {
    if line.starts_with("- ") || line == "-" {
        return true;
    }
    match line.split_once(':') {
        Some((key, rest)) => {
            !key.is_empty()
                && !key.contains(' ')
                && !key.contains(',')
                && (rest.is_empty() || rest.starts_with(' '))
        }
        None => false,
    }
}

fn is_generic(mime: &MimeType) -> bool {
    mime.is_octet_stream()
        || mime.is_any_major_type()
        || mime.is_any_subtype()
        || mime.full_type() == "text/plain"
}

impl MimeDetector for HeuristicMimeDetector {
    fn guess_type(
        &self,
        file_name: Option<&str>,
        sample: &[u8],
        declared: Option<&MimeType>,
    ) -> Option<MimeType> {
        let extension = file_name.and_then(Self::by_extension);

        let guess = Self::by_signature(sample, extension)
            .map(str::to_string)
            .or_else(|| {
                declared
                    .filter(|d| !is_generic(d))
                    .map(MimeType::full_type)
            })
            .or_else(|| extension.map(str::to_string))
            .or_else(|| Self::by_text(sample).map(str::to_string))
            .or_else(|| declared.map(MimeType::full_type))?;

        let mime = MimeType::parse(&guess).ok();
        tracing::debug!(
            "Detected {} (file name {:?}, declared {:?})",
            guess,
            file_name,
            declared.map(MimeType::full_type)
        );
        mime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guess(file_name: Option<&str>, sample: &str, declared: Option<&str>) -> Option<String> {
        let declared = declared.map(|d| MimeType::parse(d).unwrap());
        HeuristicMimeDetector::new()
            .guess_type(file_name, sample.as_bytes(), declared.as_ref())
            .map(|m| m.full_type())
    }

    #[test]
    fn test_declared_type_wins_unless_generic() {
        assert_eq!(
            guess(Some("page.csv"), "<html></html>", Some("text/html; charset=utf-8")).as_deref(),
            Some("text/html")
        );
        assert_eq!(
            guess(Some("data.csv"), "a,b\n1,2\n", Some("application/octet-stream")).as_deref(),
            Some("text/csv")
        );
    }

    #[test]
    fn test_extension() {
        assert_eq!(guess(Some("x.nq"), "", None).as_deref(), Some("application/n-quads"));
        assert_eq!(guess(Some("x.YML"), "", None).as_deref(), Some("text/yaml"));
        assert_eq!(guess(Some("noext"), "", None), None);
    }

    #[test]
    fn test_content_sniffing() {
        assert_eq!(
            guess(None, "  <!DOCTYPE html><html><head>", None).as_deref(),
            Some("text/html")
        );
        assert_eq!(
            guess(
                None,
                "<http://s> <http://p> <http://o> <http://g> .\n<http://s> <http://p> \"x\" .\n",
                None
            )
            .as_deref(),
            Some("application/n-quads")
        );
        assert_eq!(
            guess(None, "# c\n<http://s> <http://p> <http://o> .\n_:b <http://p> \"x\" .\n", None)
                .as_deref(),
            Some("application/n-triples")
        );
        assert_eq!(guess(None, "name,age\nann,3\nbob,4\n", None).as_deref(), Some("text/csv"));
        assert_eq!(guess(None, "name: ann\nage: 3\n", None).as_deref(), Some("text/yaml"));
        assert_eq!(guess(None, "just some words", None), None);
    }

    #[test]
    fn test_binary_signatures() {
        let detector = HeuristicMimeDetector::new();
        let zip = b"PK\x03\x04rest";
        assert_eq!(
            detector.guess_type(Some("book.xlsx"), zip, None).map(|m| m.full_type()).as_deref(),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        );
        assert_eq!(
            detector.guess_type(Some("bundle.bin"), zip, None).map(|m| m.full_type()).as_deref(),
            Some("application/zip")
        );
        assert_eq!(
            detector.guess_type(None, OLE_MAGIC, None).map(|m| m.full_type()).as_deref(),
            Some("application/vnd.ms-excel")
        );
    }
}
