//! MIME types with quality weights and accept-header reduction

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::SemexError;

/// The type used when nothing better is known; it matches every extractor
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A parsed `type/subtype[;q=x]` value
///
/// `None` in either position is a wildcard. Quality values outside `(0, 1)`
/// are normalized to `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct MimeType {
    major: Option<String>,
    subtype: Option<String>,
    quality: f64,
}

impl MimeType {
    pub fn parse(value: &str) -> Result<Self, SemexError> {
        let invalid = || SemexError::InvalidMimeType(value.to_string());

        let (type_part, params) = match value.find(';') {
            Some(i) => (&value[..i], Some(&value[i + 1..])),
            None => (value, None),
        };

        let mut quality = 1.0;
        for param in params.into_iter().flat_map(|p| p.split(';')) {
            let Some((key, raw)) = param.split_once('=') else {
                continue;
            };
            if !key.trim().eq_ignore_ascii_case("q") {
                continue;
            }
            let Ok(q) = raw.trim().parse::<f64>() else {
                continue;
            };
            quality = if q <= 0.0 || q >= 1.0 { 1.0 } else { q };
        }

        let (major, subtype) = type_part.split_once('/').ok_or_else(invalid)?;
        let major = major.trim().to_ascii_lowercase();
        let subtype = subtype.trim().to_ascii_lowercase();
        if major.is_empty() || subtype.is_empty() {
            return Err(invalid());
        }

        match (major.as_str(), subtype.as_str()) {
            ("*", "*") => Ok(Self::any().with_quality(quality)),
            ("*", _) => Err(invalid()),
            (_, "*") => Ok(Self {
                major: Some(major),
                subtype: None,
                quality,
            }),
            _ => Ok(Self {
                major: Some(major),
                subtype: Some(subtype),
                quality,
            }),
        }
    }

    /// `*/*`
    pub fn any() -> Self {
        Self {
            major: None,
            subtype: None,
            quality: 1.0,
        }
    }

    /// `application/octet-stream`
    pub fn octet_stream() -> Self {
        Self {
            major: Some("application".to_string()),
            subtype: Some("octet-stream".to_string()),
            quality: 1.0,
        }
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    pub fn major_type(&self) -> &str {
        self.major.as_deref().unwrap_or("*")
    }

    pub fn subtype(&self) -> &str {
        self.subtype.as_deref().unwrap_or("*")
    }

    pub fn full_type(&self) -> String {
        format!("{}/{}", self.major_type(), self.subtype())
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn is_any_major_type(&self) -> bool {
        self.major.is_none()
    }

    pub fn is_any_subtype(&self) -> bool {
        self.subtype.is_none()
    }

    pub fn is_octet_stream(&self) -> bool {
        self.full_type() == OCTET_STREAM
    }

    /// How specifically this pattern matches `concrete`:
    /// 2 for an exact match, 1 for `type/*`, 0 for `*/*`, `None` otherwise
    pub fn match_rank(&self, concrete: &MimeType) -> Option<u8> {
        if self.is_any_major_type() {
            return Some(0);
        }
        if self.major_type() != concrete.major_type() {
            return None;
        }
        if self.is_any_subtype() {
            return Some(1);
        }
        (self.subtype() == concrete.subtype()).then_some(2)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quality == 1.0 {
            write!(f, "{}", self.full_type())
        } else {
            write!(f, "{};q={}", self.full_type(), self.quality)
        }
    }
}

impl FromStr for MimeType {
    type Err = SemexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Accept header
// ============================================================================

/// Build a single accept header out of a list of quality-weighted types.
///
/// For every full type only the highest-quality entry is kept. A specific type
/// is dropped when a `type/*` or `*/*` of equal or higher quality exists, and a
/// `type/*` is dropped when `*/*` has equal or higher quality. Surviving
/// entries keep their input order. Returns `None` for an empty input.
pub fn accept_header(types: &[MimeType]) -> Option<String> {
    if types.is_empty() {
        return None;
    }

    let mut any_type: Option<usize> = None;
    let mut any_subtype: HashMap<String, usize> = HashMap::new();
    let mut specific: HashMap<String, usize> = HashMap::new();

    for (i, mime) in types.iter().enumerate() {
        let better = |current: Option<&usize>| match current {
            Some(&j) => mime.quality() > types[j].quality(),
            None => true,
        };
        if mime.is_any_major_type() {
            if better(any_type.as_ref()) {
                any_type = Some(i);
            }
        } else if mime.is_any_subtype() {
            let key = mime.major_type().to_string();
            if better(any_subtype.get(&key)) {
                any_subtype.insert(key, i);
            }
        } else {
            let key = mime.full_type();
            if better(specific.get(&key)) {
                specific.insert(key, i);
            }
        }
    }

    let any_quality = any_type.map(|i| types[i].quality());
    let covered_by_any = |q: f64| any_quality.is_some_and(|aq| q <= aq);

    specific.retain(|_, &mut i| {
        let mime = &types[i];
        let by_subtype = any_subtype
            .get(mime.major_type())
            .is_some_and(|&j| mime.quality() <= types[j].quality());
        !by_subtype && !covered_by_any(mime.quality())
    });
    any_subtype.retain(|_, &mut i| !covered_by_any(types[i].quality()));

    let mut kept: Vec<usize> = any_type
        .into_iter()
        .chain(any_subtype.into_values())
        .chain(specific.into_values())
        .collect();
    kept.sort_unstable();

    Some(
        kept.into_iter()
            .map(|i| types[i].to_string())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mimes(values: &[&str]) -> Vec<MimeType> {
        values.iter().map(|v| MimeType::parse(v).unwrap()).collect()
    }

    #[test]
    fn test_parse() {
        let m = MimeType::parse("Text/HTML; charset=utf-8; q=0.5").unwrap();
        assert_eq!(m.full_type(), "text/html");
        assert_eq!(m.quality(), 0.5);
        assert_eq!(m.to_string(), "text/html;q=0.5");

        let wildcard = MimeType::parse("text/*").unwrap();
        assert!(wildcard.is_any_subtype());
        assert!(!wildcard.is_any_major_type());

        assert!(MimeType::parse("*/*").unwrap().is_any_major_type());
        assert!(MimeType::parse("*/html").is_err());
        assert!(MimeType::parse("texthtml").is_err());
    }

    #[test]
    fn test_quality_normalization() {
        assert_eq!(MimeType::parse("a/b;q=1.5").unwrap().quality(), 1.0);
        assert_eq!(MimeType::parse("a/b;q=0").unwrap().quality(), 1.0);
        assert_eq!(MimeType::parse("a/b;q=abc").unwrap().quality(), 1.0);
    }

    #[test]
    fn test_match_rank() {
        let html = MimeType::parse("text/html").unwrap();
        assert_eq!(MimeType::parse("text/html").unwrap().match_rank(&html), Some(2));
        assert_eq!(MimeType::parse("text/*").unwrap().match_rank(&html), Some(1));
        assert_eq!(MimeType::any().match_rank(&html), Some(0));
        assert_eq!(MimeType::parse("text/plain").unwrap().match_rank(&html), None);
        assert_eq!(MimeType::parse("image/*").unwrap().match_rank(&html), None);
    }

    #[test]
    fn test_accept_header_drops_covered_specific_type() {
        let header = accept_header(&mimes(&[
            "text/*;q=0.5",
            "text/plain;q=0.1",
            "application/rdf+xml;q=1.0",
        ]))
        .unwrap();
        assert_eq!(header, "text/*;q=0.5, application/rdf+xml");
    }

    #[test]
    fn test_accept_header_keeps_higher_specific_type() {
        let header = accept_header(&mimes(&["text/*;q=0.5", "text/html"])).unwrap();
        assert_eq!(header, "text/*;q=0.5, text/html");
    }

    #[test]
    fn test_accept_header_any_type_covers_everything_lower() {
        let header = accept_header(&mimes(&[
            "text/*;q=0.3",
            "application/xml;q=0.4",
            "*/*;q=0.5",
            "text/html",
        ]))
        .unwrap();
        assert_eq!(header, "*/*;q=0.5, text/html");
    }

    #[test]
    fn test_accept_header_deduplicates_keeping_highest() {
        let header = accept_header(&mimes(&["text/html;q=0.2", "text/html;q=0.8"])).unwrap();
        assert_eq!(header, "text/html;q=0.8");
        assert!(accept_header(&[]).is_none());
    }
}
