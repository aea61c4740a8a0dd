//! HTML `<head>` extractors
//!
//! These scan the decoded markup with regular expressions instead of
//! building a DOM; they only look at `<title>`, `<link>` and `<base>`.

use once_cell::sync::Lazy;
use regex::Regex;

use semex_core::{ExtractionContext, ExtractionParameters, Iri, Literal, SemexError};
use semex_extractor::{
    ExtractionError, ExtractionInput, ExtractionResult, Extractor, ExtractorDescription,
    ExtractorFactory, ExtractorKind, Result,
};

use crate::rdf::mime;
use crate::vocab::{self, DCTERMS, XHTML};

pub const TITLE_EXTRACTOR: &str = "html-head-title";
pub const HEAD_LINKS_EXTRACTOR: &str = "html-head-links";

/// Link types that point at RDF documents
const RDF_LINK_TYPES: [&str; 6] = [
    "application/rdf+xml",
    "text/rdf",
    "application/x-turtle",
    "application/turtle",
    "text/turtle",
    "text/rdf+n3",
];

static TITLE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").ok());
static HEAD: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?is)<head\b[^>]*>(.*?)(?:</head\s*>|<body\b)").ok());
static HTML_LANG: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"(?is)<html\b[^>]*?\blang\s*=\s*["']?([A-Za-z0-9-]+)"#).ok());
static TAG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?is)<(link|base)\b([^>]*)>").ok());
static ATTRIBUTE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).ok()
});

fn markup<'a>(name: &str, input: ExtractionInput<'a>) -> Result<&'a str> {
    match input {
        ExtractionInput::Markup(text) => Ok(text),
        _ => Err(ExtractionError::extractor(name, "expected decoded markup")),
    }
}

fn html_types(description: ExtractorDescription, quality: f64) -> ExtractorDescription {
    description
        .with_type(mime("text/html").with_quality(quality))
        .with_type(mime("application/xhtml+xml").with_quality(quality))
}

// ============================================================================
// Title
// ============================================================================

/// Writes `<doc> dcterms:title "..."` for a non-empty `<title>`
#[derive(Debug, Default)]
pub struct TitleExtractor;

impl TitleExtractor {
    pub fn factory() -> ExtractorFactory {
        let description = html_types(
            ExtractorDescription::new(TITLE_EXTRACTOR, ExtractorKind::Markup),
            0.02,
        )
        .with_prefix("dcterms", DCTERMS);
        ExtractorFactory::new(description, || Box::new(TitleExtractor))
    }
}

impl Extractor for TitleExtractor {
    fn run(
        &mut self,
        _parameters: &ExtractionParameters,
        context: &ExtractionContext,
        input: ExtractionInput<'_>,
        result: &mut ExtractionResult<'_>,
    ) -> Result<()> {
        let text = markup(TITLE_EXTRACTOR, input)?;
        let Some(title) = find_title(text) else {
            return Ok(());
        };

        let literal = match document_language(text) {
            Some(lang) => Literal::with_language(title.as_str(), &lang)
                .unwrap_or_else(|_| Literal::new(title.as_str())),
            None => Literal::new(title),
        };
        result.write_triple(
            context.document_iri().clone(),
            vocab::term(DCTERMS, "title")?,
            literal,
        )
    }

    fn set_stop_at_first_error(&mut self, _stop: bool) {}
}

/// Trimmed, entity-decoded title; `None` when absent or blank
pub(crate) fn find_title(text: &str) -> Option<String> {
    let captures = TITLE.as_ref()?.captures(text)?;
    let title = decode_entities(captures.get(1)?.as_str());
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

fn document_language(text: &str) -> Option<String> {
    let captures = HTML_LANG.as_ref()?.captures(text)?;
    Some(captures.get(1)?.as_str().to_string())
}

// ============================================================================
// Head links
// ============================================================================

/// Links in `<head>` that point at RDF representations of the page.
///
/// For `<link rel="R" href="H" type="T" title="X">` it writes
/// `<doc> xhtml:R <H>`, `<H> dcterms:format "T"` and `<H> dcterms:title "X"`.
#[derive(Debug, Default)]
pub struct HeadLinkExtractor {
    stop_at_first_error: bool,
}

impl HeadLinkExtractor {
    pub fn factory() -> ExtractorFactory {
        let description = html_types(
            ExtractorDescription::new(HEAD_LINKS_EXTRACTOR, ExtractorKind::Markup),
            0.05,
        )
        .with_prefix("xhtml", XHTML)
        .with_prefix("dcterms", DCTERMS);
        ExtractorFactory::new(description, || Box::new(HeadLinkExtractor::default()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeadLink {
    pub rel: String,
    pub href: String,
    pub media_type: String,
    pub title: Option<String>,
}

impl Extractor for HeadLinkExtractor {
    fn run(
        &mut self,
        _parameters: &ExtractionParameters,
        context: &ExtractionContext,
        input: ExtractionInput<'_>,
        result: &mut ExtractionResult<'_>,
    ) -> Result<()> {
        let text = markup(HEAD_LINKS_EXTRACTOR, input)?;
        let (base, links) = scan_head(text);
        let document = context.document_iri().as_str();
        let base = base
            .and_then(|b| resolve_reference(document, &b).ok())
            .map(String::from)
            .unwrap_or_else(|| document.to_string());

        let format = vocab::term(DCTERMS, "format")?;
        let title = vocab::term(DCTERMS, "title")?;
        for link in links {
            let href = match resolve_reference(&base, &link.href) {
                Ok(href) => href,
                Err(e) if self.stop_at_first_error => {
                    return Err(ExtractionError::extractor(HEAD_LINKS_EXTRACTOR, e.to_string()))
                }
                Err(e) => {
                    result.notify_issue(
                        semex_core::IssueLevel::Warning,
                        format!("Skipping link {:?}: {}", link.href, e),
                    );
                    continue;
                }
            };
            for rel in link.rel.split_whitespace() {
                result.write_triple(
                    context.document_iri().clone(),
                    vocab::term(XHTML, &rel.to_ascii_lowercase())?,
                    href.clone(),
                )?;
            }
            if let Some(link_title) = link.title.filter(|t| !t.is_empty()) {
                result.write_triple(href.clone(), title.clone(), Literal::new(link_title))?;
            }
            result.write_triple(href, format.clone(), Literal::new(link.media_type))?;
        }
        Ok(())
    }

    fn set_stop_at_first_error(&mut self, stop: bool) {
        self.stop_at_first_error = stop;
    }
}

/// `<base href>` and the RDF links of the head section
pub(crate) fn scan_head(text: &str) -> (Option<String>, Vec<HeadLink>) {
    let (Some(head_re), Some(tag_re)) = (HEAD.as_ref(), TAG.as_ref()) else {
        return (None, Vec::new());
    };
    let head = head_re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    let mut base = None;
    let mut links = Vec::new();
    for tag in tag_re.captures_iter(head) {
        let (Some(name), Some(body)) = (tag.get(1), tag.get(2)) else {
            continue;
        };
        let attributes = attributes(body.as_str());
        let attribute = |key: &str| {
            attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        if name.as_str().eq_ignore_ascii_case("base") {
            if base.is_none() {
                base = attribute("href");
            }
            continue;
        }
        let (Some(rel), Some(href), Some(media_type)) =
            (attribute("rel"), attribute("href"), attribute("type"))
        else {
            continue;
        };
        if !RDF_LINK_TYPES.contains(&media_type.as_str()) || rel.trim().is_empty() {
            continue;
        }
        links.push(HeadLink {
            rel,
            href,
            media_type,
            title: attribute("title"),
        });
    }
    (base, links)
}

/// Lowercased attribute names with decoded values
fn attributes(tag_body: &str) -> Vec<(String, String)> {
    let Some(re) = ATTRIBUTE.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(tag_body)
        .filter_map(|c| {
            let name = c.get(1)?.as_str().to_ascii_lowercase();
            let value = c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4))?.as_str();
            Some((name, decode_entities(value.trim())))
        })
        .collect()
}

/// Resolve a link target against `base` (RFC 3986).
///
/// A relative `base` only admits absolute targets.
pub(crate) fn resolve_reference(base: &str, reference: &str) -> semex_core::Result<Iri> {
    let reference = reference.trim();
    match oxiri::Iri::parse(base) {
        Ok(base) => {
            let resolved = base.resolve(reference).map_err(|e| SemexError::InvalidIri {
                value: reference.to_string(),
                reason: e.to_string(),
            })?;
            Iri::new(resolved.into_inner())
        }
        Err(_) if semex_core::is_absolute_iri(reference) => Iri::new(reference),
        Err(_) => Err(SemexError::InvalidIri {
            value: reference.to_string(),
            reason: format!("cannot resolve against relative base {base:?}"),
        }),
    }
}

/// Named and numeric character references commonly found in head markup
pub(crate) fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate.find(';').and_then(|end| {
            let entity = &candidate[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &candidate[len..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
