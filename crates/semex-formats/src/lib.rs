//! Semex Formats - built-in extractors
//!
//! Extractors shipped with semex:
//! - N-Quads and N-Triples statements (`rdf-nq`, `rdf-nt`)
//! - HTML head title and RDF links (`html-head-title`, `html-head-links`)
//! - CSV / TSV tables (`csv`)
//! - XLSX, XLS and ODS workbooks (`excel`)
//! - YAML document trees (`yaml`)
//!
//! [`default_registry`] returns a shared registry holding all of them.

use std::sync::Arc;

use once_cell::sync::Lazy;
use semex_extractor::ExtractorRegistry;

pub mod delimited;
pub mod html;
pub mod rdf;
pub mod spreadsheet;
pub(crate) mod tabular;
pub mod vocab;
pub mod yaml;

pub use delimited::CsvExtractor;
pub use html::{HeadLinkExtractor, TitleExtractor};
pub use rdf::StatementExtractor;
pub use spreadsheet::SpreadsheetExtractor;
pub use yaml::YamlExtractor;

static DEFAULT_REGISTRY: Lazy<Arc<ExtractorRegistry>> = Lazy::new(|| {
    let mut registry = ExtractorRegistry::new();
    if let Err(e) = register_builtin(&mut registry) {
        tracing::error!("Failed to register built-in extractors: {}", e);
    }
    Arc::new(registry)
});

/// Register every built-in extractor, in a fixed order
pub fn register_builtin(registry: &mut ExtractorRegistry) -> semex_extractor::Result<()> {
    registry.register(StatementExtractor::nquads_factory())?;
    registry.register(StatementExtractor::ntriples_factory())?;
    registry.register(TitleExtractor::factory())?;
    registry.register(HeadLinkExtractor::factory())?;
    registry.register(CsvExtractor::factory())?;
    registry.register(SpreadsheetExtractor::factory())?;
    registry.register(YamlExtractor::factory())?;
    Ok(())
}

/// Process-wide registry with the built-in extractors, built on first use
pub fn default_registry() -> Arc<ExtractorRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}
