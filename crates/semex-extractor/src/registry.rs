//! Extractor registration and selection
//!
//! The registry is filled once at startup and then shared read-only, usually
//! behind an `Arc`. Groups are cheap cloned views over its factories.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use semex_core::{accept_header, MimeType};

use crate::extractor::{Extractor, ExtractorDescription};
use crate::{ExtractionError, Result};

type Constructor = dyn Fn() -> Box<dyn Extractor> + Send + Sync;

/// A description plus a constructor for fresh extractor instances
#[derive(Clone)]
pub struct ExtractorFactory {
    description: Arc<ExtractorDescription>,
    constructor: Arc<Constructor>,
}

impl ExtractorFactory {
    pub fn new<F>(description: ExtractorDescription, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn Extractor> + Send + Sync + 'static,
    {
        Self {
            description: Arc::new(description),
            constructor: Arc::new(constructor),
        }
    }

    pub fn description(&self) -> &ExtractorDescription {
        &self.description
    }

    pub fn name(&self) -> &str {
        self.description.name()
    }

    /// One extractor instance per document run
    pub fn create_extractor(&self) -> Box<dyn Extractor> {
        (self.constructor)()
    }
}

impl fmt::Debug for ExtractorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorFactory")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Groups
// ============================================================================

/// An ordered set of extractor factories
#[derive(Debug, Clone, Default)]
pub struct ExtractorGroup {
    factories: Vec<ExtractorFactory>,
}

impl ExtractorGroup {
    pub fn new(factories: Vec<ExtractorFactory>) -> Self {
        Self { factories }
    }

    /// Extractors that accept `mime_type`.
    ///
    /// Exact matches come before `type/*` matches, which come before `*/*`;
    /// within a rank higher quality comes first, then group order.
    /// `application/octet-stream` selects every extractor in group order.
    pub fn filter_by_mime_type(&self, mime_type: &MimeType) -> ExtractorGroup {
        if mime_type.is_octet_stream() {
            return self.clone();
        }

        let mut matches: Vec<(u8, f64, usize)> = self
            .factories
            .iter()
            .enumerate()
            .filter_map(|(i, f)| {
                f.description()
                    .best_match(mime_type)
                    .map(|(rank, quality)| (rank, quality, i))
            })
            .collect();
        matches.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then(b.1.total_cmp(&a.1))
                .then(a.2.cmp(&b.2))
        });

        ExtractorGroup {
            factories: matches
                .into_iter()
                .map(|(_, _, i)| self.factories[i].clone())
                .collect(),
        }
    }

    /// Accept header covering every type the group's extractors support
    pub fn accept_header(&self) -> Option<String> {
        let types: Vec<MimeType> = self
            .factories
            .iter()
            .flat_map(|f| f.description().supported_types().iter().cloned())
            .collect();
        accept_header(&types)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(ExtractorFactory::name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractorFactory> {
        self.factories.iter()
    }
}

impl<'a> IntoIterator for &'a ExtractorGroup {
    type Item = &'a ExtractorFactory;
    type IntoIter = std::slice::Iter<'a, ExtractorFactory>;

    fn into_iter(self) -> Self::IntoIter {
        self.factories.iter()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// All known extractors, keyed by unique name, in registration order
#[derive(Debug, Clone, Default)]
pub struct ExtractorRegistry {
    factories: Vec<ExtractorFactory>,
    index: HashMap<String, usize>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: ExtractorFactory) -> Result<()> {
        let name = factory.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ExtractionError::DuplicateName(name));
        }
        tracing::debug!("Registered extractor {}", name);
        self.index.insert(name, self.factories.len());
        self.factories.push(factory);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ExtractorFactory> {
        self.index.get(name).map(|&i| &self.factories[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(ExtractorFactory::name).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Every registered extractor
    pub fn group(&self) -> ExtractorGroup {
        ExtractorGroup::new(self.factories.clone())
    }

    /// The named extractors, in the order given
    pub fn group_by_names<S: AsRef<str>>(&self, names: &[S]) -> Result<ExtractorGroup> {
        let factories = names
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .cloned()
                    .ok_or_else(|| ExtractionError::UnknownExtractor(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ExtractorGroup::new(factories))
    }

    pub fn accept_header(&self) -> Option<String> {
        self.group().accept_header()
    }
}
