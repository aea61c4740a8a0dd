//! Extraction contexts
//!
//! An [`ExtractionContext`] names the scope under which an extractor produces
//! triples for one document. The document context of an extractor has no local
//! id; nested scopes (one per item found, for instance) carry one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Iri;

/// Scope identifier: (extractor name, document IRI, optional local id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractionContext {
    extractor_name: String,
    document_iri: Iri,
    local_id: Option<String>,
}

impl ExtractionContext {
    /// The document context of `extractor_name` for `document_iri`
    pub fn new(extractor_name: impl Into<String>, document_iri: Iri) -> Self {
        Self {
            extractor_name: extractor_name.into(),
            document_iri,
            local_id: None,
        }
    }

    /// A nested context within the same extractor and document
    pub fn with_local_id(
        extractor_name: impl Into<String>,
        document_iri: Iri,
        local_id: impl Into<String>,
    ) -> Self {
        Self {
            extractor_name: extractor_name.into(),
            document_iri,
            local_id: Some(local_id.into()),
        }
    }

    /// Derive a nested context sharing this context's extractor and document
    pub fn nested(&self, local_id: impl Into<String>) -> Self {
        Self::with_local_id(
            self.extractor_name.clone(),
            self.document_iri.clone(),
            local_id,
        )
    }

    pub fn extractor_name(&self) -> &str {
        &self.extractor_name
    }

    pub fn document_iri(&self) -> &Iri {
        &self.document_iri
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn is_document_context(&self) -> bool {
        self.local_id.is_none()
    }

    /// Stable textual id, `extractor:document[#local]`
    pub fn unique_id(&self) -> String {
        match &self.local_id {
            Some(local) => format!("{}:{}#{}", self.extractor_name, self.document_iri, local),
            None => format!("{}:{}", self.extractor_name, self.document_iri),
        }
    }
}

impl fmt::Display for ExtractionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtractionContext({})", self.unique_id())
    }
}
