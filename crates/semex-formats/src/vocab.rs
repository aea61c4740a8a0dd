//! Namespaces used by the built-in extractors

use semex_core::{Iri, SemexError};

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const DCTERMS: &str = "http://purl.org/dc/terms/";
pub const XHTML: &str = semex_writer::XHTML_VOCAB;

/// Rows, columns and their positions
pub const CSV: &str = "http://vocab.sindice.net/csv/";

/// Workbook structure
pub const EXCEL: &str = "http://any23.apache.org/excel/";

/// Nodes of a YAML document tree
pub const YAML: &str = "http://any23.apache.org/yaml#";

/// `namespace` + `local`
pub fn term(namespace: &str, local: &str) -> Result<Iri, SemexError> {
    Iri::new(format!("{namespace}{local}"))
}

pub fn rdf_type() -> Result<Iri, SemexError> {
    term(RDF, "type")
}

pub fn xsd(local: &str) -> Result<Iri, SemexError> {
    term(XSD, local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms() {
        assert_eq!(
            rdf_type().unwrap().as_str(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type"
        );
        assert_eq!(term(CSV, "rowPosition").unwrap().as_str(), "http://vocab.sindice.net/csv/rowPosition");
        assert!(term(DCTERMS, "not valid").is_err());
    }
}
