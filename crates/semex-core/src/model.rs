//! RDF term model
//!
//! Terms are validated at construction time, so a [`Triple`] can never carry an
//! empty subject, predicate or object. Language-tagged and datatyped literals are
//! distinct variants of [`LiteralKind`], which keeps the two mutually exclusive.
//!
//! IRI references are checked with `oxiri`, blank node labels and language
//! tags with `oxrdf`; every term converts to and from its `oxrdf` counterpart
//! for serialization.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, SemexError};

/// XML Schema string datatype, the implicit datatype of plain literals
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

// ============================================================================
// IRIs and blank nodes
// ============================================================================

/// An IRI reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iri(String);

impl Iri {
    /// Create an IRI, rejecting empty values and anything that is not an
    /// RFC 3987 IRI reference
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(SemexError::InvalidIri {
                value,
                reason: "empty IRI".to_string(),
            });
        }
        if let Err(e) = oxiri::IriRef::parse(value.as_str()) {
            return Err(SemexError::InvalidIri {
                reason: e.to_string(),
                value,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the IRI starts with a scheme (`scheme:`)
    pub fn is_absolute(&self) -> bool {
        is_absolute_iri(&self.0)
    }

    /// Resolve `suffix` by plain concatenation onto this IRI
    pub fn join(&self, suffix: &str) -> Result<Self> {
        Self::new(format!("{}{}", self.0, suffix))
    }

    pub fn to_named_node(&self) -> oxrdf::NamedNode {
        oxrdf::NamedNode::new_unchecked(self.0.clone())
    }
}

impl From<oxrdf::NamedNode> for Iri {
    fn from(node: oxrdf::NamedNode) -> Self {
        Self(node.into_string())
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Iri {
    type Error = SemexError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Iri {
    type Error = SemexError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Iri> for String {
    fn from(iri: Iri) -> Self {
        iri.0
    }
}

/// True if `candidate` is an absolute IRI with something after its scheme
pub fn is_absolute_iri(candidate: &str) -> bool {
    oxiri::Iri::parse(candidate).is_ok_and(|iri| iri.as_str().len() > iri.scheme().len() + 1)
}

/// A blank node, identified by its label (without the `_:` prefix)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlankNode(String);

impl BlankNode {
    /// Create a blank node from an N-Triples `BLANK_NODE_LABEL`
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if oxrdf::BlankNode::new(label.as_str()).is_err() {
            return Err(SemexError::InvalidBlankNode(label));
        }
        Ok(Self(label))
    }

    /// Derive a stable blank node label from arbitrary text
    pub fn from_seed(seed: &str) -> Self {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in seed.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Self(format!("node{hash:016x}"))
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    pub fn to_oxrdf(&self) -> oxrdf::BlankNode {
        oxrdf::BlankNode::new_unchecked(self.0.clone())
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

impl TryFrom<String> for BlankNode {
    type Error = SemexError;

    fn try_from(label: String) -> Result<Self> {
        Self::new(label)
    }
}

impl From<BlankNode> for String {
    fn from(node: BlankNode) -> Self {
        node.0
    }
}

impl From<oxrdf::BlankNode> for BlankNode {
    fn from(node: oxrdf::BlankNode) -> Self {
        Self(node.as_str().to_string())
    }
}

// ============================================================================
// Literals
// ============================================================================

/// Literal annotation: none, a language tag, or a datatype
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    Plain,
    Language(String),
    Typed(Iri),
}

/// An RDF literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    value: String,
    kind: LiteralKind,
}

impl Literal {
    /// Plain literal
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: LiteralKind::Plain,
        }
    }

    /// Language-tagged literal; the BCP 47 tag is normalized to lowercase
    pub fn with_language(value: impl Into<String>, language: &str) -> Result<Self> {
        let value = value.into();
        let tagged = oxrdf::Literal::new_language_tagged_literal(value.as_str(), language)
            .map_err(|_| SemexError::InvalidLanguageTag(language.to_string()))?;
        let language = tagged.language().unwrap_or(language).to_string();
        Ok(Self {
            value,
            kind: LiteralKind::Language(language),
        })
    }

    /// Datatyped literal
    pub fn typed(value: impl Into<String>, datatype: Iri) -> Self {
        Self {
            value: value.into(),
            kind: LiteralKind::Typed(datatype),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> &LiteralKind {
        &self.kind
    }

    pub fn language(&self) -> Option<&str> {
        match &self.kind {
            LiteralKind::Language(lang) => Some(lang),
            _ => None,
        }
    }

    pub fn datatype(&self) -> Option<&Iri> {
        match &self.kind {
            LiteralKind::Typed(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn to_oxrdf(&self) -> oxrdf::Literal {
        match &self.kind {
            LiteralKind::Plain => oxrdf::Literal::new_simple_literal(self.value.as_str()),
            LiteralKind::Language(lang) => oxrdf::Literal::new_language_tagged_literal_unchecked(
                self.value.as_str(),
                lang.as_str(),
            ),
            LiteralKind::Typed(datatype) => {
                oxrdf::Literal::new_typed_literal(self.value.as_str(), datatype.to_named_node())
            }
        }
    }
}

/// `xsd:string` literals come back as plain literals
impl From<oxrdf::Literal> for Literal {
    fn from(literal: oxrdf::Literal) -> Self {
        let kind = match literal.language() {
            Some(lang) => LiteralKind::Language(lang.to_string()),
            None if literal.datatype().as_str() == XSD_STRING => LiteralKind::Plain,
            None => LiteralKind::Typed(Iri(literal.datatype().as_str().to_string())),
        };
        Self {
            value: literal.value().to_string(),
            kind,
        }
    }
}

// ============================================================================
// Terms and statements
// ============================================================================

/// Subject position: IRI or blank node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Subject {
    Iri(Iri),
    Blank(BlankNode),
}

impl From<Iri> for Subject {
    fn from(iri: Iri) -> Self {
        Self::Iri(iri)
    }
}

impl From<BlankNode> for Subject {
    fn from(node: BlankNode) -> Self {
        Self::Blank(node)
    }
}

impl Subject {
    pub fn to_oxrdf(&self) -> oxrdf::Subject {
        match self {
            Self::Iri(iri) => iri.to_named_node().into(),
            Self::Blank(node) => node.to_oxrdf().into(),
        }
    }
}

impl TryFrom<oxrdf::Subject> for Subject {
    type Error = SemexError;

    #[allow(unreachable_patterns)]
    fn try_from(subject: oxrdf::Subject) -> Result<Self> {
        match subject {
            oxrdf::Subject::NamedNode(node) => Ok(Self::Iri(node.into())),
            oxrdf::Subject::BlankNode(node) => Ok(Self::Blank(node.into())),
            other => Err(SemexError::UnsupportedTerm(other.to_string())),
        }
    }
}

/// Object position: IRI, blank node or literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Term {
    Iri(Iri),
    Blank(BlankNode),
    Literal(Literal),
}

impl Term {
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub fn to_oxrdf(&self) -> oxrdf::Term {
        match self {
            Self::Iri(iri) => iri.to_named_node().into(),
            Self::Blank(node) => node.to_oxrdf().into(),
            Self::Literal(literal) => literal.to_oxrdf().into(),
        }
    }
}

impl TryFrom<oxrdf::Term> for Term {
    type Error = SemexError;

    #[allow(unreachable_patterns)]
    fn try_from(term: oxrdf::Term) -> Result<Self> {
        match term {
            oxrdf::Term::NamedNode(node) => Ok(Self::Iri(node.into())),
            oxrdf::Term::BlankNode(node) => Ok(Self::Blank(node.into())),
            oxrdf::Term::Literal(literal) => Ok(Self::Literal(literal.into())),
            other => Err(SemexError::UnsupportedTerm(other.to_string())),
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Self::Iri(iri)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Self::Blank(node)
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<Subject> for Term {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Iri(iri) => Self::Iri(iri),
            Subject::Blank(node) => Self::Blank(node),
        }
    }
}

/// A subject-predicate-object statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Subject,
    pub predicate: Iri,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: impl Into<Subject>, predicate: Iri, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }

    /// Attach a graph name
    pub fn in_graph(self, graph: Option<Iri>) -> Quad {
        Quad {
            triple: self,
            graph,
        }
    }

    pub fn to_oxrdf(&self) -> oxrdf::Triple {
        oxrdf::Triple::new(
            self.subject.to_oxrdf(),
            self.predicate.to_named_node(),
            self.object.to_oxrdf(),
        )
    }
}

impl TryFrom<oxrdf::Triple> for Triple {
    type Error = SemexError;

    fn try_from(triple: oxrdf::Triple) -> Result<Self> {
        Ok(Self {
            subject: triple.subject.try_into()?,
            predicate: triple.predicate.into(),
            object: triple.object.try_into()?,
        })
    }
}

/// A triple with an optional graph name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quad {
    pub triple: Triple,
    pub graph: Option<Iri>,
}

impl Quad {
    pub fn new(triple: Triple, graph: Option<Iri>) -> Self {
        Self { triple, graph }
    }

    /// No graph maps to the default graph
    pub fn to_oxrdf(&self) -> oxrdf::Quad {
        let graph = match &self.graph {
            Some(graph) => oxrdf::GraphName::NamedNode(graph.to_named_node()),
            None => oxrdf::GraphName::DefaultGraph,
        };
        let triple = self.triple.to_oxrdf();
        oxrdf::Quad::new(triple.subject, triple.predicate, triple.object, graph)
    }
}

impl TryFrom<oxrdf::Quad> for Quad {
    type Error = SemexError;

    /// Blank node graph names have no counterpart here
    fn try_from(quad: oxrdf::Quad) -> Result<Self> {
        let graph = match quad.graph_name {
            oxrdf::GraphName::NamedNode(node) => Some(node.into()),
            oxrdf::GraphName::DefaultGraph => None,
            oxrdf::GraphName::BlankNode(node) => {
                return Err(SemexError::UnsupportedTerm(format!("graph name {node}")))
            }
        };
        let triple = oxrdf::Triple::new(quad.subject, quad.predicate, quad.object);
        Ok(Self {
            triple: triple.try_into()?,
            graph,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iri_validation() {
        assert!(Iri::new("http://example.org/a").is_ok());
        assert!(Iri::new("").is_err());
        assert!(Iri::new("http://example.org/a b").is_err());
        assert!(Iri::new("http://example.org/<a>").is_err());
        assert!(Iri::new("http://example.org/100%").is_err());
        assert!(Iri::new("page?view=a:b").is_ok());
    }

    #[test]
    fn test_absolute_iri() {
        assert!(is_absolute_iri("http://example.org/"));
        assert!(is_absolute_iri("urn:isbn:123"));
        assert!(!is_absolute_iri("name"));
        assert!(!is_absolute_iri("1http://x"));
        assert!(!is_absolute_iri("mailto:"));
        assert!(!is_absolute_iri("page?view=a:b"));
        assert!(!Iri::new("relative/path").unwrap().is_absolute());
    }

    #[test]
    fn test_blank_node_labels() {
        assert!(BlankNode::new("b0").is_ok());
        assert!(BlankNode::new("").is_err());
        assert!(BlankNode::new("has space").is_err());
        assert_eq!(BlankNode::new("b0").unwrap().to_string(), "_:b0");

        let a = BlankNode::from_seed("http://example.org/p");
        let b = BlankNode::from_seed("http://example.org/p");
        assert_eq!(a, b);
        assert_ne!(a, BlankNode::from_seed("http://example.org/q"));
    }

    #[test]
    fn test_literal_kinds_are_exclusive() {
        let lang = Literal::with_language("chat", "FR").unwrap();
        assert_eq!(lang.language(), Some("fr"));
        assert!(lang.datatype().is_none());

        let typed = Literal::typed("42", Iri::new("http://www.w3.org/2001/XMLSchema#integer").unwrap());
        assert!(typed.language().is_none());
        assert!(typed.datatype().is_some());

        assert!(Literal::with_language("x", "").is_err());
        assert!(Literal::with_language("x", "en us").is_err());
    }

    #[test]
    fn test_blank_node_deserialize_validates() {
        let node: BlankNode = serde_json::from_str("\"b1\"").unwrap();
        assert_eq!(node.label(), "b1");
        assert!(serde_json::from_str::<BlankNode>("\"has space\"").is_err());
        assert!(serde_json::from_str::<BlankNode>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&node).unwrap(), "\"b1\"");
    }

    #[test]
    fn test_oxrdf_conversion() {
        let quad = Triple::new(
            BlankNode::new("b0").unwrap(),
            Iri::new("http://purl.org/dc/terms/title").unwrap(),
            Literal::with_language("bonjour", "fr").unwrap(),
        )
        .in_graph(Some(Iri::new("http://example.org/g").unwrap()));
        assert_eq!(Quad::try_from(quad.to_oxrdf()).unwrap(), quad);

        let plain = Literal::typed("x", Iri::new(XSD_STRING).unwrap());
        assert_eq!(Literal::from(plain.to_oxrdf()), Literal::new("x"));

        let blank_graph = oxrdf::Quad::new(
            oxrdf::NamedNode::new_unchecked("http://s"),
            oxrdf::NamedNode::new_unchecked("http://p"),
            oxrdf::NamedNode::new_unchecked("http://o"),
            oxrdf::BlankNode::new_unchecked("g"),
        );
        assert!(matches!(
            Quad::try_from(blank_graph),
            Err(SemexError::UnsupportedTerm(_))
        ));
    }
}
