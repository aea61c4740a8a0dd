//! YAML documents as a node tree
//!
//! `{doc}root` is typed `yaml:Root` and contains one `yaml:Document` node per
//! YAML document in the stream. Mappings become `yaml:Node` resources whose
//! keys are properties, sequences become RDF lists and scalars become typed
//! literals.

use serde::Deserialize;
use serde_yaml::Value;

use semex_core::{
    BlankNode, ExtractionContext, ExtractionParameters, Iri, IssueLevel, Literal, Subject, Term,
};
use semex_extractor::{
    ExtractionError, ExtractionInput, ExtractionResult, Extractor, ExtractorDescription,
    ExtractorFactory, ExtractorKind, Result,
};

use crate::rdf::mime;
use crate::vocab::{self, RDF, RDFS, YAML};

pub const YAML_EXTRACTOR: &str = "yaml";

#[derive(Debug, Default)]
pub struct YamlExtractor {
    stop_at_first_error: bool,
}

impl YamlExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> ExtractorFactory {
        let description = ExtractorDescription::new(YAML_EXTRACTOR, ExtractorKind::Markup)
            .with_type(mime("text/yaml"))
            .with_type(mime("text/x-yaml"))
            .with_type(mime("application/yaml"))
            .with_type(mime("application/x-yaml"))
            .with_prefix("yml", YAML)
            .with_prefix("rdf", RDF)
            .with_prefix("rdfs", RDFS);
        ExtractorFactory::new(description, || Box::new(Self::new()))
    }
}

impl Extractor for YamlExtractor {
    fn run(
        &mut self,
        _parameters: &ExtractionParameters,
        context: &ExtractionContext,
        input: ExtractionInput<'_>,
        result: &mut ExtractionResult<'_>,
    ) -> Result<()> {
        let ExtractionInput::Markup(text) = input else {
            return Err(ExtractionError::extractor(YAML_EXTRACTOR, "expected decoded markup"));
        };

        let mut tree = TreeWriter::new(context.document_iri().clone(), result);
        let root = tree.document.join("root")?;
        tree.emit(root.clone(), vocab::rdf_type()?, vocab::term(YAML, "Root")?)?;

        for document in serde_yaml::Deserializer::from_str(text) {
            let value = match Value::deserialize(document) {
                Ok(value) => value,
                Err(e) => {
                    let (line, column) = e
                        .location()
                        .map(|l| (l.line() as u32, l.column() as u32))
                        .unwrap_or((0, 0));
                    if self.stop_at_first_error {
                        return Err(ExtractionError::extractor(YAML_EXTRACTOR, e.to_string()));
                    }
                    tree.result
                        .notify_issue_at(IssueLevel::Error, e.to_string(), line, column);
                    // the parser cannot resume after a syntax error
                    break;
                }
            };

            let page = tree.named_node("document")?;
            tree.emit(root.clone(), vocab::term(YAML, "contains")?, page.clone())?;
            tree.emit(page.clone(), vocab::rdf_type()?, vocab::term(YAML, "Document")?)?;
            let node = tree.build(&value)?;
            tree.emit(page, vocab::term(YAML, "contains")?, node)?;
        }

        tracing::debug!(
            "yaml: {} nodes in {}",
            tree.next_id,
            context.document_iri()
        );
        Ok(())
    }

    fn set_stop_at_first_error(&mut self, stop: bool) {
        self.stop_at_first_error = stop;
    }
}

/// Walks one YAML stream; ids are shared by named nodes and list cells
struct TreeWriter<'r, 'h> {
    document: Iri,
    result: &'r mut ExtractionResult<'h>,
    next_id: usize,
}

impl<'r, 'h> TreeWriter<'r, 'h> {
    fn new(document: Iri, result: &'r mut ExtractionResult<'h>) -> Self {
        Self {
            document,
            result,
            next_id: 0,
        }
    }

    fn emit(
        &mut self,
        subject: impl Into<Subject>,
        predicate: Iri,
        object: impl Into<Term>,
    ) -> Result<()> {
        self.result.write_triple(subject, predicate, object)
    }

    fn local(&self, name: &str) -> Result<Iri> {
        let separator = if self.document.as_str().ends_with('/') { "" } else { "#" };
        Ok(self.document.join(&format!("{separator}{name}"))?)
    }

    /// `{doc}#{kind}_{n}`
    fn named_node(&mut self, kind: &str) -> Result<Iri> {
        let iri = self.local(&format!("{kind}_{}", self.next_id))?;
        self.next_id += 1;
        Ok(iri)
    }

    fn list_cell(&mut self) -> BlankNode {
        let node = BlankNode::from_seed(&format!("{}#list_{}", self.document, self.next_id));
        self.next_id += 1;
        node
    }

    fn build(&mut self, value: &Value) -> Result<Term> {
        match value {
            Value::Null => Ok(vocab::term(RDF, "nil")?.into()),
            Value::Bool(b) => Ok(Literal::typed(b.to_string(), vocab::xsd("boolean")?).into()),
            Value::Number(n) => Ok(number_literal(n)?.into()),
            Value::String(s) => Ok(Literal::new(s.as_str()).into()),
            Value::Sequence(items) => self.build_list(items),
            Value::Mapping(mapping) => self.build_mapping(mapping),
            Value::Tagged(tagged) => self.build(&tagged.value),
        }
    }

    fn build_mapping(&mut self, mapping: &serde_yaml::Mapping) -> Result<Term> {
        let node = self.named_node("node")?;
        self.emit(node.clone(), vocab::rdf_type()?, vocab::term(YAML, "Node")?)?;
        for (key, value) in mapping {
            let Some(key) = scalar_key(key) else {
                self.result.notify_issue(
                    IssueLevel::Warning,
                    "Skipping mapping entry with a non-scalar key",
                );
                continue;
            };
            let predicate = self.local(&property_name(&key))?;
            let object = self.build(value)?;
            self.emit(node.clone(), predicate.clone(), object)?;
            self.emit(
                predicate.clone(),
                vocab::rdf_type()?,
                vocab::term(RDF, "Property")?,
            )?;
            self.emit(predicate, vocab::term(RDFS, "label")?, Literal::new(key))?;
        }
        Ok(node.into())
    }

    fn build_list(&mut self, items: &[Value]) -> Result<Term> {
        let nil = vocab::term(RDF, "nil")?;
        if items.is_empty() {
            return Ok(nil.into());
        }
        let head = self.list_cell();
        self.emit(head.clone(), vocab::rdf_type()?, vocab::term(RDF, "List")?)?;

        let mut cell = head.clone();
        for (index, item) in items.iter().enumerate() {
            let value = self.build(item)?;
            self.emit(cell.clone(), vocab::term(RDF, "first")?, value)?;
            if index + 1 == items.len() {
                self.emit(cell.clone(), vocab::term(RDF, "rest")?, nil.clone())?;
            } else {
                let next = self.list_cell();
                self.emit(cell, vocab::term(RDF, "rest")?, next.clone())?;
                cell = next;
            }
        }
        Ok(head.into())
    }
}

fn scalar_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_key(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn number_literal(number: &serde_yaml::Number) -> Result<Literal> {
    if let Some(i) = number.as_i64() {
        return Ok(Literal::typed(i.to_string(), vocab::xsd("long")?));
    }
    if let Some(u) = number.as_u64() {
        return Ok(Literal::typed(u.to_string(), vocab::xsd("integer")?));
    }
    let f = number.as_f64().unwrap_or(f64::NAN);
    let lexical = if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        f.to_string()
    };
    Ok(Literal::typed(lexical, vocab::xsd("double")?))
}

/// `"first name"` becomes `"firstName"`
pub(crate) fn property_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for (index, token) in key
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|token| !token.is_empty())
        .enumerate()
    {
        let mut chars = token.chars();
        if let Some(first) = chars.next() {
            if index == 0 {
                name.extend(first.to_lowercase());
            } else {
                name.extend(first.to_uppercase());
            }
            name.push_str(chars.as_str());
        }
    }
    if name.is_empty() {
        name.push_str("key");
    }
    name
}
