//! Built-in extractors driven through the `Semex` facade

use std::io::{Cursor, Write};

use semex_core::ExtractionParameters;
use semex_extractor::{ByteArrayDocumentSource, Semex, StringDocumentSource};
use semex_formats::default_registry;
use semex_writer::{
    CountingTripleHandler, IgnoreTitlesOfEmptyDocuments, NQuadsWriter, TripleHandler,
};

const XSD_INTEGER: &str = "<http://www.w3.org/2001/XMLSchema#integer>";

fn semex() -> Semex {
    Semex::new(default_registry())
}

/// Extract into an N-Quads buffer and return its lines
fn nquads(semex: &Semex, source: &dyn semex_extractor::DocumentSource) -> (bool, Vec<String>) {
    let mut writer = NQuadsWriter::new(Vec::new());
    let matched = semex.extract(source, &mut writer).unwrap();
    writer.close().unwrap();
    let text = String::from_utf8(writer.into_inner()).unwrap();
    (matched, text.lines().map(str::to_string).collect())
}

#[test]
fn test_title_only_page_produces_nothing() {
    let page = StringDocumentSource::new(
        "<html><head><title>Hello</title></head><body><p>hi</p></body></html>",
        "http://example.org/page.html",
    );
    let mut output = IgnoreTitlesOfEmptyDocuments::with_defaults(CountingTripleHandler::new(
        NQuadsWriter::new(Vec::new()),
    ));
    assert!(semex().extract(&page, &mut output).unwrap());
    output.close().unwrap();

    let counting = output.into_inner();
    assert_eq!(counting.count(), 0);
    assert!(counting.into_inner().into_inner().is_empty());
}

#[test]
fn test_title_kept_with_head_links() {
    let page = StringDocumentSource::new(
        r#"<html><head><title>Hello</title>
           <link rel="alternate" type="text/turtle" href="/page.ttl" title="Turtle">
           </head><body></body></html>"#,
        "http://example.org/dir/page.html",
    );
    let mut output = IgnoreTitlesOfEmptyDocuments::with_defaults(NQuadsWriter::new(Vec::new()));
    semex().extract(&page, &mut output).unwrap();
    output.close().unwrap();
    let text = String::from_utf8(output.into_inner().into_inner()).unwrap();

    let graph = "<http://example.org/dir/page.html>";
    for expected in [
        format!("{graph} <http://www.w3.org/1999/xhtml/vocab#alternate> <http://example.org/page.ttl> {graph} ."),
        format!("<http://example.org/page.ttl> <http://purl.org/dc/terms/format> \"text/turtle\" {graph} ."),
        format!("<http://example.org/page.ttl> <http://purl.org/dc/terms/title> \"Turtle\" {graph} ."),
        format!("{graph} <http://purl.org/dc/terms/title> \"Hello\" {graph} ."),
    ] {
        assert!(text.lines().any(|l| l == expected), "missing {expected}\n{text}");
    }
}

#[test]
fn test_relative_document_iri_with_colon_in_query() {
    let page = StringDocumentSource::new(
        r#"<html><head><title>T</title>
           <link rel="alternate" type="application/rdf+xml" href="data.rdf">
           <link rel="meta" type="text/turtle" href="http://example.org/meta.ttl">
           </head></html>"#,
        "page?view=a:b",
    )
    .with_content_type("text/html");
    let mut counting = CountingTripleHandler::new(semex_writer::NullTripleHandler);
    let report = semex().extract_with_report(&page, &mut counting).unwrap();

    assert!(report.has_matching_extractors());
    let links = report
        .outcomes
        .iter()
        .find(|o| o.name == "html-head-links")
        .unwrap();
    assert!(!links.is_failed());
    // the relative href is skipped, the absolute one kept
    assert_eq!(links.triples, 2);
    assert!(report
        .issues
        .iter()
        .any(|i| i.extractor_name() == "html-head-links" && i.message.contains("data.rdf")));
}

#[test]
fn test_csv_rows() {
    let source = StringDocumentSource::new(
        "name,age,homepage\nann,42,http://ann.example.org/\nbob,,\n",
        "http://example.org/people.csv",
    );
    let (matched, lines) = nquads(&semex(), &source);
    assert!(matched);

    let graph = "<http://example.org/people.csv>";
    assert!(lines.contains(&format!(
        "<http://example.org/people.csvrow/0> <http://example.org/people.csvAge> \"42\"^^{XSD_INTEGER} {graph} ."
    )));
    assert!(lines.contains(&format!(
        "<http://example.org/people.csvrow/0> <http://example.org/people.csvHomepage> <http://ann.example.org/> {graph} ."
    )));
    assert!(lines.contains(&format!(
        "{graph} <http://vocab.sindice.net/csv/numberOfRows> \"2\"^^{XSD_INTEGER} {graph} ."
    )));
    // empty cells are skipped
    assert!(!lines
        .iter()
        .any(|l| l.starts_with("<http://example.org/people.csvrow/1> <http://example.org/people.csvAge>")));
}

#[test]
fn test_nquads_detected_from_content() {
    let source = StringDocumentSource::new(
        "<http://s> <http://p> <http://o> <http://g> .\n<http://s> <http://p> \"x\"@en <http://g> .\n",
        "http://example.org/dump",
    );
    let report = semex()
        .extract_with_report(&source, &mut semex_writer::NullTripleHandler)
        .unwrap();
    assert_eq!(report.detected_mime_type.full_type(), "application/n-quads");
    assert_eq!(report.matching_extractors, vec!["rdf-nq".to_string()]);

    let (_, lines) = nquads(&semex(), &source);
    assert_eq!(
        lines,
        vec![
            "<http://s> <http://p> <http://o> <http://g> .",
            "<http://s> <http://p> \"x\"@en <http://g> .",
        ]
    );
}

#[test]
fn test_ntriples_bad_line_is_an_issue() {
    let source = StringDocumentSource::new(
        "<http://s> <http://p> <http://o> .\nnot rdf\n",
        "http://example.org/data.nt",
    );
    let mut counting = CountingTripleHandler::new(semex_writer::NullTripleHandler);
    let report = semex().extract_with_report(&source, &mut counting).unwrap();
    assert_eq!(counting.count(), 1);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].extractor_name(), "rdf-nt");
    assert_eq!(report.issues[0].location.map(|l| l.line), Some(2));
}

#[test]
fn test_stop_at_first_error_isolates_extractor() {
    let source = StringDocumentSource::new(
        "<http://s> <http://p> <http://o> .\nnot rdf\n",
        "http://example.org/data.nt",
    );
    let semex = semex().with_parameters(ExtractionParameters {
        stop_at_first_error: true,
        ..ExtractionParameters::default()
    });
    let mut counting = CountingTripleHandler::new(semex_writer::NullTripleHandler);
    let report = semex.extract_with_report(&source, &mut counting).unwrap();
    assert_eq!(counting.count(), 1);
    assert!(report.outcomes.iter().any(|o| o.name == "rdf-nt" && o.is_failed()));
}

#[test]
fn test_yaml_document() {
    let source = StringDocumentSource::new(
        "name: semex\ntags:\n  - rdf\n",
        "http://example.org/conf.yml",
    );
    let (matched, lines) = nquads(&semex(), &source);
    assert!(matched);
    let graph = "<http://example.org/conf.yml>";
    assert!(lines.contains(&format!(
        "<http://example.org/conf.ymlroot> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://any23.apache.org/yaml#Root> {graph} ."
    )));
    assert!(lines.contains(&format!(
        "<http://example.org/conf.yml#node_1> <http://example.org/conf.yml#name> \"semex\" {graph} ."
    )));
    assert!(lines
        .iter()
        .any(|l| l.contains("<http://www.w3.org/1999/02/22-rdf-syntax-ns#first> \"rdf\"")));
}

fn xlsx() -> Vec<u8> {
    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#,
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="People List" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#,
        ),
        (
            "xl/worksheets/sheet1.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Name</t></is></c><c r="B1" t="inlineStr"><is><t>Age</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>ann</t></is></c><c r="B2"><v>42</v></c></row></sheetData></worksheet>"#,
        ),
    ];

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

#[test]
fn test_spreadsheet_sheets() {
    let source = ByteArrayDocumentSource::new(xlsx(), "http://example.org/book.xlsx");
    let (matched, lines) = nquads(&semex(), &source);
    assert!(matched);

    let graph = "<http://example.org/book.xlsx>";
    let sheet = "http://example.org/book.xlsx/sheet/People%20List/";
    assert!(lines.contains(&format!(
        "{graph} <http://any23.apache.org/excel/containsSheet> <{sheet}> {graph} ."
    )));
    assert!(lines.contains(&format!(
        "<{sheet}> <http://any23.apache.org/excel/sheetName> \"People List\" {graph} ."
    )));
    assert!(lines.contains(&format!(
        "<{sheet}row/0> <{sheet}Age> \"42\"^^{XSD_INTEGER} {graph} ."
    )));
}
