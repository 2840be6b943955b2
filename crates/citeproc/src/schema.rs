//! Grammar validation for style and locale documents.
//!
//! Validation never fails a load. Each rule violation becomes a
//! [`SchemaWarning`] that travels next to the loaded document.

use citeproc_csl::{ElementType, Keyword, StyleClass};
use citeproc_diagnostics::{DiagnosticMessage, DiagnosticMessageBuilder, SourceSpan};
use citeproc_xml::{XmlDocument, XmlElement};
use std::fmt;

/// The CSL namespace URI.
pub const CSL_NAMESPACE: &str = "http://purl.org/net/xbiblio/csl";

/// Elements whose children are rendering elements.
const RENDERING_CONTAINERS: [&str; 7] =
    ["layout", "macro", "group", "if", "else-if", "else", "substitute"];

const TEXT_SOURCES: [&str; 4] = ["variable", "macro", "term", "value"];

/// A non-fatal grammar violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaWarning {
    pub code: &'static str,
    pub message: String,
    pub span: SourceSpan,
}

impl SchemaWarning {
    fn new(code: &'static str, message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            code,
            message: message.into(),
            span,
        }
    }

    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        DiagnosticMessageBuilder::warning("Schema Violation")
            .with_code(self.code)
            .with_location(self.span)
            .problem(self.message.clone())
            .add_note("The document is still loaded; rendering may be incomplete")
            .build()
    }
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Checks a parsed document against a grammar.
pub trait GrammarValidator: Send + Sync {
    fn validate(&self, document: &XmlDocument) -> Vec<SchemaWarning>;
}

/// The structural rules of the CSL 1.0 schema that the processor depends on.
#[derive(Debug, Clone, Copy, Default)]
pub struct CslGrammar;

impl GrammarValidator for CslGrammar {
    fn validate(&self, document: &XmlDocument) -> Vec<SchemaWarning> {
        let mut warnings = Vec::new();
        let root = &document.root;

        if !declares_csl_namespace(root) {
            warnings.push(SchemaWarning::new(
                "C-3-2",
                format!("<{}> does not declare the CSL namespace", root.name),
                root.name_span,
            ));
        }

        match root.name.as_str() {
            "style" => check_style(root, &mut warnings),
            "locale" => check_locale(root, &mut warnings),
            other => warnings.push(SchemaWarning::new(
                "C-3-1",
                format!("Root element must be <style> or <locale>, found <{}>", other),
                root.name_span,
            )),
        }

        warnings
    }
}

fn declares_csl_namespace(root: &XmlElement) -> bool {
    root.attributes.iter().any(|a| {
        let is_declaration = (a.name == "xmlns" && a.prefix.is_none())
            || a.prefix.as_deref() == Some("xmlns");
        is_declaration && a.value == CSL_NAMESPACE
    })
}

fn check_style(root: &XmlElement, warnings: &mut Vec<SchemaWarning>) {
    if root.get_attribute("version").is_none() {
        warnings.push(SchemaWarning::new(
            "C-3-3",
            "<style> is missing the version attribute",
            root.name_span,
        ));
    }

    match root.get_attribute_full("class") {
        Some(attr) if StyleClass::from_keyword(&attr.value).is_some() => {}
        Some(attr) => warnings.push(SchemaWarning::new(
            "C-3-4",
            format!("class must be one of {}, found '{}'", StyleClass::expected(), attr.value),
            attr.value_span,
        )),
        None => warnings.push(SchemaWarning::new(
            "C-3-4",
            "<style> is missing the class attribute",
            root.name_span,
        )),
    }

    match root.first_child("citation") {
        Some(citation) => check_has_layout(citation, warnings),
        None => warnings.push(SchemaWarning::new(
            "C-3-5",
            "<style> has no <citation>",
            root.name_span,
        )),
    }
    if let Some(bibliography) = root.first_child("bibliography") {
        check_has_layout(bibliography, warnings);
    }

    for element in root.descendants() {
        if element.name == "text" {
            check_text_source(element, warnings);
        }
        if RENDERING_CONTAINERS.contains(&element.name.as_str()) {
            for child in element.all_children() {
                if !ElementType::NAMES.contains(&child.name.as_str()) {
                    warnings.push(SchemaWarning::new(
                        "C-3-7",
                        format!(
                            "<{}> is not a rendering element and is not allowed in <{}>",
                            child.name, element.name
                        ),
                        child.name_span,
                    ));
                }
            }
        }
    }
}

fn check_has_layout(element: &XmlElement, warnings: &mut Vec<SchemaWarning>) {
    if element.first_child("layout").is_none() {
        warnings.push(SchemaWarning::new(
            "C-3-5",
            format!("<{}> has no <layout>", element.name),
            element.name_span,
        ));
    }
}

fn check_text_source(element: &XmlElement, warnings: &mut Vec<SchemaWarning>) {
    let sources: Vec<&str> = TEXT_SOURCES
        .iter()
        .copied()
        .filter(|s| element.get_attribute(s).is_some())
        .collect();
    if sources.len() != 1 {
        let found = if sources.is_empty() {
            "none".to_string()
        } else {
            sources.join(", ")
        };
        warnings.push(SchemaWarning::new(
            "C-3-6",
            format!(
                "<text> must have exactly one of variable, macro, term or value (found {})",
                found
            ),
            element.name_span,
        ));
    }
}

fn check_locale(root: &XmlElement, warnings: &mut Vec<SchemaWarning>) {
    if root.get_prefixed_attribute("xml", "lang").is_none() {
        warnings.push(SchemaWarning::new(
            "C-3-8",
            "<locale> document is missing xml:lang",
            root.name_span,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(xml: &str) -> Vec<SchemaWarning> {
        CslGrammar.validate(&citeproc_xml::parse(xml).unwrap())
    }

    fn codes(warnings: &[SchemaWarning]) -> Vec<&'static str> {
        warnings.iter().map(|w| w.code).collect()
    }

    const NS: &str = r#"xmlns="http://purl.org/net/xbiblio/csl""#;

    #[test]
    fn test_conforming_style_has_no_warnings() {
        let xml = format!(
            r#"<style {} class="in-text" version="1.0">
                 <macro name="m"><text variable="title"/></macro>
                 <citation><layout><text macro="m"/></layout></citation>
                 <bibliography><layout><group><text value="x"/></group></layout></bibliography>
               </style>"#,
            NS
        );
        assert!(validate(&xml).is_empty());
    }

    #[test]
    fn test_missing_namespace_and_attributes() {
        let warnings = validate("<style><citation><layout/></citation></style>");
        assert_eq!(codes(&warnings), vec!["C-3-2", "C-3-3", "C-3-4"]);
    }

    #[test]
    fn test_invalid_class_points_at_value() {
        let xml = format!(
            r#"<style {} class="footnote" version="1.0"><citation><layout/></citation></style>"#,
            NS
        );
        let warnings = validate(&xml);
        assert_eq!(codes(&warnings), vec!["C-3-4"]);
        let start = xml.find("\"footnote\"").unwrap();
        assert_eq!(warnings[0].span, SourceSpan::new(start, start + 10));
    }

    #[test]
    fn test_missing_citation_and_layouts() {
        let xml = format!(
            r#"<style {} class="note" version="1.0"><bibliography/></style>"#,
            NS
        );
        assert_eq!(codes(&validate(&xml)), vec!["C-3-5", "C-3-5"]);
    }

    #[test]
    fn test_text_source_count() {
        let xml = format!(
            r#"<style {} class="note" version="1.0"><citation><layout>
                 <text/>
                 <text variable="title" value="x"/>
               </layout></citation></style>"#,
            NS
        );
        let warnings = validate(&xml);
        assert_eq!(codes(&warnings), vec!["C-3-6", "C-3-6"]);
        assert!(warnings[0].message.contains("found none"));
        assert!(warnings[1].message.contains("found variable, value"));
    }

    #[test]
    fn test_unknown_rendering_element() {
        let xml = format!(
            r#"<style {} class="note" version="1.0"><citation><layout><bold/></layout></citation></style>"#,
            NS
        );
        let warnings = validate(&xml);
        assert_eq!(codes(&warnings), vec!["C-3-7"]);
        assert!(warnings[0].message.contains("<bold>"));
    }

    #[test]
    fn test_locale_rules() {
        let warnings = validate(&format!("<locale {}/>", NS));
        assert_eq!(codes(&warnings), vec!["C-3-8"]);

        let warnings = validate(&format!(r#"<locale {} xml:lang="de-DE"/>"#, NS));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unexpected_root() {
        let warnings = validate(&format!("<terms {}/>", NS));
        assert_eq!(codes(&warnings), vec!["C-3-1"]);
    }

    #[test]
    fn test_warning_diagnostic_is_not_an_error() {
        let warning = SchemaWarning::new("C-3-3", "missing version", SourceSpan::new(1, 6));
        let diagnostic = warning.to_diagnostic();
        assert!(!diagnostic.is_error());
        assert_eq!(diagnostic.code.as_deref(), Some("C-3-3"));
        assert_eq!(diagnostic.location, Some(SourceSpan::new(1, 6)));
        assert_eq!(warning.to_string(), "[C-3-3] missing version");
    }
}
