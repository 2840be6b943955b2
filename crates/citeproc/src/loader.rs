//! Reading style and locale documents into XML trees.

use crate::error::{Error, Result};
use crate::schema::{GrammarValidator, SchemaWarning};
use crate::source::DocumentSource;
use citeproc_xml::XmlDocument;
use std::io::Read;

/// A value together with the grammar warnings raised while producing it.
#[derive(Debug, Clone)]
pub struct Validated<T> {
    pub value: T,
    pub warnings: Vec<SchemaWarning>,
}

impl<T> Validated<T> {
    pub fn new(value: T, warnings: Vec<SchemaWarning>) -> Self {
        Self { value, warnings }
    }

    pub fn clean(value: T) -> Self {
        Self::new(value, Vec::new())
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Transform the value, keeping the warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Validated<U> {
        Validated {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    pub fn into_parts(self) -> (T, Vec<SchemaWarning>) {
        (self.value, self.warnings)
    }
}

/// A document read and parsed from its source.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Path or placeholder the document came from.
    pub origin: String,
    pub text: String,
    pub xml: XmlDocument,
}

/// Read, parse and optionally validate a document.
///
/// Fails only when the source cannot be read or is not well-formed XML.
/// Grammar violations come back as warnings.
pub fn load(
    source: DocumentSource,
    grammar: Option<&dyn GrammarValidator>,
) -> Result<Validated<LoadedDocument>> {
    let origin = source.origin();
    let text = read_source(source, &origin)?;

    let xml = citeproc_xml::parse(&text).map_err(|source| Error::Parse {
        origin: origin.clone(),
        source,
    })?;

    let warnings = match grammar {
        Some(grammar) => grammar.validate(&xml),
        None => Vec::new(),
    };
    for warning in &warnings {
        tracing::warn!(origin = %origin, code = warning.code, "{}", warning.message);
    }

    Ok(Validated::new(LoadedDocument { origin, text, xml }, warnings))
}

fn read_source(source: DocumentSource, origin: &str) -> Result<String> {
    let io_error = |source| Error::Io {
        origin: origin.to_string(),
        source,
    };
    match source {
        DocumentSource::Content(text) => Ok(text),
        DocumentSource::Path(path) => std::fs::read_to_string(&path).map_err(io_error),
        DocumentSource::Reader(mut reader) => {
            let mut text = String::new();
            reader.read_to_string(&mut text).map_err(io_error)?;
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CslGrammar;
    use std::io::Cursor;

    const STYLE: &str = r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="in-text" version="1.0">
  <citation><layout><text variable="title"/></layout></citation>
</style>"#;

    #[test]
    fn test_load_content_without_grammar() {
        let loaded = load(DocumentSource::Content(STYLE.to_string()), None).unwrap();
        assert!(loaded.is_clean());
        assert_eq!(loaded.value.xml.root.name, "style");
        assert_eq!(loaded.value.origin, "<inline document>");
    }

    #[test]
    fn test_load_reader() {
        let reader = Cursor::new(STYLE.as_bytes().to_vec());
        let loaded = load(DocumentSource::Reader(Box::new(reader)), Some(&CslGrammar)).unwrap();
        assert!(loaded.is_clean());
        assert_eq!(loaded.value.text, STYLE);
    }

    #[test]
    fn test_grammar_violations_do_not_abort() {
        let loaded = load(
            DocumentSource::Content("<style><citation><layout/></citation></style>".to_string()),
            Some(&CslGrammar),
        )
        .unwrap();
        assert!(!loaded.is_clean());
        assert_eq!(loaded.warnings.len(), 3);
    }

    #[test]
    fn test_malformed_input_is_parse_error() {
        let err = load(DocumentSource::Content("<style>".to_string()), None).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csl");
        let err = load(DocumentSource::Path(path.clone()), None).unwrap_err();
        match err {
            Error::Io { origin, .. } => assert_eq!(origin, path.display().to_string()),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_validated_map_keeps_warnings() {
        let warning = SchemaWarning {
            code: "C-3-3",
            message: "missing version".to_string(),
            span: Default::default(),
        };
        let validated = Validated::new(2, vec![warning]).map(|n| n * 10);
        let (value, warnings) = validated.into_parts();
        assert_eq!(value, 20);
        assert_eq!(warnings.len(), 1);
    }
}
