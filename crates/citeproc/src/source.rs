//! Style identifiers and the sources they resolve to.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// What a caller hands to the resolver to name a style.
///
/// Only [`StyleIdentifier::Named`] goes through path, bundled and catalog
/// lookup. Content and readers pass through untouched.
pub enum StyleIdentifier {
    /// A filesystem path or a style name such as `"harvard1"`.
    Named(String),
    /// Style document text that is already in memory.
    Content(String),
    Reader(Box<dyn Read + Send>),
}

impl StyleIdentifier {
    /// Build a content identifier from document text.
    pub fn content(text: impl Into<String>) -> Self {
        StyleIdentifier::Content(text.into())
    }

    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        StyleIdentifier::Reader(Box::new(reader))
    }

    /// Human-readable label used in logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            StyleIdentifier::Named(name) => name.clone(),
            StyleIdentifier::Content(_) => "<inline style>".to_string(),
            StyleIdentifier::Reader(_) => "<style stream>".to_string(),
        }
    }
}

impl fmt::Debug for StyleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleIdentifier::Named(name) => f.debug_tuple("Named").field(name).finish(),
            StyleIdentifier::Content(text) => {
                f.debug_tuple("Content").field(&text.len()).finish()
            }
            StyleIdentifier::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<&str> for StyleIdentifier {
    fn from(name: &str) -> Self {
        StyleIdentifier::Named(name.to_string())
    }
}

impl From<String> for StyleIdentifier {
    fn from(name: String) -> Self {
        StyleIdentifier::Named(name)
    }
}

impl From<&Path> for StyleIdentifier {
    fn from(path: &Path) -> Self {
        StyleIdentifier::Named(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for StyleIdentifier {
    fn from(path: PathBuf) -> Self {
        StyleIdentifier::Named(path.to_string_lossy().into_owned())
    }
}

/// Where a resolved style came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Content or a stream given directly by the caller.
    Raw,
    Filesystem,
    Bundled,
    ExternalCatalog,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Provenance::Raw => "raw",
            Provenance::Filesystem => "filesystem",
            Provenance::Bundled => "bundled",
            Provenance::ExternalCatalog => "external-catalog",
        };
        f.write_str(label)
    }
}

/// Something the document loader can read.
pub enum DocumentSource {
    Path(PathBuf),
    Content(String),
    Reader(Box<dyn Read + Send>),
}

impl DocumentSource {
    /// Label for error messages: the path, or a placeholder for in-memory input.
    pub fn origin(&self) -> String {
        match self {
            DocumentSource::Path(path) => path.display().to_string(),
            DocumentSource::Content(_) => "<inline document>".to_string(),
            DocumentSource::Reader(_) => "<document stream>".to_string(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            DocumentSource::Path(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            DocumentSource::Content(text) => {
                f.debug_tuple("Content").field(&text.len()).finish()
            }
            DocumentSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// The outcome of style resolution: a readable source and its provenance.
#[derive(Debug)]
pub struct ResolvedSource {
    source: DocumentSource,
    provenance: Provenance,
}

impl ResolvedSource {
    pub(crate) fn new(source: DocumentSource, provenance: Provenance) -> Self {
        Self { source, provenance }
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// The path for filesystem, bundled and catalog sources.
    pub fn path(&self) -> Option<&Path> {
        self.source.path()
    }

    pub fn into_parts(self) -> (DocumentSource, Provenance) {
        (self.source, self.provenance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_like_identifiers_are_named() {
        assert!(matches!(StyleIdentifier::from("apa"), StyleIdentifier::Named(n) if n == "apa"));
        assert!(matches!(
            StyleIdentifier::from(PathBuf::from("styles/apa.csl")),
            StyleIdentifier::Named(n) if n == "styles/apa.csl"
        ));
        assert!(matches!(
            StyleIdentifier::content("<style/>"),
            StyleIdentifier::Content(_)
        ));
    }

    #[test]
    fn test_describe_hides_document_text() {
        assert_eq!(StyleIdentifier::content("<style/>").describe(), "<inline style>");
        assert_eq!(
            StyleIdentifier::reader(std::io::empty()).describe(),
            "<style stream>"
        );
        assert_eq!(format!("{:?}", StyleIdentifier::content("abc")), "Content(3)");
    }

    #[test]
    fn test_provenance_display() {
        assert_eq!(Provenance::ExternalCatalog.to_string(), "external-catalog");
        assert_eq!(Provenance::Bundled.to_string(), "bundled");
    }
}
