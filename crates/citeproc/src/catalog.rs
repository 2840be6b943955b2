//! Bundled style and locale directories, and external style catalogs.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extension of style documents.
pub const STYLE_EXTENSION: &str = "csl";

/// File extension of locale documents.
pub const LOCALE_EXTENSION: &str = "xml";

/// The style and locale directories that ship with the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledCatalog {
    styles_root: PathBuf,
    locales_root: PathBuf,
}

impl BundledCatalog {
    pub fn new(styles_root: impl Into<PathBuf>, locales_root: impl Into<PathBuf>) -> Self {
        Self {
            styles_root: styles_root.into(),
            locales_root: locales_root.into(),
        }
    }

    /// Catalog rooted at a data directory with `styles/` and `locales/` inside.
    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self::new(data_dir.join("styles"), data_dir.join("locales"))
    }

    /// The data directory of this crate.
    pub fn bundled() -> Self {
        Self::from_data_dir(default_data_dir())
    }

    pub fn styles_root(&self) -> &Path {
        &self.styles_root
    }

    pub fn locales_root(&self) -> &Path {
        &self.locales_root
    }

    /// `<styles_root>/<name>.csl`, whether or not it exists.
    pub fn style_path(&self, name: &str) -> PathBuf {
        self.styles_root
            .join(format!("{}.{}", name, STYLE_EXTENSION))
    }

    /// `<locales_root>/locales-<tag>.xml`, whether or not it exists.
    pub fn locale_path(&self, tag: &str) -> PathBuf {
        self.locales_root
            .join(format!("locales-{}.{}", tag, LOCALE_EXTENSION))
    }
}

impl Default for BundledCatalog {
    fn default() -> Self {
        Self::bundled()
    }
}

pub(crate) fn default_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog has no style by that name.
    #[error("style '{0}' is not in the catalog")]
    Unknown(String),

    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// An installed collection of styles that maps names to files.
pub trait StyleCatalog: Send + Sync {
    /// Short name shown in logs and errors.
    fn name(&self) -> &str;

    fn lookup(&self, name: &str) -> Result<PathBuf, CatalogError>;
}

/// A catalog backed by a directory of `<name>.csl` files.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    name: String,
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "styles".to_string());
        Self { name, root }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StyleCatalog for DirectoryCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, name: &str) -> Result<PathBuf, CatalogError> {
        if !self.root.is_dir() {
            return Err(CatalogError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        let path = self.root.join(format!("{}.{}", name, STYLE_EXTENSION));
        if path.is_file() {
            Ok(path)
        } else {
            Err(CatalogError::Unknown(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_bundled_paths_follow_naming_convention() {
        let catalog = BundledCatalog::from_data_dir("/data");
        assert_eq!(catalog.style_path("apa"), PathBuf::from("/data/styles/apa.csl"));
        assert_eq!(
            catalog.locale_path("en-US"),
            PathBuf::from("/data/locales/locales-en-US.xml")
        );
    }

    #[test]
    fn test_bundled_data_ships_harvard1() {
        let catalog = BundledCatalog::bundled();
        assert!(catalog.style_path("harvard1").is_file());
        assert!(catalog.locale_path("en-US").is_file());
    }

    #[test]
    fn test_directory_catalog_lookup() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("chicago.csl"), "<style/>").unwrap();

        let catalog = DirectoryCatalog::new(dir.path()).with_name("local");
        assert_eq!(catalog.name(), "local");
        assert_eq!(catalog.lookup("chicago"), Ok(dir.path().join("chicago.csl")));
        assert_eq!(
            catalog.lookup("mla"),
            Err(CatalogError::Unknown("mla".to_string()))
        );
    }

    #[test]
    fn test_directory_catalog_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = DirectoryCatalog::new(dir.path().join("absent"));
        assert!(matches!(
            catalog.lookup("chicago"),
            Err(CatalogError::Unavailable(_))
        ));
    }
}
