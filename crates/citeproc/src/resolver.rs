//! Turning a style identifier into a readable document source.

use crate::catalog::{BundledCatalog, CatalogError, StyleCatalog};
use crate::error::{Error, Result};
use crate::source::{DocumentSource, Provenance, ResolvedSource, StyleIdentifier};
use std::path::Path;
use std::sync::Arc;

/// Name of the optional style repository suggested when no catalog is registered.
pub const STYLE_CATALOG_PACKAGE: &str = "citeproc-styles";

/// Resolves style identifiers against the filesystem, the bundled styles and
/// an optional external catalog, in that order.
#[derive(Clone)]
pub struct StyleResolver {
    bundled: BundledCatalog,
    external: Option<Arc<dyn StyleCatalog>>,
}

impl StyleResolver {
    pub fn new(bundled: BundledCatalog) -> Self {
        Self {
            bundled,
            external: None,
        }
    }

    pub fn with_external_catalog(mut self, catalog: Arc<dyn StyleCatalog>) -> Self {
        self.external = Some(catalog);
        self
    }

    pub fn bundled(&self) -> &BundledCatalog {
        &self.bundled
    }

    pub fn has_external_catalog(&self) -> bool {
        self.external.is_some()
    }

    /// Resolve an identifier. Exactly one branch applies:
    ///
    /// 1. content and streams pass through as [`Provenance::Raw`]
    /// 2. an empty name fails
    /// 3. an existing path is used as is
    /// 4. `<styles_root>/<name>.csl` from the bundled catalog
    /// 5. the external catalog, when one is registered
    pub fn resolve(&self, identifier: StyleIdentifier) -> Result<ResolvedSource> {
        let name = match identifier {
            StyleIdentifier::Content(text) => {
                tracing::debug!("style given as content");
                return Ok(ResolvedSource::new(
                    DocumentSource::Content(text),
                    Provenance::Raw,
                ));
            }
            StyleIdentifier::Reader(reader) => {
                tracing::debug!("style given as stream");
                return Ok(ResolvedSource::new(
                    DocumentSource::Reader(reader),
                    Provenance::Raw,
                ));
            }
            StyleIdentifier::Named(name) => name,
        };

        if name.trim().is_empty() {
            tracing::debug!("empty style identifier");
            return Err(Error::StyleNotFound {
                identifier: name,
                guidance: Some("Pass a style name or a path to a .csl file".to_string()),
            });
        }

        let path = Path::new(&name);
        if path.is_file() {
            tracing::debug!(style = %name, "style resolved from filesystem");
            return Ok(ResolvedSource::new(
                DocumentSource::Path(path.to_path_buf()),
                Provenance::Filesystem,
            ));
        }

        let bundled = self.bundled.style_path(&name);
        if bundled.is_file() {
            tracing::debug!(style = %name, path = %bundled.display(), "style resolved from bundled catalog");
            return Ok(ResolvedSource::new(
                DocumentSource::Path(bundled),
                Provenance::Bundled,
            ));
        }

        let Some(catalog) = &self.external else {
            tracing::debug!(style = %name, "no external catalog registered");
            return Err(Error::StyleNotFound {
                guidance: Some(format!(
                    "'{}' is not a file or a bundled style. Install the {} style repository \
                     and register it with StyleResolver::with_external_catalog \
                     (or set catalog_dir in citeproc.toml) to use catalog styles",
                    name, STYLE_CATALOG_PACKAGE
                )),
                identifier: name,
            });
        };

        match catalog.lookup(&name) {
            Ok(path) if path.is_file() => {
                tracing::debug!(style = %name, catalog = catalog.name(), path = %path.display(), "style resolved from external catalog");
                Ok(ResolvedSource::new(
                    DocumentSource::Path(path),
                    Provenance::ExternalCatalog,
                ))
            }
            Ok(path) => {
                tracing::debug!(style = %name, path = %path.display(), "catalog path does not exist");
                Err(self.not_in_catalog(name, catalog.name()))
            }
            Err(CatalogError::Unknown(_)) => {
                tracing::debug!(style = %name, catalog = catalog.name(), "style unknown to catalog");
                Err(self.not_in_catalog(name, catalog.name()))
            }
            Err(err @ CatalogError::Unavailable(_)) => {
                tracing::debug!(style = %name, error = %err, "catalog lookup failed");
                Err(Error::StyleNotFound {
                    guidance: Some(format!("Catalog '{}' could not be used: {}", catalog.name(), err)),
                    identifier: name,
                })
            }
        }
    }

    fn not_in_catalog(&self, name: String, catalog: &str) -> Error {
        Error::StyleNotFound {
            guidance: Some(format!(
                "'{}' was not found in the bundled styles ({}) or in catalog '{}'",
                name,
                self.bundled.styles_root().display(),
                catalog
            )),
            identifier: name,
        }
    }
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::new(BundledCatalog::bundled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_content_passes_through() {
        let resolver = StyleResolver::new(BundledCatalog::from_data_dir("/nonexistent"));
        let resolved = resolver.resolve(StyleIdentifier::content("<style/>")).unwrap();
        assert_eq!(resolved.provenance(), Provenance::Raw);
        assert!(resolved.path().is_none());
    }

    #[test]
    fn test_bundled_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("styles")).unwrap();
        fs::write(dir.path().join("styles/house.csl"), "<style/>").unwrap();

        let resolver = StyleResolver::new(BundledCatalog::from_data_dir(dir.path()));
        let resolved = resolver.resolve("house".into()).unwrap();
        assert_eq!(resolved.provenance(), Provenance::Bundled);
        assert_eq!(resolved.path(), Some(dir.path().join("styles/house.csl").as_path()));
    }

    #[test]
    fn test_whitespace_name_is_not_found() {
        let resolver = StyleResolver::default();
        let err = resolver.resolve("  ".into()).unwrap_err();
        assert!(matches!(err, Error::StyleNotFound { .. }));
    }
}
