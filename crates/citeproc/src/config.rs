//! `citeproc.toml` settings.
//!
//! Every field is optional. Relative paths are taken from the directory the
//! file lives in. `CITEPROC_DATA_DIR` replaces `data_dir` when set.

use crate::catalog::{BundledCatalog, DirectoryCatalog, default_data_dir};
use crate::engine::OutputFormat;
use crate::error::{Error, Result};
use crate::style::StyleLoader;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name looked up by [`Config::discover`].
pub const CONFIG_FILE_NAME: &str = "citeproc.toml";

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "CITEPROC_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root holding `styles/` and `locales/`.
    pub data_dir: Option<PathBuf>,
    pub styles_dir: Option<PathBuf>,
    pub locales_dir: Option<PathBuf>,
    /// Directory of `.csl` files registered as the external catalog.
    pub catalog_dir: Option<PathBuf>,
    pub validate: bool,
    /// Locale used when a command does not name one.
    pub locale: Option<String>,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            styles_dir: None,
            locales_dir: None,
            catalog_dir: None,
            validate: true,
            locale: None,
            format: OutputFormat::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            origin: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text, path)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config.with_data_dir_override(std::env::var_os(DATA_DIR_ENV)))
    }

    /// Load `citeproc.toml` from the working directory, or use defaults.
    pub fn discover() -> Result<Self> {
        let path = Path::new(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default().with_data_dir_override(std::env::var_os(DATA_DIR_ENV)))
        }
    }

    /// Parse settings; relative paths are joined to the directory of `path`.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self> {
        let mut config: Config = toml::from_str(text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for dir in [
            &mut config.data_dir,
            &mut config.styles_dir,
            &mut config.locales_dir,
            &mut config.catalog_dir,
        ]
        .into_iter()
        .flatten()
        {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        Ok(config)
    }

    fn with_data_dir_override(mut self, value: Option<OsString>) -> Self {
        if let Some(dir) = value.filter(|v| !v.is_empty()) {
            tracing::debug!(data_dir = ?dir, "data directory set from {}", DATA_DIR_ENV);
            self.data_dir = Some(PathBuf::from(dir));
        }
        self
    }

    pub fn bundled_catalog(&self) -> BundledCatalog {
        let data_dir = self.data_dir.clone().unwrap_or_else(default_data_dir);
        let styles = self
            .styles_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("styles"));
        let locales = self
            .locales_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("locales"));
        BundledCatalog::new(styles, locales)
    }

    pub fn style_loader(&self) -> StyleLoader {
        let mut loader = StyleLoader::new(self.bundled_catalog()).with_validation(self.validate);
        if let Some(dir) = &self.catalog_dir {
            loader = loader.with_external_catalog(Arc::new(DirectoryCatalog::new(dir)));
        }
        loader
    }
}
