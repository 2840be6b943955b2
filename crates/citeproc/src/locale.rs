//! Locale resolution: tag selection, dialect fallback and the lookup chain.

use crate::catalog::BundledCatalog;
use crate::error::{Error, Result};
use crate::loader::{self, Validated};
use crate::schema::GrammarValidator;
use crate::source::DocumentSource;
use citeproc_csl::{DateForm, DateFormat, Locale, LocaleOptions, TermForm};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Locale used when neither the caller nor the style names one, and the
/// last link of every chain.
pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Debug, Clone, Default, Deserialize)]
struct DialectFile {
    #[serde(rename = "primary-dialects")]
    primary_dialects: HashMap<String, String>,
    #[serde(rename = "language-names", default)]
    language_names: HashMap<String, Vec<String>>,
}

/// Primary dialects shipped in `data/locales/locales.json`.
///
/// # Panics
///
/// Panics on first use if the embedded JSON is invalid, which can only
/// happen if the bundled data file was edited incorrectly.
static BUNDLED_DIALECTS: Lazy<PrimaryDialectTable> = Lazy::new(|| {
    let json = include_str!("../data/locales/locales.json");
    PrimaryDialectTable::from_json(json).expect("Invalid bundled locales.json")
});

/// Maps a bare language code to its default regional tag ("en" to "en-US").
#[derive(Debug, Clone, Default)]
pub struct PrimaryDialectTable {
    dialects: HashMap<String, String>,
    language_names: HashMap<String, Vec<String>>,
}

impl PrimaryDialectTable {
    /// The table shipped with the processor.
    pub fn bundled() -> Self {
        BUNDLED_DIALECTS.clone()
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let file: DialectFile = serde_json::from_str(json)?;
        Ok(Self {
            dialects: file.primary_dialects,
            language_names: file.language_names,
        })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            dialects: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            language_names: HashMap::new(),
        }
    }

    pub fn primary_dialect(&self, language: &str) -> Option<&str> {
        self.dialects.get(language).map(String::as_str)
    }

    /// English name of a locale tag, e.g. "English (US)".
    pub fn language_name(&self, tag: &str) -> Option<&str> {
        self.language_names
            .get(tag)
            .and_then(|names| names.last())
            .map(String::as_str)
    }
}

/// Whether a tag is a bare language code such as "en" or "de".
fn is_bare_language(tag: &str) -> bool {
    !tag.is_empty() && !tag.contains('-')
}

fn language_of(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Locales consulted in order for terms and date formats.
///
/// Overrides embedded in the style come first (exact tag, then bare
/// language, then untagged), then the locale document for the resolved tag,
/// then `en-US` when the resolved tag is something else.
#[derive(Debug, Clone)]
pub struct LocaleChain {
    tag: String,
    overrides: Vec<Locale>,
    primary: Locale,
    fallback: Option<Locale>,
}

impl LocaleChain {
    pub fn new(tag: impl Into<String>, primary: Locale) -> Self {
        Self {
            tag: tag.into(),
            overrides: Vec::new(),
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Locale) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_overrides(mut self, overrides: Vec<Locale>) -> Self {
        self.overrides = overrides;
        self
    }

    /// The tag whose locale document was loaded.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn primary(&self) -> &Locale {
        &self.primary
    }

    pub fn fallback(&self) -> Option<&Locale> {
        self.fallback.as_ref()
    }

    pub fn overrides(&self) -> &[Locale] {
        &self.overrides
    }

    /// All locales in lookup order.
    pub fn iter(&self) -> impl Iterator<Item = &Locale> {
        self.overrides
            .iter()
            .chain(std::iter::once(&self.primary))
            .chain(self.fallback.iter())
    }

    /// Look up a term, trying each form of the fallback sequence across the
    /// whole chain before moving to the next form.
    pub fn term(&self, name: &str, form: TermForm, plural: bool) -> Option<&str> {
        let mut current = Some(form);
        while let Some(form) = current {
            let found = self.iter().find_map(|locale| {
                locale
                    .terms
                    .iter()
                    .find(|t| t.name == name && t.form == form)
                    .and_then(|t| t.text(plural))
            });
            if found.is_some() {
                return found;
            }
            current = form.fallback();
        }
        None
    }

    pub fn date_format(&self, form: DateForm) -> Option<&DateFormat> {
        self.iter()
            .find_map(|locale| locale.date_formats.iter().find(|f| f.form == form))
    }

    /// Style options of the resolved locale document.
    pub fn options(&self) -> LocaleOptions {
        self.primary.options
    }
}

/// Loads locale documents from the bundled catalog.
#[derive(Clone)]
pub struct LocaleResolver {
    catalog: BundledCatalog,
    dialects: PrimaryDialectTable,
    grammar: Option<Arc<dyn GrammarValidator>>,
}

impl LocaleResolver {
    pub fn new(catalog: BundledCatalog) -> Self {
        Self {
            catalog,
            dialects: PrimaryDialectTable::bundled(),
            grammar: None,
        }
    }

    pub fn with_dialects(mut self, dialects: PrimaryDialectTable) -> Self {
        self.dialects = dialects;
        self
    }

    /// Validate every loaded locale document with this grammar.
    pub fn with_grammar(mut self, grammar: Arc<dyn GrammarValidator>) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn dialects(&self) -> &PrimaryDialectTable {
        &self.dialects
    }

    /// Build the locale chain for a style.
    ///
    /// The tag is the requested one, else the style's `default-locale`, else
    /// `en-US`. A missing locale is fatal.
    pub fn resolve(
        &self,
        tag: Option<&str>,
        style: &citeproc_csl::Style,
    ) -> Result<Validated<LocaleChain>> {
        let requested = tag
            .or(style.default_locale.as_deref())
            .unwrap_or(DEFAULT_LOCALE);
        tracing::debug!(locale = requested, "resolving locale");

        let (primary_tag, primary) = self.load_locale(requested)?;
        let (primary, mut warnings) = primary.into_parts();

        let mut chain = LocaleChain::new(primary_tag.clone(), primary);
        if primary_tag != DEFAULT_LOCALE {
            let (_, fallback) = self.load_locale(DEFAULT_LOCALE)?;
            let (fallback, fallback_warnings) = fallback.into_parts();
            warnings.extend(fallback_warnings);
            chain = chain.with_fallback(fallback);
        }

        let overrides = embedded_overrides(style, &primary_tag);
        Ok(Validated::new(chain.with_overrides(overrides), warnings))
    }

    /// Load the locale document for a tag, retrying a bare language code
    /// with its primary dialect. Returns the tag actually loaded.
    pub fn load_locale(&self, tag: &str) -> Result<(String, Validated<Locale>)> {
        let mut tried = vec![tag.to_string()];
        let mut path = self.catalog.locale_path(tag);
        let mut resolved = tag.to_string();

        if !path.is_file() && is_bare_language(tag) {
            if let Some(dialect) = self.dialects.primary_dialect(tag) {
                tracing::debug!(locale = tag, dialect, "falling back to primary dialect");
                tried.push(dialect.to_string());
                path = self.catalog.locale_path(dialect);
                resolved = dialect.to_string();
            }
        }

        if !path.is_file() {
            tracing::debug!(locale = tag, "no locale document found");
            return Err(Error::LocaleNotFound {
                tag: tag.to_string(),
                tried,
            });
        }

        let (document, warnings) =
            loader::load(DocumentSource::Path(path), self.grammar.as_deref())?.into_parts();
        let locale = citeproc_csl::parse_locale(&document.xml).map_err(|source| Error::Style {
            origin: document.origin.clone(),
            source,
        })?;
        tracing::debug!(locale = %resolved, origin = %document.origin, "loaded locale");

        Ok((resolved, Validated::new(locale, warnings)))
    }
}

/// `<locale>` blocks in the style that apply to `tag`, most specific first.
fn embedded_overrides(style: &citeproc_csl::Style, tag: &str) -> Vec<Locale> {
    let language = language_of(tag);
    let exact = style
        .locales
        .iter()
        .filter(|l| l.lang.as_deref() == Some(tag));
    let bare = style
        .locales
        .iter()
        .filter(|l| language != tag && l.lang.as_deref() == Some(language));
    let untagged = style.locales.iter().filter(|l| l.lang.is_none());
    exact.chain(bare).chain(untagged).cloned().collect()
}
