//! Loaded styles and the loader that builds them.

use crate::catalog::{BundledCatalog, StyleCatalog};
use crate::citation::{Citation, CitationItem};
use crate::engine::{CslEngine, OutputFormat, RenderContext, RuleEngine};
use crate::error::{Error, Result};
use crate::loader::{self, Validated};
use crate::locale::{LocaleChain, LocaleResolver, PrimaryDialectTable};
use crate::reference::{Reference, SourceCollection};
use crate::resolver::StyleResolver;
use crate::schema::{CslGrammar, GrammarValidator, SchemaWarning};
use crate::source::{Provenance, StyleIdentifier};
use citeproc_xml::XmlDocument;
use std::fmt;
use std::sync::Arc;

/// A style document in all the forms it was read through.
#[derive(Debug, Clone)]
pub struct StyleDocument {
    pub model: citeproc_csl::Style,
    pub xml: XmlDocument,
    pub text: String,
    /// Path or placeholder the style was read from.
    pub origin: String,
}

/// A resolved, parsed style with its locale chain and rule engine.
///
/// A `Style` is immutable once built and is shared between bibliographies
/// as `Arc<Style>`.
pub struct Style {
    provenance: Provenance,
    document: StyleDocument,
    locales: LocaleChain,
    warnings: Vec<SchemaWarning>,
    engine: Box<dyn RuleEngine>,
}

impl Style {
    pub fn new(
        provenance: Provenance,
        document: StyleDocument,
        locales: LocaleChain,
        warnings: Vec<SchemaWarning>,
    ) -> Self {
        Self {
            provenance,
            document,
            locales,
            warnings,
            engine: Box::new(CslEngine),
        }
    }

    /// Replace the rule engine.
    pub fn with_engine(mut self, engine: Box<dyn RuleEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn document(&self) -> &StyleDocument {
        &self.document
    }

    pub fn locales(&self) -> &LocaleChain {
        &self.locales
    }

    /// Grammar warnings from the style and its locale documents.
    pub fn warnings(&self) -> &[SchemaWarning] {
        &self.warnings
    }

    pub fn title(&self) -> Option<&str> {
        self.document
            .model
            .info
            .as_ref()
            .and_then(|info| info.title.as_deref())
    }

    fn context<'a>(
        &'a self,
        sources: &'a dyn SourceCollection,
        format: OutputFormat,
    ) -> RenderContext<'a> {
        RenderContext {
            document: &self.document.model,
            locales: &self.locales,
            sources,
            format,
        }
    }

    pub fn has_bibliography(&self) -> bool {
        self.engine.has_bibliography(&self.document.model)
    }

    pub fn render_citation(
        &self,
        sources: &dyn SourceCollection,
        format: OutputFormat,
        citation: &Citation,
        prior_cites: &[Citation],
        unresolved: &mut dyn FnMut(&CitationItem),
    ) -> Result<String> {
        let ctx = self.context(sources, format);
        self.engine
            .render_citation(&ctx, citation, prior_cites, unresolved)
    }

    pub fn sort_bibliography(
        &self,
        sources: &dyn SourceCollection,
        format: OutputFormat,
        items: &[Reference],
    ) -> Result<Vec<Reference>> {
        let ctx = self.context(sources, format);
        self.engine.sort_bibliography(&ctx, items)
    }

    pub fn render_bibliography(
        &self,
        sources: &dyn SourceCollection,
        format: OutputFormat,
        items: &[Reference],
    ) -> Result<String> {
        let ctx = self.context(sources, format);
        self.engine.render_bibliography(&ctx, items)
    }
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Style")
            .field("provenance", &self.provenance)
            .field("origin", &self.document.origin)
            .field("locale", &self.locales.tag())
            .field("warnings", &self.warnings.len())
            .finish_non_exhaustive()
    }
}

/// Builds [`Style`]s: resolve, read, validate, parse, attach locales.
#[derive(Clone)]
pub struct StyleLoader {
    resolver: StyleResolver,
    locales: LocaleResolver,
    validate: bool,
}

impl StyleLoader {
    pub fn new(catalog: BundledCatalog) -> Self {
        Self {
            resolver: StyleResolver::new(catalog.clone()),
            locales: LocaleResolver::new(catalog).with_grammar(Arc::new(CslGrammar)),
            validate: true,
        }
    }

    pub fn with_external_catalog(mut self, catalog: Arc<dyn StyleCatalog>) -> Self {
        self.resolver = self.resolver.with_external_catalog(catalog);
        self
    }

    /// Turn grammar validation of styles and locales on or off.
    pub fn with_validation(mut self, validate: bool) -> Self {
        let dialects = self.locales.dialects().clone();
        let mut locales = LocaleResolver::new(self.resolver.bundled().clone()).with_dialects(dialects);
        if validate {
            locales = locales.with_grammar(Arc::new(CslGrammar));
        }
        self.locales = locales;
        self.validate = validate;
        self
    }

    pub fn with_dialects(mut self, dialects: PrimaryDialectTable) -> Self {
        self.locales = self.locales.with_dialects(dialects);
        self
    }

    pub fn resolver(&self) -> &StyleResolver {
        &self.resolver
    }

    pub fn locale_resolver(&self) -> &LocaleResolver {
        &self.locales
    }

    /// Load a style. `locale` overrides the style's `default-locale`.
    pub fn load(&self, identifier: impl Into<StyleIdentifier>, locale: Option<&str>) -> Result<Style> {
        let identifier = identifier.into();
        let described = identifier.describe();
        let (source, provenance) = self.resolver.resolve(identifier)?.into_parts();

        let grammar = CslGrammar;
        let grammar: Option<&dyn GrammarValidator> = if self.validate { Some(&grammar) } else { None };
        let (document, mut warnings) = loader::load(source, grammar)?.into_parts();

        let model = citeproc_csl::parse_style(&document.xml).map_err(|source| Error::Style {
            origin: document.origin.clone(),
            source,
        })?;

        let Validated {
            value: locales,
            warnings: locale_warnings,
        } = self.locales.resolve(locale, &model)?;
        warnings.extend(locale_warnings);

        tracing::debug!(
            style = %described,
            provenance = %provenance,
            locale = locales.tag(),
            warnings = warnings.len(),
            "style loaded"
        );

        let document = StyleDocument {
            model,
            xml: document.xml,
            text: document.text,
            origin: document.origin,
        };
        Ok(Style::new(provenance, document, locales, warnings))
    }
}

impl Default for StyleLoader {
    fn default() -> Self {
        Self::new(BundledCatalog::bundled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::Locator;
    use crate::reference::ReferenceLibrary;

    const REFERENCES: &str = r#"[
        {
            "id": "smith2020",
            "type": "book",
            "title": "A Study of Things",
            "author": [{"family": "Smith", "given": "John"}],
            "issued": {"date-parts": [[2020]]},
            "publisher": "Academic Press",
            "publisher-place": "London"
        },
        {
            "id": "doe2019",
            "type": "article-journal",
            "title": "On Matters",
            "author": [{"family": "Doe", "given": "Jane"}],
            "issued": {"date-parts": [[2019, 5]]},
            "container-title": "Journal of Examples",
            "volume": 4,
            "issue": "2",
            "page": "10-20"
        }
    ]"#;

    fn harvard() -> Style {
        StyleLoader::default().load("harvard1", None).unwrap()
    }

    fn library() -> ReferenceLibrary {
        ReferenceLibrary::from_json(REFERENCES).unwrap()
    }

    fn cite(style: &Style, citation: &Citation) -> String {
        let mut unresolved = |_: &CitationItem| {};
        style
            .render_citation(&library(), OutputFormat::Html, citation, &[], &mut unresolved)
            .unwrap()
    }

    #[test]
    fn test_bundled_style_loads_clean() {
        let style = harvard();
        assert_eq!(style.provenance(), Provenance::Bundled);
        assert_eq!(style.locales().tag(), "en-GB");
        assert!(style.warnings().is_empty(), "{:?}", style.warnings());
        assert!(style.has_bibliography());
        assert_eq!(style.title(), Some("Harvard reference format 1 (author-date)"));
    }

    #[test]
    fn test_requested_locale_overrides_default() {
        let style = StyleLoader::default().load("harvard1", Some("de-DE")).unwrap();
        assert_eq!(style.locales().tag(), "de-DE");
        assert!(style.locales().fallback().is_some());
    }

    #[test]
    fn test_render_citations() {
        let style = harvard();
        assert_eq!(cite(&style, &Citation::of_keys(["smith2020"])), "(Smith 2020)");
        assert_eq!(
            cite(&style, &Citation::of_keys(["smith2020", "doe2019"])),
            "(Smith 2020; Doe 2019)"
        );

        let with_page = Citation::new(vec![
            CitationItem::new("smith2020").with_locator(Locator::page("12")),
        ]);
        assert_eq!(cite(&style, &with_page), "(Smith 2020, p. 12)");

        let suppressed = Citation::new(vec![CitationItem {
            suppress_author: true,
            ..CitationItem::new("smith2020")
        }]);
        assert_eq!(cite(&style, &suppressed), "(2020)");
    }

    #[test]
    fn test_unresolved_items_are_reported_and_skipped() {
        let style = harvard();
        let mut missing = Vec::new();
        let rendered = style
            .render_citation(
                &library(),
                OutputFormat::Plain,
                &Citation::of_keys(["ghost", "doe2019"]),
                &[],
                &mut |item| missing.push(item.key.clone()),
            )
            .unwrap();
        assert_eq!(rendered, "(Doe 2019)");
        assert_eq!(missing, vec!["ghost".to_string()]);
    }

    #[test]
    fn test_sort_and_render_bibliography() {
        let style = harvard();
        let library = library();
        let items: Vec<Reference> = library.iter().cloned().collect();

        let sorted = style
            .sort_bibliography(&library, OutputFormat::Html, &items)
            .unwrap();
        let ids: Vec<&str> = sorted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["doe2019", "smith2020"]);

        let html = style
            .render_bibliography(&library, OutputFormat::Html, &sorted[1..])
            .unwrap();
        insta::assert_snapshot!(html, @r#"
        <div class="csl-bib-body">
          <div class="csl-entry">Smith, J., 2020. <i>A Study of Things</i>, London: Academic Press.</div>
        </div>
        "#);
    }

    #[test]
    fn test_style_without_bibliography() {
        let csl = r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="note" version="1.0">
  <citation><layout><text variable="title"/></layout></citation>
</style>"#;
        let style = StyleLoader::default()
            .load(StyleIdentifier::content(csl), None)
            .unwrap();
        assert_eq!(style.provenance(), Provenance::Raw);
        assert!(!style.has_bibliography());
        let err = style
            .render_bibliography(&library(), OutputFormat::Plain, &[])
            .unwrap_err();
        assert!(matches!(err, Error::Evaluation { .. }));
    }

    #[test]
    fn test_model_errors_are_fatal() {
        let csl = r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="in-text">
  <citation><layout><text variable="title"/></layout></citation>
</style>"#;
        let err = StyleLoader::default()
            .load(StyleIdentifier::content(csl), None)
            .unwrap_err();
        assert!(matches!(err, Error::Style { .. }), "{}", err);
    }
}
