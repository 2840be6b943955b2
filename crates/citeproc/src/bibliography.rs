//! Citation registry for one document.

use crate::citation::{BibliographyId, Citation, CitationItem};
use crate::engine::OutputFormat;
use crate::error::Result;
use crate::reference::{Reference, ReferenceKey, SourceCollection};
use crate::style::Style;
use std::sync::Arc;

/// Registered references and the citation history, in registration order.
#[derive(Debug, Clone, Default)]
pub struct BibliographyState {
    keys: Vec<ReferenceKey>,
    items: Vec<Reference>,
    cites: Vec<Citation>,
}

/// Tracks which references a document cites and renders them with a style.
///
/// Only [`register`](Self::register) adds state and only [`sort`](Self::sort)
/// reorders it. Rendering reads the state and never changes it. Concurrent
/// use of one instance needs external locking; the `Style` can be shared.
#[derive(Debug)]
pub struct Bibliography<S: SourceCollection> {
    id: BibliographyId,
    style: Arc<Style>,
    source: S,
    format: OutputFormat,
    state: BibliographyState,
}

impl<S: SourceCollection> Bibliography<S> {
    pub fn new(style: Arc<Style>, source: S, format: OutputFormat) -> Self {
        Self {
            id: BibliographyId::next(),
            style,
            source,
            format,
            state: BibliographyState::default(),
        }
    }

    /// Record a citation.
    ///
    /// Each resolved reference is added once, the first time it is cited.
    /// Keys missing from the source are passed to `unresolved` on every call.
    /// The citation is bound to this bibliography and appended to the history
    /// whether or not anything resolved.
    pub fn register(
        &mut self,
        citation: &mut Citation,
        mut unresolved: Option<&mut dyn FnMut(&CitationItem)>,
    ) {
        for item in &citation.items {
            let Some(reference) = self.source.get(&item.key) else {
                tracing::trace!(bibliography = %self.id, key = %item.key, "unresolved key");
                if let Some(callback) = unresolved.as_deref_mut() {
                    callback(item);
                }
                continue;
            };
            if self.state.keys.contains(&item.key) {
                continue;
            }
            tracing::trace!(bibliography = %self.id, key = %item.key, "registered reference");
            let mut reference = reference.clone();
            reference.id = item.key.clone();
            self.state.keys.push(item.key.clone());
            self.state.items.push(reference);
        }

        citation.bind(self.id, self.state.cites.len());
        self.state.cites.push(citation.clone());
    }

    /// Reorder the registered references by the style's sort keys.
    pub fn sort(&mut self) -> Result<()> {
        let sorted = self
            .style
            .sort_bibliography(&self.source, self.format, &self.state.items)?;
        self.state.keys = sorted.iter().map(|r| r.id.clone()).collect();
        self.state.items = sorted;
        Ok(())
    }

    /// Render a citation against the full citation history.
    pub fn cite(
        &self,
        citation: &Citation,
        unresolved: &mut dyn FnMut(&CitationItem),
    ) -> Result<String> {
        self.style.render_citation(
            &self.source,
            self.format,
            citation,
            &self.state.cites,
            unresolved,
        )
    }

    /// Render every registered reference in the current order.
    pub fn bibliography(&self) -> Result<String> {
        self.style
            .render_bibliography(&self.source, self.format, &self.state.items)
    }

    pub fn id(&self) -> BibliographyId {
        self.id
    }

    pub fn style(&self) -> &Arc<Style> {
        &self.style
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn keys(&self) -> &[ReferenceKey] {
        &self.state.keys
    }

    pub fn items(&self) -> &[Reference] {
        &self.state.items
    }

    pub fn cites(&self) -> &[Citation] {
        &self.state.cites
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceLibrary;
    use crate::source::StyleIdentifier;
    use crate::style::StyleLoader;

    const STYLE: &str = r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="in-text" version="1.0">
  <citation><layout delimiter=", "><text variable="title"/></layout></citation>
  <bibliography>
    <sort><key variable="title"/></sort>
    <layout><text variable="title" suffix="."/></layout>
  </bibliography>
</style>"#;

    fn bibliography() -> Bibliography<ReferenceLibrary> {
        let style = StyleLoader::default()
            .load(StyleIdentifier::content(STYLE), None)
            .unwrap();
        let library: ReferenceLibrary = [("a", "Beta"), ("b", "Alpha")]
            .into_iter()
            .map(|(id, title)| {
                let mut reference = Reference::new(id, "book");
                reference.title = Some(title.to_string());
                reference
            })
            .collect();
        Bibliography::new(Arc::new(style), library, OutputFormat::Plain)
    }

    #[test]
    fn test_register_then_sort() {
        let mut bib = bibliography();
        let mut citation = Citation::of_keys(["a", "b", "a"]);
        bib.register(&mut citation, None);

        assert_eq!(bib.keys(), ["a", "b"]);
        assert_eq!(citation.registered_with(), Some(bib.id()));
        assert_eq!(citation.sequence(), Some(0));
        assert_eq!(bib.cites().len(), 1);

        bib.sort().unwrap();
        assert_eq!(bib.keys(), ["b", "a"]);
        assert_eq!(bib.bibliography().unwrap(), "Alpha.\nBeta.");
    }

    #[test]
    fn test_cite_does_not_mutate() {
        let mut bib = bibliography();
        let mut citation = Citation::of_keys(["a", "missing"]);
        let mut reported = 0;
        bib.register(&mut citation, Some(&mut |_| reported += 1));
        assert_eq!(reported, 1);

        let rendered = bib.cite(&citation, &mut |_| {}).unwrap();
        assert_eq!(rendered, "Beta");
        assert_eq!(bib.keys(), ["a"]);
        assert_eq!(bib.cites().len(), 1);
    }
}
