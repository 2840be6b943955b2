//! Registry behavior of `Bibliography`, independent of rendering rules.

use citeproc::{
    Bibliography, Citation, CitationItem, OutputFormat, Reference, ReferenceLibrary,
    RenderContext, Result, RuleEngine, Style, StyleIdentifier, StyleLoader,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Renders keys joined by commas and sorts by reference type.
struct MockEngine {
    citations: Arc<AtomicUsize>,
}

impl RuleEngine for MockEngine {
    fn has_bibliography(&self, _document: &citeproc_csl::Style) -> bool {
        true
    }

    fn render_citation(
        &self,
        ctx: &RenderContext<'_>,
        citation: &Citation,
        prior_cites: &[Citation],
        unresolved: &mut dyn FnMut(&CitationItem),
    ) -> Result<String> {
        self.citations.fetch_add(1, Ordering::SeqCst);
        let mut keys = Vec::new();
        for item in &citation.items {
            if ctx.sources.contains(&item.key) {
                keys.push(item.key.clone());
            } else {
                unresolved(item);
            }
        }
        Ok(format!("[{}|{}]", keys.join(","), prior_cites.len()))
    }

    fn sort_bibliography(&self, _ctx: &RenderContext<'_>, items: &[Reference]) -> Result<Vec<Reference>> {
        let mut sorted = items.to_vec();
        sorted.sort_by(|a, b| a.ref_type.cmp(&b.ref_type));
        Ok(sorted)
    }

    fn render_bibliography(&self, _ctx: &RenderContext<'_>, items: &[Reference]) -> Result<String> {
        Ok(items
            .iter()
            .map(|r| r.id.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }
}

const STYLE: &str = r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="in-text" version="1.0">
  <citation><layout><text variable="title"/></layout></citation>
</style>"#;

fn mock_style(citations: Arc<AtomicUsize>) -> Arc<Style> {
    let style = StyleLoader::default()
        .load(StyleIdentifier::content(STYLE), None)
        .unwrap()
        .with_engine(Box::new(MockEngine { citations }));
    Arc::new(style)
}

/// a: book, b: article, c: book, d: article
fn library() -> ReferenceLibrary {
    [("a", "book"), ("b", "article"), ("c", "book"), ("d", "article")]
        .into_iter()
        .map(|(id, ty)| Reference::new(id, ty))
        .collect()
}

fn bibliography() -> Bibliography<ReferenceLibrary> {
    Bibliography::new(
        mock_style(Arc::new(AtomicUsize::new(0))),
        library(),
        OutputFormat::Plain,
    )
}

fn keys(bib: &Bibliography<ReferenceLibrary>) -> Vec<&str> {
    bib.keys().iter().map(String::as_str).collect()
}

#[test]
fn registering_twice_adds_nothing_new() {
    let mut bib = bibliography();
    let mut first = Citation::of_keys(["a", "b"]);
    bib.register(&mut first, None);
    let mut again = Citation::of_keys(["a", "b"]);
    bib.register(&mut again, None);

    assert_eq!(keys(&bib), ["a", "b"]);
    assert_eq!(bib.items().len(), 2);
    assert_eq!(bib.cites().len(), 2);
}

#[test]
fn keys_follow_first_citation_order() {
    let mut bib = bibliography();
    bib.register(&mut Citation::of_keys(["b", "a", "c"]), None);
    bib.register(&mut Citation::of_keys(["a"]), None);
    assert_eq!(keys(&bib), ["b", "a", "c"]);
}

#[test]
fn keys_match_item_ids() {
    let mut bib = bibliography();
    bib.register(&mut Citation::of_keys(["d", "a", "c", "b"]), None);
    bib.sort().unwrap();
    for (key, item) in bib.keys().iter().zip(bib.items()) {
        assert_eq!(key, &item.id);
    }
}

#[test]
fn sort_is_stable_and_idempotent() {
    let mut bib = bibliography();
    bib.register(&mut Citation::of_keys(["a", "b", "c", "d"]), None);

    bib.sort().unwrap();
    assert_eq!(keys(&bib), ["b", "d", "a", "c"]);

    bib.sort().unwrap();
    assert_eq!(keys(&bib), ["b", "d", "a", "c"]);
    assert_eq!(bib.bibliography().unwrap(), "b d a c");
}

#[test]
fn unresolved_keys_are_reported_on_every_register() {
    let mut bib = bibliography();
    let mut reported = Vec::new();

    let mut citation = Citation::of_keys(["a", "ghost"]);
    bib.register(&mut citation, Some(&mut |item| reported.push(item.key.clone())));
    let mut repeat = Citation::of_keys(["ghost"]);
    bib.register(&mut repeat, Some(&mut |item| reported.push(item.key.clone())));

    assert_eq!(reported, ["ghost", "ghost"]);
    assert_eq!(keys(&bib), ["a"]);
}

#[test]
fn citations_are_recorded_even_when_nothing_resolves() {
    let mut bib = bibliography();
    let mut citation = Citation::of_keys(["ghost"]);
    bib.register(&mut citation, None);

    assert!(bib.keys().is_empty());
    assert_eq!(bib.cites().len(), 1);
    assert_eq!(citation.registered_with(), Some(bib.id()));
    assert_eq!(bib.cites()[0].registered_with(), Some(bib.id()));
}

#[test]
fn cite_passes_history_and_does_not_mutate() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut bib = Bibliography::new(mock_style(calls.clone()), library(), OutputFormat::Plain);

    let mut first = Citation::of_keys(["a"]);
    bib.register(&mut first, None);
    let mut second = Citation::of_keys(["b", "ghost"]);
    bib.register(&mut second, None);

    let mut missing = 0;
    let rendered = bib.cite(&second, &mut |_| missing += 1).unwrap();
    assert_eq!(rendered, "[b|2]");
    assert_eq!(missing, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(keys(&bib), ["a", "b"]);
    assert_eq!(bib.cites().len(), 2);
}

#[test]
fn bibliographies_share_a_style() {
    let style = mock_style(Arc::new(AtomicUsize::new(0)));
    let mut one = Bibliography::new(style.clone(), library(), OutputFormat::Plain);
    let mut two = Bibliography::new(style, library(), OutputFormat::Plain);

    let mut citation = Citation::of_keys(["a"]);
    one.register(&mut citation, None);
    two.register(&mut Citation::of_keys(["c"]), None);

    assert_ne!(one.id(), two.id());
    assert_eq!(citation.registered_with(), Some(one.id()));
    assert_eq!(keys(&one), ["a"]);
    assert_eq!(keys(&two), ["c"]);
}
