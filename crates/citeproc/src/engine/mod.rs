//! Rule evaluation behind a replaceable seam.
//!
//! [`RuleEngine`] is what a [`crate::Style`] uses to turn citations and
//! references into text. [`CslEngine`] is the built-in implementation.

mod eval;
pub mod output;

pub use output::{Output, OutputFormat, Tag};

use crate::citation::{Citation, CitationItem};
use crate::error::{Error, Result};
use crate::locale::LocaleChain;
use crate::reference::{Reference, SourceCollection};
use citeproc_csl::{SortKey, SortOrder};
use eval::{CitePosition, Evaluator, apply_formatting};
use std::cmp::Ordering;

/// Everything a rule engine reads while rendering.
pub struct RenderContext<'a> {
    pub document: &'a citeproc_csl::Style,
    pub locales: &'a LocaleChain,
    pub sources: &'a dyn SourceCollection,
    pub format: OutputFormat,
}

/// Evaluates a style's rules.
pub trait RuleEngine: Send + Sync {
    fn has_bibliography(&self, document: &citeproc_csl::Style) -> bool;

    /// Render one citation. `prior_cites` is the citation history of the
    /// bibliography; items with no reference are reported to `unresolved`
    /// and skipped.
    fn render_citation(
        &self,
        ctx: &RenderContext<'_>,
        citation: &Citation,
        prior_cites: &[Citation],
        unresolved: &mut dyn FnMut(&CitationItem),
    ) -> Result<String>;

    /// Order references by the bibliography's sort keys. Ties keep input order.
    fn sort_bibliography(&self, ctx: &RenderContext<'_>, items: &[Reference]) -> Result<Vec<Reference>>;

    /// Render the references, in the order given.
    fn render_bibliography(&self, ctx: &RenderContext<'_>, items: &[Reference]) -> Result<String>;
}

/// Built-in engine for the CSL element set.
#[derive(Debug, Clone, Copy, Default)]
pub struct CslEngine;

impl RuleEngine for CslEngine {
    fn has_bibliography(&self, document: &citeproc_csl::Style) -> bool {
        document.bibliography.is_some()
    }

    fn render_citation(
        &self,
        ctx: &RenderContext<'_>,
        citation: &Citation,
        prior_cites: &[Citation],
        unresolved: &mut dyn FnMut(&CitationItem),
    ) -> Result<String> {
        // Only cites made before this one count towards its position.
        let history = match citation.sequence() {
            Some(index)
                if prior_cites.get(index).is_some_and(|c| {
                    c.sequence() == Some(index) && c.registered_with() == citation.registered_with()
                }) =>
            {
                &prior_cites[..index]
            }
            _ => prior_cites,
        };
        let layout = &ctx.document.citation;

        let mut rendered = Vec::new();
        for (index, item) in citation.items.iter().enumerate() {
            let Some(reference) = ctx.sources.get(&item.key) else {
                tracing::debug!(key = %item.key, "no reference for cited key");
                unresolved(item);
                continue;
            };
            let position =
                CitePosition::of(item, index, &citation.items, history, citation.note_number);
            let mut evaluator = Evaluator::new(ctx.document, ctx.locales, reference, layout)
                .for_item(item, position);
            let mut output = evaluator.layout(layout);
            if item.author_only {
                output = output.first_names();
            } else if item.suppress_author {
                output = output.without_first_names();
            }
            rendered.push(Output::sequence(vec![
                item.prefix.as_deref().map(Output::literal).unwrap_or(Output::Null),
                output,
                item.suffix.as_deref().map(Output::literal).unwrap_or(Output::Null),
            ]));
        }

        let joined = Output::join(rendered, layout.delimiter.as_deref().unwrap_or("; "));
        let output = apply_formatting(ctx.locales, joined, &layout.formatting);
        Ok(ctx.format.render(&output))
    }

    fn sort_bibliography(&self, ctx: &RenderContext<'_>, items: &[Reference]) -> Result<Vec<Reference>> {
        let Some(layout) = &ctx.document.bibliography else {
            return Ok(items.to_vec());
        };
        let Some(sort) = &layout.sort else {
            return Ok(items.to_vec());
        };

        let mut keyed: Vec<(Vec<Option<String>>, &Reference)> = items
            .iter()
            .map(|reference| {
                let values = sort
                    .keys
                    .iter()
                    .map(|key| {
                        Evaluator::new(ctx.document, ctx.locales, reference, layout)
                            .sorting()
                            .sort_value(key)
                    })
                    .collect();
                (values, reference)
            })
            .collect();
        keyed.sort_by(|a, b| compare_sort_values(&sort.keys, &a.0, &b.0));

        Ok(keyed.into_iter().map(|(_, reference)| reference.clone()).collect())
    }

    fn render_bibliography(&self, ctx: &RenderContext<'_>, items: &[Reference]) -> Result<String> {
        let Some(layout) = &ctx.document.bibliography else {
            return Err(Error::Evaluation {
                message: "style has no bibliography".to_string(),
            });
        };
        let entries: Vec<String> = items
            .iter()
            .map(|reference| {
                let output = Evaluator::new(ctx.document, ctx.locales, reference, layout).layout(layout);
                let output = apply_formatting(ctx.locales, output, &layout.formatting);
                ctx.format.render(&output)
            })
            .filter(|entry| !entry.is_empty())
            .collect();
        Ok(ctx.format.bibliography(&entries))
    }
}

/// Compare key by key. Missing values sort last in either direction.
fn compare_sort_values(keys: &[SortKey], a: &[Option<String>], b: &[Option<String>]) -> Ordering {
    for ((key, a), b) in keys.iter().zip(a).zip(b) {
        let ordering = match (a, b) {
            (Some(a), Some(b)) => {
                let ordering = compare_sort_value(a, b);
                match key.sort_order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Numbers come before text and compare by value; text compares as strings.
fn compare_sort_value(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citeproc_csl::SortKeyType;
    use citeproc_diagnostics::SourceSpan;

    fn key(order: SortOrder) -> SortKey {
        SortKey {
            key: SortKeyType::Variable("issued".to_string()),
            sort_order: order,
            span: SourceSpan::default(),
        }
    }

    #[test]
    fn test_missing_values_sort_last() {
        let keys = [key(SortOrder::Descending)];
        let present = [Some("2020".to_string())];
        let missing = [None];
        assert_eq!(compare_sort_values(&keys, &present, &missing), Ordering::Less);
        assert_eq!(compare_sort_values(&keys, &missing, &present), Ordering::Greater);
    }

    #[test]
    fn test_numeric_values_compare_as_numbers() {
        let keys = [key(SortOrder::Ascending)];
        let nine = [Some("9".to_string())];
        let ten = [Some("10".to_string())];
        assert_eq!(compare_sort_values(&keys, &nine, &ten), Ordering::Less);
    }

    #[test]
    fn test_numbers_sort_before_text() {
        let mut values = vec!["1a", "10", "9", "b", "02", "2"];
        values.sort_by(|a, b| compare_sort_value(a, b));
        assert_eq!(values, vec!["02", "2", "9", "10", "1a", "b"]);
    }

    #[test]
    fn test_mixed_values_order_independent_of_input() {
        let keys = [key(SortOrder::Ascending)];
        let orders = [["10", "9", "1a"], ["9", "1a", "10"], ["10", "1a", "9"]];
        for order in orders {
            let mut values: Vec<[Option<String>; 1]> =
                order.iter().map(|v| [Some(v.to_string())]).collect();
            values.sort_by(|a, b| compare_sort_values(&keys, a, b));
            let sorted: Vec<&str> = values.iter().filter_map(|v| v[0].as_deref()).collect();
            assert_eq!(sorted, vec!["9", "10", "1a"]);
        }
    }
}
