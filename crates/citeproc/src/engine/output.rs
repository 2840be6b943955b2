//! Intermediate output tree and the formats it renders to.
//!
//! Evaluation builds an [`Output`] tree. Text case, period stripping and
//! quotes are applied while the tree is built, so rendering only adds
//! markup, affixes and escaping.

use citeproc_csl::{FontStyle, FontVariant, FontWeight, Formatting, TextDecoration, VerticalAlign};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Semantic marks that citation post-processing looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// Rendered names of one `<names>` element.
    Names,
    /// A rendered date variable.
    Date(String),
    Title,
    Locator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Formatted {
        formatting: Formatting,
        children: Vec<Output>,
    },
    Literal(String),
    Tagged {
        tag: Tag,
        child: Box<Output>,
    },
    Null,
}

impl Output {
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Output::Null
        } else {
            Output::Literal(text)
        }
    }

    /// Wrap children in formatting. Null children are dropped; no children
    /// left means no output, affixes included.
    pub fn formatted(formatting: Formatting, children: Vec<Output>) -> Self {
        let children: Vec<Output> = children.into_iter().filter(|c| !c.is_null()).collect();
        if children.is_empty() {
            Output::Null
        } else {
            Output::Formatted {
                formatting,
                children,
            }
        }
    }

    pub fn tagged(tag: Tag, child: Output) -> Self {
        if child.is_null() {
            Output::Null
        } else {
            Output::Tagged {
                tag,
                child: Box::new(child),
            }
        }
    }

    pub fn sequence(children: Vec<Output>) -> Self {
        let mut children: Vec<Output> = children.into_iter().filter(|c| !c.is_null()).collect();
        match children.len() {
            0 => Output::Null,
            1 => children.remove(0),
            _ => Output::Formatted {
                formatting: Formatting::default(),
                children,
            },
        }
    }

    /// Join non-null outputs with a delimiter.
    pub fn join(outputs: Vec<Output>, delimiter: &str) -> Self {
        let mut children = Vec::new();
        for output in outputs.into_iter().filter(|o| !o.is_null()) {
            if !children.is_empty() && !delimiter.is_empty() {
                children.push(Output::Literal(delimiter.to_string()));
            }
            children.push(output);
        }
        Output::sequence(children)
    }

    pub fn is_null(&self) -> bool {
        match self {
            Output::Null => true,
            Output::Literal(s) => s.is_empty(),
            Output::Formatted { children, .. } => children.iter().all(Output::is_null),
            Output::Tagged { child, .. } => child.is_null(),
        }
    }

    /// Apply `f` to every literal, in document order.
    pub fn map_literals(&mut self, f: &mut dyn FnMut(&str) -> String) {
        match self {
            Output::Literal(s) => *s = f(s),
            Output::Formatted { children, .. } => {
                for child in children {
                    child.map_literals(f);
                }
            }
            Output::Tagged { child, .. } => child.map_literals(f),
            Output::Null => {}
        }
    }

    /// Plain text with affixes but without markup.
    pub fn plain_text(&self) -> String {
        OutputFormat::Plain.render(self)
    }

    fn contains_tag(&self, tag: &Tag) -> bool {
        match self {
            Output::Tagged { tag: t, child } => t == tag || child.contains_tag(tag),
            Output::Formatted { children, .. } => children.iter().any(|c| c.contains_tag(tag)),
            Output::Literal(_) | Output::Null => false,
        }
    }

    /// Drop the first rendered names, for suppress-author citations.
    pub fn without_first_names(self) -> Output {
        let mut removed = false;
        let stripped = self.remove_first(&Tag::Names, &mut removed);
        if removed {
            stripped.trim_leading_delimiter()
        } else {
            stripped
        }
    }

    fn remove_first(self, tag: &Tag, removed: &mut bool) -> Output {
        if *removed {
            return self;
        }
        match self {
            Output::Tagged { tag: t, .. } if &t == tag => {
                *removed = true;
                Output::Null
            }
            Output::Tagged { tag: t, child } => Output::tagged(t, (*child).remove_first(tag, removed)),
            Output::Formatted {
                formatting,
                children,
            } => {
                let children = children
                    .into_iter()
                    .map(|c| c.remove_first(tag, removed))
                    .collect();
                Output::formatted(formatting, children)
            }
            other => other,
        }
    }

    /// After removing leading content, drop a delimiter left at the front.
    fn trim_leading_delimiter(self) -> Output {
        match self {
            Output::Literal(s) => {
                let trimmed = s.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
                Output::literal(trimmed)
            }
            Output::Formatted {
                formatting,
                children,
            } => {
                let mut iter = children.into_iter();
                let mut kept = Vec::new();
                for child in iter.by_ref() {
                    let trimmed = child.trim_leading_delimiter();
                    if !trimmed.is_null() {
                        kept.push(trimmed);
                        break;
                    }
                }
                kept.extend(iter);
                Output::formatted(formatting, kept)
            }
            Output::Tagged { tag, child } => Output::tagged(tag, (*child).trim_leading_delimiter()),
            Output::Null => Output::Null,
        }
    }

    /// The first rendered names and nothing else, for author-only citations.
    pub fn first_names(&self) -> Output {
        match self {
            Output::Tagged {
                tag: Tag::Names,
                child,
            } => Output::tagged(Tag::Names, (**child).clone()),
            Output::Tagged { child, .. } => child.first_names(),
            Output::Formatted { children, .. } => children
                .iter()
                .find(|c| c.contains_tag(&Tag::Names))
                .map(Output::first_names)
                .unwrap_or(Output::Null),
            Output::Literal(_) | Output::Null => Output::Null,
        }
    }
}

/// Target format of rendered citations and bibliographies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    #[serde(alias = "text")]
    Plain,
}

impl OutputFormat {
    pub fn render(&self, output: &Output) -> String {
        let mut out = String::new();
        self.render_into(output, &mut out);
        out
    }

    fn render_into(&self, output: &Output, out: &mut String) {
        match output {
            Output::Null => {}
            Output::Literal(text) => out.push_str(&self.escape(text)),
            Output::Tagged { child, .. } => self.render_into(child, out),
            Output::Formatted {
                formatting,
                children,
            } => {
                let mut inner = String::new();
                for child in children {
                    self.render_into(child, &mut inner);
                }
                if inner.is_empty() {
                    return;
                }
                if let Some(prefix) = &formatting.prefix {
                    out.push_str(&self.escape(prefix));
                }
                out.push_str(&self.markup(formatting, inner));
                if let Some(suffix) = &formatting.suffix {
                    out.push_str(&self.escape(suffix));
                }
            }
        }
    }

    fn markup(&self, formatting: &Formatting, text: String) -> String {
        if *self == OutputFormat::Plain {
            return text;
        }
        let mut text = text;
        if matches!(formatting.font_style, Some(FontStyle::Italic | FontStyle::Oblique)) {
            text = format!("<i>{}</i>", text);
        }
        if formatting.font_weight == Some(FontWeight::Bold) {
            text = format!("<b>{}</b>", text);
        }
        if formatting.font_variant == Some(FontVariant::SmallCaps) {
            text = format!(r#"<span style="font-variant:small-caps;">{}</span>"#, text);
        }
        if formatting.text_decoration == Some(TextDecoration::Underline) {
            text = format!(r#"<span style="text-decoration:underline;">{}</span>"#, text);
        }
        match formatting.vertical_align {
            Some(VerticalAlign::Sup) => text = format!("<sup>{}</sup>", text),
            Some(VerticalAlign::Sub) => text = format!("<sub>{}</sub>", text),
            _ => {}
        }
        text
    }

    pub fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            OutputFormat::Plain => Cow::Borrowed(text),
            OutputFormat::Html => {
                if !text.contains(['&', '<', '>']) {
                    return Cow::Borrowed(text);
                }
                Cow::Owned(
                    text.replace('&', "&amp;")
                        .replace('<', "&lt;")
                        .replace('>', "&gt;"),
                )
            }
        }
    }

    /// Wrap rendered entries into a bibliography.
    pub fn bibliography(&self, entries: &[String]) -> String {
        match self {
            OutputFormat::Plain => entries.join("\n"),
            OutputFormat::Html => {
                let mut out = String::from("<div class=\"csl-bib-body\">\n");
                for entry in entries {
                    out.push_str("  <div class=\"csl-entry\">");
                    out.push_str(entry);
                    out.push_str("</div>\n");
                }
                out.push_str("</div>");
                out
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Html => f.write_str("html"),
            OutputFormat::Plain => f.write_str("plain"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "plain" | "text" => Ok(OutputFormat::Plain),
            other => Err(format!("unknown output format '{}' (expected html or plain)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn italic() -> Formatting {
        Formatting {
            font_style: Some(FontStyle::Italic),
            ..Default::default()
        }
    }

    fn affixed(prefix: &str, suffix: &str) -> Formatting {
        Formatting {
            prefix: Some(prefix.to_string()),
            suffix: Some(suffix.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_null_children_suppress_affixes() {
        let output = Output::formatted(affixed("(", ")"), vec![Output::literal("")]);
        assert!(output.is_null());
        assert_eq!(OutputFormat::Html.render(&output), "");
    }

    #[test]
    fn test_join_skips_nulls() {
        let output = Output::join(
            vec![Output::literal("a"), Output::Null, Output::literal("b")],
            ", ",
        );
        assert_eq!(output.plain_text(), "a, b");
    }

    #[test]
    fn test_html_markup_and_escaping() {
        let output = Output::formatted(
            affixed("<", ">"),
            vec![Output::formatted(italic(), vec![Output::literal("Q&A")])],
        );
        assert_eq!(OutputFormat::Html.render(&output), "&lt;<i>Q&amp;A</i>&gt;");
        assert_eq!(OutputFormat::Plain.render(&output), "<Q&A>");
    }

    #[test]
    fn test_suppress_and_isolate_names() {
        let output = Output::join(
            vec![
                Output::tagged(Tag::Names, Output::literal("Smith")),
                Output::literal("2020"),
            ],
            ", ",
        );
        assert_eq!(output.first_names().plain_text(), "Smith");
        assert_eq!(output.without_first_names().plain_text(), "2020");
    }

    #[test]
    fn test_map_literals() {
        let mut output = Output::join(vec![Output::literal("a.b"), Output::literal("c.")], " ");
        output.map_literals(&mut |s| s.replace('.', ""));
        assert_eq!(output.plain_text(), "ab c");
    }

    #[test]
    fn test_bibliography_wrappers() {
        let entries = vec!["One".to_string(), "Two".to_string()];
        assert_eq!(OutputFormat::Plain.bibliography(&entries), "One\nTwo");
        insta::assert_snapshot!(OutputFormat::Html.bibliography(&entries), @r#"
        <div class="csl-bib-body">
          <div class="csl-entry">One</div>
          <div class="csl-entry">Two</div>
        </div>
        "#);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("HTML".parse::<OutputFormat>(), Ok(OutputFormat::Html));
        assert_eq!("plain".parse::<OutputFormat>(), Ok(OutputFormat::Plain));
        assert!("rtf".parse::<OutputFormat>().is_err());
    }
}
