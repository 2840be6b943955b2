//! Core types for source-tracked XML trees.

use citeproc_diagnostics::SourceSpan;

/// A parsed XML document.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub root: XmlElement,

    /// Span of the entire document text.
    pub span: SourceSpan,
}

/// An XML element with source location tracking.
#[derive(Debug, Clone)]
pub struct XmlElement {
    /// The local name of the element (without namespace prefix).
    pub name: String,

    /// Span of the element name in the start tag.
    pub name_span: SourceSpan,

    /// Namespace prefix, if any (e.g. "cs" in `<cs:text>`).
    pub prefix: Option<String>,

    pub attributes: Vec<XmlAttribute>,

    pub children: XmlChildren,

    /// Span of the entire element, start tag through end tag.
    pub span: SourceSpan,
}

/// An XML attribute with separate spans for its name and value.
#[derive(Debug, Clone)]
pub struct XmlAttribute {
    /// The local name of the attribute (without namespace prefix).
    pub name: String,

    pub name_span: SourceSpan,

    /// Namespace prefix, if any ("xml" for `xml:lang`).
    pub prefix: Option<String>,

    /// The attribute value after unescaping XML entities.
    pub value: String,

    /// Span of the value in the source, including the quotes.
    pub value_span: SourceSpan,
}

/// Children of an XML element.
#[derive(Debug, Clone)]
pub enum XmlChildren {
    /// Only child elements (whitespace between them is dropped).
    Elements(Vec<XmlElement>),

    /// Only text content.
    Text { content: String, span: SourceSpan },

    /// Text and elements interleaved.
    Mixed(Vec<XmlChild>),

    Empty,
}

/// A single child in mixed content.
#[derive(Debug, Clone)]
pub enum XmlChild {
    Element(XmlElement),
    Text { content: String, span: SourceSpan },
}

impl XmlDocument {
    pub fn new(root: XmlElement, span: SourceSpan) -> Self {
        Self { root, span }
    }
}

impl XmlElement {
    /// Create an element with no children.
    pub fn new(
        name: impl Into<String>,
        attributes: Vec<XmlAttribute>,
        span: SourceSpan,
    ) -> Self {
        Self {
            name: name.into(),
            name_span: span,
            prefix: None,
            attributes,
            children: XmlChildren::Empty,
            span,
        }
    }

    /// Create an element with child elements.
    pub fn with_elements(
        name: impl Into<String>,
        attributes: Vec<XmlAttribute>,
        children: Vec<XmlElement>,
        span: SourceSpan,
    ) -> Self {
        Self {
            children: XmlChildren::Elements(children),
            ..Self::new(name, attributes, span)
        }
    }

    /// Create an element with text content.
    pub fn with_text(
        name: impl Into<String>,
        attributes: Vec<XmlAttribute>,
        text: impl Into<String>,
        span: SourceSpan,
    ) -> Self {
        Self {
            children: XmlChildren::Text {
                content: text.into(),
                span,
            },
            ..Self::new(name, attributes, span)
        }
    }

    /// Get an attribute value by local name.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.get_attribute_full(name).map(|a| a.value.as_str())
    }

    /// Get an attribute by local name, with its spans.
    pub fn get_attribute_full(&self, name: &str) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Get an attribute by prefix and local name (`xml:lang` is `("xml", "lang")`).
    pub fn get_prefixed_attribute(&self, prefix: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.prefix.as_deref() == Some(prefix))
            .map(|a| a.value.as_str())
    }

    pub fn has_elements(&self) -> bool {
        !self.all_children().is_empty()
    }

    pub fn has_text(&self) -> bool {
        matches!(&self.children, XmlChildren::Text { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.children, XmlChildren::Empty)
    }

    /// Text content, if this element contains only text.
    pub fn text(&self) -> Option<&str> {
        match &self.children {
            XmlChildren::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Child elements with the given local name.
    pub fn get_children(&self, name: &str) -> Vec<&XmlElement> {
        self.all_children()
            .into_iter()
            .filter(|e| e.name == name)
            .collect()
    }

    /// First child element with the given local name.
    pub fn first_child(&self, name: &str) -> Option<&XmlElement> {
        self.all_children().into_iter().find(|e| e.name == name)
    }

    /// All child elements (ignoring text in mixed content).
    pub fn all_children(&self) -> Vec<&XmlElement> {
        match &self.children {
            XmlChildren::Elements(elements) => elements.iter().collect(),
            XmlChildren::Mixed(children) => children
                .iter()
                .filter_map(|c| match c {
                    XmlChild::Element(e) => Some(e),
                    XmlChild::Text { .. } => None,
                })
                .collect(),
            XmlChildren::Text { .. } | XmlChildren::Empty => vec![],
        }
    }

    /// Depth-first walk over this element and all descendants.
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = vec![self];
        for child in self.all_children() {
            out.extend(child.descendants());
        }
        out
    }
}

impl XmlAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_span: SourceSpan::default(),
            prefix: None,
            value: value.into(),
            value_span: SourceSpan::default(),
        }
    }
}
