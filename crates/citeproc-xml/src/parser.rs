//! XML parser that builds [`XmlDocument`] trees.

use crate::{Error, Result, XmlAttribute, XmlChild, XmlChildren, XmlDocument, XmlElement};
use citeproc_diagnostics::SourceSpan;
use quick_xml::Reader;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};

/// Parse XML text into a source-tracked tree.
///
/// Comments, processing instructions, the XML declaration and DOCTYPE are
/// skipped. Whitespace-only text between child elements is dropped.
///
/// ```rust
/// use citeproc_xml::parse;
///
/// let xml = parse("<locale><terms/></locale>").unwrap();
/// assert_eq!(xml.root.name, "locale");
/// ```
///
/// # Errors
///
/// Returns an error if the XML is malformed, empty, or has several roots.
pub fn parse(content: &str) -> Result<XmlDocument> {
    XmlParser::new(content).parse()
}

struct XmlParser<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    /// Elements still open, innermost last.
    stack: Vec<BuildNode>,
}

/// A node being constructed during parsing.
struct BuildNode {
    name: String,
    name_span: SourceSpan,
    prefix: Option<String>,
    attributes: Vec<XmlAttribute>,
    /// Byte offset of the `<` of the start tag.
    start_offset: usize,
    children: Vec<XmlChild>,
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            source,
            reader,
            stack: Vec::new(),
        }
    }

    fn parse(&mut self) -> Result<XmlDocument> {
        let mut root: Option<XmlElement> = None;

        loop {
            let event_start = self.reader.buffer_position() as usize;

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    self.handle_start(&e, event_start)?;
                }
                Ok(Event::End(e)) => {
                    let element = self.handle_end(&e)?;
                    self.attach(element, &mut root)?;
                }
                Ok(Event::Empty(e)) => {
                    let element = self.handle_empty(&e, event_start)?;
                    self.attach(element, &mut root)?;
                }
                Ok(Event::Text(e)) => {
                    self.handle_text(&e, event_start)?;
                }
                Ok(Event::CData(e)) => {
                    self.handle_cdata(&e, event_start);
                }
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        position: Some(self.reader.error_position()),
                    });
                }
            }
        }

        if let Some(node) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", node.name),
                location: Some(node.name_span),
            });
        }

        let root = root.ok_or(Error::EmptyDocument)?;
        Ok(XmlDocument::new(root, SourceSpan::new(0, self.source.len())))
    }

    /// Hand a finished element to its parent, or make it the root.
    fn attach(&mut self, element: XmlElement, root: &mut Option<XmlElement>) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(XmlChild::Element(element));
                Ok(())
            }
            None if root.is_some() => Err(Error::MultipleRoots {
                location: Some(element.span),
            }),
            None => {
                *root = Some(element);
                Ok(())
            }
        }
    }

    fn handle_start(&mut self, e: &BytesStart<'_>, event_start: usize) -> Result<()> {
        let (name, prefix) = split_qname(e.name().as_ref());
        let name_start = event_start + 1;
        let name_span = SourceSpan::new(name_start, name_start + e.name().as_ref().len());
        let attributes = self.parse_attributes(e, event_start)?;

        self.stack.push(BuildNode {
            name,
            name_span,
            prefix,
            attributes,
            start_offset: event_start,
            children: Vec::new(),
        });

        Ok(())
    }

    fn handle_end(&mut self, e: &BytesEnd<'_>) -> Result<XmlElement> {
        let (end_name, _) = split_qname(e.name().as_ref());

        let node = self.stack.pop().ok_or_else(|| Error::InvalidStructure {
            message: format!("Unexpected closing tag </{}>", end_name),
            location: None,
        })?;

        if node.name != end_name {
            return Err(Error::MismatchedEndTag {
                expected: node.name,
                found: end_name,
                location: Some(node.name_span),
            });
        }

        let end_offset = self.reader.buffer_position() as usize;

        Ok(XmlElement {
            name: node.name,
            name_span: node.name_span,
            prefix: node.prefix,
            attributes: node.attributes,
            children: finalize_children(node.children),
            span: SourceSpan::new(node.start_offset, end_offset),
        })
    }

    fn handle_empty(&mut self, e: &BytesStart<'_>, event_start: usize) -> Result<XmlElement> {
        let (name, prefix) = split_qname(e.name().as_ref());
        let name_start = event_start + 1;
        let name_span = SourceSpan::new(name_start, name_start + e.name().as_ref().len());
        let attributes = self.parse_attributes(e, event_start)?;
        let end_offset = self.reader.buffer_position() as usize;

        Ok(XmlElement {
            name,
            name_span,
            prefix,
            attributes,
            children: XmlChildren::Empty,
            span: SourceSpan::new(event_start, end_offset),
        })
    }

    fn handle_text(&mut self, e: &BytesText<'_>, event_start: usize) -> Result<()> {
        let text = e.unescape().map_err(|err| Error::XmlSyntax {
            message: format!("Invalid text content: {}", err),
            position: Some(event_start as u64),
        })?;
        let span = SourceSpan::new(event_start, self.reader.buffer_position() as usize);

        if let Some(node) = self.stack.last_mut() {
            node.children.push(XmlChild::Text {
                content: text.into_owned(),
                span,
            });
        }
        Ok(())
    }

    fn handle_cdata(&mut self, e: &BytesCData<'_>, event_start: usize) {
        let text = String::from_utf8_lossy(e.as_ref()).into_owned();
        let span = SourceSpan::new(event_start, self.reader.buffer_position() as usize);

        if let Some(node) = self.stack.last_mut() {
            node.children.push(XmlChild::Text {
                content: text,
                span,
            });
        }
    }

    fn parse_attributes(&self, e: &BytesStart<'_>, tag_start: usize) -> Result<Vec<XmlAttribute>> {
        let mut attributes = Vec::new();

        // Raw tag content starts right after '<'
        let content_start = tag_start + 1;
        let tag_str = String::from_utf8_lossy(e.as_ref());
        let mut search_from = e.name().as_ref().len();

        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| Error::XmlSyntax {
                message: format!("Attribute error: {}", err),
                position: Some(tag_start as u64),
            })?;
            let raw_name = attr.key.as_ref();
            let (name, prefix) = split_qname(raw_name);
            let full_name = String::from_utf8_lossy(raw_name);

            let value = attr.unescape_value().map_err(|err| Error::XmlSyntax {
                message: format!("Invalid attribute value: {}", err),
                position: Some(tag_start as u64),
            })?;

            let (name_span, value_span, next) =
                locate_attribute(&tag_str, search_from, &full_name, content_start);
            search_from = next;

            attributes.push(XmlAttribute {
                name,
                name_span,
                prefix,
                value: value.into_owned(),
                value_span,
            });
        }

        Ok(attributes)
    }
}

/// Split `prefix:local` into `(local, Some(prefix))`.
fn split_qname(raw: &[u8]) -> (String, Option<String>) {
    let full = String::from_utf8_lossy(raw);
    match full.split_once(':') {
        Some((prefix, local)) => (local.to_string(), Some(prefix.to_string())),
        None => (full.into_owned(), None),
    }
}

/// Find the spans of `name="value"` inside a tag, searching from `search_from`.
///
/// Returns the name span, the value span (quotes included) and the offset to
/// continue searching from for the next attribute.
fn locate_attribute(
    tag_str: &str,
    search_from: usize,
    attr_name: &str,
    content_start: usize,
) -> (SourceSpan, SourceSpan, usize) {
    let search_from = search_from.min(tag_str.len());
    let Some(rel) = tag_str[search_from..].find(attr_name) else {
        let fallback = SourceSpan::new(content_start, content_start + 1);
        return (fallback, fallback, search_from);
    };

    let name_start = search_from + rel;
    let name_end = name_start + attr_name.len();
    let rest = &tag_str[name_end..];

    let value_rel = rest.find(['"', '\'']);
    let (value_start, value_end) = match value_rel {
        Some(open) => {
            let quote = rest[open..].chars().next().unwrap_or('"');
            let close = rest[open + 1..]
                .find(quote)
                .map_or(rest.len(), |p| open + 1 + p + 1);
            (name_end + open, name_end + close)
        }
        None => (name_start, name_end),
    };

    (
        SourceSpan::new(content_start + name_start, content_start + name_end),
        SourceSpan::new(content_start + value_start, content_start + value_end),
        value_end,
    )
}

fn finalize_children(children: Vec<XmlChild>) -> XmlChildren {
    let has_elements = children.iter().any(|c| matches!(c, XmlChild::Element(_)));

    if !has_elements {
        let mut texts = children.into_iter().filter_map(|c| match c {
            XmlChild::Text { content, span } => Some((content, span)),
            XmlChild::Element(_) => None,
        });
        return match texts.next() {
            None => XmlChildren::Empty,
            Some((mut content, first_span)) => {
                let mut end = first_span.end;
                for (more, span) in texts {
                    content.push_str(&more);
                    end = span.end;
                }
                XmlChildren::Text {
                    content,
                    span: SourceSpan::new(first_span.start, end),
                }
            }
        };
    }

    let meaningful: Vec<XmlChild> = children
        .into_iter()
        .filter(|c| match c {
            XmlChild::Text { content, .. } => !content.trim().is_empty(),
            XmlChild::Element(_) => true,
        })
        .collect();

    if meaningful.iter().all(|c| matches!(c, XmlChild::Element(_))) {
        XmlChildren::Elements(
            meaningful
                .into_iter()
                .filter_map(|c| match c {
                    XmlChild::Element(e) => Some(e),
                    XmlChild::Text { .. } => None,
                })
                .collect(),
        )
    } else {
        XmlChildren::Mixed(meaningful)
    }
}
