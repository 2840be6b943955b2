//! Failures while building an XML tree.

use citeproc_diagnostics::{DiagnosticMessage, DiagnosticMessageBuilder, SourceSpan};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Malformed markup reported by quick-xml; `position` is a byte offset.
    #[error("XML syntax error: {message}")]
    XmlSyntax {
        message: String,
        position: Option<u64>,
    },

    /// Input ended while an element was still open.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof {
        expected: String,
        location: Option<SourceSpan>,
    },

    #[error("mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        expected: String,
        found: String,
        location: Option<SourceSpan>,
    },

    #[error("invalid XML structure: {message}")]
    InvalidStructure {
        message: String,
        location: Option<SourceSpan>,
    },

    #[error("empty XML document: no root element found")]
    EmptyDocument,

    #[error("invalid XML: multiple root elements")]
    MultipleRoots { location: Option<SourceSpan> },
}

impl Error {
    /// Byte range the error points at, when known.
    pub fn location(&self) -> Option<SourceSpan> {
        match self {
            Error::XmlSyntax { position, .. } => position.map(|offset| {
                let offset = offset as usize;
                SourceSpan::new(offset, offset + 1)
            }),
            Error::UnexpectedEof { location, .. }
            | Error::MismatchedEndTag { location, .. }
            | Error::InvalidStructure { location, .. }
            | Error::MultipleRoots { location } => *location,
            Error::EmptyDocument => None,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Error::XmlSyntax { .. } => "C-1-1",
            Error::UnexpectedEof { .. } => "C-1-2",
            Error::MismatchedEndTag { .. } => "C-1-3",
            Error::InvalidStructure { .. } => "C-1-4",
            Error::EmptyDocument => "C-1-5",
            Error::MultipleRoots { .. } => "C-1-6",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Error::XmlSyntax { .. } => "XML Syntax Error",
            Error::UnexpectedEof { .. } => "Unexpected End of XML Input",
            Error::MismatchedEndTag { .. } => "Mismatched XML End Tag",
            Error::InvalidStructure { .. } => "Invalid XML Structure",
            Error::EmptyDocument => "Empty XML Document",
            Error::MultipleRoots { .. } => "Multiple XML Root Elements",
        }
    }

    /// Diagnostic with a `C-1-*` code, located when the span is known.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let problem = match self {
            Error::XmlSyntax { message, .. } | Error::InvalidStructure { message, .. } => {
                message.clone()
            }
            Error::UnexpectedEof { expected, .. } => {
                format!("The document ended before {}", expected)
            }
            Error::MismatchedEndTag {
                expected, found, ..
            } => format!("End tag </{}> closes <{}>", found, expected),
            Error::EmptyDocument => "The document has no root element".to_string(),
            Error::MultipleRoots { .. } => "The document has more than one root element".to_string(),
        };

        let mut builder = DiagnosticMessageBuilder::error(self.title())
            .with_code(self.code())
            .problem(problem);
        match self {
            Error::XmlSyntax {
                position: Some(offset),
                ..
            } => builder = builder.add_detail(format!("At byte offset {}", offset)),
            Error::MismatchedEndTag { .. } => {
                builder = builder.add_hint("Does every opening tag have a matching closing tag?")
            }
            Error::MultipleRoots { .. } => {
                builder = builder.add_hint("Wrap the elements in a single <style> or <locale>?")
            }
            _ => {}
        }
        if let Some(location) = self.location() {
            builder = builder.with_location(location);
        }
        builder.build()
    }
}
