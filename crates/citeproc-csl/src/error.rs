//! Failures while building a style or locale model from an XML tree.

use citeproc_diagnostics::{DiagnosticMessage, DiagnosticMessageBuilder, SourceSpan};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("XML error: {0}")]
    Xml(#[from] citeproc_xml::Error),

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: String,
        location: SourceSpan,
    },

    #[error("'{value}' is not a valid {attribute} on <{element}> (expected {expected})")]
    InvalidAttributeValue {
        element: String,
        attribute: String,
        value: String,
        expected: String,
        location: SourceSpan,
    },

    #[error("<{parent}> is missing required child <{element}>")]
    MissingElement {
        parent: String,
        element: String,
        location: SourceSpan,
    },

    /// `<text>` without variable, macro, term or value.
    #[error("<text> has no variable, macro, term or value")]
    MissingTextSource { location: SourceSpan },

    #[error("macro '{name}' is not defined")]
    UndefinedMacro {
        name: String,
        reference_location: SourceSpan,
        /// Closest defined macro name, if any is near enough.
        suggestion: Option<String>,
    },

    /// `chain` repeats its first name at the end.
    #[error("macros call each other in a cycle: {}", .chain.join(" -> "))]
    CircularMacro {
        chain: Vec<String>,
        location: SourceSpan,
    },

    #[error("macro '{name}' is defined twice")]
    DuplicateMacro {
        name: String,
        first_location: SourceSpan,
        second_location: SourceSpan,
    },

    #[error("root element is <{found}>, expected <{expected}>")]
    InvalidRootElement {
        expected: String,
        found: String,
        location: SourceSpan,
    },
}

impl Error {
    /// Byte range in the document this error points at.
    pub fn location(&self) -> Option<SourceSpan> {
        match self {
            Error::Xml(err) => err.location(),
            Error::MissingAttribute { location, .. }
            | Error::InvalidAttributeValue { location, .. }
            | Error::MissingElement { location, .. }
            | Error::MissingTextSource { location }
            | Error::CircularMacro { location, .. }
            | Error::InvalidRootElement { location, .. } => Some(*location),
            Error::UndefinedMacro {
                reference_location, ..
            } => Some(*reference_location),
            Error::DuplicateMacro {
                second_location, ..
            } => Some(*second_location),
        }
    }

    /// Model errors carry `C-2-*` codes; XML errors keep their `C-1-*` code.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let (code, title) = match self {
            Error::Xml(err) => return err.to_diagnostic(),
            Error::MissingAttribute { .. } => ("C-2-1", "Missing Required Attribute"),
            Error::InvalidAttributeValue { .. } => ("C-2-2", "Invalid Attribute Value"),
            Error::MissingElement { .. } => ("C-2-3", "Missing Required Element"),
            Error::MissingTextSource { .. } => ("C-2-4", "Missing Text Source"),
            Error::UndefinedMacro { .. } => ("C-2-5", "Undefined Macro"),
            Error::CircularMacro { .. } => ("C-2-6", "Circular Macro Dependency"),
            Error::DuplicateMacro { .. } => ("C-2-7", "Duplicate Macro Definition"),
            Error::InvalidRootElement { .. } => ("C-2-8", "Invalid Root Element"),
        };

        let mut builder = DiagnosticMessageBuilder::error(title)
            .with_code(code)
            .problem(capitalized(&self.to_string()));
        if let Some(location) = self.location() {
            builder = builder.with_location(location);
        }

        builder = match self {
            Error::MissingAttribute { attribute, .. } => {
                builder.add_hint(format!("Add {}=\"...\" to the element?", attribute))
            }
            Error::InvalidAttributeValue { expected, .. } => {
                builder.add_detail(format!("Expected: {}", expected))
            }
            Error::MissingTextSource { .. } => builder.add_hint(
                "Add one of variable=\"...\", macro=\"...\", term=\"...\" or value=\"...\"?",
            ),
            Error::UndefinedMacro {
                suggestion: Some(suggestion),
                ..
            } => builder.add_hint(format!("Did you mean '{}'?", suggestion)),
            Error::DuplicateMacro { first_location, .. } => {
                builder.add_detail_at("First definition is here", *first_location)
            }
            _ => builder,
        };
        builder.build()
    }
}

fn capitalized(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
