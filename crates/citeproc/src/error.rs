//! Error types for style resolution, locale resolution and rendering.

use citeproc_diagnostics::{DetailItem, DetailKind, DiagnosticMessage, DiagnosticMessageBuilder};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for citeproc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a [`Style`](crate::Style) or using it.
///
/// Schema warnings and unresolved references are not errors: the former are
/// carried in [`Validated`](crate::Validated), the latter are reported
/// through the callback given to [`Bibliography::register`](crate::Bibliography::register).
#[derive(Debug, Error)]
pub enum Error {
    /// The identifier matched no filesystem path, bundled style or catalog entry.
    #[error("style '{identifier}' not found{}", guidance_suffix(.guidance))]
    StyleNotFound {
        identifier: String,
        /// How to make the style available, when there is a known remedy.
        guidance: Option<String>,
    },

    /// No locale document exists for the tag, even after dialect fallback.
    #[error("locale '{tag}' not found (tried {})", .tried.join(", "))]
    LocaleNotFound { tag: String, tried: Vec<String> },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: citeproc_xml::Error,
    },

    #[error("failed to read {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    /// The document parsed as XML but is not a usable style or locale.
    #[error("invalid style {origin}: {source}")]
    Style {
        origin: String,
        #[source]
        source: citeproc_csl::Error,
    },

    /// CSL-JSON input could not be read as references.
    #[error("invalid reference data: {message}")]
    Reference { message: String },

    #[error("invalid configuration in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("evaluation error: {message}")]
    Evaluation { message: String },
}

fn with_origin(mut diagnostic: DiagnosticMessage, origin: &str) -> DiagnosticMessage {
    diagnostic.details.push(DetailItem {
        kind: DetailKind::Info,
        content: format!("While loading {}", origin).into(),
        location: None,
    });
    diagnostic
}

fn guidance_suffix(guidance: &Option<String>) -> String {
    match guidance {
        Some(g) => format!(". {}", g),
        None => String::new(),
    }
}

impl Error {
    /// Convert this error to a DiagnosticMessage.
    ///
    /// Core errors use C-4-1 through C-4-6. Parse and model errors keep the
    /// code of the underlying XML or CSL error and add the origin as a detail.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            Error::StyleNotFound {
                identifier,
                guidance,
            } => {
                let mut builder = DiagnosticMessageBuilder::error("Style Not Found")
                    .with_code("C-4-1")
                    .problem(format!(
                        "No style could be resolved for '{}'",
                        identifier
                    ))
                    .add_info("Looked for a file path, then a bundled style, then a catalog entry");
                if let Some(guidance) = guidance {
                    builder = builder.add_hint(guidance.clone());
                }
                builder.build()
            }

            Error::LocaleNotFound { tag, tried } => {
                let mut builder = DiagnosticMessageBuilder::error("Locale Not Found")
                    .with_code("C-4-2")
                    .problem(format!("No locale document found for '{}'", tag));
                for candidate in tried {
                    builder = builder.add_detail(format!("Tried locales-{}.xml", candidate));
                }
                builder
                    .add_hint("Request a locale that ships with the bundled data?")
                    .build()
            }

            Error::Parse { origin, source } => with_origin(source.to_diagnostic(), origin),

            Error::Io { origin, source } => DiagnosticMessageBuilder::error("Unreadable Document")
                .with_code("C-4-3")
                .problem(format!("Could not read {}", origin))
                .add_detail(source.to_string())
                .build(),

            Error::Style { origin, source } => with_origin(source.to_diagnostic(), origin),

            Error::Reference { message } => DiagnosticMessageBuilder::error("Invalid Reference Data")
                .with_code("C-4-4")
                .problem("References must be a CSL-JSON array of items")
                .add_detail(message.clone())
                .build(),

            Error::Config { path, message } => DiagnosticMessageBuilder::error("Invalid Configuration")
                .with_code("C-4-5")
                .problem(format!("Could not load {}", path.display()))
                .add_detail(message.clone())
                .build(),

            Error::Evaluation { message } => DiagnosticMessageBuilder::error("Evaluation Error")
                .with_code("C-4-6")
                .problem(message.clone())
                .build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_not_found_display_includes_guidance() {
        let err = Error::StyleNotFound {
            identifier: "apa".to_string(),
            guidance: Some("install citeproc-styles".to_string()),
        };
        assert_eq!(err.to_string(), "style 'apa' not found. install citeproc-styles");
        let bare = Error::StyleNotFound {
            identifier: "apa".to_string(),
            guidance: None,
        };
        assert_eq!(bare.to_string(), "style 'apa' not found");
    }

    #[test]
    fn test_locale_not_found_lists_candidates() {
        let err = Error::LocaleNotFound {
            tag: "xx".to_string(),
            tried: vec!["xx".to_string()],
        };
        assert_eq!(err.to_string(), "locale 'xx' not found (tried xx)");

        let diagnostic = err.to_diagnostic();
        assert_eq!(diagnostic.code.as_deref(), Some("C-4-2"));
        assert_eq!(diagnostic.details.len(), 1);
    }

    #[test]
    fn test_parse_error_keeps_xml_code() {
        let err = Error::Parse {
            origin: "style.csl".to_string(),
            source: citeproc_xml::Error::EmptyDocument,
        };
        let diagnostic = err.to_diagnostic();
        assert!(diagnostic.code.as_deref().is_some_and(|c| c.starts_with("C-1-")));
        assert!(diagnostic.is_error());
    }
}
