//! CSL (Citation Style Language) style and locale models with source tracking.
//!
//! Builds semantic Rust types on top of [`citeproc_xml`] trees. Every
//! rendering element becomes a variant of the closed [`ElementType`] enum at
//! parse time, so evaluation is a single `match` rather than a lookup by tag
//! name.
//!
//! The main types are:
//! - [`Style`]: a complete parsed style
//! - [`Element`]: a rendering element (text, names, date, ...)
//! - [`Macro`]: a reusable macro definition
//! - [`Locale`]: terms and date formats, standalone or embedded in a style
//! - [`Keyword`]: the attribute keywords each enum is spelled with
//!
//! # Example
//!
//! ```rust
//! use citeproc_csl::parse_csl;
//!
//! let csl = r#"<?xml version="1.0" encoding="utf-8"?>
//! <style xmlns="http://purl.org/net/xbiblio/csl" class="in-text" version="1.0">
//!   <info><title>Test Style</title></info>
//!   <citation><layout><text variable="title"/></layout></citation>
//! </style>"#;
//!
//! let style = parse_csl(csl).unwrap();
//! assert_eq!(style.version, "1.0");
//! ```
//!
//! # Error Reporting
//!
//! ```rust
//! use citeproc_csl::parse_csl;
//!
//! let err = parse_csl("<style/>").unwrap_err();  // Missing required attributes
//! let diagnostic = err.to_diagnostic();
//! assert_eq!(diagnostic.code.as_deref(), Some("C-2-1"));
//! ```

pub mod error;
pub mod keyword;
pub mod parser;
pub mod types;

pub use error::{Error, Result};
pub use keyword::Keyword;
pub use parser::{parse_csl, parse_locale, parse_style};
pub use types::*;
