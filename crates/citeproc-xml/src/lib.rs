//! Source-tracked XML parsing for CSL style and locale documents.
//!
//! Wraps [`quick-xml`] to build a tree of [`XmlElement`]s where every element,
//! attribute and text node remembers the byte range it came from, so that
//! grammar warnings and model errors can point back into the document.
//!
//! ```rust
//! use citeproc_xml::parse;
//!
//! let xml = parse(r#"<style version="1.0">
//!   <macro name="author">
//!     <text variable="author"/>
//!   </macro>
//! </style>"#).unwrap();
//!
//! assert_eq!(xml.root.name, "style");
//! assert_eq!(xml.root.get_attribute("version"), Some("1.0"));
//!
//! let macros = xml.root.get_children("macro");
//! assert_eq!(macros.len(), 1);
//! assert_eq!(macros[0].get_attribute("name"), Some("author"));
//! ```

pub mod error;
pub mod parser;
pub mod types;

pub use citeproc_diagnostics::SourceSpan;
pub use error::{Error, Result};
pub use parser::parse;
pub use types::{XmlAttribute, XmlChild, XmlChildren, XmlDocument, XmlElement};
