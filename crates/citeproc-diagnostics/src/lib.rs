//! Structured diagnostic messages for the citeproc crates.
//!
//! Every error and warning produced while loading styles and locales can be
//! turned into a [`DiagnosticMessage`]: a short title, an optional stable
//! code (e.g. `C-4-1`), a problem statement, bulleted details and hints.
//!
//! - [`DiagnosticMessage`]: the message itself
//! - [`DiagnosticMessageBuilder`]: tidyverse-style builder (`.problem()`,
//!   `.add_detail()`, `.add_hint()`)
//! - [`SourceSpan`] / [`SourceFile`]: byte ranges into a document, rendered
//!   with ariadne when the document text is available
//!
//! # Example
//!
//! ```
//! use citeproc_diagnostics::DiagnosticMessageBuilder;
//!
//! let msg = DiagnosticMessageBuilder::error("Style Not Found")
//!     .with_code("C-4-1")
//!     .problem("'apa' is not a bundled style")
//!     .add_hint("Register an external style catalog?")
//!     .build();
//!
//! let text = msg.to_text(None);
//! assert!(text.starts_with("Error [C-4-1]: Style Not Found"));
//! ```

pub mod builder;
pub mod diagnostic;
pub mod span;

pub use builder::DiagnosticMessageBuilder;
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
pub use span::{SourceFile, SourceSpan};
