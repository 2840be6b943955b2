//! CSL citation processing: style and locale resolution plus a citation registry.
//!
//! A [`StyleLoader`] turns a style identifier into a [`Style`]:
//! - a path, a bundled style name, or a name known to an external
//!   [`StyleCatalog`] is resolved to a document
//! - the document is read, checked against the CSL grammar (problems become
//!   warnings) and parsed with [`citeproc_csl`]
//! - the locale chain is built from the requested tag or the style default
//!
//! A [`Bibliography`] registers [`Citation`]s against a
//! [`SourceCollection`] and renders citations and the reference list through
//! the style's [`RuleEngine`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          citeproc                            │
//! │   resolver → loader → Style (locales, engine) → Bibliography │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        citeproc-csl                          │
//! │           XmlDocument → Style, Element, Locale               │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │          citeproc-xml        +     citeproc-diagnostics      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use citeproc::{Bibliography, Citation, OutputFormat, ReferenceLibrary, StyleLoader};
//! use std::sync::Arc;
//!
//! let style = StyleLoader::default().load("harvard1", None)?;
//! let library = ReferenceLibrary::from_file("refs.json".as_ref())?;
//! let mut bibliography = Bibliography::new(Arc::new(style), library, OutputFormat::Html);
//!
//! let mut citation = Citation::of_keys(["smith2020"]);
//! bibliography.register(&mut citation, None);
//! println!("{}", bibliography.cite(&citation, &mut |item| eprintln!("missing {}", item.key))?);
//!
//! bibliography.sort()?;
//! println!("{}", bibliography.bibliography()?);
//! ```

pub mod bibliography;
pub mod catalog;
pub mod citation;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod locale;
pub mod reference;
pub mod resolver;
pub mod schema;
pub mod source;
pub mod style;

pub use bibliography::{Bibliography, BibliographyState};
pub use catalog::{BundledCatalog, CatalogError, DirectoryCatalog, StyleCatalog};
pub use citation::{BibliographyId, Citation, CitationItem, Locator};
pub use config::Config;
pub use engine::{CslEngine, OutputFormat, RenderContext, RuleEngine};
pub use error::{Error, Result};
pub use loader::{LoadedDocument, Validated};
pub use locale::{DEFAULT_LOCALE, LocaleChain, LocaleResolver, PrimaryDialectTable};
pub use reference::{Reference, ReferenceKey, ReferenceLibrary, SourceCollection};
pub use resolver::{STYLE_CATALOG_PACKAGE, StyleResolver};
pub use schema::{CslGrammar, GrammarValidator, SchemaWarning};
pub use source::{DocumentSource, Provenance, ResolvedSource, StyleIdentifier};
pub use style::{Style, StyleDocument, StyleLoader};
