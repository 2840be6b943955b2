//! Citations and the items they cite.

use crate::reference::ReferenceKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A pinpoint within the cited work, e.g. `page 12`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    /// Locator term name ("page", "chapter", ...).
    pub label: String,
    pub value: String,
}

impl Locator {
    pub fn page(value: impl Into<String>) -> Self {
        Self {
            label: "page".to_string(),
            value: value.into(),
        }
    }
}

/// One reference within a citation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CitationItem {
    pub key: ReferenceKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<Locator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Render without the author, e.g. "Smith says (2020)".
    #[serde(default)]
    pub suppress_author: bool,
    /// Render only the author.
    #[serde(default)]
    pub author_only: bool,
}

impl CitationItem {
    pub fn new(key: impl Into<ReferenceKey>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_locator(mut self, locator: Locator) -> Self {
        self.locator = Some(locator);
        self
    }
}

/// Identity of a [`Bibliography`](crate::Bibliography) instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BibliographyId(u64);

impl BibliographyId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        BibliographyId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BibliographyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bibliography-{}", self.0)
    }
}

/// An in-text citation event citing one or more references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Citation {
    pub items: Vec<CitationItem>,
    pub id: Option<String>,
    /// Footnote number, for note styles.
    pub note_number: Option<u32>,
    registered_with: Option<BibliographyId>,
    /// Index in the citation history of the bibliography it was registered with.
    sequence: Option<usize>,
}

impl Citation {
    pub fn new(items: Vec<CitationItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    /// Build a citation of plain keys.
    pub fn of_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ReferenceKey>,
    {
        Self::new(keys.into_iter().map(CitationItem::new).collect())
    }

    /// The bibliography this citation was registered with, if any.
    pub fn registered_with(&self) -> Option<BibliographyId> {
        self.registered_with
    }

    /// Where this citation sits in its bibliography's history.
    pub fn sequence(&self) -> Option<usize> {
        self.sequence
    }

    pub(crate) fn bind(&mut self, bibliography: BibliographyId, sequence: usize) {
        self.registered_with = Some(bibliography);
        self.sequence = Some(sequence);
    }
}
