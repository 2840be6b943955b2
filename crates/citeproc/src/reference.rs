//! CSL-JSON references and the collections they are looked up from.

use crate::error::{Error, Result};
use hashlink::LinkedHashMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Key a citation uses to name a reference (the CSL-JSON `id`).
pub type ReferenceKey = String;

/// A bibliographic record in CSL-JSON form.
///
/// Common variables are typed fields; anything else lands in `other` and is
/// still reachable through [`Reference::get_variable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// CSL-JSON allows string or integer ids; both are read as a string.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: ReferenceKey,

    #[serde(rename = "type", default)]
    pub ref_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "title-short", skip_serializing_if = "Option::is_none")]
    pub title_short: Option<String>,
    #[serde(rename = "container-title", skip_serializing_if = "Option::is_none")]
    pub container_title: Option<String>,
    #[serde(rename = "collection-title", skip_serializing_if = "Option::is_none")]
    pub collection_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(rename = "publisher-place", skip_serializing_if = "Option::is_none")]
    pub publisher_place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition: Option<NumberVariable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<NumberVariable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<NumberVariable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(rename = "DOI", skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(rename = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Vec<Name>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<Vec<Name>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translator: Option<Vec<Name>>,
    #[serde(rename = "container-author", skip_serializing_if = "Option::is_none")]
    pub container_author: Option<Vec<Name>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<DateVariable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessed: Option<DateVariable>,

    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,
}

/// A variable CSL-JSON allows as either a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberVariable {
    Text(String),
    Number(i64),
}

impl NumberVariable {
    pub fn to_text(&self) -> String {
        match self {
            NumberVariable::Text(s) => s.clone(),
            NumberVariable::Number(n) => n.to_string(),
        }
    }

    /// The integer value, when the text is a plain integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            NumberVariable::Text(s) => s.trim().parse().ok(),
            NumberVariable::Number(n) => Some(*n),
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "reference id must be a string or number, found {}",
            other
        ))),
    }
}

/// A personal or institutional name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    /// e.g. "van" in "Vincent van Gogh".
    #[serde(rename = "non-dropping-particle", skip_serializing_if = "Option::is_none")]
    pub non_dropping_particle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Institutional names are given whole.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
}

impl Name {
    /// Family name with its non-dropping particle, or the literal name.
    pub fn family_part(&self) -> Option<String> {
        if let Some(literal) = &self.literal {
            return Some(literal.clone());
        }
        let family = self.family.as_deref()?;
        Some(match &self.non_dropping_particle {
            Some(particle) => format!("{} {}", particle, family),
            None => family.to_string(),
        })
    }

    /// Key used when sorting by this name: family first, then given.
    pub fn sort_key(&self) -> String {
        let family = self.family.as_deref().or(self.literal.as_deref()).unwrap_or("");
        match &self.given {
            Some(given) => format!("{} {}", family, given),
            None => family.to_string(),
        }
    }
}

/// A CSL-JSON date: structured `date-parts` or a literal string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateVariable {
    /// `[[year, month, day]]`, with a second entry for ranges.
    #[serde(
        rename = "date-parts",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_date_parts"
    )]
    pub date_parts: Option<Vec<Vec<i32>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub circa: Option<bool>,
}

/// Accepts integers and numeric strings inside `date-parts`.
fn deserialize_date_parts<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<Vec<i32>>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Part {
        Number(i64),
        Text(String),
    }

    let raw: Option<Vec<Vec<Part>>> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    raw.into_iter()
        .map(|date| {
            date.into_iter()
                .map(|part| match part {
                    Part::Number(n) => i32::try_from(n)
                        .map_err(|_| D::Error::custom(format!("date part out of range: {}", n))),
                    Part::Text(s) => s
                        .trim()
                        .parse::<i32>()
                        .map_err(|_| D::Error::custom(format!("invalid date part: {}", s))),
                })
                .collect()
        })
        .collect::<std::result::Result<Vec<Vec<i32>>, D::Error>>()
        .map(Some)
}

/// The start of a date, part by part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateParts {
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
}

impl DateVariable {
    /// The first date in `date-parts`.
    pub fn parts(&self) -> Option<DateParts> {
        let first = self.date_parts.as_ref()?.first()?;
        Some(DateParts {
            year: first.first().copied(),
            month: first.get(1).copied(),
            day: first.get(2).copied(),
        })
    }

    /// The end of a range, when `date-parts` has two dates.
    pub fn end_parts(&self) -> Option<DateParts> {
        let end = self.date_parts.as_ref()?.get(1)?;
        Some(DateParts {
            year: end.first().copied(),
            month: end.get(1).copied(),
            day: end.get(2).copied(),
        })
    }

    /// Sortable text form: zero-padded `YYYYMMDD`, or the literal.
    pub fn sort_key(&self) -> Option<String> {
        match self.parts() {
            Some(parts) => Some(format!(
                "{:04}{:02}{:02}",
                parts.year.unwrap_or(0),
                parts.month.unwrap_or(0),
                parts.day.unwrap_or(0)
            )),
            None => self.literal.clone(),
        }
    }
}

impl Reference {
    /// Build a reference with only an id and a type.
    pub fn new(id: impl Into<String>, ref_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ref_type: ref_type.into(),
            title: None,
            title_short: None,
            container_title: None,
            collection_title: None,
            publisher: None,
            publisher_place: None,
            edition: None,
            volume: None,
            issue: None,
            page: None,
            doi: None,
            url: None,
            note: None,
            author: None,
            editor: None,
            translator: None,
            container_author: None,
            issued: None,
            accessed: None,
            other: HashMap::new(),
        }
    }

    /// A standard (text or number) variable by its CSL name.
    pub fn get_variable(&self, name: &str) -> Option<String> {
        let value = match name {
            "id" => Some(self.id.clone()),
            "title" => self.title.clone(),
            "title-short" => self.title_short.clone(),
            "container-title" => self.container_title.clone(),
            "collection-title" => self.collection_title.clone(),
            "publisher" => self.publisher.clone(),
            "publisher-place" => self.publisher_place.clone(),
            "edition" => self.edition.as_ref().map(NumberVariable::to_text),
            "volume" => self.volume.as_ref().map(NumberVariable::to_text),
            "issue" => self.issue.as_ref().map(NumberVariable::to_text),
            "page" => self.page.clone(),
            "DOI" => self.doi.clone(),
            "URL" => self.url.clone(),
            "note" => self.note.clone(),
            _ => match self.other.get(name)? {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            },
        };
        value.filter(|v| !v.is_empty())
    }

    pub fn get_names(&self, name: &str) -> Option<&[Name]> {
        let names = match name {
            "author" => self.author.as_ref(),
            "editor" => self.editor.as_ref(),
            "translator" => self.translator.as_ref(),
            "container-author" => self.container_author.as_ref(),
            _ => None,
        };
        names.map(Vec::as_slice).filter(|n| !n.is_empty())
    }

    pub fn get_date(&self, name: &str) -> Option<&DateVariable> {
        match name {
            "issued" => self.issued.as_ref(),
            "accessed" => self.accessed.as_ref(),
            _ => None,
        }
    }

    /// True when the variable exists as text, names or a date.
    pub fn has_variable(&self, name: &str) -> bool {
        self.get_variable(name).is_some()
            || self.get_names(name).is_some()
            || self.get_date(name).is_some()
    }
}

/// Read-only lookup of references by key.
///
/// The bibliography manager only needs membership and lookup, so any map the
/// caller already has can serve as the collection.
pub trait SourceCollection {
    fn get(&self, key: &str) -> Option<&Reference>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl SourceCollection for HashMap<String, Reference> {
    fn get(&self, key: &str) -> Option<&Reference> {
        HashMap::get(self, key)
    }
}

impl<T: SourceCollection + ?Sized> SourceCollection for &T {
    fn get(&self, key: &str) -> Option<&Reference> {
        (**self).get(key)
    }
}

/// References keyed by id, in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    references: LinkedHashMap<ReferenceKey, Reference>,
}

impl ReferenceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a CSL-JSON array. A later item with a repeated id replaces the earlier one.
    pub fn from_json(json: &str) -> Result<Self> {
        let references: Vec<Reference> =
            serde_json::from_str(json).map_err(|e| Error::Reference {
                message: e.to_string(),
            })?;
        Ok(references.into_iter().collect())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            origin: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn insert(&mut self, reference: Reference) {
        self.references.replace(reference.id.clone(), reference);
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.references.values()
    }
}

impl FromIterator<Reference> for ReferenceLibrary {
    fn from_iter<I: IntoIterator<Item = Reference>>(iter: I) -> Self {
        let mut library = ReferenceLibrary::new();
        for reference in iter {
            library.insert(reference);
        }
        library
    }
}

impl SourceCollection for ReferenceLibrary {
    fn get(&self, key: &str) -> Option<&Reference> {
        self.references.get(key)
    }
}
