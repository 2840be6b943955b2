//! Semantic types for CSL styles and locales.
//!
//! Every rendering element is one variant of the closed [`ElementType`] set,
//! decided at parse time. Each node keeps the [`SourceSpan`] it came from.

use citeproc_diagnostics::SourceSpan;
use std::collections::HashMap;

/// A parsed CSL style.
#[derive(Debug, Clone)]
pub struct Style {
    /// CSL version (e.g., "1.0").
    pub version: String,

    pub class: StyleClass,

    /// Locale the style asks for when the caller gives none.
    pub default_locale: Option<String>,

    pub info: Option<StyleInfo>,

    /// `<locale>` overrides embedded in the style, in document order.
    pub locales: Vec<Locale>,

    pub macros: HashMap<String, Macro>,

    pub citation: Layout,

    pub bibliography: Option<Layout>,

    /// Name options set on the `<style>` element.
    pub name_options: InheritableNameOptions,

    pub span: SourceSpan,
}

/// Style class: determines citation format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleClass {
    InText,
    Note,
}

/// Style metadata from `<info>`.
#[derive(Debug, Clone, Default)]
pub struct StyleInfo {
    pub title: Option<String>,
    pub title_short: Option<String>,
    /// Style ID (URI).
    pub id: Option<String>,
    pub authors: Vec<String>,
    /// Values of `citation-format` on `<category>`.
    pub citation_formats: Vec<String>,
    pub updated: Option<String>,
}

/// A locale: terms, date formats and options for one language.
///
/// Used both for standalone locale documents and for `<locale>` blocks
/// inside a style.
#[derive(Debug, Clone)]
pub struct Locale {
    /// Language tag from `xml:lang` (e.g., "en", "en-US"). `None` applies to every language.
    pub lang: Option<String>,
    pub terms: Vec<Term>,
    pub date_formats: Vec<DateFormat>,
    pub options: LocaleOptions,
    pub span: SourceSpan,
}

/// Options from `<style-options>` in a locale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocaleOptions {
    pub punctuation_in_quote: bool,
    pub limit_day_ordinals_to_day_1: bool,
}

/// A term definition.
#[derive(Debug, Clone)]
pub struct Term {
    /// Term name (e.g., "and", "editor", "page").
    pub name: String,
    pub form: TermForm,
    pub single: Option<String>,
    pub multiple: Option<String>,
    /// Plain text content, used when `<single>`/`<multiple>` are absent.
    pub value: Option<String>,
    pub span: SourceSpan,
}

impl Term {
    /// The text of this term in singular or plural.
    pub fn text(&self, plural: bool) -> Option<&str> {
        let numbered = if plural { &self.multiple } else { &self.single };
        numbered.as_deref().or(self.value.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TermForm {
    #[default]
    Long,
    Short,
    Verb,
    VerbShort,
    Symbol,
}

impl TermForm {
    /// The form to try next when a term is missing in this form.
    pub fn fallback(self) -> Option<TermForm> {
        match self {
            TermForm::Long => None,
            TermForm::Short | TermForm::Verb => Some(TermForm::Long),
            TermForm::VerbShort => Some(TermForm::Verb),
            TermForm::Symbol => Some(TermForm::Short),
        }
    }
}

/// A localized date format.
#[derive(Debug, Clone)]
pub struct DateFormat {
    pub form: DateForm,
    pub parts: Vec<DatePart>,
    pub delimiter: Option<String>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateForm {
    #[default]
    Text,
    Numeric,
}

/// A macro definition.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub name_span: SourceSpan,
    pub elements: Vec<Element>,
    pub span: SourceSpan,
}

/// A layout for citations or bibliography entries.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Formatting of the `<layout>` element (affixes wrap the whole output).
    pub formatting: Formatting,
    /// Delimiter between cites (citation) or entries (bibliography).
    pub delimiter: Option<String>,
    pub sort: Option<Sort>,
    /// Name options set on `<citation>` or `<bibliography>`.
    pub name_options: InheritableNameOptions,
    pub elements: Vec<Element>,
    pub span: SourceSpan,
}

/// Name options that inherit from style to layout to `<name>`.
#[derive(Debug, Clone, Default)]
pub struct InheritableNameOptions {
    pub and: Option<NameAnd>,
    pub delimiter: Option<String>,
    pub delimiter_precedes_last: Option<DelimiterPrecedesLast>,
    pub et_al_min: Option<u32>,
    pub et_al_use_first: Option<u32>,
    pub initialize_with: Option<String>,
    pub form: Option<NameForm>,
    pub name_as_sort_order: Option<NameAsSortOrder>,
    pub sort_separator: Option<String>,
}

impl InheritableNameOptions {
    /// Merge two option sets, `self` taking precedence over `other`.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            and: self.and.or(other.and),
            delimiter: self.delimiter.clone().or_else(|| other.delimiter.clone()),
            delimiter_precedes_last: self.delimiter_precedes_last.or(other.delimiter_precedes_last),
            et_al_min: self.et_al_min.or(other.et_al_min),
            et_al_use_first: self.et_al_use_first.or(other.et_al_use_first),
            initialize_with: self
                .initialize_with
                .clone()
                .or_else(|| other.initialize_with.clone()),
            form: self.form.or(other.form),
            name_as_sort_order: self.name_as_sort_order.or(other.name_as_sort_order),
            sort_separator: self
                .sort_separator
                .clone()
                .or_else(|| other.sort_separator.clone()),
        }
    }
}

/// Sort keys for the bibliography or citations.
#[derive(Debug, Clone)]
pub struct Sort {
    pub keys: Vec<SortKey>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct SortKey {
    pub key: SortKeyType,
    pub sort_order: SortOrder,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKeyType {
    Variable(String),
    Macro(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// A rendering element.
#[derive(Debug, Clone)]
pub struct Element {
    pub element_type: ElementType,
    pub formatting: Formatting,
    pub span: SourceSpan,
}

/// The closed set of rendering elements.
#[derive(Debug, Clone)]
pub enum ElementType {
    Text(TextElement),
    Number(NumberElement),
    Label(LabelElement),
    Names(NamesElement),
    Date(DateElement),
    Group(GroupElement),
    Choose(ChooseElement),
}

impl ElementType {
    /// Element names that may appear inside a layout, macro, group or branch.
    pub const NAMES: [&'static str; 7] =
        ["text", "number", "label", "names", "date", "group", "choose"];
}

#[derive(Debug, Clone)]
pub struct TextElement {
    pub source: TextSource,
}

#[derive(Debug, Clone)]
pub enum TextSource {
    Variable {
        name: String,
        form: VariableForm,
    },
    Macro {
        name: String,
        name_span: SourceSpan,
    },
    Term {
        name: String,
        form: TermForm,
        plural: bool,
    },
    Value {
        value: String,
    },
}

/// `form` on a text variable: "short" prefers the `<name>-short` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableForm {
    #[default]
    Long,
    Short,
}

#[derive(Debug, Clone)]
pub struct NumberElement {
    pub variable: String,
    pub form: NumberForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberForm {
    #[default]
    Numeric,
    Ordinal,
    LongOrdinal,
    Roman,
}

#[derive(Debug, Clone)]
pub struct LabelElement {
    pub variable: String,
    pub form: TermForm,
    pub plural: LabelPlural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPlural {
    #[default]
    Contextual,
    Always,
    Never,
}

#[derive(Debug, Clone)]
pub struct NamesElement {
    /// Name variables, rendered in order (e.g., "author", "editor").
    pub variables: Vec<String>,
    /// Delimiter between variables.
    pub delimiter: Option<String>,
    pub name: Option<Name>,
    pub et_al: Option<EtAl>,
    pub label: Option<NamesLabel>,
    /// Tried in order when every variable is empty.
    pub substitute: Option<Vec<Element>>,
}

/// `<name>` options plus its own formatting.
#[derive(Debug, Clone, Default)]
pub struct Name {
    pub options: InheritableNameOptions,
    pub formatting: Formatting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameAsSortOrder {
    First,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameAnd {
    Text,
    Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelimiterPrecedesLast {
    #[default]
    Contextual,
    Always,
    Never,
    AfterInvertedName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameForm {
    #[default]
    Long,
    Short,
    Count,
}

#[derive(Debug, Clone, Default)]
pub struct EtAl {
    /// Term to use (default "et-al").
    pub term: Option<String>,
    pub formatting: Formatting,
}

#[derive(Debug, Clone)]
pub struct NamesLabel {
    pub form: TermForm,
    pub plural: LabelPlural,
    pub formatting: Formatting,
}

#[derive(Debug, Clone)]
pub struct DateElement {
    pub variable: String,
    /// Localized form; `None` means the parts below are the whole definition.
    pub form: Option<DateForm>,
    pub date_parts: DatePartsFilter,
    pub parts: Vec<DatePart>,
    pub delimiter: Option<String>,
}

/// Which parts of a localized date to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePartsFilter {
    Year,
    YearMonth,
    #[default]
    YearMonthDay,
}

impl DatePartsFilter {
    pub fn includes(self, part: DatePartName) -> bool {
        match (self, part) {
            (_, DatePartName::Year) => true,
            (DatePartsFilter::Year, _) => false,
            (DatePartsFilter::YearMonth, DatePartName::Day) => false,
            _ => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatePart {
    pub name: DatePartName,
    pub form: Option<DatePartForm>,
    pub formatting: Formatting,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePartName {
    Year,
    Month,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePartForm {
    Long,
    Short,
    Numeric,
    NumericLeadingZeros,
    Ordinal,
}

#[derive(Debug, Clone)]
pub struct GroupElement {
    pub elements: Vec<Element>,
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChooseElement {
    /// `if`, then each `else-if`, then `else` (which has no conditions).
    pub branches: Vec<ChooseBranch>,
}

#[derive(Debug, Clone)]
pub struct ChooseBranch {
    pub conditions: Vec<Condition>,
    pub match_type: MatchType,
    pub elements: Vec<Element>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchType {
    #[default]
    All,
    Any,
    None,
}

/// One test attribute on `<if>`/`<else-if>`; each value in it is tested separately.
#[derive(Debug, Clone)]
pub struct Condition {
    pub condition_type: ConditionType,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub enum ConditionType {
    Type(Vec<String>),
    Variable(Vec<String>),
    IsNumeric(Vec<String>),
    IsUncertainDate(Vec<String>),
    Locator(Vec<String>),
    Position(Vec<Position>),
    Disambiguate(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    First,
    Subsequent,
    IbidWithLocator,
    Ibid,
    NearNote,
}

/// Formatting attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formatting {
    pub font_style: Option<FontStyle>,
    pub font_variant: Option<FontVariant>,
    pub font_weight: Option<FontWeight>,
    pub text_decoration: Option<TextDecoration>,
    pub vertical_align: Option<VerticalAlign>,
    pub text_case: Option<TextCase>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub display: Option<Display>,
    pub quotes: bool,
    pub strip_periods: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontVariant {
    Normal,
    SmallCaps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Baseline,
    Sup,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCase {
    Lowercase,
    Uppercase,
    CapitalizeFirst,
    CapitalizeAll,
    Sentence,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    LeftMargin,
    RightInline,
    Indent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_text_prefers_numbered_forms() {
        let term = Term {
            name: "page".to_string(),
            form: TermForm::Short,
            single: Some("p.".to_string()),
            multiple: Some("pp.".to_string()),
            value: None,
            span: SourceSpan::default(),
        };
        assert_eq!(term.text(false), Some("p."));
        assert_eq!(term.text(true), Some("pp."));
    }

    #[test]
    fn test_term_form_fallback_reaches_long() {
        let mut form = TermForm::VerbShort;
        let mut seen = vec![form];
        while let Some(next) = form.fallback() {
            seen.push(next);
            form = next;
        }
        assert_eq!(seen, vec![TermForm::VerbShort, TermForm::Verb, TermForm::Long]);
    }

    #[test]
    fn test_name_options_merge_precedence() {
        let specific = InheritableNameOptions {
            delimiter: Some("; ".to_string()),
            ..Default::default()
        };
        let general = InheritableNameOptions {
            delimiter: Some(", ".to_string()),
            et_al_min: Some(3),
            ..Default::default()
        };
        let merged = specific.merge(&general);
        assert_eq!(merged.delimiter.as_deref(), Some("; "));
        assert_eq!(merged.et_al_min, Some(3));
    }

    #[test]
    fn test_date_parts_filter() {
        assert!(DatePartsFilter::Year.includes(DatePartName::Year));
        assert!(!DatePartsFilter::Year.includes(DatePartName::Month));
        assert!(DatePartsFilter::YearMonth.includes(DatePartName::Month));
        assert!(!DatePartsFilter::YearMonth.includes(DatePartName::Day));
    }
}
