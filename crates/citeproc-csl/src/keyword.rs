//! Attribute keywords of the CSL grammar and the model enums they map to.

use crate::types::*;

/// An enum written in CSL as one of a fixed set of keywords.
pub trait Keyword: Sized + Copy + 'static {
    /// Every keyword with the value it denotes.
    const KEYWORDS: &'static [(&'static str, Self)];

    fn from_keyword(word: &str) -> Option<Self> {
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| *keyword == word)
            .map(|(_, value)| *value)
    }

    /// Human-readable list of accepted keywords, for error messages.
    fn expected() -> String {
        let quoted: Vec<String> = Self::KEYWORDS
            .iter()
            .map(|(keyword, _)| format!("\"{}\"", keyword))
            .collect();
        quoted.join(", ")
    }
}

macro_rules! keywords {
    ($($ty:ident { $($word:literal => $variant:ident),+ $(,)? })+) => {
        $(
            impl Keyword for $ty {
                const KEYWORDS: &'static [(&'static str, Self)] = &[$(($word, $ty::$variant)),+];
            }
        )+
    };
}

keywords! {
    StyleClass { "in-text" => InText, "note" => Note }
    TermForm {
        "long" => Long,
        "short" => Short,
        "verb" => Verb,
        "verb-short" => VerbShort,
        "symbol" => Symbol,
    }
    DateForm { "text" => Text, "numeric" => Numeric }
    SortOrder { "ascending" => Ascending, "descending" => Descending }
    VariableForm { "long" => Long, "short" => Short }
    NumberForm {
        "numeric" => Numeric,
        "ordinal" => Ordinal,
        "long-ordinal" => LongOrdinal,
        "roman" => Roman,
    }
    LabelPlural { "contextual" => Contextual, "always" => Always, "never" => Never }
    NameAsSortOrder { "first" => First, "all" => All }
    NameAnd { "text" => Text, "symbol" => Symbol }
    DelimiterPrecedesLast {
        "contextual" => Contextual,
        "always" => Always,
        "never" => Never,
        "after-inverted-name" => AfterInvertedName,
    }
    NameForm { "long" => Long, "short" => Short, "count" => Count }
    DatePartsFilter { "year" => Year, "year-month" => YearMonth, "year-month-day" => YearMonthDay }
    DatePartName { "year" => Year, "month" => Month, "day" => Day }
    DatePartForm {
        "long" => Long,
        "short" => Short,
        "numeric" => Numeric,
        "numeric-leading-zeros" => NumericLeadingZeros,
        "ordinal" => Ordinal,
    }
    MatchType { "all" => All, "any" => Any, "none" => None }
    Position {
        "first" => First,
        "subsequent" => Subsequent,
        "ibid-with-locator" => IbidWithLocator,
        "ibid" => Ibid,
        "near-note" => NearNote,
    }
    FontStyle { "normal" => Normal, "italic" => Italic, "oblique" => Oblique }
    FontVariant { "normal" => Normal, "small-caps" => SmallCaps }
    FontWeight { "normal" => Normal, "bold" => Bold, "light" => Light }
    TextDecoration { "none" => None, "underline" => Underline }
    VerticalAlign { "baseline" => Baseline, "sup" => Sup, "sub" => Sub }
    TextCase {
        "lowercase" => Lowercase,
        "uppercase" => Uppercase,
        "capitalize-first" => CapitalizeFirst,
        "capitalize-all" => CapitalizeAll,
        "sentence" => Sentence,
        "title" => Title,
    }
    Display {
        "block" => Block,
        "left-margin" => LeftMargin,
        "right-inline" => RightInline,
        "indent" => Indent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_words() {
        assert_eq!(TermForm::from_keyword("verb-short"), Some(TermForm::VerbShort));
        assert_eq!(TextCase::from_keyword("title"), Some(TextCase::Title));
        assert_eq!(FontStyle::from_keyword("bold"), None);
        assert_eq!(MatchType::from_keyword("none"), Some(MatchType::None));
    }

    #[test]
    fn expected_lists_every_keyword() {
        assert_eq!(StyleClass::expected(), "\"in-text\", \"note\"");
        assert_eq!(DatePartName::expected(), "\"year\", \"month\", \"day\"");
    }
}
