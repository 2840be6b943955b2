//! Evaluation of style elements against one reference.
//!
//! Every element kind is a variant of the closed [`ElementType`] enum and is
//! handled by a single `match` in [`Evaluator::element`].

use super::output::{Output, Tag};
use crate::citation::{Citation, CitationItem};
use crate::locale::LocaleChain;
use crate::reference::{DateParts, Name, Reference};
use citeproc_csl::{
    ChooseBranch, ChooseElement, Condition, ConditionType, DateElement, DatePart, DatePartForm,
    DatePartName, DelimiterPrecedesLast, Element, ElementType, EtAl, Formatting, GroupElement,
    InheritableNameOptions, LabelElement, LabelPlural, Layout, MatchType, NameAnd,
    NameAsSortOrder, NameForm, NamesElement, NumberElement, NumberForm, Position, SortKey,
    SortKeyType, Style, TextCase, TextElement, TextSource, TermForm, VariableForm,
};
use std::collections::HashSet;

/// Notes within this distance of a previous cite of the same item are "near".
const NEAR_NOTE_DISTANCE: u32 = 5;

const TITLE_STOP_WORDS: [&str; 17] = [
    "a", "an", "and", "as", "at", "but", "by", "for", "from", "in", "nor", "of", "on", "or",
    "the", "to", "with",
];

/// Where a cite stands relative to earlier cites of the same reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CitePosition {
    pub position: Position,
    pub near_note: bool,
}

impl CitePosition {
    pub(crate) const FIRST: CitePosition = CitePosition {
        position: Position::First,
        near_note: false,
    };

    fn matches(&self, test: Position) -> bool {
        match test {
            Position::First => self.position == Position::First,
            Position::Subsequent => self.position != Position::First,
            Position::Ibid => matches!(self.position, Position::Ibid | Position::IbidWithLocator),
            Position::IbidWithLocator => self.position == Position::IbidWithLocator,
            Position::NearNote => self.near_note,
        }
    }

    /// Position of `citation.items[index]` given the citations before it.
    pub(crate) fn of(
        item: &CitationItem,
        index: usize,
        items: &[CitationItem],
        history: &[Citation],
        note: Option<u32>,
    ) -> Self {
        let earlier_in_citation = &items[..index];
        let cited_before = earlier_in_citation.iter().any(|i| i.key == item.key)
            || history
                .iter()
                .any(|c| c.items.iter().any(|i| i.key == item.key));
        if !cited_before {
            return CitePosition::FIRST;
        }

        let previous = match earlier_in_citation.last() {
            Some(prev) => Some(prev),
            None => history
                .last()
                .filter(|c| c.items.iter().all(|i| i.key == item.key))
                .and_then(|c| c.items.last()),
        };

        let position = match previous {
            Some(prev) if prev.key == item.key => match (&prev.locator, &item.locator) {
                (None, None) => Position::Ibid,
                (Some(a), Some(b)) if a == b => Position::Ibid,
                (_, Some(_)) => Position::IbidWithLocator,
                (Some(_), None) => Position::Subsequent,
            },
            _ => Position::Subsequent,
        };

        let last_note = history
            .iter()
            .rev()
            .find(|c| c.items.iter().any(|i| i.key == item.key))
            .and_then(|c| c.note_number);
        let near_note = match (note, last_note) {
            (Some(current), Some(last)) => current.saturating_sub(last) <= NEAR_NOTE_DISTANCE,
            _ => false,
        };

        CitePosition {
            position,
            near_note,
        }
    }
}

/// Evaluation state for one reference under one layout.
pub(crate) struct Evaluator<'a> {
    document: &'a Style,
    locales: &'a LocaleChain,
    reference: &'a Reference,
    item: Option<&'a CitationItem>,
    position: CitePosition,
    name_options: InheritableNameOptions,
    /// Names rendered in sort order, for sort keys.
    sorting: bool,
    vars_attempted: usize,
    vars_rendered: usize,
    /// Variables already used by a `<substitute>`; they render nothing afterwards.
    substituted: HashSet<String>,
    in_substitute: bool,
    substitute_parent: Option<&'a NamesElement>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        document: &'a Style,
        locales: &'a LocaleChain,
        reference: &'a Reference,
        layout: &'a Layout,
    ) -> Self {
        Self {
            document,
            locales,
            reference,
            item: None,
            position: CitePosition::FIRST,
            name_options: layout.name_options.merge(&document.name_options),
            sorting: false,
            vars_attempted: 0,
            vars_rendered: 0,
            substituted: HashSet::new(),
            in_substitute: false,
            substitute_parent: None,
        }
    }

    pub(crate) fn for_item(mut self, item: &'a CitationItem, position: CitePosition) -> Self {
        self.item = Some(item);
        self.position = position;
        self
    }

    pub(crate) fn sorting(mut self) -> Self {
        self.sorting = true;
        self
    }

    pub(crate) fn layout(&mut self, layout: &'a Layout) -> Output {
        self.elements(&layout.elements, "")
    }

    /// Text value of a sort key, lowercased. `None` sorts last.
    pub(crate) fn sort_value(&mut self, key: &'a SortKey) -> Option<String> {
        let value = match &key.key {
            SortKeyType::Variable(name) => {
                if let Some(names) = self.reference.get_names(name) {
                    Some(names.iter().map(Name::sort_key).collect::<Vec<_>>().join("; "))
                } else if let Some(date) = self.reference.get_date(name) {
                    date.sort_key()
                } else {
                    self.reference.get_variable(name)
                }
            }
            SortKeyType::Macro(name) => {
                let document = self.document;
                let definition = document.macros.get(name)?;
                Some(self.elements(&definition.elements, "").plain_text())
            }
        };
        value
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
    }

    fn elements(&mut self, elements: &'a [Element], delimiter: &str) -> Output {
        let outputs = elements.iter().map(|e| self.element(e)).collect();
        Output::join(outputs, delimiter)
    }

    fn element(&mut self, element: &'a Element) -> Output {
        let output = match &element.element_type {
            ElementType::Text(text) => self.text(text),
            ElementType::Number(number) => self.number(number),
            ElementType::Label(label) => self.label(label),
            ElementType::Names(names) => self.names(names),
            ElementType::Date(date) => self.date(date),
            ElementType::Group(group) => self.group(group),
            ElementType::Choose(choose) => self.choose(choose),
        };
        apply_formatting(self.locales, output, &element.formatting)
    }

    fn track(&mut self, found: bool) {
        self.vars_attempted += 1;
        if found {
            self.vars_rendered += 1;
        }
    }

    fn note_substitution(&mut self, variable: &str) {
        if self.in_substitute {
            self.substituted.insert(variable.to_string());
        }
    }

    /// A text or number variable, including the cite's locator.
    fn variable_value(&self, name: &str) -> Option<String> {
        if self.substituted.contains(name) {
            return None;
        }
        match name {
            "locator" => self
                .item
                .and_then(|item| item.locator.as_ref())
                .map(|locator| locator.value.clone())
                .filter(|v| !v.is_empty()),
            _ => self.reference.get_variable(name),
        }
    }

    fn has_variable(&self, name: &str) -> bool {
        if self.substituted.contains(name) {
            return false;
        }
        match name {
            "locator" => self.item.is_some_and(|item| item.locator.is_some()),
            _ => self.reference.has_variable(name),
        }
    }

    fn term(&self, name: &str, form: TermForm, plural: bool) -> Option<String> {
        self.locales.term(name, form, plural).map(str::to_string)
    }

    fn text(&mut self, text: &'a TextElement) -> Output {
        let document = self.document;
        match &text.source {
            TextSource::Variable { name, form } => {
                let short = match form {
                    VariableForm::Short => self.variable_value(&format!("{}-short", name)),
                    VariableForm::Long => None,
                };
                let value = short.or_else(|| self.variable_value(name));
                self.track(value.is_some());
                let Some(value) = value else {
                    return Output::Null;
                };
                self.note_substitution(name);
                let output = Output::literal(value);
                match name.as_str() {
                    "title" => Output::tagged(Tag::Title, output),
                    "locator" => Output::tagged(Tag::Locator, output),
                    _ => output,
                }
            }
            TextSource::Macro { name, .. } => match document.macros.get(name) {
                Some(definition) => self.elements(&definition.elements, ""),
                None => {
                    tracing::warn!(name = %name, "macro is not defined");
                    Output::Null
                }
            },
            TextSource::Term { name, form, plural } => self
                .term(name, *form, *plural)
                .map(Output::literal)
                .unwrap_or(Output::Null),
            TextSource::Value { value } => Output::literal(value.clone()),
        }
    }

    fn number(&mut self, number: &'a NumberElement) -> Output {
        let value = self.variable_value(&number.variable);
        self.track(value.is_some());
        let Some(value) = value else {
            return Output::Null;
        };
        match value.trim().parse::<i64>() {
            Ok(n) => Output::literal(self.format_number(n, number.form)),
            Err(_) => Output::literal(value),
        }
    }

    fn format_number(&self, n: i64, form: NumberForm) -> String {
        match form {
            NumberForm::Numeric => n.to_string(),
            NumberForm::Ordinal => format!("{}{}", n, self.ordinal_suffix(n)),
            NumberForm::LongOrdinal if (1..=10).contains(&n) => self
                .term(&format!("long-ordinal-{:02}", n), TermForm::Long, false)
                .unwrap_or_else(|| format!("{}{}", n, self.ordinal_suffix(n))),
            NumberForm::LongOrdinal => format!("{}{}", n, self.ordinal_suffix(n)),
            NumberForm::Roman => to_roman(n).unwrap_or_else(|| n.to_string()),
        }
    }

    fn ordinal_suffix(&self, n: i64) -> String {
        let last_two = n.abs() % 100;
        let specific = if (11..=13).contains(&last_two) {
            format!("ordinal-{}", last_two)
        } else {
            format!("ordinal-{:02}", last_two % 10)
        };
        self.term(&specific, TermForm::Long, false)
            .or_else(|| self.term("ordinal", TermForm::Long, false))
            .unwrap_or_default()
    }

    fn label(&mut self, label: &'a LabelElement) -> Output {
        let (term_name, value) = if label.variable == "locator" {
            match self.item.and_then(|item| item.locator.as_ref()) {
                Some(locator) => (locator.label.clone(), Some(locator.value.clone())),
                None => return Output::Null,
            }
        } else {
            (label.variable.clone(), self.variable_value(&label.variable))
        };
        let Some(value) = value else {
            return Output::Null;
        };
        let plural = match label.plural {
            LabelPlural::Always => true,
            LabelPlural::Never => false,
            LabelPlural::Contextual => is_plural_value(&value),
        };
        self.term(&term_name, label.form, plural)
            .map(Output::literal)
            .unwrap_or(Output::Null)
    }

    fn names(&mut self, names: &'a NamesElement) -> Output {
        let parent = self.substitute_parent;
        let name_element = names
            .name
            .as_ref()
            .or_else(|| parent.and_then(|p| p.name.as_ref()));
        let et_al = names
            .et_al
            .as_ref()
            .or_else(|| parent.and_then(|p| p.et_al.as_ref()));
        let label = names
            .label
            .as_ref()
            .or_else(|| parent.and_then(|p| p.label.as_ref()));

        let mut options = match name_element {
            Some(name) => name.options.merge(&self.name_options),
            None => self.name_options.clone(),
        };
        if self.sorting {
            options.name_as_sort_order = Some(NameAsSortOrder::All);
        }

        let reference = self.reference;
        let mut rendered = Vec::new();
        for variable in &names.variables {
            let list = if self.substituted.contains(variable) {
                None
            } else {
                reference.get_names(variable)
            };
            self.track(list.is_some());
            let Some(list) = list else {
                continue;
            };
            self.note_substitution(variable);

            let mut output = self.name_list(list, &options, et_al);
            if let Some(name) = name_element {
                output = apply_formatting(self.locales, output, &name.formatting);
            }
            if let Some(label) = label {
                let plural = match label.plural {
                    LabelPlural::Always => true,
                    LabelPlural::Never => false,
                    LabelPlural::Contextual => list.len() > 1,
                };
                if let Some(term) = self.term(variable, label.form, plural) {
                    let label_output =
                        apply_formatting(self.locales, Output::literal(term), &label.formatting);
                    output = Output::sequence(vec![output, label_output]);
                }
            }
            rendered.push(output);
        }

        if !rendered.is_empty() {
            let delimiter = names.delimiter.as_deref().unwrap_or("");
            return Output::tagged(Tag::Names, Output::join(rendered, delimiter));
        }

        let Some(substitute) = &names.substitute else {
            return Output::Null;
        };
        let saved_parent = self.substitute_parent.replace(names);
        let saved_flag = std::mem::replace(&mut self.in_substitute, true);
        let mut result = Output::Null;
        for element in substitute {
            let output = self.element(element);
            if !output.is_null() {
                result = output;
                break;
            }
        }
        self.substitute_parent = saved_parent;
        self.in_substitute = saved_flag;

        Output::tagged(Tag::Names, result)
    }

    fn name_list(
        &self,
        names: &[Name],
        options: &InheritableNameOptions,
        et_al: Option<&EtAl>,
    ) -> Output {
        let use_first = options.et_al_use_first.unwrap_or(1).max(1) as usize;
        let truncate = options
            .et_al_min
            .is_some_and(|min| names.len() >= min as usize && use_first < names.len());
        let shown = if truncate { &names[..use_first] } else { names };

        if options.form == Some(NameForm::Count) {
            return Output::literal(shown.len().to_string());
        }

        let formatted: Vec<(String, bool)> = shown
            .iter()
            .enumerate()
            .map(|(index, name)| format_name(name, index, options))
            .filter(|(text, _)| !text.is_empty())
            .collect();

        let delimiter = options.delimiter.as_deref().unwrap_or(", ");
        let and = match options.and {
            Some(NameAnd::Text) => Some(
                self.term("and", TermForm::Long, false)
                    .unwrap_or_else(|| "and".to_string()),
            ),
            Some(NameAnd::Symbol) => Some("&".to_string()),
            None => None,
        };

        let mut text = String::new();
        for (index, (name, _)) in formatted.iter().enumerate() {
            if index > 0 {
                let is_last = index == formatted.len() - 1;
                match (&and, is_last && !truncate) {
                    (Some(and), true) => {
                        let precedes = match options.delimiter_precedes_last.unwrap_or_default() {
                            DelimiterPrecedesLast::Contextual => formatted.len() >= 3,
                            DelimiterPrecedesLast::Always => true,
                            DelimiterPrecedesLast::Never => false,
                            DelimiterPrecedesLast::AfterInvertedName => formatted[index - 1].1,
                        };
                        text.push_str(if precedes { delimiter } else { " " });
                        text.push_str(and);
                        text.push(' ');
                    }
                    _ => text.push_str(delimiter),
                }
            }
            text.push_str(name);
        }

        let mut output = Output::literal(text);
        if truncate {
            let term_name = et_al
                .and_then(|e| e.term.as_deref())
                .unwrap_or("et-al");
            if let Some(term) = self.term(term_name, TermForm::Long, false) {
                let before = if formatted.len() > 1 { delimiter } else { " " };
                let formatting = et_al.map(|e| e.formatting.clone()).unwrap_or_default();
                output = Output::sequence(vec![
                    output,
                    Output::literal(before),
                    apply_formatting(self.locales, Output::literal(term), &formatting),
                ]);
            }
        }
        output
    }

    fn date(&mut self, date: &'a DateElement) -> Output {
        let reference = self.reference;
        let value = if self.substituted.contains(&date.variable) {
            None
        } else {
            reference.get_date(&date.variable)
        };
        self.track(value.is_some());
        let Some(value) = value else {
            return Output::Null;
        };
        self.note_substitution(&date.variable);

        let Some(start) = value.parts() else {
            return match &value.literal {
                Some(literal) => Output::tagged(
                    Tag::Date(date.variable.clone()),
                    Output::literal(literal.clone()),
                ),
                None => Output::Null,
            };
        };

        let (parts, delimiter) = self.date_layout(date);
        let rendered = self.render_date(&start, &parts, delimiter.as_deref());
        let output = match value.end_parts() {
            Some(end) if end != start => {
                let end = self.render_date(&end, &parts, delimiter.as_deref());
                Output::sequence(vec![rendered, Output::literal("–"), end])
            }
            _ => rendered,
        };
        Output::tagged(Tag::Date(date.variable.clone()), output)
    }

    /// Parts to render and their delimiter: the localized format when the
    /// element names one, with the element's own parts overriding it.
    fn date_layout(&self, date: &DateElement) -> (Vec<DatePart>, Option<String>) {
        if let Some(format) = date.form.and_then(|form| self.locales.date_format(form)) {
            let parts = format
                .parts
                .iter()
                .filter(|part| date.date_parts.includes(part.name))
                .map(|part| match date.parts.iter().find(|o| o.name == part.name) {
                    Some(local) => DatePart {
                        name: part.name,
                        form: local.form.or(part.form),
                        formatting: if local.formatting == Formatting::default() {
                            part.formatting.clone()
                        } else {
                            local.formatting.clone()
                        },
                        span: local.span,
                    },
                    None => part.clone(),
                })
                .collect();
            return (parts, format.delimiter.clone());
        }

        if date.parts.is_empty() {
            let year = DatePart {
                name: DatePartName::Year,
                form: None,
                formatting: Formatting::default(),
                span: Default::default(),
            };
            return (vec![year], None);
        }
        (date.parts.clone(), date.delimiter.clone())
    }

    fn render_date(&self, date: &DateParts, parts: &[DatePart], delimiter: Option<&str>) -> Output {
        let outputs = parts
            .iter()
            .map(|part| {
                let text = match part.name {
                    DatePartName::Year => date.year.map(|y| {
                        if y < 0 {
                            format!("{}BC", -y)
                        } else {
                            y.to_string()
                        }
                    }),
                    DatePartName::Month => date
                        .month
                        .and_then(|m| self.month(m, part.form.unwrap_or(DatePartForm::Long))),
                    DatePartName::Day => date
                        .day
                        .map(|d| self.day(d, part.form.unwrap_or(DatePartForm::Numeric))),
                };
                match text {
                    Some(text) => apply_formatting(self.locales, Output::literal(text), &part.formatting),
                    None => Output::Null,
                }
            })
            .collect();
        Output::join(outputs, delimiter.unwrap_or(""))
    }

    fn month(&self, month: i32, form: DatePartForm) -> Option<String> {
        if (21..=24).contains(&month) {
            return self.term(&format!("season-{:02}", month - 20), TermForm::Long, false);
        }
        let term_name = format!("month-{:02}", month);
        match form {
            DatePartForm::Long => self.term(&term_name, TermForm::Long, false),
            DatePartForm::Short => self.term(&term_name, TermForm::Short, false),
            DatePartForm::Numeric => Some(month.to_string()),
            DatePartForm::NumericLeadingZeros => Some(format!("{:02}", month)),
            DatePartForm::Ordinal => Some(format!("{}{}", month, self.ordinal_suffix(month.into()))),
        }
    }

    fn day(&self, day: i32, form: DatePartForm) -> String {
        match form {
            DatePartForm::NumericLeadingZeros => format!("{:02}", day),
            DatePartForm::Ordinal
                if day == 1 || !self.locales.options().limit_day_ordinals_to_day_1 =>
            {
                format!("{}{}", day, self.ordinal_suffix(day.into()))
            }
            _ => day.to_string(),
        }
    }

    /// A group renders nothing when it asked for variables and none had a value.
    fn group(&mut self, group: &'a GroupElement) -> Output {
        let attempted = self.vars_attempted;
        let rendered = self.vars_rendered;
        let output = self.elements(&group.elements, group.delimiter.as_deref().unwrap_or(""));
        if self.vars_attempted > attempted && self.vars_rendered == rendered {
            Output::Null
        } else {
            output
        }
    }

    fn choose(&mut self, choose: &'a ChooseElement) -> Output {
        for branch in &choose.branches {
            if branch.conditions.is_empty() || self.branch_matches(branch) {
                return self.elements(&branch.elements, "");
            }
        }
        Output::Null
    }

    fn branch_matches(&self, branch: &ChooseBranch) -> bool {
        let mut tests = branch
            .conditions
            .iter()
            .flat_map(|condition| self.condition_tests(condition));
        match branch.match_type {
            MatchType::All => tests.all(|t| t),
            MatchType::Any => tests.any(|t| t),
            MatchType::None => !tests.any(|t| t),
        }
    }

    /// One result per value listed in the condition attribute.
    fn condition_tests(&self, condition: &Condition) -> Vec<bool> {
        match &condition.condition_type {
            ConditionType::Type(types) => types
                .iter()
                .map(|t| *t == self.reference.ref_type)
                .collect(),
            ConditionType::Variable(variables) => {
                variables.iter().map(|v| self.has_variable(v)).collect()
            }
            ConditionType::IsNumeric(variables) => variables
                .iter()
                .map(|v| self.variable_value(v).is_some_and(|s| is_numeric(&s)))
                .collect(),
            ConditionType::IsUncertainDate(variables) => variables
                .iter()
                .map(|v| {
                    self.reference
                        .get_date(v)
                        .and_then(|d| d.circa)
                        .unwrap_or(false)
                })
                .collect(),
            ConditionType::Locator(labels) => {
                let current = self
                    .item
                    .and_then(|item| item.locator.as_ref())
                    .map(|locator| locator.label.as_str());
                labels.iter().map(|l| current == Some(l.as_str())).collect()
            }
            ConditionType::Position(positions) => {
                positions.iter().map(|p| self.position.matches(*p)).collect()
            }
            ConditionType::Disambiguate(expected) => vec![!expected],
        }
    }
}

/// Apply text case, period stripping, quotes and markup to an output.
pub(crate) fn apply_formatting(
    locales: &LocaleChain,
    output: Output,
    formatting: &Formatting,
) -> Output {
    if output.is_null() {
        return Output::Null;
    }
    let mut output = output;

    if let Some(case) = formatting.text_case {
        apply_text_case(&mut output, case);
    }
    if formatting.strip_periods {
        output.map_literals(&mut |s| s.replace('.', ""));
    }
    if formatting.quotes {
        let open = locales
            .term("open-quote", TermForm::Long, false)
            .unwrap_or("\u{201c}");
        let close = locales
            .term("close-quote", TermForm::Long, false)
            .unwrap_or("\u{201d}");
        output = Output::sequence(vec![Output::literal(open), output, Output::literal(close)]);
    }

    let markup = Formatting {
        text_case: None,
        strip_periods: false,
        quotes: false,
        ..formatting.clone()
    };
    if markup == Formatting::default() {
        output
    } else {
        Output::formatted(markup, vec![output])
    }
}

fn apply_text_case(output: &mut Output, case: TextCase) {
    match case {
        TextCase::Lowercase => output.map_literals(&mut |s| s.to_lowercase()),
        TextCase::Uppercase => output.map_literals(&mut |s| s.to_uppercase()),
        TextCase::CapitalizeFirst | TextCase::Sentence => {
            let mut done = false;
            output.map_literals(&mut |s| {
                if done || !s.chars().any(char::is_alphabetic) {
                    return s.to_string();
                }
                done = true;
                capitalize_first(s)
            });
        }
        TextCase::CapitalizeAll => output.map_literals(&mut |s| capitalize_words(s, false)),
        TextCase::Title => output.map_literals(&mut |s| capitalize_words(s, true)),
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    let mut out = String::with_capacity(s.len());
    for c in chars.by_ref() {
        if c.is_alphabetic() {
            out.extend(c.to_uppercase());
            break;
        }
        out.push(c);
    }
    out.extend(chars);
    out
}

fn capitalize_words(s: &str, skip_stop_words: bool) -> String {
    s.split(' ')
        .enumerate()
        .map(|(index, word)| {
            if skip_stop_words && index > 0 && TITLE_STOP_WORDS.contains(&word) {
                word.to_string()
            } else {
                capitalize_first(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render one name; the flag reports whether it came out inverted.
fn format_name(name: &Name, index: usize, options: &InheritableNameOptions) -> (String, bool) {
    if let Some(literal) = &name.literal {
        return (literal.clone(), false);
    }
    let family = name.family_part();
    let given = name
        .given
        .as_deref()
        .map(|given| match &options.initialize_with {
            Some(with) => initialize(given, with),
            None => given.to_string(),
        });

    match options.form.unwrap_or_default() {
        NameForm::Short | NameForm::Count => (family.or(given).unwrap_or_default(), false),
        NameForm::Long => {
            let inverted = match options.name_as_sort_order {
                Some(NameAsSortOrder::All) => true,
                Some(NameAsSortOrder::First) => index == 0,
                None => false,
            };
            let separator = options.sort_separator.as_deref().unwrap_or(", ");
            match (family, given) {
                (Some(family), Some(given)) if inverted => {
                    let mut text = format!("{}{}{}", family, separator, given);
                    if let Some(suffix) = &name.suffix {
                        text.push_str(separator);
                        text.push_str(suffix);
                    }
                    (text, true)
                }
                (Some(family), Some(given)) => {
                    let mut text = format!("{} {}", given, family);
                    if let Some(suffix) = &name.suffix {
                        text.push(' ');
                        text.push_str(suffix);
                    }
                    (text, false)
                }
                (Some(family), None) => (family, false),
                (None, Some(given)) => (given, false),
                (None, None) => (String::new(), false),
            }
        }
    }
}

/// "John William" with ". " becomes "J. W."; hyphenated names keep the hyphen.
fn initialize(given: &str, with: &str) -> String {
    let mark = with.trim_end();
    let spacing = &with[mark.len()..];
    let mut out = String::new();
    for word in given.split_whitespace() {
        let initials: Vec<String> = word
            .split('-')
            .filter_map(|part| part.chars().next())
            .map(|c| format!("{}{}", c.to_uppercase(), mark))
            .collect();
        if initials.is_empty() {
            continue;
        }
        out.push_str(&initials.join("-"));
        out.push_str(spacing);
    }
    out.trim_end().to_string()
}

/// Whether a value reads as a number or a list/range of numbers ("12", "2nd", "12-15").
fn is_numeric(value: &str) -> bool {
    let mut tokens = value
        .split(|c: char| matches!(c, '-' | '–' | ',' | '&') || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .peekable();
    tokens.peek().is_some()
        && tokens.all(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()))
}

fn is_plural_value(value: &str) -> bool {
    value.contains(['-', '–', ',', '&'])
}

fn to_roman(n: i64) -> Option<String> {
    const NUMERALS: [(i64, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    if !(1..4000).contains(&n) {
        return None;
    }
    let mut rest = n;
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while rest >= value {
            out.push_str(numeral);
            rest -= value;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::Locator;

    #[test]
    fn test_initialize() {
        assert_eq!(initialize("John William", ". "), "J. W.");
        assert_eq!(initialize("John William", "."), "J.W.");
        assert_eq!(initialize("Jean-Paul", ". "), "J.-P.");
        assert_eq!(initialize("alice", ""), "A");
    }

    #[test]
    fn test_format_name_forms() {
        let name = Name {
            family: Some("Smith".to_string()),
            given: Some("John".to_string()),
            ..Default::default()
        };
        let mut options = InheritableNameOptions {
            initialize_with: Some(". ".to_string()),
            name_as_sort_order: Some(NameAsSortOrder::First),
            ..Default::default()
        };
        assert_eq!(format_name(&name, 0, &options), ("Smith, J.".to_string(), true));
        assert_eq!(format_name(&name, 1, &options), ("J. Smith".to_string(), false));

        options.form = Some(NameForm::Short);
        assert_eq!(format_name(&name, 0, &options).0, "Smith");
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("12"));
        assert!(is_numeric("2nd"));
        assert!(is_numeric("12-15"));
        assert!(is_numeric("1, 3 & 5"));
        assert!(!is_numeric("second"));
        assert!(!is_numeric("2nd edition"));
        assert!(!is_numeric(""));
    }

    #[test]
    fn test_roman() {
        assert_eq!(to_roman(1994).as_deref(), Some("mcmxciv"));
        assert_eq!(to_roman(0), None);
    }

    #[test]
    fn test_text_case() {
        let mut output = Output::literal("the art of war");
        apply_text_case(&mut output, TextCase::Title);
        assert_eq!(output.plain_text(), "The Art of War");

        let mut output = Output::literal("anon.");
        apply_text_case(&mut output, TextCase::CapitalizeFirst);
        assert_eq!(output.plain_text(), "Anon.");
    }

    #[test]
    fn test_positions() {
        let a = CitationItem::new("a");
        let a_page = CitationItem::new("a").with_locator(Locator::page("4"));
        let b = CitationItem::new("b");

        let position = |item: &CitationItem, history: &[Citation]| {
            CitePosition::of(item, 0, std::slice::from_ref(item), history, None).position
        };

        assert_eq!(position(&a, &[]), Position::First);
        assert_eq!(position(&a, &[Citation::new(vec![a.clone()])]), Position::Ibid);
        assert_eq!(
            position(&a_page, &[Citation::new(vec![a.clone()])]),
            Position::IbidWithLocator
        );
        assert_eq!(
            position(&a, &[Citation::new(vec![a_page.clone()])]),
            Position::Subsequent
        );
        assert_eq!(
            position(
                &a,
                &[Citation::new(vec![a.clone()]), Citation::new(vec![b.clone()])]
            ),
            Position::Subsequent
        );
    }

    #[test]
    fn test_near_note() {
        let a = CitationItem::new("a");
        let mut earlier = Citation::new(vec![a.clone()]);
        earlier.note_number = Some(1);
        let near = CitePosition::of(&a, 0, std::slice::from_ref(&a), &[earlier.clone()], Some(4));
        assert!(near.near_note);
        let far = CitePosition::of(&a, 0, std::slice::from_ref(&a), &[earlier], Some(9));
        assert!(!far.near_note);
    }
}
