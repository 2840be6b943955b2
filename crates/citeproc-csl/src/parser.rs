//! Builds the semantic model from source-tracked XML trees.
//!
//! Each CSL element has one builder function below. Attribute values that
//! name a keyword go through [`Keyword`]; unknown keywords are left unset
//! and reported by the grammar validator instead.

use crate::error::{Error, Result};
use crate::keyword::Keyword;
use crate::types::*;
use citeproc_diagnostics::SourceSpan;
use citeproc_xml::{XmlAttribute, XmlDocument, XmlElement};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Parse a CSL style from a string.
///
/// # Example
///
/// ```rust
/// use citeproc_csl::parse_csl;
///
/// let csl = r#"<?xml version="1.0" encoding="utf-8"?>
/// <style xmlns="http://purl.org/net/xbiblio/csl" class="in-text" version="1.0">
///   <info><title>Test</title></info>
///   <citation><layout><text variable="title"/></layout></citation>
/// </style>"#;
///
/// let style = parse_csl(csl).unwrap();
/// assert_eq!(style.class, citeproc_csl::StyleClass::InText);
/// ```
pub fn parse_csl(content: &str) -> Result<Style> {
    parse_style(&citeproc_xml::parse(content)?)
}

/// Build a [`Style`] from an already parsed tree.
///
/// After the tree is read, every macro call must name a defined macro and no
/// macro may reach itself through its calls.
pub fn parse_style(xml: &XmlDocument) -> Result<Style> {
    let style = style(&xml.root)?;
    check_macros(&style)?;
    Ok(style)
}

/// Build a [`Locale`] from a standalone `<locale xml:lang="...">` document.
pub fn parse_locale(xml: &XmlDocument) -> Result<Locale> {
    expect_root(&xml.root, "locale")?;
    locale(&xml.root)
}

fn expect_root(root: &XmlElement, name: &str) -> Result<()> {
    if root.name == name {
        return Ok(());
    }
    Err(Error::InvalidRootElement {
        expected: name.to_string(),
        found: root.name.clone(),
        location: root.name_span,
    })
}

// Macro calls

/// Calls `visit` with each macro name called from `elements`, in document order.
fn walk_macro_calls(
    elements: &[Element],
    visit: &mut dyn FnMut(&str, SourceSpan) -> Result<()>,
) -> Result<()> {
    for element in elements {
        match &element.element_type {
            ElementType::Text(TextElement {
                source: TextSource::Macro { name, name_span },
            }) => visit(name, *name_span)?,
            ElementType::Group(group) => walk_macro_calls(&group.elements, visit)?,
            ElementType::Choose(choose) => {
                for branch in &choose.branches {
                    walk_macro_calls(&branch.elements, visit)?;
                }
            }
            ElementType::Names(NamesElement {
                substitute: Some(substitute),
                ..
            }) => walk_macro_calls(substitute, visit)?,
            _ => {}
        }
    }
    Ok(())
}

fn check_macros(style: &Style) -> Result<()> {
    // Sorted so the reported error does not depend on hash order
    let mut macros: Vec<&Macro> = style.macros.values().collect();
    macros.sort_by(|a, b| a.name.cmp(&b.name));
    let defined: BTreeSet<&str> = macros.iter().map(|m| m.name.as_str()).collect();

    let mut check = |name: &str, at: SourceSpan| -> Result<()> {
        if defined.contains(name) {
            return Ok(());
        }
        Err(Error::UndefinedMacro {
            name: name.to_string(),
            reference_location: at,
            suggestion: closest_name(name, &defined),
        })
    };

    for macro_def in &macros {
        walk_macro_calls(&macro_def.elements, &mut check)?;
    }
    for layout in std::iter::once(&style.citation).chain(&style.bibliography) {
        walk_macro_calls(&layout.elements, &mut check)?;
        for key in layout.sort.iter().flat_map(|sort| &sort.keys) {
            if let SortKeyType::Macro(name) = &key.key {
                check(name, key.span)?;
            }
        }
    }

    let mut acyclic = HashSet::new();
    for macro_def in &macros {
        if !acyclic.contains(&macro_def.name) {
            find_cycle(&style.macros, &mut vec![macro_def.name.clone()], &mut acyclic)?;
            acyclic.insert(macro_def.name.clone());
        }
    }
    Ok(())
}

/// Depth-first search from the last macro in `path`.
///
/// `acyclic` holds macros already fully explored without finding a cycle.
fn find_cycle(
    macros: &HashMap<String, Macro>,
    path: &mut Vec<String>,
    acyclic: &mut HashSet<String>,
) -> Result<()> {
    let Some(current) = path.last().and_then(|name| macros.get(name)) else {
        return Ok(());
    };

    let mut calls = Vec::new();
    walk_macro_calls(&current.elements, &mut |name, at| {
        calls.push((name.to_string(), at));
        Ok(())
    })?;

    for (callee, at) in calls {
        if path.contains(&callee) {
            path.push(callee);
            return Err(Error::CircularMacro {
                chain: path.clone(),
                location: at,
            });
        }
        if acyclic.contains(&callee) {
            continue;
        }
        path.push(callee);
        find_cycle(macros, path, acyclic)?;
        if let Some(done) = path.pop() {
            acyclic.insert(done);
        }
    }
    Ok(())
}

/// The defined name nearest to `name`, if within three edits.
fn closest_name(name: &str, defined: &BTreeSet<&str>) -> Option<String> {
    let wanted = name.to_lowercase();
    defined
        .iter()
        .map(|candidate| (edit_distance(&wanted, &candidate.to_lowercase()), *candidate))
        .filter(|(distance, _)| *distance <= 3)
        .min()
        .map(|(_, candidate)| candidate.to_string())
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == *cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

// Attribute access

fn attr<'a>(element: &'a XmlElement, name: &str) -> Option<&'a str> {
    element.get_attribute(name)
}

fn owned(element: &XmlElement, name: &str) -> Option<String> {
    attr(element, name).map(str::to_string)
}

fn flag(element: &XmlElement, name: &str) -> bool {
    attr(element, name) == Some("true")
}

fn keyword<T: Keyword>(element: &XmlElement, name: &str) -> Option<T> {
    attr(element, name).and_then(T::from_keyword)
}

fn words(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

fn required<'a>(element: &'a XmlElement, name: &str) -> Result<&'a XmlAttribute> {
    element
        .get_attribute_full(name)
        .ok_or_else(|| Error::MissingAttribute {
            element: element.name.clone(),
            attribute: name.to_string(),
            location: element.name_span,
        })
}

fn required_keyword<T: Keyword>(element: &XmlElement, name: &str) -> Result<T> {
    let attribute = required(element, name)?;
    T::from_keyword(&attribute.value).ok_or_else(|| Error::InvalidAttributeValue {
        element: element.name.clone(),
        attribute: name.to_string(),
        value: attribute.value.clone(),
        expected: T::expected(),
        location: attribute.value_span,
    })
}

// Style structure

fn style(element: &XmlElement) -> Result<Style> {
    expect_root(element, "style")?;
    let version = required(element, "version")?.value.clone();
    let class = required_keyword(element, "class")?;

    let mut info = None;
    let mut locales = Vec::new();
    let mut macros: HashMap<String, Macro> = HashMap::new();
    let mut citation = None;
    let mut bibliography = None;

    for child in element.all_children() {
        match child.name.as_str() {
            "info" => info = Some(style_info(child)),
            "locale" => locales.push(locale(child)?),
            "citation" => citation = Some(layout(child)?),
            "bibliography" => bibliography = Some(layout(child)?),
            "macro" => {
                let defined = macro_def(child)?;
                if let Some(first) = macros.get(&defined.name) {
                    return Err(Error::DuplicateMacro {
                        name: defined.name,
                        first_location: first.name_span,
                        second_location: defined.name_span,
                    });
                }
                macros.insert(defined.name.clone(), defined);
            }
            _ => {}
        }
    }

    let Some(citation) = citation else {
        return Err(Error::MissingElement {
            parent: "style".to_string(),
            element: "citation".to_string(),
            location: element.name_span,
        });
    };

    Ok(Style {
        version,
        class,
        default_locale: owned(element, "default-locale"),
        info,
        locales,
        macros,
        citation,
        bibliography,
        name_options: name_options(element),
        span: element.span,
    })
}

fn style_info(element: &XmlElement) -> StyleInfo {
    let trimmed = |el: &XmlElement| el.text().map(|text| text.trim().to_string());
    let mut info = StyleInfo::default();

    for child in element.all_children() {
        match child.name.as_str() {
            "title" => info.title = trimmed(child),
            "title-short" => info.title_short = trimmed(child),
            "id" => info.id = trimmed(child),
            "updated" => info.updated = trimmed(child),
            "author" => info.authors.extend(child.first_child("name").and_then(trimmed)),
            "category" => info.citation_formats.extend(owned(child, "citation-format")),
            _ => {}
        }
    }
    info
}

fn locale(element: &XmlElement) -> Result<Locale> {
    let mut terms = Vec::new();
    let mut date_formats = Vec::new();
    let mut options = LocaleOptions::default();

    for child in element.all_children() {
        match child.name.as_str() {
            "terms" => {
                for term_element in child.get_children("term") {
                    terms.push(term(term_element)?);
                }
            }
            "date" => date_formats.push(date_format(child)?),
            "style-options" => {
                options = LocaleOptions {
                    punctuation_in_quote: flag(child, "punctuation-in-quote"),
                    limit_day_ordinals_to_day_1: flag(child, "limit-day-ordinals-to-day-1"),
                }
            }
            _ => {}
        }
    }

    Ok(Locale {
        lang: element
            .get_prefixed_attribute("xml", "lang")
            .map(str::to_string),
        terms,
        date_formats,
        options,
        span: element.span,
    })
}

fn term(element: &XmlElement) -> Result<Term> {
    let text_of = |el: &XmlElement| el.text().unwrap_or_default().to_string();
    let children = element.all_children();

    let mut term = Term {
        name: required(element, "name")?.value.clone(),
        form: keyword(element, "form").unwrap_or_default(),
        single: None,
        multiple: None,
        value: None,
        span: element.span,
    };
    if children.is_empty() {
        // <term name="page"></term> is an explicitly empty term
        term.value = Some(text_of(element));
    }
    for child in children {
        match child.name.as_str() {
            "single" => term.single = Some(text_of(child)),
            "multiple" => term.multiple = Some(text_of(child)),
            _ => {}
        }
    }
    Ok(term)
}

fn date_format(element: &XmlElement) -> Result<DateFormat> {
    Ok(DateFormat {
        form: keyword(element, "form").unwrap_or_default(),
        parts: date_parts(element)?,
        delimiter: owned(element, "delimiter"),
        span: element.span,
    })
}

fn macro_def(element: &XmlElement) -> Result<Macro> {
    let name = required(element, "name")?;
    Ok(Macro {
        name: name.value.clone(),
        name_span: name.value_span,
        elements: elements(element)?,
        span: element.span,
    })
}

/// `<citation>` or `<bibliography>` with its `<layout>` and optional `<sort>`.
fn layout(element: &XmlElement) -> Result<Layout> {
    let Some(inner) = element.first_child("layout") else {
        return Err(Error::MissingElement {
            parent: element.name.clone(),
            element: "layout".to_string(),
            location: element.name_span,
        });
    };

    Ok(Layout {
        formatting: formatting(inner),
        delimiter: owned(inner, "delimiter"),
        sort: element.first_child("sort").map(sort).transpose()?,
        name_options: name_options(element),
        elements: elements(inner)?,
        span: element.span,
    })
}

/// Name options as written on `<style>`, `<citation>`, `<bibliography>` or `<name>`.
///
/// Outside `<name>` the delimiter and form are spelled `name-delimiter` and
/// `name-form`.
fn name_options(element: &XmlElement) -> InheritableNameOptions {
    let on_name = element.name == "name";
    let either = |prefixed: &str, plain: &str| {
        attr(element, prefixed).or_else(|| if on_name { attr(element, plain) } else { None })
    };

    InheritableNameOptions {
        and: keyword(element, "and"),
        delimiter: either("name-delimiter", "delimiter").map(str::to_string),
        delimiter_precedes_last: keyword(element, "delimiter-precedes-last"),
        et_al_min: attr(element, "et-al-min").and_then(|v| v.parse().ok()),
        et_al_use_first: attr(element, "et-al-use-first").and_then(|v| v.parse().ok()),
        initialize_with: owned(element, "initialize-with"),
        form: either("name-form", "form").and_then(NameForm::from_keyword),
        name_as_sort_order: keyword(element, "name-as-sort-order"),
        sort_separator: owned(element, "sort-separator"),
    }
}

fn sort(element: &XmlElement) -> Result<Sort> {
    let keys = element
        .get_children("key")
        .into_iter()
        .map(sort_key)
        .collect::<Result<Vec<_>>>()?;
    Ok(Sort {
        keys,
        span: element.span,
    })
}

fn sort_key(element: &XmlElement) -> Result<SortKey> {
    let key = match (owned(element, "variable"), owned(element, "macro")) {
        (Some(variable), _) => SortKeyType::Variable(variable),
        (None, Some(name)) => SortKeyType::Macro(name),
        (None, None) => {
            return Err(Error::MissingAttribute {
                element: "key".to_string(),
                attribute: "variable or macro".to_string(),
                location: element.span,
            });
        }
    };
    Ok(SortKey {
        key,
        sort_order: keyword(element, "sort").unwrap_or_default(),
        span: element.span,
    })
}

// Rendering elements

fn elements(parent: &XmlElement) -> Result<Vec<Element>> {
    let mut built = Vec::new();
    for child in parent.all_children() {
        built.extend(element(child)?);
    }
    Ok(built)
}

/// Unknown element names yield `None`; the grammar validator reports them.
fn element(element: &XmlElement) -> Result<Option<Element>> {
    let element_type = match element.name.as_str() {
        "text" => ElementType::Text(text(element)?),
        "number" => ElementType::Number(NumberElement {
            variable: required(element, "variable")?.value.clone(),
            form: keyword(element, "form").unwrap_or_default(),
        }),
        "label" => ElementType::Label(LabelElement {
            variable: required(element, "variable")?.value.clone(),
            form: keyword(element, "form").unwrap_or_default(),
            plural: keyword(element, "plural").unwrap_or_default(),
        }),
        "names" => ElementType::Names(names(element)?),
        "date" => ElementType::Date(date(element)?),
        "group" => ElementType::Group(GroupElement {
            elements: elements(element)?,
            delimiter: owned(element, "delimiter"),
        }),
        "choose" => ElementType::Choose(choose(element)?),
        _ => return Ok(None),
    };

    Ok(Some(Element {
        element_type,
        formatting: formatting(element),
        span: element.span,
    }))
}

/// `<text>` takes its content from the first of variable, macro, term or value.
fn text(element: &XmlElement) -> Result<TextElement> {
    let source = if let Some(name) = owned(element, "variable") {
        TextSource::Variable {
            name,
            form: keyword(element, "form").unwrap_or_default(),
        }
    } else if let Some(call) = element.get_attribute_full("macro") {
        TextSource::Macro {
            name: call.value.clone(),
            name_span: call.value_span,
        }
    } else if let Some(name) = owned(element, "term") {
        TextSource::Term {
            name,
            form: keyword(element, "form").unwrap_or_default(),
            plural: flag(element, "plural"),
        }
    } else if let Some(value) = owned(element, "value") {
        TextSource::Value { value }
    } else {
        return Err(Error::MissingTextSource {
            location: element.span,
        });
    };
    Ok(TextElement { source })
}

fn names(element: &XmlElement) -> Result<NamesElement> {
    let mut names = NamesElement {
        variables: words(&required(element, "variable")?.value),
        delimiter: owned(element, "delimiter"),
        name: None,
        et_al: None,
        label: None,
        substitute: None,
    };

    for child in element.all_children() {
        match child.name.as_str() {
            "name" => {
                names.name = Some(Name {
                    options: name_options(child),
                    formatting: formatting(child),
                })
            }
            "et-al" => {
                names.et_al = Some(EtAl {
                    term: owned(child, "term"),
                    formatting: formatting(child),
                })
            }
            "label" => {
                names.label = Some(NamesLabel {
                    form: keyword(child, "form").unwrap_or_default(),
                    plural: keyword(child, "plural").unwrap_or_default(),
                    formatting: formatting(child),
                })
            }
            "substitute" => names.substitute = Some(elements(child)?),
            _ => {}
        }
    }
    Ok(names)
}

fn date(element: &XmlElement) -> Result<DateElement> {
    Ok(DateElement {
        variable: required(element, "variable")?.value.clone(),
        form: keyword(element, "form"),
        date_parts: keyword(element, "date-parts").unwrap_or_default(),
        parts: date_parts(element)?,
        delimiter: owned(element, "delimiter"),
    })
}

fn date_parts(element: &XmlElement) -> Result<Vec<DatePart>> {
    element
        .get_children("date-part")
        .into_iter()
        .map(|part| {
            Ok(DatePart {
                name: required_keyword(part, "name")?,
                form: keyword(part, "form"),
                formatting: formatting(part),
                span: part.span,
            })
        })
        .collect()
}

fn choose(element: &XmlElement) -> Result<ChooseElement> {
    let mut branches = Vec::new();
    for child in element.all_children() {
        let conditions = match child.name.as_str() {
            "if" | "else-if" => conditions(child),
            "else" => Vec::new(),
            _ => continue,
        };
        branches.push(ChooseBranch {
            conditions,
            match_type: keyword(child, "match").unwrap_or_default(),
            elements: elements(child)?,
            span: child.span,
        });
    }
    Ok(ChooseElement { branches })
}

/// One condition per test attribute, in attribute order.
fn conditions(element: &XmlElement) -> Vec<Condition> {
    element
        .attributes
        .iter()
        .filter_map(|attribute| {
            let value = attribute.value.as_str();
            let condition_type = match attribute.name.as_str() {
                "type" => ConditionType::Type(words(value)),
                "variable" => ConditionType::Variable(words(value)),
                "is-numeric" => ConditionType::IsNumeric(words(value)),
                "is-uncertain-date" => ConditionType::IsUncertainDate(words(value)),
                "locator" => ConditionType::Locator(words(value)),
                "position" => ConditionType::Position(
                    value
                        .split_whitespace()
                        .filter_map(Position::from_keyword)
                        .collect(),
                ),
                "disambiguate" => ConditionType::Disambiguate(value == "true"),
                _ => return None,
            };
            Some(Condition {
                condition_type,
                span: attribute.value_span,
            })
        })
        .collect()
}

fn formatting(element: &XmlElement) -> Formatting {
    Formatting {
        font_style: keyword(element, "font-style"),
        font_variant: keyword(element, "font-variant"),
        font_weight: keyword(element, "font-weight"),
        text_decoration: keyword(element, "text-decoration"),
        vertical_align: keyword(element, "vertical-align"),
        text_case: keyword(element, "text-case"),
        prefix: owned(element, "prefix"),
        suffix: owned(element, "suffix"),
        display: keyword(element, "display"),
        quotes: flag(element, "quotes"),
        strip_periods: flag(element, "strip-periods"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_with(body: &str) -> String {
        format!(
            r#"<style xmlns="http://purl.org/net/xbiblio/csl" class="in-text" version="1.0">{}</style>"#,
            body
        )
    }

    #[test]
    fn test_parse_minimal_style() {
        let style = parse_csl(&style_with(
            r#"<citation><layout><text variable="title"/></layout></citation>"#,
        ))
        .unwrap();

        assert_eq!(style.version, "1.0");
        assert_eq!(style.class, StyleClass::InText);
        assert!(style.bibliography.is_none());
        assert_eq!(style.citation.elements.len(), 1);
    }

    #[test]
    fn test_parse_style_with_macros() {
        let style = parse_csl(&style_with(
            r#"<macro name="author"><names variable="author"/></macro>
               <citation><layout><text macro="author"/></layout></citation>"#,
        ))
        .unwrap();

        assert!(style.macros.contains_key("author"));
        match &style.citation.elements[0].element_type {
            ElementType::Text(TextElement {
                source: TextSource::Macro { name, .. },
            }) => assert_eq!(name, "author"),
            other => panic!("Expected macro text, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_style_with_choose() {
        let style = parse_csl(&style_with(
            r#"<citation><layout>
                 <choose>
                   <if type="book thesis" match="any"><text variable="publisher"/></if>
                   <else-if variable="page"><text variable="page"/></else-if>
                   <else><text value="n.p."/></else>
                 </choose>
               </layout></citation>"#,
        ))
        .unwrap();

        let ElementType::Choose(choose) = &style.citation.elements[0].element_type else {
            panic!("Expected choose");
        };
        assert_eq!(choose.branches.len(), 3);
        assert_eq!(choose.branches[0].match_type, MatchType::Any);
        assert!(matches!(
            &choose.branches[0].conditions[0].condition_type,
            ConditionType::Type(types) if types == &["book", "thesis"]
        ));
        assert!(choose.branches[2].conditions.is_empty());
    }

    #[test]
    fn test_parse_bibliography_sort() {
        let style = parse_csl(&style_with(
            r#"<citation><layout><text variable="title"/></layout></citation>
               <bibliography>
                 <sort><key variable="issued" sort="descending"/><key variable="title"/></sort>
                 <layout><text variable="title"/></layout>
               </bibliography>"#,
        ))
        .unwrap();

        let sort = style.bibliography.and_then(|b| b.sort).unwrap();
        assert_eq!(sort.keys.len(), 2);
        assert_eq!(sort.keys[0].sort_order, SortOrder::Descending);
        assert_eq!(sort.keys[1].key, SortKeyType::Variable("title".to_string()));
    }

    #[test]
    fn test_parse_embedded_locale() {
        let style = parse_csl(&style_with(
            r#"<locale xml:lang="en">
                 <terms>
                   <term name="page" form="short"><single>p.</single><multiple>pp.</multiple></term>
                   <term name="and">and</term>
                 </terms>
               </locale>
               <citation><layout><text variable="title"/></layout></citation>"#,
        ))
        .unwrap();

        let locale = &style.locales[0];
        assert_eq!(locale.lang.as_deref(), Some("en"));
        assert_eq!(locale.terms.len(), 2);
        assert_eq!(locale.terms[0].form, TermForm::Short);
        assert_eq!(locale.terms[0].text(true), Some("pp."));
        assert_eq!(locale.terms[1].text(false), Some("and"));
    }

    #[test]
    fn test_parse_standalone_locale() {
        let xml = citeproc_xml::parse(
            r#"<locale xmlns="http://purl.org/net/xbiblio/csl" version="1.0" xml:lang="de-DE">
                 <style-options punctuation-in-quote="false"/>
                 <date form="numeric" delimiter=".">
                   <date-part name="day" form="numeric-leading-zeros"/>
                   <date-part name="month" form="numeric-leading-zeros"/>
                   <date-part name="year"/>
                 </date>
                 <terms><term name="and">und</term></terms>
               </locale>"#,
        )
        .unwrap();

        let locale = parse_locale(&xml).unwrap();
        assert_eq!(locale.lang.as_deref(), Some("de-DE"));
        assert_eq!(locale.date_formats[0].form, DateForm::Numeric);
        assert_eq!(locale.date_formats[0].parts.len(), 3);
        assert_eq!(locale.date_formats[0].delimiter.as_deref(), Some("."));
    }

    #[test]
    fn test_locale_root_is_required() {
        let xml = citeproc_xml::parse("<style/>").unwrap();
        let err = parse_locale(&xml).unwrap_err();
        assert!(matches!(err, Error::InvalidRootElement { ref expected, .. } if expected == "locale"));
    }

    #[test]
    fn test_missing_version_error() {
        let err = parse_csl(
            r#"<style class="in-text"><citation><layout/></citation></style>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingAttribute { ref attribute, .. } if attribute == "version"
        ));
    }

    #[test]
    fn test_missing_citation_error() {
        let err = parse_csl(&style_with("<info/>")).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingElement { ref element, .. } if element == "citation"
        ));
    }

    #[test]
    fn test_citation_without_layout_error() {
        let err = parse_csl(&style_with("<citation/>")).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingElement { ref element, .. } if element == "layout"
        ));
    }

    #[test]
    fn test_parse_formatting_attributes() {
        let style = parse_csl(&style_with(
            r#"<citation><layout prefix="(" suffix=")">
                 <text variable="title" font-style="italic" font-weight="bold"
                       text-case="uppercase" quotes="true" prefix="[" suffix="]"/>
               </layout></citation>"#,
        ))
        .unwrap();

        assert_eq!(style.citation.formatting.prefix.as_deref(), Some("("));
        let fmt = &style.citation.elements[0].formatting;
        assert_eq!(fmt.font_style, Some(FontStyle::Italic));
        assert_eq!(fmt.font_weight, Some(FontWeight::Bold));
        assert_eq!(fmt.text_case, Some(TextCase::Uppercase));
        assert!(fmt.quotes);
        assert_eq!(fmt.prefix.as_deref(), Some("["));
    }

    #[test]
    fn test_text_without_source_error() {
        let err = parse_csl(&style_with(
            r#"<citation><layout><text/></layout></citation>"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::MissingTextSource { .. }));
    }

    #[test]
    fn test_undefined_macro_with_suggestion() {
        let err = parse_csl(&style_with(
            r#"<macro name="author"><text variable="author"/></macro>
               <citation><layout><text macro="auther"/></layout></citation>"#,
        ))
        .unwrap_err();

        match err {
            Error::UndefinedMacro {
                name, suggestion, ..
            } => {
                assert_eq!(name, "auther");
                assert_eq!(suggestion.as_deref(), Some("author"));
            }
            other => panic!("Expected UndefinedMacro, got {:?}", other),
        }
    }

    #[test]
    fn test_undefined_sort_macro() {
        let err = parse_csl(&style_with(
            r#"<citation><layout><text variable="title"/></layout></citation>
               <bibliography><sort><key macro="missing"/></sort><layout/></bibliography>"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::UndefinedMacro { ref name, .. } if name == "missing"));
    }

    #[test]
    fn test_circular_macro_error() {
        let err = parse_csl(&style_with(
            r#"<macro name="a"><text macro="b"/></macro>
               <macro name="b"><group><text macro="a"/></group></macro>
               <citation><layout><text macro="a"/></layout></citation>"#,
        ))
        .unwrap_err();

        match err {
            Error::CircularMacro { chain, .. } => {
                assert_eq!(chain.first(), chain.last());
                assert_eq!(chain.len(), 3);
            }
            other => panic!("Expected CircularMacro, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_macro_error() {
        let err = parse_csl(&style_with(
            r#"<macro name="a"><text value="x"/></macro>
               <macro name="a"><text value="y"/></macro>
               <citation><layout><text macro="a"/></layout></citation>"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateMacro { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("same", "same"), 0);
    }
}
