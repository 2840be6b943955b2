//! Integration tests for citeproc-csl.
//!
//! These parse the style and locale files bundled with the `citeproc` crate.

use citeproc_csl::{ElementType, StyleClass, TermForm, parse_csl, parse_locale};
use std::fs;
use std::path::PathBuf;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../citeproc/data")
}

#[test]
fn test_parse_harvard1_style() {
    let content = fs::read_to_string(data_dir().join("styles/harvard1.csl"))
        .expect("Failed to read harvard1.csl");
    let style = parse_csl(&content).expect("Failed to parse harvard1.csl");

    assert_eq!(style.version, "1.0");
    assert_eq!(style.class, StyleClass::InText);
    assert_eq!(style.default_locale.as_deref(), Some("en-GB"));

    let info = style.info.as_ref().expect("style has <info>");
    assert!(info.title.as_deref().is_some_and(|t| t.starts_with("Harvard")));
    assert_eq!(info.citation_formats, vec!["author-date".to_string()]);

    for name in ["author", "author-short", "year-date", "title", "publisher"] {
        assert!(style.macros.contains_key(name), "missing macro {}", name);
    }

    assert_eq!(style.citation.name_options.et_al_min, Some(3));
    assert_eq!(style.citation.formatting.prefix.as_deref(), Some("("));
    assert_eq!(style.citation.delimiter.as_deref(), Some("; "));

    let bibliography = style.bibliography.as_ref().expect("style has bibliography");
    assert_eq!(bibliography.sort.as_ref().map(|s| s.keys.len()), Some(3));
    assert!(
        bibliography
            .elements
            .iter()
            .any(|e| matches!(e.element_type, ElementType::Choose(_)))
    );
}

#[test]
fn test_parse_all_bundled_locales() {
    let locales_dir = data_dir().join("locales");

    let mut locale_files: Vec<PathBuf> = fs::read_dir(&locales_dir)
        .expect("Failed to read locales directory")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "xml"))
        .collect();
    locale_files.sort();

    assert!(!locale_files.is_empty(), "No locale files found");

    for path in &locale_files {
        let content = fs::read_to_string(path).expect("Failed to read locale");
        let xml = citeproc_xml::parse(&content)
            .unwrap_or_else(|e| panic!("{:?}: {}", path, e));
        let locale = parse_locale(&xml).unwrap_or_else(|e| panic!("{:?}: {}", path, e));

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        assert_eq!(
            locale.lang.as_deref(),
            stem.strip_prefix("locales-"),
            "xml:lang should match file name for {:?}",
            path
        );
        assert_eq!(locale.date_formats.len(), 2);
        assert!(
            locale
                .terms
                .iter()
                .any(|t| t.name == "and" && t.form == TermForm::Long)
        );
    }
}

#[test]
fn test_en_us_page_terms() {
    let content = fs::read_to_string(data_dir().join("locales/locales-en-US.xml")).unwrap();
    let locale = parse_locale(&citeproc_xml::parse(&content).unwrap()).unwrap();

    let page_short = locale
        .terms
        .iter()
        .find(|t| t.name == "page" && t.form == TermForm::Short)
        .unwrap();
    assert_eq!(page_short.text(false), Some("p."));
    assert_eq!(page_short.text(true), Some("pp."));
    assert!(locale.options.punctuation_in_quote);
}
