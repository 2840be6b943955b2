//! The diagnostic message type and its text/JSON renderings.
//!
//! A message reads top to bottom as: a titled header (with its code), one
//! problem sentence, bulleted details, then hints phrased as questions.

use crate::span::{SourceFile, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Severity of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Error,
    Warning,
    Info,
    Note,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::Error => "Error",
            DiagnosticKind::Warning => "Warning",
            DiagnosticKind::Info => "Info",
            DiagnosticKind::Note => "Note",
        })
    }
}

/// Bullet style of a detail line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailKind {
    /// `✖`
    Error,
    /// `ℹ`
    Info,
    /// `•`
    Note,
}

impl DetailKind {
    fn bullet(self) -> char {
        match self {
            DetailKind::Error => '✖',
            DetailKind::Info => 'ℹ',
            DetailKind::Note => '•',
        }
    }
}

/// Text of a problem, detail or hint.
///
/// Serialized as `{"type": "plain" | "markdown", "content": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum MessageContent {
    Plain(String),
    Markdown(String),
}

impl MessageContent {
    pub fn as_str(&self) -> &str {
        match self {
            MessageContent::Plain(text) | MessageContent::Markdown(text) => text,
        }
    }
}

impl fmt::Display for MessageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Markdown(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Markdown(text.to_owned())
    }
}

/// One bulleted line under the problem statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    pub kind: DetailKind,
    pub content: MessageContent,
    /// Where in the document this detail applies, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceSpan>,
}

impl fmt::Display for DetailItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.bullet(), self.content)
    }
}

/// An error, warning or note about a style, locale or lookup.
///
/// `code` is a stable identifier such as `C-4-1` that stays the same across
/// wording changes; build richer messages with
/// [`DiagnosticMessageBuilder`](crate::DiagnosticMessageBuilder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    pub kind: DiagnosticKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<DetailItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<MessageContent>,
    /// Byte range in the document the message is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceSpan>,
}

impl DiagnosticMessage {
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            code: None,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Error)
    }

    fn header(&self) -> String {
        match &self.code {
            Some(code) => format!("{} [{}]: {}", self.kind, code, self.title),
            None => format!("{}: {}", self.kind, self.title),
        }
    }

    /// Render as human-readable text.
    ///
    /// Given the document text and a located message, the header, problem
    /// and located details become an annotated snippet; details without a
    /// location and the hints follow it as plain lines.
    ///
    /// ```
    /// use citeproc_diagnostics::DiagnosticMessageBuilder;
    ///
    /// let msg = DiagnosticMessageBuilder::warning("Schema Violation")
    ///     .problem("<citation> has no <layout>")
    ///     .add_hint("Add a <layout> child?")
    ///     .build();
    /// let text = msg.to_text(None);
    /// assert!(text.contains("Warning: Schema Violation"));
    /// assert!(text.contains("? Add a <layout> child?"));
    /// ```
    pub fn to_text(&self, source: Option<&SourceFile>) -> String {
        let snippet = source
            .zip(self.location)
            .and_then(|(file, location)| self.snippet(file, location));

        let mut lines: Vec<String> = Vec::new();
        match snippet {
            Some(snippet) => {
                lines.push(snippet.trim_end().to_owned());
                lines.extend(
                    self.details
                        .iter()
                        .filter(|detail| detail.location.is_none())
                        .map(ToString::to_string),
                );
            }
            None => {
                lines.push(self.header());
                lines.extend(self.problem.iter().map(ToString::to_string));
                lines.extend(self.details.iter().map(ToString::to_string));
            }
        }
        lines.extend(self.hints.iter().map(|hint| format!("? {}", hint)));
        lines.join("\n")
    }

    /// Render as a JSON value.
    ///
    /// ```
    /// use citeproc_diagnostics::DiagnosticMessage;
    ///
    /// let json = DiagnosticMessage::error("Something went wrong").to_json();
    /// assert_eq!(json["kind"], "error");
    /// assert_eq!(json["title"], "Something went wrong");
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn snippet(&self, file: &SourceFile, location: SourceSpan) -> Option<String> {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let color = |kind: DetailKind| match kind {
            DetailKind::Error => Color::Red,
            DetailKind::Info => Color::Cyan,
            DetailKind::Note => Color::Blue,
        };
        let (report_kind, main_color) = match self.kind {
            DiagnosticKind::Error => (ReportKind::Error, Color::Red),
            DiagnosticKind::Warning => (ReportKind::Warning, Color::Yellow),
            DiagnosticKind::Info => (ReportKind::Advice, Color::Cyan),
            DiagnosticKind::Note => (ReportKind::Advice, Color::Blue),
        };

        let name = file.name.as_str();
        let main = clamp(location, file.content.len());
        let headline = match &self.code {
            Some(code) => format!("[{}] {}", code, self.title),
            None => self.title.clone(),
        };
        let label = self.problem.as_ref().map_or(self.title.as_str(), MessageContent::as_str);

        let mut report = Report::build(report_kind, name, main.start)
            .with_message(headline)
            .with_label(
                Label::new((name, main))
                    .with_message(label)
                    .with_color(main_color),
            );
        for detail in &self.details {
            if let Some(at) = detail.location {
                report = report.with_label(
                    Label::new((name, clamp(at, file.content.len())))
                        .with_message(detail.content.as_str())
                        .with_color(color(detail.kind)),
                );
            }
        }

        let mut out = Vec::new();
        report
            .finish()
            .write((name, Source::from(file.content.as_str())), &mut out)
            .ok()?;
        String::from_utf8(out).ok()
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(None))
    }
}

/// Clamp a span to a document of `len` bytes, keeping `start <= end`.
fn clamp(span: SourceSpan, len: usize) -> Range<usize> {
    let start = span.start.min(len);
    start..span.end.clamp(start, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DiagnosticMessageBuilder;

    #[test]
    fn bare_message_has_only_a_header() {
        let msg = DiagnosticMessage::error("Something went wrong");
        assert!(msg.is_error());
        assert_eq!(msg.to_text(None), "Error: Something went wrong");
        assert_eq!(msg.to_string(), msg.to_text(None));
    }

    #[test]
    fn code_appears_in_header() {
        let msg = DiagnosticMessage::warning("Something looks off").with_code("C-3-1");
        assert_eq!(msg.to_text(None), "Warning [C-3-1]: Something looks off");
    }

    #[test]
    fn full_message_layout() {
        let msg = DiagnosticMessageBuilder::error("Locale Not Found")
            .problem("No locale document for 'xx'")
            .add_detail("Tried: locales-xx.xml")
            .add_info("Bare language codes fall back to their primary dialect")
            .add_hint("Install the locale file?")
            .build();

        insta::assert_snapshot!(msg.to_text(None), @r"
        Error: Locale Not Found
        No locale document for 'xx'
        ✖ Tried: locales-xx.xml
        ℹ Bare language codes fall back to their primary dialect
        ? Install the locale file?
        ");
    }

    #[test]
    fn located_message_renders_a_snippet() {
        let file = SourceFile::new("style.csl", "<style>\n  <bogus/>\n</style>");
        let msg = DiagnosticMessageBuilder::warning("Unknown Element")
            .with_location(SourceSpan::new(10, 18))
            .add_hint("Remove it?")
            .build();

        let text = msg.to_text(Some(&file));
        assert!(text.contains("style.csl"));
        assert!(text.ends_with("? Remove it?"));
    }

    #[test]
    fn location_without_source_falls_back_to_layout() {
        let msg = DiagnosticMessageBuilder::warning("Unknown Element")
            .with_location(SourceSpan::new(10, 18))
            .build();
        assert_eq!(msg.to_text(None), "Warning: Unknown Element");
    }

    #[test]
    fn clamp_keeps_spans_inside_the_document() {
        assert_eq!(clamp(SourceSpan::new(2, 5), 10), 2..5);
        assert_eq!(clamp(SourceSpan::new(8, 20), 10), 8..10);
        assert_eq!(clamp(SourceSpan::new(30, 40), 10), 10..10);
        assert_eq!(clamp(SourceSpan::new(6, 3), 10), 6..6);
    }

    #[test]
    fn json_omits_empty_parts() {
        let msg = DiagnosticMessageBuilder::error("Invalid input")
            .with_code("C-4-2")
            .problem("Values must be numeric")
            .add_detail("Found text in column 3")
            .add_hint("Convert to numbers first?")
            .build();

        let json = msg.to_json();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["code"], "C-4-2");
        assert_eq!(json["problem"]["type"], "markdown");
        assert_eq!(json["details"][0]["kind"], "error");
        assert_eq!(json["hints"][0]["content"], "Convert to numbers first?");
        assert!(json.get("location").is_none());

        let bare = DiagnosticMessage::info("Note this").to_json();
        assert!(bare.get("details").is_none());
        assert!(bare.get("hints").is_none());
    }
}
