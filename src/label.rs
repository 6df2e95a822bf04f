use std::sync::OnceLock;

use regex::Regex;

static LABEL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn label_pattern() -> &'static Regex {
    LABEL_PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^(.*?)(?:\r?\n|[ \t]+)\s*\((?i:id):\s*([^()\r\n]*?)\s*\)\s*$")
            .expect("label pattern compiles")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLabel<'a> {
    pub display: &'a str,
    pub id: &'a str,
}

pub fn parse_label(text: &str) -> Option<DisplayLabel<'_>> {
    let captures = label_pattern().captures(text.trim())?;
    let display = captures.get(1)?.as_str().trim();
    let id = captures.get(2)?.as_str().trim();
    if id.is_empty() {
        return None;
    }
    Some(DisplayLabel { display, id })
}

/// The id inside a display label, or the whole trimmed text otherwise.
pub fn extract_id(text: &str) -> &str {
    parse_label(text)
        .map(|label| label.id)
        .unwrap_or_else(|| text.trim())
}

/// Text before the first newline, trimmed.
pub fn display_portion(text: &str) -> &str {
    text.split('\n').next().unwrap_or_default().trim()
}

/// Replaces each line break (and the whitespace around it) with one space.
pub fn collapse_newlines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
