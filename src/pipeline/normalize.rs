//! OCR text normalization.
//!
//! Collapses whitespace runs inside each line, drops blank lines, and repairs
//! characters that OCR engines commonly confuse with letters. Tokens shaped
//! like dates and purely numeric tokens pass through untouched so that
//! dates and counts survive the repair.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Character substitutions applied to every non-protected token, in order.
pub const OCR_CONFUSABLES: &[(char, char)] = &[('0', 'O'), ('1', 'I'), ('|', 'I'), ('§', 'S')];

static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[-/]\d+[-/]\d+$").unwrap());

/// Cleaned scan text plus its line sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    text: String,
    lines: Vec<String>,
}

impl NormalizedText {
    /// Whole text, lines joined by `\n`.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Normalize raw OCR output. Never fails; empty input gives empty output.
pub fn normalize(raw: &str) -> NormalizedText {
    let lines: Vec<String> = raw
        .lines()
        .map(|line| {
            line.split_whitespace()
                .map(repair_token)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect();

    NormalizedText {
        text: lines.join("\n"),
        lines,
    }
}

/// Apply the confusable table to one whitespace-free token.
pub fn repair_token(token: &str) -> Cow<'_, str> {
    if is_protected(token) || !token.chars().any(is_confusable) {
        return Cow::Borrowed(token);
    }

    Cow::Owned(
        token
            .chars()
            .map(|c| {
                OCR_CONFUSABLES
                    .iter()
                    .find(|(from, _)| *from == c)
                    .map_or(c, |(_, to)| *to)
            })
            .collect(),
    )
}

fn is_protected(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit()) || DATE_SHAPE.is_match(token)
}

fn is_confusable(c: char) -> bool {
    OCR_CONFUSABLES.iter().any(|(from, _)| *from == c)
}
