//! Prescription segmentation.
//!
//! Document-level metadata (patient, doctor, clinic, date, timing phrases)
//! comes from the whole text. Medicine entries come from individual lines:
//! each qualifying line is extracted in isolation so nothing found on one
//! line can end up in another line's record.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{DateClass, MedicineLineRecord, PrescriptionRecord};

use super::confidence::prescription_confidence;
use super::dates::resolve_dates;
use super::fields::{clean_clause, first_dosage_unit};
use super::normalize::NormalizedText;

/// Unit keyword at a word end. Letters may precede it because OCR repair turns
/// `500mg` into `5OOmg`. A bare `g` still needs a digit so "Age" is not a dose.
static LINE_DOSAGE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:mg/ml|mg|mcg|ml|iu|units?)\b|%|\d[0-9OI]*\s*g\b").unwrap()
});

/// Second medicine-line signal: a number followed later by a frequency word.
static FREQUENCY_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+.*\b(?:times?|daily|twice|once)\b").unwrap());

/// Tokens that never name the medicine on a prescription line.
const LINE_KEYWORDS: &[&str] = &[
    "take", "tab", "tabs", "tablet", "tablets", "cap", "caps", "capsule", "capsules", "syp",
    "syrup", "inj", "mg", "ml", "once", "twice", "thrice", "daily", "rx",
];

static ROMAN_NUMERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[IVX]+$").unwrap());

static FREQUENCY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:once|twice|thrice)\s*(?:daily|a day|per day)\b").unwrap(),
        Regex::new(r"(?i)\b\d+\s*times?\s*(?:daily|a day|per day)\b").unwrap(),
        Regex::new(r"(?i)\bevery\s*\d+\s*hours?\b").unwrap(),
        Regex::new(r"(?i)\b\d+\s*x\s*\d+\b").unwrap(),
        // Morning-noon-night grid: 1-0-1
        Regex::new(r"\b[0-2]-[0-2]-[0-2]\b").unwrap(),
    ]
});

static DURATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bfor\s*\d+\s*(?:days?|weeks?|months?)\b").unwrap(),
        Regex::new(r"(?i)\b\d+\s*(?:days?|weeks?|months?)\s*course\b").unwrap(),
    ]
});

static LINE_INSTRUCTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:after|before|with|food|meals?|empty stomach)\b").unwrap()
});

static PATIENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:patient(?:\s*name)?|name)\b\s*:?\s*([A-Za-z .]+)").unwrap(),
        Regex::new(r"(?i)\b(?:mr|mrs|ms)\b\.?\s+([A-Za-z .]+)").unwrap(),
    ]
});

static DOCTOR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bdr\b\.?\s*([A-Za-z .]+)").unwrap(),
        Regex::new(r"(?i)\bdoctor\b\s*:?\s*([A-Za-z .]+)").unwrap(),
        Regex::new(r"(?i)\bphysician\b\s*:?\s*([A-Za-z .]+)").unwrap(),
    ]
});

/// Person-name captures end where the next labelled field starts.
static NAME_TERMINATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:age|sex|gender|date|dob)\b").unwrap());

static CLINIC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[^\n]*\b(?:clinic|hospital|medical cent(?:er|re))\b[^\n]*").unwrap()
});

static GENERAL_INSTRUCTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b\d+\s*times?\s*(?:a\s*)?day\b").unwrap(),
        Regex::new(r"(?i)\btwice\s*(?:a\s*)?day\b").unwrap(),
        Regex::new(r"(?i)\bonce\s*(?:a\s*)?day\b").unwrap(),
        Regex::new(r"(?i)\bbefore\s*meals?\b").unwrap(),
        Regex::new(r"(?i)\bafter\s*meals?\b").unwrap(),
        Regex::new(r"(?i)\bwith\s*meals?\b").unwrap(),
        Regex::new(r"(?i)\bat\s*bedtime\b").unwrap(),
        Regex::new(r"(?i)\bas\s*needed\b").unwrap(),
    ]
});

/// Build a prescription record from normalized text.
pub fn segment_prescription(text: &NormalizedText, engine_confidence: f32) -> PrescriptionRecord {
    let body = text.text();
    let dates = resolve_dates(body);

    let medicines: Vec<MedicineLineRecord> = text
        .lines()
        .iter()
        .filter(|line| is_medicine_line(line))
        .map(|line| extract_medicine_line(line))
        .collect();

    let record = PrescriptionRecord {
        patient_name: first_person_name(&PATIENT_PATTERNS, body),
        doctor_name: first_person_name(&DOCTOR_PATTERNS, body),
        prescription_date: dates
            .first_normalized(DateClass::Other)
            .or_else(|| dates.first_normalized(DateClass::Expiry)),
        clinic: extract_clinic(body),
        medicines,
        general_instructions: extract_general_instructions(body),
        confidence: prescription_confidence(engine_confidence, text.is_empty()),
        error: None,
    };

    tracing::debug!(
        medicines = record.medicines.len(),
        has_patient = record.patient_name.is_some(),
        has_doctor = record.doctor_name.is_some(),
        "Segmented prescription"
    );

    record
}

/// A line names a medicine if it carries a dosage unit or a numbered frequency.
pub fn is_medicine_line(line: &str) -> bool {
    LINE_DOSAGE_UNIT.is_match(line) || FREQUENCY_SHAPE.is_match(line)
}

/// Extract one medicine entry using only the text of `line`.
pub fn extract_medicine_line(line: &str) -> MedicineLineRecord {
    MedicineLineRecord {
        name: line_medicine_name(line),
        dosage: first_dosage_unit(line),
        frequency: first_match(&FREQUENCY_PATTERNS, line),
        duration: first_match(&DURATION_PATTERNS, line),
        instructions: LINE_INSTRUCTION_START
            .find(line)
            .map(|m| clean_clause(&line[m.start()..]))
            .filter(|s| !s.is_empty()),
    }
}

/// First token that is not a numbering mark, quantity or prescription keyword, title-cased.
fn line_medicine_name(line: &str) -> Option<String> {
    line.split_whitespace()
        .filter(|token| !is_list_marker(token))
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|token| is_name_token(token))
        .map(title_case)
}

/// `9.`, `(12)` and their repaired forms such as `IO.`
fn is_list_marker(token: &str) -> bool {
    let body = token.trim_start_matches('(').trim_end_matches(['.', ')']);
    body.len() < token.len()
        && (1..=3).contains(&body.len())
        && body.chars().all(|c| c.is_ascii_digit() || matches!(c, 'I' | 'O'))
}

fn is_name_token(token: &str) -> bool {
    token.chars().count() >= 2
        && token.chars().any(char::is_alphabetic)
        && !token.starts_with(|c: char| c.is_ascii_digit())
        && !ROMAN_NUMERAL.is_match(token)
        && !LINE_KEYWORDS.contains(&token.to_lowercase().as_str())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn first_match(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|m| m.as_str().trim().to_string())
}

fn first_person_name(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        let captured = &caps[1];
        let cut = NAME_TERMINATOR
            .find(captured)
            .map_or(captured, |m| &captured[..m.start()]);
        let name = cut.trim().trim_end_matches('.').trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}

fn extract_clinic(text: &str) -> Option<String> {
    CLINIC_LINE
        .find(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Timing phrases across the whole document, in pattern order, de-duplicated.
fn extract_general_instructions(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    GENERAL_INSTRUCTION_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.find_iter(text))
        .map(|m| m.as_str().trim().to_string())
        .filter(|phrase| seen.insert(phrase.to_lowercase()))
        .collect()
}
