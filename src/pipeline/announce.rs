//! Spoken-style text renderings of finished records.
//!
//! Produces the sentences a speech collaborator reads aloud. Audio is not
//! produced here; [`speech_friendly`] only rewrites abbreviations so a
//! synthesizer pronounces them.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::models::{MedicineRecord, PrescriptionRecord, ScanOutcome};

/// Days left at or below which the expiry notice is marked important.
pub const URGENT_EXPIRY_DAYS: i64 = 3;

static MARKDOWN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_*#]").unwrap());
static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Abbreviation rewrites, applied in order.
static SPOKEN_FORMS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)(\d)\s*mcg\b").unwrap(), "${1} micrograms"),
        (Regex::new(r"(?i)(\d)\s*mg\b").unwrap(), "${1} milligrams"),
        (Regex::new(r"(?i)(\d)\s*ml\b").unwrap(), "${1} milliliters"),
        (Regex::new(r"(?i)(\d)\s*g\b").unwrap(), "${1} grams"),
        (Regex::new(r"(?i)\bdr\.").unwrap(), "Doctor"),
        (Regex::new(r"(?i)\bmrs\.").unwrap(), "Missus"),
        (Regex::new(r"(?i)\bmr\.").unwrap(), "Mister"),
        (Regex::new(r"(?i)\bms\.").unwrap(), "Miss"),
        (Regex::new(r"&").unwrap(), " and "),
        (Regex::new(r"%").unwrap(), " percent"),
    ]
});

/// Rewrite text so a speech synthesizer reads it naturally.
pub fn speech_friendly(text: &str) -> String {
    let text = MARKDOWN.replace_all(text, " ");
    let mut text = LINE_BREAKS.replace_all(&text, ". ").into_owned();

    for (pattern, spoken) in SPOKEN_FORMS.iter() {
        text = pattern.replace_all(&text, *spoken).into_owned();
    }

    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// One-paragraph summary of a label scan.
pub fn scan_summary(record: &MedicineRecord) -> String {
    let name = record.name.as_deref().unwrap_or("unknown medicine");
    let mut parts = vec![format!("Scanned medicine: {name}.")];

    if let Some(dosage) = &record.dosage {
        parts.push(format!("Dosage: {dosage}."));
    }
    if let Some(expiry) = record.expiry_date {
        parts.push(format!("This medicine expires on {}.", expiry.format("%Y-%m-%d")));
    }
    parts.push("Scan completed successfully.".to_string());

    parts.join(" ")
}

/// Expiry notice graded by days remaining. Negative means already expired.
pub fn expiry_notice(name: &str, days_until_expiry: i64) -> String {
    match days_until_expiry {
        d if d < 0 => format!(
            "Important warning: {name} has expired. Please do not use this medicine and consult your doctor for a replacement."
        ),
        0 => format!(
            "Important warning: {name} expires today. Please check with your pharmacist or doctor for a replacement."
        ),
        1 => format!(
            "Important notice: {name} will expire in 1 day. Please arrange for a replacement soon."
        ),
        d if d <= URGENT_EXPIRY_DAYS => format!(
            "Important notice: {name} will expire in {d} days. Please arrange for a replacement soon."
        ),
        d => format!("Notice: {name} will expire in {d} days. Please plan to get a replacement."),
    }
}

/// Expiry notice for a record, with the day count recomputed at `now`.
/// `None` when the record has no expiry date.
pub fn expiry_notice_at(record: &MedicineRecord, now: NaiveDateTime) -> Option<String> {
    let days = record.days_until_expiry_at(now)?;
    let name = record.name.as_deref().unwrap_or("This medicine");
    Some(expiry_notice(name, days))
}

pub fn prescription_summary(record: &PrescriptionRecord) -> String {
    let mut parts = Vec::new();

    if let Some(doctor) = &record.doctor_name {
        parts.push(format!("Prescription from Doctor {doctor}."));
    } else {
        parts.push("Prescription scanned.".to_string());
    }
    if let Some(patient) = &record.patient_name {
        parts.push(format!("Patient: {patient}."));
    }
    if let Some(date) = record.prescription_date {
        parts.push(format!("Dated {}.", date.format("%Y-%m-%d")));
    }

    match record.medicines.len() {
        0 => parts.push("No medicines were detected.".to_string()),
        1 => parts.push("1 medicine prescribed.".to_string()),
        n => parts.push(format!("{n} medicines prescribed.")),
    }

    for medicine in &record.medicines {
        let details: Vec<&str> = [
            medicine.name.as_deref().or(Some("Unnamed medicine")),
            medicine.dosage.as_deref(),
            medicine.frequency.as_deref(),
            medicine.duration.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        parts.push(format!("{}.", details.join(", ")));
    }

    if !record.general_instructions.is_empty() {
        parts.push(format!(
            "General instructions: {}.",
            record.general_instructions.join(", ")
        ));
    }

    parts.join(" ")
}

/// Summary for either scan kind, rewritten for speech.
pub fn spoken_outcome(outcome: &ScanOutcome) -> String {
    let text = match outcome {
        ScanOutcome::Label(record) => scan_summary(record),
        ScanOutcome::Prescription(record) => prescription_summary(record),
    };
    speech_friendly(&text)
}
