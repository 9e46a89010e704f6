//! Date detection, context classification and canonicalization.
//!
//! Detection runs five date-shape patterns in priority order. Each match is
//! classified by the keywords within ±20 characters of it (expiry beats
//! manufacturing beats other), then normalized to a calendar date.
//!
//! Numeric dates carry no locale signal, so ambiguity is settled by one fixed
//! policy: read day-first, and only if that is not a real calendar date,
//! read month-first ([`resolve_day_month`]). Two-digit and pre-1950 years are
//! moved forward a century ([`pivot_year`]).

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::DateClass;

/// Characters inspected on each side of a date when classifying it.
pub const CONTEXT_RADIUS_CHARS: usize = 20;

/// Parsed years below this are moved forward 100 years.
pub const CENTURY_PIVOT_YEAR: i32 = 1950;

const EXPIRY_KEYWORDS: &[&str] = &["exp", "expiry", "expires", "use by", "best before"];
const MANUFACTURING_KEYWORDS: &[&str] = &["mfg", "manufactured", "mfd", "production"];

const MONTH_NAMES: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

/// Date shapes in detection priority order.
static DATE_SHAPES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // DD/MM/YYYY or DD-MM-YYYY
        Regex::new(r"\b\d{1,2}[-/]\d{1,2}[-/]\d{4}\b").unwrap(),
        // DD/MM/YY or DD-MM-YY
        Regex::new(r"\b\d{1,2}[-/]\d{1,2}[-/]\d{2}\b").unwrap(),
        // MM/YYYY or MM-YYYY
        Regex::new(r"\b\d{1,2}[-/]\d{4}\b").unwrap(),
        // Month DD, YYYY
        Regex::new(&format!(r"(?i)\b(?:{MONTH_NAMES})\.?\s+\d{{1,2}},?\s*\d{{4}}\b")).unwrap(),
        // DD Month YYYY
        Regex::new(&format!(r"(?i)\b\d{{1,2}}\s+(?:{MONTH_NAMES})\.?,?\s+\d{{4}}\b")).unwrap(),
    ]
});

/// Normalization templates, anchored on the cleaned candidate string.
static NUMERIC_DMY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{4}|\d{2})$").unwrap());
static NUMERIC_YMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})$").unwrap());
static NUMERIC_MY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[-/](\d{4})$").unwrap());
static DAY_MONTH_NAME_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^(\d{{1,2}}) ({MONTH_NAMES})\.? (\d{{4}})$")).unwrap()
});
static MONTH_NAME_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^({MONTH_NAMES})\.? (\d{{1,2}}) (\d{{4}})$")).unwrap()
});

/// Last-resort D[sep]M[sep]Y search inside an otherwise unparseable string.
static GENERIC_DMY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[./-](\d{1,2})[./-](\d{4}|\d{2})\b").unwrap());

/// A date-shaped substring found in the scan text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateCandidate {
    pub raw: String,
    /// Byte offset of the match in the scanned text.
    pub offset: usize,
    pub context_window: String,
    pub classification: DateClass,
    pub normalized: Option<NaiveDate>,
}

/// Candidates split by classification, in detection order, deduplicated per bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDates {
    pub manufacturing: Vec<DateCandidate>,
    pub expiry: Vec<DateCandidate>,
    pub other: Vec<DateCandidate>,
}

impl ResolvedDates {
    pub fn bucket(&self, class: DateClass) -> &[DateCandidate] {
        match class {
            DateClass::Manufacturing => &self.manufacturing,
            DateClass::Expiry => &self.expiry,
            DateClass::Other => &self.other,
        }
    }

    /// First candidate in the bucket that normalizes to a calendar date.
    pub fn first_normalized(&self, class: DateClass) -> Option<NaiveDate> {
        self.bucket(class).iter().find_map(|c| c.normalized)
    }

    pub fn is_empty(&self) -> bool {
        self.manufacturing.is_empty() && self.expiry.is_empty() && self.other.is_empty()
    }
}

/// Detect, classify and normalize every date in `text`.
pub fn resolve_dates(text: &str) -> ResolvedDates {
    let mut resolved = ResolvedDates::default();
    let mut seen: HashSet<(DateClass, String)> = HashSet::new();

    for candidate in detect_dates(text) {
        if !seen.insert((candidate.classification, candidate.raw.to_lowercase())) {
            continue;
        }
        tracing::debug!(
            class = candidate.classification.as_str(),
            normalized = ?candidate.normalized,
            "Date candidate"
        );
        match candidate.classification {
            DateClass::Manufacturing => resolved.manufacturing.push(candidate),
            DateClass::Expiry => resolved.expiry.push(candidate),
            DateClass::Other => resolved.other.push(candidate),
        }
    }

    resolved
}

/// All date-shaped matches in priority order. A match overlapping a span
/// already claimed by a higher-priority shape is skipped.
pub fn detect_dates(text: &str) -> Vec<DateCandidate> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut candidates = Vec::new();

    for shape in DATE_SHAPES.iter() {
        for m in shape.find_iter(text) {
            if claimed.iter().any(|&(s, e)| m.start() < e && s < m.end()) {
                continue;
            }
            claimed.push((m.start(), m.end()));

            let window = context_window(text, m.start(), m.end(), CONTEXT_RADIUS_CHARS);
            candidates.push(DateCandidate {
                raw: m.as_str().to_string(),
                offset: m.start(),
                context_window: window.to_string(),
                classification: classify_context(window),
                normalized: normalize_date(m.as_str()),
            });
        }
    }

    candidates
}

/// Classify a date by the keywords in its surrounding window.
pub fn classify_context(window: &str) -> DateClass {
    let lower = window.to_lowercase();
    if EXPIRY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        DateClass::Expiry
    } else if MANUFACTURING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        DateClass::Manufacturing
    } else {
        DateClass::Other
    }
}

/// Slice of `text` from `radius` chars before `start` to `radius` chars after `end`.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = if radius == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .nth(radius - 1)
            .map_or(0, |(i, _)| i)
    };
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    &text[from..to]
}

/// Canonicalize a raw date string. `None` when no reading gives a real date.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.replace(',', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return None;
    }

    if let Some(c) = NUMERIC_DMY.captures(&cleaned) {
        if let Some(date) = resolve_day_month(num(&c[1])?, num(&c[2])?, expand_year(&c[3])?) {
            return Some(date);
        }
    }
    if let Some(c) = NUMERIC_YMD.captures(&cleaned) {
        if let Some(date) = ymd(expand_year(&c[1])?, num(&c[2])?, num(&c[3])?) {
            return Some(date);
        }
    }
    if let Some(c) = NUMERIC_MY.captures(&cleaned) {
        if let Some(date) = ymd(expand_year(&c[2])?, num(&c[1])?, 1) {
            return Some(date);
        }
    }
    if let Some(c) = DAY_MONTH_NAME_YEAR.captures(&cleaned) {
        if let Some(date) = ymd(expand_year(&c[3])?, month_number(&c[2])?, num(&c[1])?) {
            return Some(date);
        }
    }
    if let Some(c) = MONTH_NAME_DAY_YEAR.captures(&cleaned) {
        if let Some(date) = ymd(expand_year(&c[3])?, month_number(&c[1])?, num(&c[2])?) {
            return Some(date);
        }
    }

    let c = GENERIC_DMY.captures(&cleaned)?;
    resolve_day_month(num(&c[1])?, num(&c[2])?, expand_year(&c[3])?)
}

/// Day-first, then month-first fallback.
///
/// `first` and `second` are the two leading numeric components as written.
/// They are read as (day, month); if that is not a valid calendar date they
/// are read as (month, day). If neither is valid the date is unrecorded.
pub fn resolve_day_month(first: u32, second: u32, year: i32) -> Option<NaiveDate> {
    ymd(year, second, first).or_else(|| ymd(year, first, second))
}

/// Move a parsed year below [`CENTURY_PIVOT_YEAR`] forward one century.
pub fn pivot_year(year: i32) -> i32 {
    if year < CENTURY_PIVOT_YEAR {
        year + 100
    } else {
        year
    }
}

/// Two-digit years read as 19yy before pivoting, so `49` → 2049 and `50` → 1950.
fn expand_year(digits: &str) -> Option<i32> {
    let year: i32 = digits.parse().ok()?;
    if digits.len() <= 2 {
        Some(pivot_year(1900 + year))
    } else {
        Some(pivot_year(year))
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn num(digits: &str) -> Option<u32> {
    digits.parse().ok()
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
