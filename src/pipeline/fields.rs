//! Per-field pattern families for medicine labels.
//!
//! Every extractor takes normalized text and returns `None` (or an empty
//! list) when nothing matches. Pattern tables are ordered: the first pattern
//! with a usable match anywhere in the text wins.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::lexicon::Lexicon;
use super::name_scoring::{best_candidate, FieldCandidate};

/// Dosage-unit shapes in claim priority order. `mg/ml` claims its span
/// before the bare `mg` pattern can.
static DOSAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*mg/ml\b").unwrap(),
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*mg\b").unwrap(),
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*mcg\b").unwrap(),
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*g\b").unwrap(),
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*ml\b").unwrap(),
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*iu\b").unwrap(),
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*units?\b").unwrap(),
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*%").unwrap(),
    ]
});

/// Any dosage unit after a number, for line-scoped extraction. The number may
/// carry OCR-repaired digits after its first (`5OOmg`); group 1 is the number.
static DOSAGE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d[0-9OI]*(?:\.[0-9OI]+)?)\s*(?:(?:mg/ml|mg|mcg|ml|g|iu|units?)\b|%)")
        .unwrap()
});

static MANUFACTURER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:manufactured by|mfg by|mfd by|company)[ :]+([A-Za-z0-9 ,.\-]+?)(?:\n|,|$)")
            .unwrap(),
        Regex::new(r"(?i)([A-Za-z0-9 ]+(?:pharmaceuticals|pharma|ltd|limited|pvt))\b").unwrap(),
        Regex::new(r"(?i)\bby\s+([A-Za-z0-9 ,.\-]+?)\s*(?:ltd|limited|pvt|pharma)\b").unwrap(),
    ]
});

/// Manufacturer values at or below this many chars are discarded.
const MIN_MANUFACTURER_CHARS: usize = 3;

static BATCH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:batch|lot|b\.\s?no|l\.\s?no)\b\.?\s*(?:no\b\.?|number\b)?\s*[:#]?\s*([A-Z0-9][A-Z0-9\-]*)",
    )
    .unwrap()
});

static QUANTITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(\d+)\s*tablets?\b").unwrap(),
        Regex::new(r"(?i)\b(\d+)\s*capsules?\b").unwrap(),
        Regex::new(r"(?i)\b(\d+)\s*ml\s*bottle").unwrap(),
        Regex::new(r"(?i)\b(\d+)\s*strips?\b").unwrap(),
        Regex::new(r"(?i)\bpack\s*of\s*(\d+)").unwrap(),
        Regex::new(r"(?i)\b(\d+)\s*pieces?\b").unwrap(),
    ]
});

// Clauses run to the next full stop or line end.
static STORAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bstore[^.\n]*").unwrap(),
        Regex::new(r"(?i)\bkeep[^.\n]*").unwrap(),
        Regex::new(r"(?i)\bstorage[^.\n]*").unwrap(),
        Regex::new(r"(?i)\btemperature[^.\n]*").unwrap(),
    ]
});

static WARNING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bwarning[^.\n]*").unwrap(),
        Regex::new(r"(?i)\bcaution[^.\n]*").unwrap(),
        Regex::new(r"(?i)\bdo not[^.\n]*").unwrap(),
        Regex::new(r"(?i)\bavoid[^.\n]*").unwrap(),
    ]
});

static TAKE_USE_APPLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:take|use|apply)\b[^\n]*").unwrap());
static DIRECTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:dosage|directions?)\s*:\s*([^\n]+)").unwrap());
static DAILY_TIMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:once|twice|thrice)\s+(?:daily|a day)\b[^\n]*").unwrap()
});

/// Date phrases that start with an instruction verb but are not instructions.
const NON_INSTRUCTION_PREFIXES: &[&str] = &["use by", "use before"];

/// Every dosage-unit match in scan order, scored 1.0 when it is in milligrams.
pub fn dosage_candidates(text: &str) -> Vec<FieldCandidate> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut candidates = Vec::new();

    for pattern in DOSAGE_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            if claimed.iter().any(|&(s, e)| m.start() < e && s < m.end()) {
                continue;
            }
            claimed.push((m.start(), m.end()));

            let value = m.as_str().trim().to_string();
            let score = if value.to_lowercase().contains("mg") { 1.0 } else { 0.0 };
            candidates.push(FieldCandidate {
                field_name: "dosage",
                raw_value: value,
                score,
                first_seen_offset: m.start(),
            });
        }
    }

    candidates.sort_by_key(|c| c.first_seen_offset);
    candidates
}

/// First milligram dosage in the text, else the first dosage of any unit.
pub fn extract_dosage(text: &str) -> Option<String> {
    best_candidate(dosage_candidates(text)).map(|c| c.raw_value)
}

/// First line-scoped dosage-unit match, with repaired digits restored.
pub fn first_dosage_unit(line: &str) -> Option<String> {
    let caps = DOSAGE_UNIT.captures(line)?;
    let (whole, number) = (caps.get(0)?, caps.get(1)?);
    let digits: String = number
        .as_str()
        .chars()
        .map(|c| match c {
            'O' | 'o' => '0',
            'I' | 'i' => '1',
            other => other,
        })
        .collect();
    Some(format!("{digits}{}", &line[number.end()..whole.end()]).trim().to_string())
}

/// Canonical form of the first lexicon entry with a keyword present as a
/// whole word (optionally pluralized with `s`).
pub fn extract_form(text: &str, lexicon: &Lexicon) -> Option<String> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    lexicon
        .forms()
        .iter()
        .find(|entry| {
            entry.keywords.iter().any(|keyword| {
                let phrase: Vec<&str> = keyword.split_whitespace().collect();
                contains_phrase(&words, &phrase)
            })
        })
        .map(|entry| entry.form.clone())
}

pub fn extract_manufacturer(text: &str) -> Option<String> {
    MANUFACTURER_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        let value = caps[1]
            .trim()
            .trim_end_matches([',', '.', '-'])
            .trim();
        (value.chars().count() > MIN_MANUFACTURER_CHARS).then(|| value.to_string())
    })
}

/// Batch/lot number. Values without a digit ("Batch No: see box") are skipped.
pub fn extract_batch_no(text: &str) -> Option<String> {
    BATCH_PATTERN.captures_iter(text).find_map(|caps| {
        let value = caps[1].trim_end_matches('-');
        value
            .chars()
            .any(|c| c.is_ascii_digit())
            .then(|| value.to_string())
    })
}

/// Pack count rendered as `"<n> units"`.
pub fn extract_quantity(text: &str) -> Option<String> {
    QUANTITY_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(text))
        .map(|caps| format!("{} units", &caps[1]))
}

pub fn extract_storage(text: &str) -> Option<String> {
    STORAGE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|m| clean_clause(m.as_str()))
        .filter(|s| !s.is_empty())
}

/// Warning clauses in text order, de-duplicated, at most `max`.
pub fn extract_warnings(text: &str, max: usize) -> Vec<String> {
    let mut spans: Vec<(usize, usize)> = WARNING_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.find_iter(text).map(|m| (m.start(), m.end())))
        .collect();
    spans.sort();

    let mut claimed_until = 0;
    let mut seen = HashSet::new();
    let mut warnings = Vec::new();

    for (start, end) in spans {
        if warnings.len() >= max {
            break;
        }
        if start < claimed_until {
            continue;
        }
        claimed_until = end;

        let clause = clean_clause(&text[start..end]);
        if clause.is_empty() || !seen.insert(clause.to_lowercase()) {
            continue;
        }
        warnings.push(clause);
    }

    warnings
}

/// Usage directions printed on a label.
pub fn extract_label_instructions(text: &str) -> Option<String> {
    let verb_clause = TAKE_USE_APPLY.find_iter(text).find(|m| {
        let lower = m.as_str().to_lowercase();
        !NON_INSTRUCTION_PREFIXES.iter().any(|p| lower.starts_with(p))
    });
    if let Some(m) = verb_clause {
        return Some(clean_clause(m.as_str())).filter(|s| !s.is_empty());
    }

    if let Some(caps) = DIRECTIONS.captures(text) {
        return Some(clean_clause(&caps[1])).filter(|s| !s.is_empty());
    }

    DAILY_TIMES
        .find(text)
        .map(|m| clean_clause(m.as_str()))
        .filter(|s| !s.is_empty())
}

/// Strip surrounding whitespace and clause punctuation.
pub fn clean_clause(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '-'))
        .to_string()
}

fn contains_phrase(words: &[&str], phrase: &[&str]) -> bool {
    let Some((last, head)) = phrase.split_last() else {
        return false;
    };
    words.windows(phrase.len()).any(|window| {
        window[..head.len()] == *head && is_word_or_plural(window[head.len()], last)
    })
}

fn is_word_or_plural(word: &str, keyword: &str) -> bool {
    word == keyword || word.strip_suffix('s') == Some(keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Dosage ──────────────────────────────────────────────

    #[test]
    fn dosage_prefers_milligrams() {
        assert_eq!(extract_dosage("Syrup 5 ml contains 250 mg").as_deref(), Some("250 mg"));
    }

    #[test]
    fn dosage_falls_back_to_first_in_scan_order() {
        assert_eq!(extract_dosage("100 ml bottle, 2% w/v").as_deref(), Some("100 ml"));
        assert_eq!(extract_dosage("Vitamin D3 1000 IU").as_deref(), Some("1000 IU"));
    }

    #[test]
    fn first_milligram_dosage_wins() {
        assert_eq!(extract_dosage("500 mg and 125 mg").as_deref(), Some("500 mg"));
    }

    #[test]
    fn concentration_claims_span_before_bare_mg() {
        let found = dosage_candidates("Suspension 10 mg/ml");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].raw_value, "10 mg/ml");
    }

    #[test]
    fn decimal_dosages() {
        assert_eq!(extract_dosage("Levothyroxine 0.5 mcg").as_deref(), Some("0.5 mcg"));
        assert_eq!(first_dosage_unit("Cream 1.5% apply").as_deref(), Some("1.5%"));
    }

    #[test]
    fn line_dosage_restores_repaired_digits() {
        assert_eq!(first_dosage_unit("Amoxicillin 5OOmg").as_deref(), Some("500mg"));
        assert_eq!(first_dosage_unit("Ibuprofen 4OO mg").as_deref(), Some("400 mg"));
        assert_eq!(first_dosage_unit("Vitamin D 6OOOOIU").as_deref(), Some("60000IU"));
        assert!(first_dosage_unit("Omg").is_none());
    }

    #[test]
    fn no_dosage_is_none() {
        assert!(extract_dosage("Keep away from children").is_none());
        // "mg" glued to a word is not a unit
        assert!(extract_dosage("500mgx").is_none());
    }

    // ── Form ────────────────────────────────────────────────

    #[test]
    fn form_uses_lexicon_priority() {
        let lex = Lexicon::builtin();
        // Both tablet and syrup keywords present; tablet is earlier in the lexicon
        assert_eq!(extract_form("Syrup or Tablets", &lex).as_deref(), Some("tablet"));
        assert_eq!(extract_form("Cough Syrup 100 ml", &lex).as_deref(), Some("syrup"));
    }

    #[test]
    fn form_matches_whole_words_with_plural() {
        let lex = Lexicon::builtin();
        assert_eq!(extract_form("10 Tabs", &lex).as_deref(), Some("tablet"));
        assert_eq!(extract_form("Eye Drops 10 ml", &lex).as_deref(), Some("drops"));
        // "cap" inside "capital" is not a capsule
        assert!(extract_form("Capital Pharma", &lex).is_none());
    }

    #[test]
    fn form_multi_word_keyword() {
        let forms = vec![crate::pipeline::lexicon::FormEntry {
            form: "nasal spray".into(),
            keywords: vec!["nasal spray".into()],
        }];
        let lex = Lexicon::new(Vec::new(), Vec::new(), forms);
        assert_eq!(extract_form("Otrivin Nasal Sprays", &lex).as_deref(), Some("nasal spray"));
        assert!(extract_form("Nasal congestion spray", &lex).is_none());
    }

    // ── Manufacturer ────────────────────────────────────────

    #[test]
    fn manufacturer_after_marker() {
        let text = "Manufactured by: Sun Pharma Laboratories Ltd, Mumbai";
        assert_eq!(
            extract_manufacturer(text).as_deref(),
            Some("Sun Pharma Laboratories Ltd")
        );
    }

    #[test]
    fn manufacturer_by_company_suffix() {
        let text = "Crocin\nGSK Pharmaceuticals\nExp 12/2026";
        assert_eq!(extract_manufacturer(text).as_deref(), Some("GSK Pharmaceuticals"));
    }

    #[test]
    fn manufacturer_strips_trailing_punctuation() {
        assert_eq!(
            extract_manufacturer("Company: Acme Labs.").as_deref(),
            Some("Acme Labs")
        );
    }

    #[test]
    fn short_manufacturer_is_rejected() {
        assert!(extract_manufacturer("Company: AB").is_none());
    }

    // ── Batch ───────────────────────────────────────────────

    #[test]
    fn batch_variants() {
        assert_eq!(extract_batch_no("Batch No: AB4521").as_deref(), Some("AB4521"));
        assert_eq!(extract_batch_no("B.No. X12-7").as_deref(), Some("X12-7"));
        assert_eq!(extract_batch_no("Lot#45").as_deref(), Some("45"));
        assert_eq!(extract_batch_no("Batch Number 778").as_deref(), Some("778"));
    }

    #[test]
    fn batch_requires_a_digit() {
        assert!(extract_batch_no("Batch No: see carton").is_none());
        assert_eq!(
            extract_batch_no("Lot: see carton. Batch 9981").as_deref(),
            Some("9981")
        );
    }

    // ── Quantity ────────────────────────────────────────────

    #[test]
    fn quantity_renders_units() {
        assert_eq!(extract_quantity("Strip of 10 Tablets").as_deref(), Some("10 units"));
        assert_eq!(extract_quantity("100 ml bottle").as_deref(), Some("100 units"));
        assert_eq!(extract_quantity("Pack of 30").as_deref(), Some("30 units"));
        assert!(extract_quantity("Paracetamol 500 mg").is_none());
    }

    #[test]
    fn quantity_pattern_order_beats_text_order() {
        // pieces appear first in the text, but tablets is the earlier pattern
        assert_eq!(extract_quantity("4 pieces, 20 tablets").as_deref(), Some("20 units"));
    }

    // ── Storage / warnings ──────────────────────────────────

    #[test]
    fn storage_clause_to_full_stop() {
        let text = "Store in a cool, dry place. Protect from light.";
        assert_eq!(extract_storage(text).as_deref(), Some("Store in a cool, dry place"));
        assert_eq!(
            extract_storage("Keep out of reach of children").as_deref(),
            Some("Keep out of reach of children")
        );
        assert!(extract_storage("Paracetamol").is_none());
    }

    #[test]
    fn warnings_in_text_order_capped() {
        let text = "Avoid alcohol. Warning: may cause drowsiness. Do not drive. \
                    Caution: not for children. Avoid sunlight.";
        let warnings = extract_warnings(text, 3);
        assert_eq!(
            warnings,
            ["Avoid alcohol", "Warning: may cause drowsiness", "Do not drive"]
        );
    }

    #[test]
    fn overlapping_and_duplicate_warnings_collapse() {
        let text = "Warning: do not exceed dose.\nDo not exceed dose.\nDO NOT EXCEED DOSE.";
        let warnings = extract_warnings(text, 3);
        assert_eq!(warnings, ["Warning: do not exceed dose", "Do not exceed dose"]);
    }

    #[test]
    fn no_warnings_is_empty() {
        assert!(extract_warnings("Paracetamol 500 mg", 3).is_empty());
        assert!(extract_warnings("Avoid alcohol", 0).is_empty());
    }

    // ── Instructions ────────────────────────────────────────

    #[test]
    fn instruction_verbs_skip_date_phrases() {
        let text = "Use by 12/2026\nTake one tablet after food.";
        assert_eq!(
            extract_label_instructions(text).as_deref(),
            Some("Take one tablet after food")
        );
    }

    #[test]
    fn directions_marker() {
        assert_eq!(
            extract_label_instructions("Directions: as advised by physician").as_deref(),
            Some("as advised by physician")
        );
    }

    #[test]
    fn daily_frequency_as_instructions() {
        assert_eq!(
            extract_label_instructions("Twice daily after meals").as_deref(),
            Some("Twice daily after meals")
        );
        assert!(extract_label_instructions("Use before 05/2026").is_none());
    }

    #[test]
    fn clean_clause_trims_edges_only() {
        assert_eq!(clean_clause(" - keep dry, cool. "), "keep dry, cool");
    }
}
