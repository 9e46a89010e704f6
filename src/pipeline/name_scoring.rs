//! Medicine name selection by candidate scoring.
//!
//! Candidates come from capitalized word runs and ALL-CAPS words. Each is
//! scored by [`score_name`] with the weights in [`NameScoreWeights`]; the
//! highest score wins and ties go to the candidate seen first in the text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::lexicon::Lexicon;

/// Substrings that hint a token names a dosage form ("Crocin Tab", "Benadryl Syrup").
pub const FORM_HINTS: &[&str] = &["tab", "cap", "syrup", "inj"];

/// Candidates shorter than this (in chars) are discarded.
pub const MIN_NAME_CHARS: usize = 3;

/// Tunable weights for [`score_name`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameScoreWeights {
    /// Lowercase candidate is a key in the medicine lexicon.
    pub lexicon_hit: f32,
    /// Candidate is followed later in the text by an `<n> mg` dosage.
    pub dosage_follows: f32,
    /// Added per character of the candidate.
    pub per_char: f32,
    /// Candidate contains one of [`FORM_HINTS`].
    pub form_hint: f32,
}

impl Default for NameScoreWeights {
    fn default() -> Self {
        Self {
            lexicon_hit: 10.0,
            dosage_follows: 5.0,
            per_char: 0.1,
            form_hint: 2.0,
        }
    }
}

/// A provisional field value with its score and first text offset.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCandidate {
    pub field_name: &'static str,
    pub raw_value: String,
    pub score: f32,
    pub first_seen_offset: usize,
}

static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Capitalized word runs: "Paracetamol", "Co-Amoxiclav", "Vitamin Bcomplex"
        Regex::new(r"\b[A-Z][a-z]+(?:[- ][A-Z][a-z]+)*\b").unwrap(),
        // ALL-CAPS words, optionally trailing lowercase
        Regex::new(r"\b[A-Z]{2,}[a-z]*\b").unwrap(),
    ]
});

static ROMAN_NUMERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[IVX]+$").unwrap());

static MG_DOSAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\s*mg").unwrap());

/// Generate unscored name candidates in text order, deduplicated case-insensitively.
pub fn name_candidates(text: &str, lexicon: &Lexicon) -> Vec<FieldCandidate> {
    let mut found: Vec<(usize, &str)> = Vec::new();

    for pattern in NAME_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            let (skip, trimmed) = trim_edge_stopwords(m.as_str(), lexicon);
            if is_plausible_name(trimmed, lexicon) {
                found.push((m.start() + skip, trimmed));
            }
        }
    }

    found.sort_by_key(|(offset, _)| *offset);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter(|(_, value)| seen.insert(value.to_lowercase()))
        .map(|(offset, value)| FieldCandidate {
            field_name: "name",
            raw_value: value.to_string(),
            score: 0.0,
            first_seen_offset: offset,
        })
        .collect()
}

/// Score one name candidate against the full text.
pub fn score_name(
    candidate: &str,
    text: &str,
    lexicon: &Lexicon,
    weights: &NameScoreWeights,
) -> f32 {
    let mut score = 0.0;

    if lexicon.is_known_medicine(candidate) {
        score += weights.lexicon_hit;
    }
    if dosage_follows(candidate, text) {
        score += weights.dosage_follows;
    }
    score += weights.per_char * candidate.chars().count() as f32;

    let lower = candidate.to_lowercase();
    if FORM_HINTS.iter().any(|hint| lower.contains(hint)) {
        score += weights.form_hint;
    }

    score
}

/// Highest-scoring candidate; ties keep the earliest offset.
pub fn select_name(
    text: &str,
    lexicon: &Lexicon,
    weights: &NameScoreWeights,
) -> Option<FieldCandidate> {
    let scored = name_candidates(text, lexicon).into_iter().map(|mut candidate| {
        candidate.score = score_name(&candidate.raw_value, text, lexicon, weights);
        candidate
    });

    let best = best_candidate(scored);
    if let Some(ref winner) = best {
        tracing::debug!(score = winner.score, offset = winner.first_seen_offset, "Selected name");
    }
    best
}

/// Maximum score wins; equal scores resolve to the lowest `first_seen_offset`.
pub fn best_candidate(
    candidates: impl IntoIterator<Item = FieldCandidate>,
) -> Option<FieldCandidate> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(b)
            if b.score > candidate.score
                || (b.score == candidate.score
                    && b.first_seen_offset <= candidate.first_seen_offset) =>
        {
            Some(b)
        }
        _ => Some(candidate),
    })
}

/// True when the candidate occurs (case-insensitively) with `<n> mg` somewhere after it.
fn dosage_follows(candidate: &str, text: &str) -> bool {
    let haystack = text.to_ascii_lowercase();
    let needle = candidate.to_ascii_lowercase();
    haystack
        .find(&needle)
        .is_some_and(|pos| MG_DOSAGE.is_match(&haystack[pos + needle.len()..]))
}

/// Drop stoplisted words from either end of a word run ("Paracetamol Tablets" → "Paracetamol").
/// Returns the byte offset of the kept part within `run`.
fn trim_edge_stopwords<'t>(run: &'t str, lexicon: &Lexicon) -> (usize, &'t str) {
    let mut start = 0;
    let mut end = run.len();

    while let Some((head, _)) = run[start..end].split_once(' ') {
        if !lexicon.is_stopword(head) {
            break;
        }
        start += head.len() + 1;
    }
    while let Some((_, tail)) = run[start..end].rsplit_once(' ') {
        if !lexicon.is_stopword(tail) {
            break;
        }
        end -= tail.len() + 1;
    }

    (start, &run[start..end])
}

fn is_plausible_name(value: &str, lexicon: &Lexicon) -> bool {
    value.chars().count() >= MIN_NAME_CHARS
        && !lexicon.is_stopword(value)
        && !value.chars().all(|c| c.is_ascii_digit())
        && !ROMAN_NUMERAL.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::builtin()
    }

    fn names(text: &str) -> Vec<String> {
        name_candidates(text, &lexicon())
            .into_iter()
            .map(|c| c.raw_value)
            .collect()
    }

    #[test]
    fn lexicon_name_beats_brand_name() {
        let text = "Panadol\nParacetamol 500 mg Tablets";
        let weights = NameScoreWeights::default();
        let lex = lexicon();
        let winner = select_name(text, &lex, &weights).unwrap();
        assert_eq!(winner.raw_value, "Paracetamol");
        assert!(winner.score >= 15.0, "got {}", winner.score);

        let panadol = score_name("Panadol", text, &lex, &weights);
        assert!(panadol < winner.score);
    }

    #[test]
    fn score_components_add_up() {
        let lex = lexicon();
        let w = NameScoreWeights::default();
        // lexicon 10 + dosage 5 + 11 chars * 0.1
        let s = score_name("Paracetamol", "Paracetamol 500 mg", &lex, &w);
        assert!((s - 16.1).abs() < 1e-4, "got {s}");
        // 6 chars * 0.1 + form hint 2
        let s = score_name("Crotab", "Crotab", &lex, &w);
        assert!((s - 2.6).abs() < 1e-4, "got {s}");
    }

    #[test]
    fn dosage_must_follow_candidate() {
        let lex = lexicon();
        let w = NameScoreWeights::default();
        let before = score_name("Zentel", "400 mg Zentel", &lex, &w);
        let after = score_name("Zentel", "Zentel 400 mg", &lex, &w);
        assert!((after - before - 5.0).abs() < 1e-4);
    }

    #[test]
    fn tie_goes_to_first_seen() {
        // A capitalized run on one line is a single candidate
        let winner = select_name("Zorvex Quilam", &lexicon(), &NameScoreWeights::default());
        assert_eq!(winner.unwrap().raw_value, "Zorvex Quilam");

        // Equal scores on separate lines
        let winner = select_name("Zorvex\nQuilam", &lexicon(), &NameScoreWeights::default());
        let winner = winner.unwrap();
        assert_eq!(winner.raw_value, "Zorvex");
        assert_eq!(winner.first_seen_offset, 0);
    }

    #[test]
    fn filters_short_numeric_roman_and_stoplisted() {
        let found = names("IP USP XIV Tablets Mumbai 500 Ltd Amlodipine");
        assert_eq!(found, ["USP", "Amlodipine"]);
    }

    #[test]
    fn caps_words_are_candidates() {
        assert_eq!(names("PARACETAMOL TABLETS"), ["PARACETAMOL"]);
    }

    #[test]
    fn edge_stopwords_are_trimmed_from_runs() {
        let found = name_candidates("Batch Crocin Tablets", &lexicon());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].raw_value, "Crocin");
        assert_eq!(found[0].first_seen_offset, 6);
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let found = name_candidates("ASPIRIN\nAspirin 75 mg", &lexicon());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].raw_value, "ASPIRIN");
        assert_eq!(found[0].first_seen_offset, 0);
    }

    #[test]
    fn no_candidates_means_no_name() {
        assert!(select_name("", &lexicon(), &NameScoreWeights::default()).is_none());
        assert!(select_name("500 mg 10/2025", &lexicon(), &NameScoreWeights::default()).is_none());
    }

    #[test]
    fn best_candidate_ignores_input_order() {
        let make = |value: &str, score: f32, offset: usize| FieldCandidate {
            field_name: "name",
            raw_value: value.to_string(),
            score,
            first_seen_offset: offset,
        };
        let forward = vec![make("A", 1.0, 4), make("B", 1.0, 2), make("C", 0.5, 0)];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(best_candidate(forward).unwrap().raw_value, "B");
        assert_eq!(best_candidate(reversed).unwrap().raw_value, "B");
        assert!(best_candidate(Vec::new()).is_none());
    }

    #[test]
    fn custom_weights_change_the_winner() {
        let text = "Panadol Extra\nParacetamol";
        let lex = lexicon();
        let default_pick = select_name(text, &lex, &NameScoreWeights::default()).unwrap();
        assert_eq!(default_pick.raw_value, "Paracetamol");

        let no_lexicon = NameScoreWeights {
            lexicon_hit: 0.0,
            ..NameScoreWeights::default()
        };
        let pick = select_name(text, &lex, &no_lexicon).unwrap();
        assert_eq!(pick.raw_value, "Panadol Extra");
    }
}
