use crate::clock::Clock;
use crate::config::PipelineConfig;
use crate::models::{DateClass, MedicineRecord};

use super::confidence::label_confidence;
use super::dates::resolve_dates;
use super::expiry::days_until_expiry;
use super::fields;
use super::lexicon::Lexicon;
use super::name_scoring::{select_name, NameScoreWeights};
use super::normalize::NormalizedText;

/// Build a label record from normalized text.
///
/// `validated` only means the name is in the lexicon; unlisted real
/// medicines come out `false`. `days_until_expiry` is computed against
/// `clock` at assembly time.
pub fn assemble_label(
    text: &NormalizedText,
    lexicon: &Lexicon,
    clock: &dyn Clock,
    config: &PipelineConfig,
) -> MedicineRecord {
    let body = text.text();
    let dates = resolve_dates(body);

    let name = select_name(body, lexicon, &NameScoreWeights::default()).map(|c| c.raw_value);
    let validated = name
        .as_deref()
        .is_some_and(|n| lexicon.is_known_medicine(n));
    let expiry_date = dates.first_normalized(DateClass::Expiry);

    let mut record = MedicineRecord {
        name,
        dosage: fields::extract_dosage(body),
        form: fields::extract_form(body, lexicon),
        manufacturer: fields::extract_manufacturer(body),
        batch_no: fields::extract_batch_no(body),
        mfg_date: dates.first_normalized(DateClass::Manufacturing),
        expiry_date,
        quantity: fields::extract_quantity(body),
        instructions: fields::extract_label_instructions(body),
        warnings: fields::extract_warnings(body, config.max_warnings),
        storage_instructions: fields::extract_storage(body),
        days_until_expiry: expiry_date.map(|date| days_until_expiry(date, clock.now())),
        confidence: 0.0,
        validated,
        error: None,
    };
    record.confidence = label_confidence(&record, text.char_len());

    tracing::debug!(
        validated = record.validated,
        has_expiry = record.expiry_date.is_some(),
        warnings = record.warnings.len(),
        confidence = record.confidence,
        "Assembled label record"
    );

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::pipeline::normalize::normalize;
    use chrono::NaiveDate;

    const LABEL: &str = "PARACETAMOL TABLETS IP
Paracetamol 500 mg
Batch No: AB4521
Mfg: 01/02/2024
Manufactured by: Cipla Ltd, Mumbai
Exp: 31/01/2027
Strip of 10 Tablets
Store below 25 C.
Warning: Do not exceed the recommended dose.
Take one tablet twice daily after food.";

    fn make_clock(y: i32, m: u32, d: u32) -> FixedClock {
        FixedClock::at_start_of(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn assemble(raw: &str, clock: &FixedClock) -> MedicineRecord {
        assemble_label(
            &normalize(raw),
            &Lexicon::builtin(),
            clock,
            &PipelineConfig::default(),
        )
    }

    #[test]
    fn full_label_populates_every_field() {
        let record = assemble(LABEL, &make_clock(2027, 1, 21));

        assert_eq!(record.name.as_deref(), Some("PARACETAMOL"));
        assert!(record.validated);
        assert_eq!(record.dosage.as_deref(), Some("500 mg"));
        assert_eq!(record.form.as_deref(), Some("tablet"));
        assert_eq!(record.manufacturer.as_deref(), Some("Cipla Ltd"));
        // OCR repair turns the 1 in a mixed token into I
        assert_eq!(record.batch_no.as_deref(), Some("AB452I"));
        assert_eq!(record.mfg_date, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(record.expiry_date, NaiveDate::from_ymd_opt(2027, 1, 31));
        assert_eq!(record.days_until_expiry, Some(10));
        assert_eq!(record.quantity.as_deref(), Some("10 units"));
        assert_eq!(record.storage_instructions.as_deref(), Some("Store below 25 C"));
        assert_eq!(record.warnings, ["Warning: Do not exceed the recommended dose"]);
        assert_eq!(
            record.instructions.as_deref(),
            Some("Take one tablet twice daily after food")
        );
        assert_eq!(record.confidence, 1.0);
        assert!(record.error.is_none());
    }

    #[test]
    fn unknown_name_is_not_validated() {
        let record = assemble("Zerodol SP\nAceclofenac blend 100 mg", &make_clock(2025, 1, 1));
        assert!(record.name.is_some());
        assert!(!record.validated);
    }

    #[test]
    fn expired_label_has_negative_days() {
        let record = assemble("Aspirin 75 mg\nExp: 01/01/2025", &make_clock(2025, 3, 1));
        assert_eq!(record.days_until_expiry, Some(-59));
    }

    #[test]
    fn empty_text_gives_empty_record() {
        let record = assemble("", &make_clock(2025, 1, 1));
        assert_eq!(record, MedicineRecord::default());
    }

    #[test]
    fn warning_cap_follows_config() {
        let config = PipelineConfig {
            max_warnings: 1,
            ..PipelineConfig::default()
        };
        let record = assemble_label(
            &normalize("Avoid alcohol. Do not drive."),
            &Lexicon::builtin(),
            &make_clock(2025, 1, 1),
            &config,
        );
        assert_eq!(record.warnings, ["Avoid alcohol"]);
    }
}
