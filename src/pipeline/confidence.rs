use crate::models::MedicineRecord;

/// Additive signal weights for label confidence
pub mod weights {
    pub const NAME: f32 = 0.3;
    pub const DOSAGE: f32 = 0.2;
    pub const EXPIRY: f32 = 0.2;
    pub const BATCH: f32 = 0.1;
    pub const MANUFACTURER: f32 = 0.1;

    /// Normalized text longer than [`MIN_TEXT_CHARS`] characters.
    pub const TEXT_LENGTH: f32 = 0.1;

    pub const MIN_TEXT_CHARS: usize = 20;
}

/// Score a label record from field presence and text length.
/// Sum of the present signals, clamped to 1.0.
pub fn label_confidence(record: &MedicineRecord, normalized_chars: usize) -> f32 {
    let mut score: f32 = 0.0;

    if record.name.is_some() {
        score += weights::NAME;
    }
    if record.dosage.is_some() {
        score += weights::DOSAGE;
    }
    if record.expiry_date.is_some() {
        score += weights::EXPIRY;
    }
    if record.batch_no.is_some() {
        score += weights::BATCH;
    }
    if record.manufacturer.is_some() {
        score += weights::MANUFACTURER;
    }
    if normalized_chars > weights::MIN_TEXT_CHARS {
        score += weights::TEXT_LENGTH;
    }

    score.min(1.0)
}

/// Engine-reported confidence for prescriptions. Out-of-range values clamp
/// into [0, 1]; empty text always scores 0.0.
pub fn prescription_confidence(engine_confidence: f32, text_is_empty: bool) -> f32 {
    if text_is_empty || !engine_confidence.is_finite() {
        return 0.0;
    }
    engine_confidence.clamp(0.0, 1.0)
}
