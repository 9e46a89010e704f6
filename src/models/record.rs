use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::pipeline::expiry;

/// Structured result of a medicine label scan.
///
/// Every field is optional: `None` means "not detected", never a failure.
/// `days_until_expiry` is a snapshot taken when the record was assembled;
/// consumers that hold a record over time should call
/// [`MedicineRecord::days_until_expiry_at`] instead of trusting the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicineRecord {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub form: Option<String>,
    pub manufacturer: Option<String>,
    pub batch_no: Option<String>,
    pub mfg_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub quantity: Option<String>,
    pub instructions: Option<String>,
    pub warnings: Vec<String>,
    pub storage_instructions: Option<String>,
    #[serde(skip_deserializing)]
    pub days_until_expiry: Option<i64>,
    pub confidence: f32,
    pub validated: bool,
    /// Set only on degenerate records produced by a pipeline fault.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MedicineRecord {
    /// All fields absent, confidence 0.0, carrying the fault description.
    pub fn degenerate(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Recompute the signed day offset to expiry against `now`.
    pub fn days_until_expiry_at(&self, now: NaiveDateTime) -> Option<i64> {
        self.expiry_date
            .map(|date| expiry::days_until_expiry(date, now))
    }

    /// Recompute the signed day offset to expiry against a clock.
    pub fn days_until_expiry_with(&self, clock: &dyn Clock) -> Option<i64> {
        self.days_until_expiry_at(clock.now())
    }
}

/// One medicine entry on a prescription, scoped to a single line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicineLineRecord {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub instructions: Option<String>,
}

/// Structured result of a prescription scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub prescription_date: Option<NaiveDate>,
    pub clinic: Option<String>,
    pub medicines: Vec<MedicineLineRecord>,
    pub general_instructions: Vec<String>,
    /// Engine-reported confidence, clamped to [0, 1].
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PrescriptionRecord {
    pub fn degenerate(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn degenerate_record_is_empty_with_marker() {
        let record = MedicineRecord::degenerate("boom");
        assert!(record.name.is_none());
        assert!(record.expiry_date.is_none());
        assert!(record.warnings.is_empty());
        assert_eq!(record.confidence, 0.0);
        assert!(!record.validated);
        assert_eq!(record.error.as_deref(), Some("boom"));
    }

    #[test]
    fn dates_serialize_as_canonical_strings() {
        let record = MedicineRecord {
            expiry_date: NaiveDate::from_ymd_opt(2025, 3, 5),
            ..MedicineRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["expiry_date"], "2025-03-05");
        assert!(json.get("error").is_none(), "error omitted when absent");
    }

    #[test]
    fn days_until_expiry_is_recomputed_not_stored() {
        let mut record = MedicineRecord {
            expiry_date: NaiveDate::from_ymd_opt(2025, 3, 10),
            ..MedicineRecord::default()
        };
        record.days_until_expiry = Some(999);
        // Noon on the 5th: 4.5 days to midnight on the 10th, floored.
        assert_eq!(record.days_until_expiry_at(noon(2025, 3, 5)), Some(4));
        let clock = FixedClock::new(noon(2025, 3, 12));
        assert_eq!(record.days_until_expiry_with(&clock), Some(-3));
    }

    #[test]
    fn stored_day_count_is_ignored_on_deserialize() {
        let json = r#"{"name":"Aspirin","dosage":null,"form":null,"manufacturer":null,
            "batch_no":null,"mfg_date":null,"expiry_date":"2030-01-01","quantity":null,
            "instructions":null,"warnings":[],"storage_instructions":null,
            "days_until_expiry":12345,"confidence":0.5,"validated":true}"#;
        let record: MedicineRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.days_until_expiry, None);
        assert_eq!(record.expiry_date, NaiveDate::from_ymd_opt(2030, 1, 1));
    }
}
