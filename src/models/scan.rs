use serde::{Deserialize, Serialize};

use super::enums::ScanKind;
use super::record::{MedicineRecord, PrescriptionRecord};

/// Text handed over by the OCR collaborator for one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScanInput {
    pub text: String,
    /// Engine-reported confidence in [0, 1].
    pub engine_confidence: f32,
    #[serde(default)]
    pub engine_id: String,
    #[serde(default)]
    pub scan_kind: ScanKind,
}

impl RawScanInput {
    pub fn label(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            engine_confidence: 1.0,
            engine_id: String::new(),
            scan_kind: ScanKind::Label,
        }
    }

    pub fn prescription(text: impl Into<String>) -> Self {
        Self {
            scan_kind: ScanKind::Prescription,
            ..Self::label(text)
        }
    }

    pub fn with_engine(mut self, engine_id: impl Into<String>, confidence: f32) -> Self {
        self.engine_id = engine_id.into();
        self.engine_confidence = confidence;
        self
    }
}

/// Finished record for one scan, tagged by scan kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scan_kind", rename_all = "snake_case")]
pub enum ScanOutcome {
    Label(MedicineRecord),
    Prescription(PrescriptionRecord),
}

impl ScanOutcome {
    pub fn kind(&self) -> ScanKind {
        match self {
            Self::Label(_) => ScanKind::Label,
            Self::Prescription(_) => ScanKind::Prescription,
        }
    }

    /// Degenerate record of the requested kind carrying `error`.
    pub fn degenerate(kind: ScanKind, error: impl Into<String>) -> Self {
        match kind {
            ScanKind::Label => Self::Label(MedicineRecord::degenerate(error)),
            ScanKind::Prescription => Self::Prescription(PrescriptionRecord::degenerate(error)),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Label(r) => r.error.as_deref(),
            Self::Prescription(r) => r.error.as_deref(),
        }
    }

    pub fn confidence(&self) -> f32 {
        match self {
            Self::Label(r) => r.confidence,
            Self::Prescription(r) => r.confidence,
        }
    }

    pub fn as_label(&self) -> Option<&MedicineRecord> {
        match self {
            Self::Label(r) => Some(r),
            Self::Prescription(_) => None,
        }
    }

    pub fn as_prescription(&self) -> Option<&PrescriptionRecord> {
        match self {
            Self::Prescription(r) => Some(r),
            Self::Label(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_defaults_engine_and_kind() {
        let input: RawScanInput =
            serde_json::from_str(r#"{"text":"Aspirin","engine_confidence":0.8}"#).unwrap();
        assert_eq!(input.engine_id, "");
        assert_eq!(input.scan_kind, ScanKind::Label);
    }

    #[test]
    fn outcome_is_tagged_by_scan_kind() {
        let outcome = ScanOutcome::degenerate(ScanKind::Prescription, "bad input");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["scan_kind"], "prescription");
        assert_eq!(json["error"], "bad input");
        assert_eq!(outcome.kind(), ScanKind::Prescription);
        assert!(outcome.as_label().is_none());
    }

    #[test]
    fn builders_set_kind_and_engine() {
        let input = RawScanInput::prescription("Rx").with_engine("tesseract", 0.42);
        assert_eq!(input.scan_kind, ScanKind::Prescription);
        assert_eq!(input.engine_id, "tesseract");
        assert!((input.engine_confidence - 0.42).abs() < f32::EPSILON);
    }
}
