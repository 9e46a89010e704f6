//! Scan orchestration boundary.
//!
//! Single entry point that drives one scan:
//! validate → normalize → {label assembly | prescription segmentation}.
//!
//! Extractors never fail; the only faults are malformed or out-of-range
//! input, caught here and turned into a degenerate record carrying the error
//! text. Callers always get a well-formed [`ScanOutcome`].

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::PipelineConfig;
use crate::models::{
    ExpiryStatus, MedicineRecord, PrescriptionRecord, RawScanInput, ScanKind, ScanOutcome,
};

use super::assembler::assemble_label;
use super::expiry::ExpiryCalculator;
use super::lexicon::Lexicon;
use super::normalize::{normalize, NormalizedText};
use super::prescription::segment_prescription;

/// Pipeline faults. Field absence is never one of these.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Malformed scan input: {0}")]
    MalformedInput(String),

    #[error("Engine confidence {0} is outside [0, 1]")]
    InvalidConfidence(f32),

    #[error("Scan text has {chars} characters, limit is {limit}")]
    InputTooLarge { chars: usize, limit: usize },
}

/// Shared, immutable extraction pipeline.
///
/// Holds the lexicon and clock behind `Arc`s, so one instance can serve
/// concurrent scans from any number of threads.
pub struct ScanPipeline {
    lexicon: Arc<Lexicon>,
    clock: Arc<dyn Clock + Send + Sync>,
    config: PipelineConfig,
}

impl ScanPipeline {
    pub fn new(lexicon: Arc<Lexicon>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            lexicon,
            clock,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Process one scan. Faults become a degenerate record of the requested kind.
    pub fn process(&self, input: &RawScanInput) -> ScanOutcome {
        match self.try_process(input) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    engine_id = %input.engine_id,
                    scan_kind = input.scan_kind.as_str(),
                    error = %e,
                    "Scan rejected"
                );
                ScanOutcome::degenerate(input.scan_kind, e.to_string())
            }
        }
    }

    /// Process a JSON-encoded [`RawScanInput`].
    pub fn process_json(&self, json: &str) -> ScanOutcome {
        match serde_json::from_str::<RawScanInput>(json) {
            Ok(input) => self.process(&input),
            Err(e) => {
                let kind = requested_kind(json);
                let error = ScanError::MalformedInput(e.to_string());
                tracing::warn!(scan_kind = kind.as_str(), error = %error, "Scan rejected");
                ScanOutcome::degenerate(kind, error.to_string())
            }
        }
    }

    /// Validate and dispatch, surfacing faults to the caller.
    pub fn try_process(&self, input: &RawScanInput) -> Result<ScanOutcome, ScanError> {
        validate_input(input, &self.config)?;

        tracing::info!(
            engine_id = %input.engine_id,
            scan_kind = input.scan_kind.as_str(),
            text_chars = input.text.chars().count(),
            "Scan started"
        );

        let text = normalize(&input.text);
        let outcome = match input.scan_kind {
            ScanKind::Label => ScanOutcome::Label(self.extract_label(&text)),
            ScanKind::Prescription => ScanOutcome::Prescription(
                self.extract_prescription(&text, input.engine_confidence),
            ),
        };

        tracing::info!(
            scan_kind = outcome.kind().as_str(),
            confidence = outcome.confidence(),
            "Scan finished"
        );

        Ok(outcome)
    }

    pub fn extract_label(&self, text: &NormalizedText) -> MedicineRecord {
        assemble_label(text, &self.lexicon, self.clock.as_ref(), &self.config)
    }

    pub fn extract_prescription(
        &self,
        text: &NormalizedText,
        engine_confidence: f32,
    ) -> PrescriptionRecord {
        segment_prescription(text, engine_confidence)
    }

    /// Grade a label's expiry against this pipeline's clock and horizon.
    pub fn expiry_status(&self, record: &MedicineRecord) -> Option<ExpiryStatus> {
        let expiry = record.expiry_date?;
        let calculator = ExpiryCalculator::new(self.clock.as_ref(), self.config.expiring_soon_days);
        Some(calculator.status(expiry))
    }
}

impl Default for ScanPipeline {
    /// Built-in lexicon, wall clock, default limits.
    fn default() -> Self {
        Self::new(Arc::new(Lexicon::builtin()), Arc::new(SystemClock))
    }
}

fn validate_input(input: &RawScanInput, config: &PipelineConfig) -> Result<(), ScanError> {
    let confidence = input.engine_confidence;
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(ScanError::InvalidConfidence(confidence));
    }

    let chars = input.text.chars().count();
    if chars > config.max_input_chars {
        return Err(ScanError::InputTooLarge {
            chars,
            limit: config.max_input_chars,
        });
    }

    Ok(())
}

/// Best-effort read of `scan_kind` from JSON that failed full decoding.
fn requested_kind(json: &str) -> ScanKind {
    serde_json::from_str::<serde_json::Value>(json)
        .ok()
        .and_then(|value| value.get("scan_kind")?.as_str()?.parse().ok())
        .unwrap_or_default()
}
