//! Command-line front end: one scan per invocation, JSON on stdout.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::Parser;
use thiserror::Error;

use crate::clock::{Clock, FixedClock, SystemClock};
use crate::config;
use crate::models::{ExpiryStatus, RawScanInput, ScanKind, ScanOutcome};
use crate::pipeline::announce::{expiry_notice_at, speech_friendly, spoken_outcome};
use crate::pipeline::{Lexicon, ScanPipeline};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Parser)]
#[command(
    name = "mediscan",
    version,
    about = "Extract medicine label and prescription records from OCR text"
)]
pub struct Cli {
    /// OCR text file. Reads stdin when omitted.
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Treat the text as a prescription instead of a medicine label
    #[arg(long)]
    pub prescription: bool,

    /// Identifier of the OCR engine that produced the text
    #[arg(long, value_name = "ID", default_value = "")]
    pub engine_id: String,

    /// Engine-reported confidence in [0, 1]
    #[arg(long, value_name = "F", default_value_t = 1.0)]
    pub engine_confidence: f32,

    /// Pin "today" for expiry arithmetic (reproducible output)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,

    /// Lexicon JSON file (default: $MEDISCAN_LEXICON or ~/MediScan/lexicon.json)
    #[arg(long, value_name = "FILE")]
    pub lexicon: Option<PathBuf>,

    /// Print the spoken summary instead of JSON
    #[arg(long)]
    pub summary: bool,
}

impl Cli {
    fn scan_input(&self, text: String) -> RawScanInput {
        RawScanInput {
            text,
            engine_confidence: self.engine_confidence,
            engine_id: self.engine_id.clone(),
            scan_kind: if self.prescription {
                ScanKind::Prescription
            } else {
                ScanKind::Label
            },
        }
    }

    fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        match self.today {
            Some(date) => Arc::new(FixedClock::at_start_of(date)),
            None => Arc::new(SystemClock),
        }
    }
}

/// Run one scan and render the result.
pub fn execute(cli: &Cli) -> Result<String, CliError> {
    let text = match &cli.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let lexicon_path = cli.lexicon.clone().unwrap_or_else(config::lexicon_path);
    let lexicon = Arc::new(Lexicon::load_or_builtin(&lexicon_path));
    let pipeline = ScanPipeline::new(lexicon, cli.clock());

    let outcome = pipeline.process(&cli.scan_input(text));

    if cli.summary {
        let mut spoken = spoken_outcome(&outcome);
        if let ScanOutcome::Label(record) = &outcome {
            let due = pipeline
                .expiry_status(record)
                .is_some_and(|status| status != ExpiryStatus::Valid);
            if let Some(notice) = expiry_notice_at(record, pipeline.clock().now()).filter(|_| due) {
                spoken.push(' ');
                spoken.push_str(&speech_friendly(&notice));
            }
        }
        Ok(spoken)
    } else {
        Ok(serde_json::to_string_pretty(&outcome)?)
    }
}
