use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "MediScan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable that points at a lexicon JSON file.
pub const LEXICON_ENV: &str = "MEDISCAN_LEXICON";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "mediscan=info,mediscan_lib=info"
}

/// Get the application data directory.
/// ~/MediScan/ on all platforms. Falls back to the working directory when
/// no home directory can be determined (containers, CI).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Resolve the lexicon file location: `MEDISCAN_LEXICON` wins, otherwise
/// `<app_data_dir>/lexicon.json`.
pub fn lexicon_path() -> PathBuf {
    lexicon_path_from(std::env::var_os(LEXICON_ENV).map(PathBuf::from))
}

fn lexicon_path_from(override_path: Option<PathBuf>) -> PathBuf {
    override_path.unwrap_or_else(|| app_data_dir().join("lexicon.json"))
}

/// Runtime limits for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Inputs longer than this (in chars) are rejected at the orchestration boundary.
    pub max_input_chars: usize,
    /// Upper bound on warning clauses kept per label.
    pub max_warnings: usize,
    /// Days ahead (inclusive) in which a medicine counts as expiring soon.
    pub expiring_soon_days: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 100_000,
            max_warnings: 3,
            expiring_soon_days: 7,
        }
    }
}
