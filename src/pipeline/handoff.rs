//! Boundary with downstream collaborators.
//!
//! Finished records leave the pipeline through these traits: storage,
//! reminder scheduling and speech. Implementations live outside this crate;
//! records are handed over by reference and never modified here.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

use crate::models::{
    MedicineLineRecord, MedicineRecord, PrescriptionRecord, Recurrence, ScanOutcome,
};

use super::announce::spoken_outcome;

#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("{collaborator} rejected the record: {reason}")]
    Rejected {
        collaborator: &'static str,
        reason: String,
    },

    #[error("{0} is unavailable")]
    Unavailable(&'static str),
}

/// Persists finished scan outcomes. Returns the stored record's id.
pub trait RecordStore: Send + Sync {
    fn save(&self, outcome: &ScanOutcome) -> Result<String, HandoffError>;
}

/// Creates a recurring reminder from a finished record.
pub trait ReminderScheduler: Send + Sync {
    fn schedule(&self, request: &ReminderRequest) -> Result<(), HandoffError>;
}

/// Speaks or displays a summary sentence.
pub trait Announcer: Send + Sync {
    fn announce(&self, text: &str) -> Result<(), HandoffError>;
}

/// What a reminder collaborator needs to create one recurring reminder.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRequest {
    pub record: MedicineRecord,
    pub recurrence: Recurrence,
    pub time_of_day: NaiveTime,
}

impl ReminderRequest {
    /// Reminder for a scanned label; recurrence comes from its instructions.
    pub fn for_label(record: &MedicineRecord, time_of_day: NaiveTime) -> Self {
        let recurrence = record
            .instructions
            .as_deref()
            .map_or(Recurrence::Daily, suggest_recurrence);
        Self {
            record: record.clone(),
            recurrence,
            time_of_day,
        }
    }

    /// Reminder for one prescription line; recurrence comes from its frequency.
    pub fn for_line(line: &MedicineLineRecord, time_of_day: NaiveTime) -> Self {
        let recurrence = line
            .frequency
            .as_deref()
            .map_or(Recurrence::Daily, suggest_recurrence);
        Self {
            record: MedicineRecord {
                name: line.name.clone(),
                dosage: line.dosage.clone(),
                instructions: line.instructions.clone(),
                ..MedicineRecord::default()
            },
            recurrence,
            time_of_day,
        }
    }
}

static EVERY_N_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"every\s*(\d+)\s*hours?").unwrap());
static N_TIMES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*times?").unwrap());
static DOSE_GRID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-2])-([0-2])-([0-2])\b").unwrap());
static N_BY_M: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\s*x\s*(\d+)\b").unwrap());

/// Map an extracted frequency phrase to a recurrence token.
/// Phrases with no recognizable daily count map to [`Recurrence::Custom`].
pub fn suggest_recurrence(frequency: &str) -> Recurrence {
    let lower = frequency.to_lowercase();

    if lower.contains("week") {
        return Recurrence::Weekly;
    }
    if let Some(caps) = EVERY_N_HOURS.captures(&lower) {
        return match caps[1].parse::<u32>() {
            Ok(24) => Recurrence::Daily,
            Ok(12) => Recurrence::TwiceDaily,
            Ok(8) => Recurrence::ThreeTimesDaily,
            _ => Recurrence::Custom,
        };
    }
    if let Some(caps) = DOSE_GRID.captures(&lower) {
        let doses = (1..=3).filter(|&i| &caps[i] != "0").count();
        return per_day(doses);
    }
    if let Some(caps) = N_TIMES.captures(&lower) {
        return caps[1].parse().map_or(Recurrence::Custom, per_day);
    }
    if let Some(caps) = N_BY_M.captures(&lower) {
        return caps[1].parse().map_or(Recurrence::Custom, per_day);
    }
    if lower.contains("thrice") {
        return Recurrence::ThreeTimesDaily;
    }
    if lower.contains("twice") {
        return Recurrence::TwiceDaily;
    }
    if lower.contains("once") || lower.contains("daily") || lower.contains("a day") {
        return Recurrence::Daily;
    }
    Recurrence::Custom
}

fn per_day(count: usize) -> Recurrence {
    match count {
        1 => Recurrence::Daily,
        2 => Recurrence::TwiceDaily,
        3 => Recurrence::ThreeTimesDaily,
        _ => Recurrence::Custom,
    }
}

/// Submit one reminder per prescribed medicine. Stops at the first refusal.
/// Returns the number of reminders scheduled.
pub fn schedule_prescription(
    record: &PrescriptionRecord,
    scheduler: &dyn ReminderScheduler,
    time_of_day: NaiveTime,
) -> Result<usize, HandoffError> {
    for line in &record.medicines {
        scheduler.schedule(&ReminderRequest::for_line(line, time_of_day))?;
    }
    tracing::info!(reminders = record.medicines.len(), "Prescription reminders scheduled");
    Ok(record.medicines.len())
}

/// Store an outcome, then announce its spoken summary.
/// A failed announcement does not undo the save.
pub fn deliver(
    outcome: &ScanOutcome,
    store: &dyn RecordStore,
    announcer: &dyn Announcer,
) -> Result<String, HandoffError> {
    let id = store.save(outcome)?;
    if let Err(e) = announcer.announce(&spoken_outcome(outcome)) {
        tracing::warn!(record_id = %id, error = %e, "Announcement failed");
    }
    Ok(id)
}
