//! Read-only lookup tables shared by every extraction call.
//!
//! A [`Lexicon`] is built once (from the built-in tables or a JSON file) and
//! then shared behind an `Arc`. Nothing mutates it after construction, so
//! concurrent scans read it without locking.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lexicon JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lexicon file lists no medicines")]
    Empty,
}

/// Lookup payload for a known medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineInfo {
    pub generic: String,
    pub category: String,
}

/// One dosage form and the keywords that signal it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormEntry {
    pub form: String,
    pub keywords: Vec<String>,
}

/// Known medicine names (lowercase) → generic name and category.
const BUILTIN_MEDICINES: &[(&str, &str, &str)] = &[
    ("paracetamol", "Acetaminophen", "Analgesic"),
    ("aspirin", "Acetylsalicylic acid", "NSAID"),
    ("ibuprofen", "Ibuprofen", "NSAID"),
    ("amoxicillin", "Amoxicillin", "Antibiotic"),
    ("ciprofloxacin", "Ciprofloxacin", "Antibiotic"),
    ("metformin", "Metformin", "Antidiabetic"),
    ("omeprazole", "Omeprazole", "PPI"),
    ("losartan", "Losartan", "ARB"),
    ("atorvastatin", "Atorvastatin", "Statin"),
];

/// Packaging, regulatory and location words that are never medicine names.
const BUILTIN_STOPLIST: &[&str] = &[
    "tablet", "tablets", "capsule", "capsules", "syrup", "suspension",
    "injection", "cream", "ointment", "gel", "drops", "powder",
    "expiry", "exp", "mfg", "manufactured", "batch", "lot", "company",
    "pharma", "pharmaceuticals", "ltd", "limited", "pvt", "private",
    "india", "mumbai", "delhi", "bangalore", "hyderabad", "chennai",
    "use", "before", "date", "keep", "store", "temperature", "room",
    "this", "that", "with", "from", "under", "above", "below",
];

/// Dosage forms in priority order; the first entry with a keyword in the text wins.
const BUILTIN_FORMS: &[(&str, &[&str])] = &[
    ("tablet", &["tablet", "tab"]),
    ("capsule", &["capsule", "cap"]),
    ("syrup", &["syrup", "liquid"]),
    ("injection", &["injection", "inj"]),
    ("cream", &["cream", "ointment"]),
    ("drops", &["drops", "eye drops"]),
    ("suspension", &["suspension"]),
    ("gel", &["gel"]),
    ("powder", &["powder", "sachet"]),
    ("inhaler", &["inhaler"]),
];

/// On-disk shape. Missing sections fall back to the built-in tables.
#[derive(Debug, Deserialize)]
struct LexiconFile {
    medicines: Option<HashMap<String, MedicineInfo>>,
    stoplist: Option<Vec<String>>,
    forms: Option<Vec<FormEntry>>,
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    medicines: HashMap<String, MedicineInfo>,
    stoplist: HashSet<String>,
    forms: Vec<FormEntry>,
}

impl Lexicon {
    /// Build from arbitrary tables. Keys and keywords are lowercased.
    pub fn new(
        medicines: impl IntoIterator<Item = (String, MedicineInfo)>,
        stoplist: impl IntoIterator<Item = String>,
        forms: Vec<FormEntry>,
    ) -> Self {
        Self {
            medicines: medicines
                .into_iter()
                .map(|(name, info)| (name.to_lowercase(), info))
                .collect(),
            stoplist: stoplist.into_iter().map(|w| w.to_lowercase()).collect(),
            forms: forms
                .into_iter()
                .map(|entry| FormEntry {
                    form: entry.form,
                    keywords: entry.keywords.iter().map(|k| k.to_lowercase()).collect(),
                })
                .collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(
            builtin_medicines(),
            BUILTIN_STOPLIST.iter().map(|w| w.to_string()),
            builtin_forms(),
        )
    }

    /// Parse a lexicon JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, LexiconError> {
        let file: LexiconFile = serde_json::from_str(json)?;

        let medicines = match file.medicines {
            Some(m) if m.is_empty() => return Err(LexiconError::Empty),
            Some(m) => m,
            None => builtin_medicines().collect(),
        };
        let stoplist = file
            .stoplist
            .unwrap_or_else(|| BUILTIN_STOPLIST.iter().map(|w| w.to_string()).collect());
        let forms = file.forms.unwrap_or_else(builtin_forms);

        Ok(Self::new(medicines, stoplist, forms))
    }

    pub fn from_path(path: &Path) -> Result<Self, LexiconError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load from `path` if it exists, otherwise (or on error) use the built-ins.
    pub fn load_or_builtin(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No lexicon file, using built-in tables");
            return Self::builtin();
        }

        match Self::from_path(path) {
            Ok(lexicon) => {
                tracing::info!(
                    path = %path.display(),
                    medicines = lexicon.medicine_count(),
                    "Loaded lexicon file"
                );
                lexicon
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Lexicon file unusable, falling back to built-in tables"
                );
                Self::builtin()
            }
        }
    }

    /// Case-insensitive medicine lookup.
    pub fn medicine(&self, name: &str) -> Option<&MedicineInfo> {
        self.medicines.get(&name.to_lowercase())
    }

    pub fn is_known_medicine(&self, name: &str) -> bool {
        self.medicine(name).is_some()
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stoplist.contains(&word.to_lowercase())
    }

    pub fn forms(&self) -> &[FormEntry] {
        &self.forms
    }

    pub fn medicine_count(&self) -> usize {
        self.medicines.len()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_medicines() -> impl Iterator<Item = (String, MedicineInfo)> {
    BUILTIN_MEDICINES.iter().map(|(name, generic, category)| {
        (
            name.to_string(),
            MedicineInfo {
                generic: generic.to_string(),
                category: category.to_string(),
            },
        )
    })
}

fn builtin_forms() -> Vec<FormEntry> {
    BUILTIN_FORMS
        .iter()
        .map(|(form, keywords)| FormEntry {
            form: form.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        })
        .collect()
}
