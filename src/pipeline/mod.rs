pub mod normalize;
pub mod lexicon;
pub mod dates;
pub mod expiry;
pub mod name_scoring;
pub mod fields;
pub mod confidence;
pub mod assembler;
pub mod prescription;
pub mod orchestrator; // Single fault boundary for every scan
pub mod announce;
pub mod handoff; // Storage, reminder and speech collaborators

pub use lexicon::{Lexicon, LexiconError};
pub use normalize::{normalize, NormalizedText};
pub use orchestrator::{ScanError, ScanPipeline};
