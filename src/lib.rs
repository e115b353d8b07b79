// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod history;
pub mod persistence;
pub mod review;

pub use crate::config::EngineConfig;
pub use crate::core::engine::{HistoryMode, RunOptions, RunSummary, VocabEngine};
pub use crate::core::scanner::{count_occurrences, Corpus, CorpusScanner, ThresholdMode};
pub use crate::core::types::{ConfidenceRange, Entry};
pub use crate::core::word_set::WordSet;
pub use crate::error::{Result, VocabError};
pub use crate::history::HistoryMerger;
pub use crate::review::{ConsolePrompter, ReviewSampler, ReviewSession};
