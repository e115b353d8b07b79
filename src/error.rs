// File: src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Fatal and validation failures. Malformed lines, bad confidence fields and
/// invalid interactive input are absorbed where they occur and never show up here.
#[derive(Debug, Error)]
pub enum VocabError {
    #[error("corpus source not found: {0}")]
    MissingCorpus(PathBuf),

    #[error("dictionary file not found: {0}")]
    MissingDictionary(PathBuf),

    #[error("history file {path} is not usable: {reason}")]
    HistoryAccess { path: PathBuf, reason: String },

    #[error("output file {path} is not usable: {reason}")]
    OutputAccess { path: PathBuf, reason: String },

    #[error("minimum occurrence count must be non-negative, got {0}")]
    InvalidThreshold(i64),

    #[error("review sample size must be positive, got {0}")]
    InvalidSampleSize(i64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("review interaction failed: {0}")]
    Interaction(#[source] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VocabError>;

impl VocabError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VocabError::Io {
            path: path.into(),
            source,
        }
    }
}
