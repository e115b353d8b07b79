// File: src/config.rs
use crate::core::types::ConfidenceRange;
use crate::error::{Result, VocabError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine-wide settings, passed into `VocabEngine::new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub confidence: ConfidenceRange,
    pub debug: bool,
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.confidence.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| VocabError::io(path, e))?;
        Self::from_json(&text)
    }

    /// The suppression threshold used when none is given.
    pub fn default_confidence_threshold(&self) -> i64 {
        self.confidence.midpoint()
    }
}
