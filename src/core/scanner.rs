// File: src/core/scanner.rs
use crate::core::types::Entry;
use crate::core::word_set::WordSet;
use crate::error::{Result, VocabError};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

const PROGRESS_INTERVAL: usize = 500;

/// One corpus text held fully in memory.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub name: String,
    pub text: String,
}

impl Corpus {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| VocabError::io(path, e))?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// Expands a corpus argument into the files it names. A directory yields its
/// regular files (non-recursive) sorted by path; one without any is treated
/// as a missing corpus.
pub fn expand_corpus_path(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(VocabError::MissingCorpus(path.to_path_buf()));
    }
    let mut files = Vec::new();
    for item in fs::read_dir(path).map_err(|e| VocabError::io(path, e))? {
        let item = item.map_err(|e| VocabError::io(path, e))?;
        let file = item.path();
        if file.is_file() {
            files.push(file);
        }
    }
    if files.is_empty() {
        warn!("Corpus directory {} contains no files", path.display());
        return Err(VocabError::MissingCorpus(path.to_path_buf()));
    }
    files.sort();
    debug!("Files in {}: {:?}", path.display(), files);
    Ok(files)
}

/// How counts from several sources in one pass are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdMode {
    /// Tagged if the threshold is met in any single source; never un-tagged later in the pass.
    #[default]
    AnySource,
    /// Tagged if the counts summed over every source meet the threshold.
    Combined,
}

/// Counts non-overlapping literal occurrences. An empty pattern counts 0.
pub fn count_occurrences(text: &str, pattern: &str) -> usize {
    if pattern.is_empty() {
        return 0;
    }
    text.matches(pattern).count()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusScanner {
    mode: ThresholdMode,
}

impl CorpusScanner {
    pub fn new(mode: ThresholdMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ThresholdMode {
        self.mode
    }

    /// Occurrences of the primary form plus the alternate form (if any).
    pub fn entry_count(entry: &Entry, text: &str) -> usize {
        entry.forms().map(|form| count_occurrences(text, form)).sum()
    }

    /// The tag decision for one entry against one text. Does not touch the entry.
    pub fn tag_against_corpus(entry: &Entry, text: &str, required_count: usize) -> bool {
        Self::entry_count(entry, text) >= required_count
    }

    /// Runs one full tagging pass: clears every tag, then tags against
    /// `sources` according to the scanner's mode. Returns the tagged count.
    pub fn tag_pass(&self, words: &mut WordSet, sources: &[Corpus], required_count: usize) -> usize {
        words.clear_tags();
        match self.mode {
            ThresholdMode::AnySource => {
                for source in sources {
                    debug!("Scanning {} for threshold {}", source.name, required_count);
                    for entry in words.iter_mut().filter(|e| !e.tag) {
                        if Self::tag_against_corpus(entry, &source.text, required_count) {
                            entry.tag = true;
                        }
                    }
                }
            }
            ThresholdMode::Combined => {
                for entry in words.iter_mut() {
                    let total: usize = sources
                        .iter()
                        .map(|source| Self::entry_count(entry, &source.text))
                        .sum();
                    entry.tag = total >= required_count;
                }
            }
        }

        let mut tagged = 0;
        for (index, entry) in words.iter().enumerate() {
            if entry.tag {
                tagged += 1;
            }
            if (index + 1) % PROGRESS_INTERVAL == 0 {
                debug!("{}: {}/{}", index + 1, tagged, index + 1);
            }
        }
        info!(
            "Tagged {}/{} entries across {} source(s)",
            tagged,
            words.len(),
            sources.len()
        );
        tagged
    }
}
