// File: src/review/mod.rs
pub mod console;
pub mod sampler;

pub use console::ConsolePrompter;
pub use sampler::ReviewSampler;

use crate::core::types::{ConfidenceRange, Entry};
use crate::core::word_set::WordSet;
use crate::error::{Result, VocabError};
use log::{debug, info};
use std::io;

/// How much of a card is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStage {
    /// The primary form only.
    Front,
    /// Every display field.
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Abort,
}

/// The presentation side of a review. Implementations only display and read;
/// validation and bookkeeping stay in `ReviewSession`.
pub trait ReviewPrompter {
    fn reveal(&mut self, entry: &Entry, stage: RevealStage, position: usize, total: usize) -> io::Result<Flow>;

    /// Raw confidence input, or `None` when the user quits.
    fn ask_confidence(&mut self, entry: &Entry, range: &ConfidenceRange) -> io::Result<Option<String>>;

    fn reject(&mut self, input: &str, range: &ConfidenceRange) -> io::Result<()>;

    fn finish(&mut self, _outcome: &ReviewOutcome) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// `(id, confidence)` in review order.
    pub reviewed: Vec<(String, i64)>,
    pub aborted: bool,
}

pub struct ReviewSession {
    range: ConfidenceRange,
}

impl ReviewSession {
    pub fn new(range: ConfidenceRange) -> Self {
        Self { range }
    }

    /// Walks `sample` in order, updating each entry's confidence in place.
    /// Entries after an abort are left untouched.
    pub fn run<P: ReviewPrompter>(&self, sample: &mut WordSet, prompter: &mut P) -> Result<ReviewOutcome> {
        let mut outcome = ReviewOutcome::default();
        let total = sample.len();

        'cards: for (position, entry) in sample.iter_mut().enumerate() {
            for stage in [RevealStage::Front, RevealStage::Details] {
                if prompter
                    .reveal(entry, stage, position + 1, total)
                    .map_err(VocabError::Interaction)?
                    == Flow::Abort
                {
                    outcome.aborted = true;
                    break 'cards;
                }
            }

            let confidence = loop {
                let input = match prompter
                    .ask_confidence(entry, &self.range)
                    .map_err(VocabError::Interaction)?
                {
                    Some(input) => input,
                    None => {
                        outcome.aborted = true;
                        break 'cards;
                    }
                };
                match self.range.parse_strict(&input) {
                    Some(value) => break value,
                    None => prompter
                        .reject(&input, &self.range)
                        .map_err(VocabError::Interaction)?,
                }
            };

            entry.set_confidence(confidence, &self.range);
            debug!("Reviewed {}: confidence {}", entry.id(), confidence);
            outcome.reviewed.push((entry.id().to_string(), confidence));
        }

        prompter.finish(&outcome).map_err(VocabError::Interaction)?;
        info!(
            "Reviewed {}/{} entries{}",
            outcome.reviewed.len(),
            total,
            if outcome.aborted { " (aborted)" } else { "" }
        );
        Ok(outcome)
    }
}
