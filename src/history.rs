// File: src/history.rs
use crate::core::types::ConfidenceRange;
use crate::core::word_set::WordSet;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Every non-empty primary and alternate form found in `history`.
pub fn known_form_set(history: &WordSet) -> HashSet<String> {
    history
        .iter()
        .flat_map(|entry| entry.forms())
        .map(str::to_string)
        .collect()
}

/// Highest history confidence recorded for each known form.
pub fn known_form_confidence(history: &WordSet) -> HashMap<String, i64> {
    let mut known: HashMap<String, i64> = HashMap::new();
    for entry in history.iter() {
        for form in entry.forms() {
            let slot = known.entry(form.to_string()).or_insert(entry.confidence());
            *slot = (*slot).max(entry.confidence());
        }
    }
    known
}

/// Applies the known-vocabulary ledger to a freshly tagged word set.
pub struct HistoryMerger {
    confidence_threshold: i64,
    range: ConfidenceRange,
}

impl HistoryMerger {
    pub fn new(confidence_threshold: i64, range: ConfidenceRange) -> Self {
        Self {
            confidence_threshold,
            range,
        }
    }

    pub fn confidence_threshold(&self) -> i64 {
        self.confidence_threshold
    }

    /// Copies the confidence of each history entry onto the current entry with
    /// the same id. Returns how many entries were updated.
    pub fn adopt_history_confidence(&self, current: &mut WordSet, history: &WordSet) -> usize {
        let mut adopted = 0;
        for entry in current.iter_mut() {
            if let Some(known) = history.lookup_by_id(entry.id()) {
                entry.set_confidence(known.confidence(), &self.range);
                adopted += 1;
            }
        }
        adopted
    }

    /// Un-tags entries whose form is already known with a confidence above the
    /// threshold. Known entries at or below it stay tagged so they come back
    /// for review. Returns how many entries were un-tagged.
    pub fn suppress_confident(&self, current: &mut WordSet, history: &WordSet) -> usize {
        let known = known_form_confidence(history);
        let mut suppressed = 0;
        for entry in current.iter_mut().filter(|e| e.tag) {
            let best = entry
                .forms()
                .filter_map(|form| known.get(form).copied())
                .max();
            if let Some(confidence) = best {
                if confidence > self.confidence_threshold {
                    debug!(
                        "Suppressing {} ({}): known with confidence {}",
                        entry.id(),
                        entry.primary,
                        confidence
                    );
                    entry.tag = false;
                    suppressed += 1;
                }
            }
        }
        suppressed
    }

    /// Upserts every tagged entry of `current` into `history`.
    /// Returns how many entries were folded.
    pub fn fold_into_history(&self, current: &WordSet, history: &mut WordSet) -> usize {
        let mut folded = 0;
        for entry in current.tagged() {
            history.upsert(entry.clone());
            folded += 1;
        }
        folded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ConfidenceRange, Entry};

    fn merger(threshold: i64) -> HistoryMerger {
        HistoryMerger::new(threshold, ConfidenceRange::default())
    }

    fn current() -> WordSet {
        let range = ConfidenceRange::default();
        [
            Entry::new("001", "你", "妳", &range).with_tag(true),
            Entry::new("002", "好", "", &range).with_tag(true),
        ]
        .into_iter()
        .collect()
    }

    fn history_with(confidence: i64) -> WordSet {
        let range = ConfidenceRange::default();
        std::iter::once(Entry::new("001", "你", "妳", &range).with_confidence(confidence, &range))
            .collect()
    }

    #[test]
    fn known_forms_skip_empty_alternates() {
        let range = ConfidenceRange::default();
        let history: WordSet = [
            Entry::new("001", "你", "妳", &range),
            Entry::new("002", "好", "", &range),
        ]
        .into_iter()
        .collect();
        let forms = known_form_set(&history);
        assert_eq!(forms.len(), 3);
        assert!(forms.contains("妳"));
        assert!(!forms.contains(""));
    }

    #[test]
    fn confident_history_suppresses() {
        let mut words = current();
        let suppressed = merger(4).suppress_confident(&mut words, &history_with(5));
        assert_eq!(suppressed, 1);
        assert!(!words.lookup_by_id("001").unwrap().tag);
        assert!(words.lookup_by_id("002").unwrap().tag);
    }

    #[test]
    fn unsure_history_resurfaces() {
        let mut words = current();
        let suppressed = merger(5).suppress_confident(&mut words, &history_with(5));
        assert_eq!(suppressed, 0);
        assert!(words.lookup_by_id("001").unwrap().tag);
    }

    #[test]
    fn shared_alternate_form_counts_as_known() {
        let range = ConfidenceRange::default();
        let mut words: WordSet = std::iter::once(Entry::new("009", "妳", "", &range).with_tag(true)).collect();
        merger(2).suppress_confident(&mut words, &history_with(3));
        assert!(!words.lookup_by_id("009").unwrap().tag);
    }

    #[test]
    fn untagged_entries_are_left_alone() {
        let mut words = current();
        words.clear_tags();
        assert_eq!(merger(0).suppress_confident(&mut words, &history_with(5)), 0);
    }

    #[test]
    fn fold_upserts_tagged_entries() {
        let range = ConfidenceRange::default();
        let mut words = current();
        words.lookup_by_id_mut("002").unwrap().tag = false;
        words.set_confidence("001", 4, &range);
        let mut history = history_with(2);
        let folded = merger(3).fold_into_history(&words, &mut history);
        assert_eq!(folded, 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.lookup_by_id("001").unwrap().confidence(), 4);
        assert!(history.lookup_by_id("002").is_none());
    }

    #[test]
    fn adopt_copies_confidence_by_id() {
        let mut words = current();
        let adopted = merger(3).adopt_history_confidence(&mut words, &history_with(5));
        assert_eq!(adopted, 1);
        assert_eq!(words.lookup_by_id("001").unwrap().confidence(), 5);
        assert_eq!(words.lookup_by_id("002").unwrap().confidence(), 1);
    }
}
