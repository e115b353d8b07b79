// File: src/core/word_set.rs
use crate::core::types::{ConfidenceRange, Entry};
use std::collections::HashMap;

/// An insertion-ordered collection of entries with unique ids.
///
/// `index` maps an id to its position in `entries`, so upsert and lookup are
/// O(1) while serialization still follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct WordSet {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl WordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Ids cannot be changed through this iterator, so the index stays valid.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entry> {
        self.entries.iter_mut()
    }

    pub fn clear_tags(&mut self) {
        for entry in &mut self.entries {
            entry.tag = false;
        }
    }

    /// Replaces an entry with the same id in place, or appends.
    /// Returns the replaced entry.
    pub fn upsert(&mut self, entry: Entry) -> Option<Entry> {
        match self.index.get(entry.id()) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos], entry)),
            None => {
                self.index.insert(entry.id().to_string(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn lookup_by_id(&self, id: &str) -> Option<&Entry> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn lookup_by_id_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.index.get(id).map(|&pos| &mut self.entries[pos])
    }

    pub fn tagged(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|entry| entry.tag)
    }

    pub fn tagged_count(&self) -> usize {
        self.tagged().count()
    }

    /// Writes a reviewed confidence back onto the entry with `id`.
    /// Returns false if there is no such entry or the value is out of range.
    pub fn set_confidence(&mut self, id: &str, value: i64, range: &ConfidenceRange) -> bool {
        if !range.contains(value) {
            return false;
        }
        match self.lookup_by_id_mut(id) {
            Some(entry) => entry.set_confidence(value, range),
            None => false,
        }
    }
}

impl FromIterator<Entry> for WordSet {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut set = WordSet::new();
        for entry in iter {
            set.upsert(entry);
        }
        set
    }
}

impl<'a> IntoIterator for &'a WordSet {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
