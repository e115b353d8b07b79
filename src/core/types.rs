// src/core/types.rs
use crate::error::{Result, VocabError};
use serde::{Deserialize, Serialize};

/// Closed integer range a confidence value must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceRange {
    pub min: i64,
    pub max: i64,
}

impl Default for ConfidenceRange {
    fn default() -> Self {
        Self { min: 1, max: 5 }
    }
}

impl ConfidenceRange {
    pub fn new(min: i64, max: i64) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(VocabError::InvalidConfig(format!(
                "confidence min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Out-of-range values fall back to `min`.
    pub fn normalize(&self, value: i64) -> i64 {
        if self.contains(value) {
            value
        } else {
            self.min
        }
    }

    /// Lenient parse used at the file boundary: anything unusable becomes `min`.
    pub fn parse_lenient(&self, text: &str) -> i64 {
        text.trim()
            .parse::<i64>()
            .map(|v| self.normalize(v))
            .unwrap_or(self.min)
    }

    /// Strict parse used for interactive input: `None` means re-prompt.
    pub fn parse_strict(&self, text: &str) -> Option<i64> {
        text.trim().parse::<i64>().ok().filter(|v| self.contains(*v))
    }

    pub fn midpoint(&self) -> i64 {
        self.min + (self.max - self.min) / 2
    }
}

/// One vocabulary record.
///
/// The id is fixed at construction because `WordSet` indexes on it, and the
/// confidence can only be set through a `ConfidenceRange`, so it is never out
/// of bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    id: String,
    pub primary: String,
    /// Empty means "no alternate form".
    pub alternate: String,
    pub pronunciation: String,
    pub meaning: String,
    pub translation: String,
    pub extra1: String,
    pub extra2: String,
    pub tag: bool,
    confidence: i64,
}

impl Entry {
    pub fn new(
        id: impl Into<String>,
        primary: impl Into<String>,
        alternate: impl Into<String>,
        range: &ConfidenceRange,
    ) -> Self {
        Self {
            id: id.into(),
            primary: primary.into(),
            alternate: alternate.into(),
            pronunciation: String::new(),
            meaning: String::new(),
            translation: String::new(),
            extra1: String::new(),
            extra2: String::new(),
            tag: false,
            confidence: range.min,
        }
    }

    pub fn with_details(
        mut self,
        pronunciation: impl Into<String>,
        meaning: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        self.pronunciation = pronunciation.into();
        self.meaning = meaning.into();
        self.translation = translation.into();
        self
    }

    pub fn with_extras(mut self, extra1: impl Into<String>, extra2: impl Into<String>) -> Self {
        self.extra1 = extra1.into();
        self.extra2 = extra2.into();
        self
    }

    pub fn with_tag(mut self, tag: bool) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_confidence(mut self, value: i64, range: &ConfidenceRange) -> Self {
        self.confidence = range.normalize(value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn confidence(&self) -> i64 {
        self.confidence
    }

    /// Returns false (and stores `min`) when `value` is outside the range.
    pub fn set_confidence(&mut self, value: i64, range: &ConfidenceRange) -> bool {
        self.confidence = range.normalize(value);
        range.contains(value)
    }

    /// The primary form followed by the alternate form when there is one.
    pub fn forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str())
            .chain(std::iter::once(self.alternate.as_str()))
            .filter(|form| !form.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_starts_untagged_at_min() {
        let range = ConfidenceRange::new(2, 7).unwrap();
        let entry = Entry::new("001", "你", "妳", &range);
        assert!(!entry.tag);
        assert_eq!(entry.confidence(), 2);
    }

    #[test]
    fn out_of_range_confidence_falls_back_to_min() {
        let range = ConfidenceRange::default();
        assert_eq!(Entry::new("1", "a", "", &range).with_confidence(9, &range).confidence(), 1);
        assert_eq!(Entry::new("1", "a", "", &range).with_confidence(-3, &range).confidence(), 1);
        assert_eq!(Entry::new("1", "a", "", &range).with_confidence(4, &range).confidence(), 4);
    }

    #[test]
    fn set_confidence_reports_rejection() {
        let range = ConfidenceRange::default();
        let mut entry = Entry::new("1", "a", "", &range).with_confidence(3, &range);
        assert!(entry.set_confidence(5, &range));
        assert_eq!(entry.confidence(), 5);
        assert!(!entry.set_confidence(6, &range));
        assert_eq!(entry.confidence(), 1);
    }

    #[test]
    fn lenient_and_strict_parsing() {
        let range = ConfidenceRange::default();
        assert_eq!(range.parse_lenient(" 3 "), 3);
        assert_eq!(range.parse_lenient("abc"), 1);
        assert_eq!(range.parse_lenient("12"), 1);
        assert_eq!(range.parse_strict("4"), Some(4));
        assert_eq!(range.parse_strict("0"), None);
        assert_eq!(range.parse_strict("x"), None);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(matches!(
            ConfidenceRange::new(5, 1),
            Err(VocabError::InvalidConfig(_))
        ));
    }

    #[test]
    fn forms_skip_empty_alternate() {
        let range = ConfidenceRange::default();
        let entry = Entry::new("002", "好", "", &range);
        assert_eq!(entry.forms().collect::<Vec<_>>(), vec!["好"]);
        let entry = Entry::new("001", "你", "妳", &range);
        assert_eq!(entry.forms().collect::<Vec<_>>(), vec!["你", "妳"]);
    }

    #[test]
    fn midpoint_rounds_down() {
        assert_eq!(ConfidenceRange::default().midpoint(), 3);
        assert_eq!(ConfidenceRange::new(1, 4).unwrap().midpoint(), 2);
    }
}
