//! Prohibited-word policy for user-chosen names.

use std::collections::BTreeSet;

/// Answers whether a candidate name contains disallowed words.
pub trait ProhibitedWords {
    fn has_prohibited_words(&self, candidate: &str) -> bool;
}

impl<P: ProhibitedWords + ?Sized> ProhibitedWords for &P {
    fn has_prohibited_words(&self, candidate: &str) -> bool {
        (**self).has_prohibited_words(candidate)
    }
}

/// Substring blocklist, matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProhibitedWordList {
    words: BTreeSet<String>,
}

impl ProhibitedWordList {
    /// Builds a list from raw words. Blank entries are ignored.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_ascii_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl ProhibitedWords for ProhibitedWordList {
    fn has_prohibited_words(&self, candidate: &str) -> bool {
        let candidate = candidate.to_ascii_lowercase();
        self.words
            .iter()
            .any(|word| candidate.contains(word.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::{ProhibitedWordList, ProhibitedWords};

    #[test]
    fn matches_substrings_case_insensitively() {
        let list = ProhibitedWordList::new(["Bollocks", "admin"]);
        assert!(list.has_prohibited_words("bollocks69"));
        assert!(list.has_prohibited_words("superADMIN1"));
        assert!(!list.has_prohibited_words("frosty123"));
    }

    #[test]
    fn blank_words_are_dropped_and_duplicates_collapse() {
        let list = ProhibitedWordList::new(["  ", "root", "ROOT", ""]);
        assert_eq!(list.len(), 1);
        assert!(!list.has_prohibited_words("anything"));
    }

    #[test]
    fn empty_list_allows_everything() {
        let list = ProhibitedWordList::default();
        assert!(list.is_empty());
        assert!(!list.has_prohibited_words("whatever1"));
    }
}
