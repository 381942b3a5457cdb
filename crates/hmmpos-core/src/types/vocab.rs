//! # Vocabulary
//!
//! Maps surface words to dense indices. The word list is kept sorted and
//! always contains the `<BOS>`, `<EOS>` and `<UNK>` tokens.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::tagset::{BOS, EOS, UNK};
use crate::error::{HmmError, Result};

/// Immutable word -> index mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    words: Vec<String>,
    index: HashMap<String, usize>,
    unk: usize,
}

impl Vocabulary {
    /// Build a vocabulary from a word list. Sentinels and `<UNK>` are added.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words: Vec<String> = words.into_iter().map(Into::into).collect();
        words.extend([BOS, EOS, UNK].map(String::from));
        words.sort();
        words.dedup();
        Self::from_sorted(words)
    }

    fn from_sorted(words: Vec<String>) -> Self {
        let index: HashMap<String, usize> = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();
        let unk = index[UNK];
        Self { words, index, unk }
    }

    /// Number of words, special tokens included.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false`: the special tokens are always present.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Index of a word, without unknown-word substitution.
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Whether the word is known.
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Index of the word, falling back to `<UNK>` for unknown words.
    pub fn resolve_index(&self, word: &str) -> usize {
        self.index_of(word).unwrap_or(self.unk)
    }

    /// The word itself if known, `<UNK>` otherwise.
    pub fn resolve<'a>(&'a self, word: &'a str) -> &'a str {
        if self.contains(word) { word } else { UNK }
    }

    /// Index of `<UNK>`.
    pub fn unk(&self) -> usize {
        self.unk
    }

    /// Word at an index.
    pub fn word(&self, idx: usize) -> Option<&str> {
        self.words.get(idx).map(String::as_str)
    }

    /// Words in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = HmmError;

    fn try_from(words: Vec<String>) -> Result<Self> {
        for pair in words.windows(2) {
            if pair[0] >= pair[1] {
                return Err(HmmError::InvalidConfig(format!(
                    "vocabulary is not sorted at {:?}",
                    pair[1]
                )));
            }
        }
        for special in [BOS, EOS] {
            if !words.iter().any(|w| w == special) {
                return Err(HmmError::MissingSentinel(special));
            }
        }
        if !words.iter().any(|w| w == UNK) {
            return Err(HmmError::MissingSentinel(UNK));
        }
        Ok(Self::from_sorted(words))
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(value: Vocabulary) -> Self {
        value.words
    }
}

/// Frequency-based vocabulary construction.
///
/// Counts `(word, tag)` pairs; a word is kept when at least one of its
/// pairings was seen `min_count` times or more. Everything else is left to
/// `<UNK>`.
#[derive(Debug, Clone, Default)]
pub struct VocabularyBuilder {
    pair_counts: HashMap<(String, String), u64>,
}

impl VocabularyBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `word` tagged `tag`.
    pub fn add(&mut self, word: &str, tag: &str) {
        *self
            .pair_counts
            .entry((word.to_string(), tag.to_string()))
            .or_default() += 1;
    }

    /// Record every pair of a sentence.
    pub fn add_sentence<W, T>(&mut self, pairs: &[(W, T)])
    where
        W: AsRef<str>,
        T: AsRef<str>,
    {
        for (word, tag) in pairs {
            self.add(word.as_ref(), tag.as_ref());
        }
    }

    /// Number of distinct `(word, tag)` pairs seen so far.
    pub fn num_pairs(&self) -> usize {
        self.pair_counts.len()
    }

    /// Build the vocabulary with the given frequency threshold.
    pub fn build(&self, min_count: u64) -> Vocabulary {
        let kept: HashSet<&str> = self
            .pair_counts
            .iter()
            .filter(|(_, count)| **count >= min_count)
            .map(|((word, _), _)| word.as_str())
            .collect();
        Vocabulary::new(kept)
    }
}
