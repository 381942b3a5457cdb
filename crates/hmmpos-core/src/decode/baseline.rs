//! Most-frequent-tag baseline.
//!
//! Tags every word with the tag that emitted it most often in training,
//! ignoring context. Used only as a point of comparison for Viterbi.

use serde::{Deserialize, Serialize};

use crate::error::{HmmError, Result};
use crate::estimate::CountTables;
use crate::types::{TagSet, Vocabulary};

/// Per-word argmax of the emission counts, indexed like the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MostFrequentTag {
    best: Vec<Option<usize>>,
}

impl MostFrequentTag {
    /// Build the table. Tags are scanned in index order and only a strictly
    /// larger count replaces the current best, so ties keep the lowest index
    /// and words never observed get no tag.
    pub fn from_counts(counts: &CountTables, tags: &TagSet, vocab: &Vocabulary) -> Self {
        let mut best = vec![None; vocab.len()];
        let mut best_count = vec![0u64; vocab.len()];
        for (i, tag) in tags.iter().enumerate() {
            for (word, count) in counts.emissions_of(tag) {
                let Some(k) = vocab.index_of(word) else {
                    continue;
                };
                if count > best_count[k] {
                    best_count[k] = count;
                    best[k] = Some(i);
                }
            }
        }
        Self { best }
    }

    /// Number of words covered by the table.
    pub fn len(&self) -> usize {
        self.best.len()
    }

    /// `true` for a table over an empty vocabulary.
    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Check that every stored tag index is below `num_tags`.
    pub fn check_tags(&self, num_tags: usize) -> Result<()> {
        match self
            .best
            .iter()
            .enumerate()
            .find_map(|(k, &tag)| tag.filter(|&i| i >= num_tags).map(|i| (k, i)))
        {
            Some((word, tag)) => Err(HmmError::InvalidConfig(format!(
                "baseline maps word {word} to tag index {tag}, but there are only {num_tags} tags"
            ))),
            None => Ok(()),
        }
    }

    /// Best tag index for a vocabulary index.
    pub fn predict_index(&self, word: usize) -> Option<usize> {
        self.best.get(word).copied().flatten()
    }

    /// Best tag index for a surface word; `None` for out-of-vocabulary words.
    pub fn predict(&self, vocab: &Vocabulary, word: &str) -> Option<usize> {
        vocab.index_of(word).and_then(|k| self.predict_index(k))
    }
}
