//! # Tag Index
//!
//! The closed set of part-of-speech tags. Indices are assigned by sorting the
//! tag strings, so the same set of tags always yields the same index mapping
//! at training and decode time.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HmmError, Result};

/// Sentence-start sentinel, used both as a word and as a tag.
pub const BOS: &str = "<BOS>";
/// Sentence-end sentinel, used both as a word and as a tag.
pub const EOS: &str = "<EOS>";
/// Designated unknown-word token.
pub const UNK: &str = "<UNK>";

/// Returns `true` for the structural `<BOS>`/`<EOS>` symbols.
pub fn is_sentinel(symbol: &str) -> bool {
    symbol == BOS || symbol == EOS
}

/// Sorted, deduplicated tag list with both sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet {
    tags: Vec<String>,
    index: HashMap<String, usize>,
    bos: usize,
    eos: usize,
}

impl TagSet {
    /// Build a tag set from any collection of tag names.
    ///
    /// The sentinels are inserted if absent and duplicates are dropped.
    ///
    /// # Examples
    /// ```
    /// use hmmpos_core::TagSet;
    ///
    /// let tags = TagSet::new(["VERB", "NOUN", "NOUN"]);
    /// let names: Vec<_> = tags.iter().collect();
    /// assert_eq!(names, ["<BOS>", "<EOS>", "NOUN", "VERB"]);
    /// ```
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        tags.push(BOS.to_string());
        tags.push(EOS.to_string());
        tags.sort();
        tags.dedup();
        Self::from_sorted(tags)
    }

    fn from_sorted(tags: Vec<String>) -> Self {
        let index: HashMap<String, usize> = tags
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        let bos = index[BOS];
        let eos = index[EOS];
        Self {
            tags,
            index,
            bos,
            eos,
        }
    }

    /// Number of tags, sentinels included.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Always `false`: a tag set holds at least the two sentinels.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Index of a tag, if it belongs to the set.
    pub fn index_of(&self, tag: &str) -> Option<usize> {
        self.index.get(tag).copied()
    }

    /// Index of a tag, or [`HmmError::UnknownTag`].
    pub fn require(&self, tag: &str) -> Result<usize> {
        self.index_of(tag)
            .ok_or_else(|| HmmError::UnknownTag(tag.to_string()))
    }

    /// Tag name at an index.
    pub fn name(&self, idx: usize) -> Option<&str> {
        self.tags.get(idx).map(String::as_str)
    }

    /// Index of `<BOS>`.
    pub fn bos(&self) -> usize {
        self.bos
    }

    /// Index of `<EOS>`.
    pub fn eos(&self) -> usize {
        self.eos
    }

    /// Whether the index refers to a sentinel tag.
    pub fn is_sentinel_index(&self, idx: usize) -> bool {
        idx == self.bos || idx == self.eos
    }

    /// Tags in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Tags in index order, as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }
}

impl TryFrom<Vec<String>> for TagSet {
    type Error = HmmError;

    /// Accepts only a list that is already strictly sorted and carries both
    /// sentinels, so a persisted ordering is never silently re-sorted.
    fn try_from(tags: Vec<String>) -> Result<Self> {
        for pair in tags.windows(2) {
            if pair[0] >= pair[1] {
                return Err(HmmError::UnsortedTags(pair[1].clone()));
            }
        }
        for sentinel in [BOS, EOS] {
            if !tags.iter().any(|t| t == sentinel) {
                return Err(HmmError::MissingSentinel(sentinel));
            }
        }
        Ok(Self::from_sorted(tags))
    }
}

impl From<TagSet> for Vec<String> {
    fn from(value: TagSet) -> Self {
        value.tags
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.tags.join(", "))
    }
}
