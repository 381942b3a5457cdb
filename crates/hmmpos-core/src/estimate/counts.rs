//! # Count Aggregator
//!
//! Single linear scan over boundary-annotated `(word, tag)` pairs producing
//! tag unigram, tag bigram and tag -> word counts.
//!
//! A pair tagged `<BOS>` opens a new sentence and resets the previous tag to
//! the `<EOS>` boundary state, so every sentence contributes exactly one
//! `<EOS> -> <BOS>` transition and nothing is carried over from the sentence
//! before it.

use std::collections::HashMap;

use crate::types::{BOS, EOS};

/// Raw frequency tables built from a tagged corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTables {
    tag_counts: HashMap<String, u64>,
    /// prev_tag -> tag -> count
    transition_counts: HashMap<String, HashMap<String, u64>>,
    /// tag -> word -> count
    emission_counts: HashMap<String, HashMap<String, u64>>,
    num_tokens: u64,
    num_sentences: u64,
}

impl CountTables {
    /// Create empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a stream of pairs. Sentence boundaries are recognised by the
    /// `<BOS>` tag; the stream is expected to bracket every sentence with
    /// `("<BOS>", "<BOS>")` and `("<EOS>", "<EOS>")` but nothing is rejected.
    pub fn observe<I, W, T>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (W, T)>,
        W: AsRef<str>,
        T: AsRef<str>,
    {
        let mut prev = EOS.to_string();
        for (word, tag) in pairs {
            let (word, tag) = (word.as_ref(), tag.as_ref());
            let starts_sentence = tag == BOS;
            if starts_sentence {
                prev.clear();
                prev.push_str(EOS);
                self.num_sentences += 1;
            }
            self.record(&prev, tag, word);
            prev.clear();
            prev.push_str(tag);
        }
    }

    /// Scan one bracketed sentence.
    pub fn observe_sentence<W, T>(&mut self, pairs: &[(W, T)])
    where
        W: AsRef<str>,
        T: AsRef<str>,
    {
        self.observe(pairs.iter().map(|(w, t)| (w.as_ref(), t.as_ref())));
    }

    fn record(&mut self, prev: &str, tag: &str, word: &str) {
        *self.tag_counts.entry(tag.to_string()).or_default() += 1;
        *self
            .transition_counts
            .entry(prev.to_string())
            .or_default()
            .entry(tag.to_string())
            .or_default() += 1;
        *self
            .emission_counts
            .entry(tag.to_string())
            .or_default()
            .entry(word.to_string())
            .or_default() += 1;
        self.num_tokens += 1;
    }

    /// How often `tag` occurred.
    pub fn tag_count(&self, tag: &str) -> u64 {
        self.tag_counts.get(tag).copied().unwrap_or(0)
    }

    /// How often `tag` directly followed `prev`.
    pub fn transition_count(&self, prev: &str, tag: &str) -> u64 {
        self.transition_counts
            .get(prev)
            .and_then(|row| row.get(tag))
            .copied()
            .unwrap_or(0)
    }

    /// How often `tag` emitted `word`.
    pub fn emission_count(&self, tag: &str, word: &str) -> u64 {
        self.emission_counts
            .get(tag)
            .and_then(|row| row.get(word))
            .copied()
            .unwrap_or(0)
    }

    /// Every tag observed, in arbitrary order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tag_counts.keys().map(String::as_str)
    }

    /// Observed successors of `prev` with their counts.
    pub fn transitions_from(&self, prev: &str) -> impl Iterator<Item = (&str, u64)> {
        self.transition_counts
            .get(prev)
            .into_iter()
            .flatten()
            .map(|(tag, &count)| (tag.as_str(), count))
    }

    /// Observed words of `tag` with their counts.
    pub fn emissions_of(&self, tag: &str) -> impl Iterator<Item = (&str, u64)> {
        self.emission_counts
            .get(tag)
            .into_iter()
            .flatten()
            .map(|(word, &count)| (word.as_str(), count))
    }

    /// Tags that have at least one outgoing transition.
    pub(crate) fn transition_sources(&self) -> impl Iterator<Item = &str> {
        self.transition_counts.keys().map(String::as_str)
    }

    /// Total number of pairs scanned.
    pub fn num_tokens(&self) -> u64 {
        self.num_tokens
    }

    /// Number of `<BOS>` pairs scanned.
    pub fn num_sentences(&self) -> u64 {
        self.num_sentences
    }

    /// `true` when nothing has been observed.
    pub fn is_empty(&self) -> bool {
        self.num_tokens == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bracket<'a>(pairs: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut out = vec![(BOS, BOS)];
        out.extend_from_slice(pairs);
        out.push((EOS, EOS));
        out
    }

    #[test]
    fn test_single_sentence_counts() {
        let mut counts = CountTables::new();
        counts.observe_sentence(&bracket(&[("el", "DET"), ("perro", "NOUN")]));

        assert_eq!(counts.num_tokens(), 4);
        assert_eq!(counts.num_sentences(), 1);
        assert_eq!(counts.tag_count("DET"), 1);
        assert_eq!(counts.tag_count(BOS), 1);
        assert_eq!(counts.transition_count(EOS, BOS), 1);
        assert_eq!(counts.transition_count(BOS, "DET"), 1);
        assert_eq!(counts.transition_count("DET", "NOUN"), 1);
        assert_eq!(counts.transition_count("NOUN", EOS), 1);
        assert_eq!(counts.emission_count("NOUN", "perro"), 1);
        assert_eq!(counts.emission_count("NOUN", "el"), 0);
    }

    #[test]
    fn test_boundary_resets_previous_tag() {
        let mut stream = bracket(&[("corre", "VERB")]);
        stream.extend(bracket(&[("perro", "NOUN")]));
        // a sentence missing its closing sentinel must not leak into the next one
        stream.extend([(BOS, BOS), ("come", "VERB")]);
        stream.extend(bracket(&[("gato", "NOUN")]));

        let mut counts = CountTables::new();
        counts.observe(stream);

        assert_eq!(counts.num_sentences(), 4);
        assert_eq!(counts.transition_count(EOS, BOS), 4);
        assert_eq!(counts.transition_count("VERB", BOS), 0);
        assert_eq!(counts.transition_count(BOS, "NOUN"), 2);
    }

    #[test]
    fn test_outgoing_totals_match_tag_counts() {
        let mut counts = CountTables::new();
        counts.observe_sentence(&bracket(&[("el", "DET"), ("perro", "NOUN"), ("come", "VERB")]));
        counts.observe_sentence(&bracket(&[("come", "VERB")]));

        for tag in counts.tags().collect::<Vec<_>>() {
            let outgoing: u64 = counts.transitions_from(tag).map(|(_, c)| c).sum();
            let emitted: u64 = counts.emissions_of(tag).map(|(_, c)| c).sum();
            assert_eq!(outgoing, counts.tag_count(tag), "transitions from {tag}");
            assert_eq!(emitted, counts.tag_count(tag), "emissions of {tag}");
        }
    }
}
