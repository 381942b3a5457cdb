//! # Trained model bundle
//!
//! [`HmmModel`] is the immutable result of training: vocabulary, tag set,
//! transition and emission matrices, and optionally the baseline table. It is
//! saved and loaded as one JSON document so the pieces can never drift apart.
//!
//! Decoding goes through a [`Tagger`], which borrows the model and can be
//! shared freely across threads.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::decode::{Lattice, MostFrequentTag, ViterbiDecoder};
use crate::error::{HmmError, Result};
use crate::types::{Matrix, TagSet, Vocabulary, BOS, EOS};

/// Version stamped into saved model files.
pub const FORMAT_VERSION: u32 = 1;

/// Immutable trained model.
#[derive(Debug, Clone)]
pub struct HmmModel {
    vocab: Vocabulary,
    tags: TagSet,
    transition: Matrix,
    emission: Matrix,
    baseline: Option<MostFrequentTag>,
    decoder: ViterbiDecoder,
}

#[derive(Serialize)]
struct ArtifactRef<'a> {
    format_version: u32,
    vocabulary: &'a Vocabulary,
    tags: &'a TagSet,
    transition: &'a Matrix,
    emission: &'a Matrix,
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline: Option<&'a MostFrequentTag>,
}

#[derive(Deserialize)]
struct Artifact {
    format_version: u32,
    vocabulary: Vocabulary,
    tags: TagSet,
    transition: Matrix,
    emission: Matrix,
    #[serde(default)]
    baseline: Option<MostFrequentTag>,
}

impl HmmModel {
    /// Assemble a model, checking that every component agrees on the
    /// dimensions and that all probabilities are strictly positive.
    pub fn from_parts(
        vocab: Vocabulary,
        tags: TagSet,
        transition: Matrix,
        emission: Matrix,
        baseline: Option<MostFrequentTag>,
    ) -> Result<Self> {
        let n = tags.len();
        transition.check_shape("transition matrix", (n, n))?;
        emission.check_shape("emission matrix", (n, vocab.len()))?;
        if let Some(table) = &baseline {
            if table.len() != vocab.len() {
                return Err(HmmError::ShapeMismatch {
                    what: "baseline table",
                    expected: (vocab.len(), 1),
                    found: (table.len(), 1),
                });
            }
            table.check_tags(n)?;
        }

        let decoder = ViterbiDecoder::new(transition.row(tags.bos()), &transition, &emission)?;
        Ok(Self {
            vocab,
            tags,
            transition,
            emission,
            baseline,
            decoder,
        })
    }

    /// The vocabulary.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// The tag set.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// `P(tag_j | tag_i)`.
    pub fn transition(&self) -> &Matrix {
        &self.transition
    }

    /// `P(word_k | tag_i)`.
    pub fn emission(&self) -> &Matrix {
        &self.emission
    }

    /// The most-frequent-tag table, when the model was trained with one.
    pub fn baseline(&self) -> Option<&MostFrequentTag> {
        self.baseline.as_ref()
    }

    /// The shared decoder.
    pub fn decoder(&self) -> &ViterbiDecoder {
        &self.decoder
    }

    /// A tagger borrowing this model.
    pub fn tagger(&self) -> Tagger<'_> {
        Tagger { model: self }
    }

    /// Baseline prediction for each word; `None` where the table has no tag
    /// for the word (out of vocabulary or never observed).
    pub fn naive_tag<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<Option<&str>>> {
        let table = self.baseline.as_ref().ok_or(HmmError::BaselineUnavailable)?;
        Ok(words
            .iter()
            .map(|w| {
                table
                    .predict(&self.vocab, w.as_ref())
                    .and_then(|i| self.tags.name(i))
            })
            .collect())
    }

    /// Write the model to `path` as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &self.artifact())?;
        writer.flush()?;
        info!(
            path = %path.display(),
            num_tags = self.tags.len(),
            num_words = self.vocab.len(),
            "model saved"
        );
        Ok(())
    }

    /// Read a model written by [`HmmModel::save`], validating it again.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let artifact: Artifact = serde_json::from_reader(reader)?;
        let model = artifact.into_model()?;
        info!(
            path = %path.display(),
            num_tags = model.tags.len(),
            num_words = model.vocab.len(),
            "model loaded"
        );
        Ok(model)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.artifact())?)
    }

    fn artifact(&self) -> ArtifactRef<'_> {
        ArtifactRef {
            format_version: FORMAT_VERSION,
            vocabulary: &self.vocab,
            tags: &self.tags,
            transition: &self.transition,
            emission: &self.emission,
            baseline: self.baseline.as_ref(),
        }
    }

    /// Parse a model from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: Artifact = serde_json::from_str(json)?;
        artifact.into_model()
    }
}

impl Artifact {
    fn into_model(self) -> Result<HmmModel> {
        if self.format_version != FORMAT_VERSION {
            return Err(HmmError::InvalidConfig(format!(
                "unsupported model format version {} (expected {FORMAT_VERSION})",
                self.format_version
            )));
        }
        HmmModel::from_parts(
            self.vocabulary,
            self.tags,
            self.transition,
            self.emission,
            self.baseline,
        )
    }
}

/// Viterbi tagging against a borrowed model.
#[derive(Debug, Clone, Copy)]
pub struct Tagger<'m> {
    model: &'m HmmModel,
}

impl<'m> Tagger<'m> {
    /// Vocabulary indices of the words; every word must be known.
    pub fn observations<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<usize>> {
        words
            .iter()
            .enumerate()
            .map(|(position, w)| {
                let word = w.as_ref();
                self.model
                    .vocab
                    .index_of(word)
                    .ok_or_else(|| HmmError::UnknownWord {
                        word: word.to_string(),
                        position,
                    })
            })
            .collect()
    }

    /// Decode a boundary-marked word sequence into tag indices.
    pub fn tag_indices<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<usize>> {
        let obs = self.observations(words)?;
        self.model.decoder.decode(&obs)
    }

    /// Forward tables for a word sequence.
    pub fn lattice<S: AsRef<str>>(&self, words: &[S]) -> Result<Lattice> {
        let obs = self.observations(words)?;
        self.model.decoder.forward(&obs)
    }

    /// Decode a boundary-marked word sequence into tag names, one per
    /// position, sentinels included. Unknown words are an error; substitute
    /// `<UNK>` beforehand with [`Vocabulary::resolve`].
    ///
    /// # Examples
    /// ```no_run
    /// use hmmpos_core::HmmModel;
    ///
    /// let model = HmmModel::load("model.json")?;
    /// let tags = model.tagger().tag(&["<BOS>", "el", "perro", "<EOS>"])?;
    /// assert_eq!(tags.len(), 4);
    /// # Ok::<(), hmmpos_core::HmmError>(())
    /// ```
    pub fn tag<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<&'m str>> {
        let path = self.tag_indices(words)?;
        Ok(path.into_iter().map(|i| self.tag_name(i)).collect())
    }

    /// Tag raw tokens: wrap them with sentinels, replace unknown words by
    /// `<UNK>`, decode and return `(token, tag)` pairs without the sentinel
    /// positions.
    pub fn tag_sentence<'t, S: AsRef<str>>(&self, tokens: &'t [S]) -> Result<Vec<(&'t str, &'m str)>> {
        let vocab = &self.model.vocab;
        let mut obs = Vec::with_capacity(tokens.len() + 2);
        obs.push(vocab.resolve_index(BOS));
        obs.extend(tokens.iter().map(|t| vocab.resolve_index(t.as_ref())));
        obs.push(vocab.resolve_index(EOS));

        let path = self.model.decoder.decode(&obs)?;
        debug!(num_tokens = tokens.len(), "sentence tagged");
        Ok(tokens
            .iter()
            .zip(&path[1..path.len() - 1])
            .map(|(t, &i)| (t.as_ref(), self.tag_name(i)))
            .collect())
    }

    /// Tag many boundary-marked sentences in parallel. The result holds one
    /// entry per input sentence, in input order.
    pub fn tag_batch<S>(&self, sentences: &[Vec<S>]) -> Vec<Result<Vec<&'m str>>>
    where
        S: AsRef<str> + Sync,
    {
        sentences.par_iter().map(|s| self.tag(s)).collect()
    }

    fn tag_name(&self, idx: usize) -> &'m str {
        self.model.tags.as_slice()[idx].as_str()
    }
}
