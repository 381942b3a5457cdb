//! Trainer builder: accumulates counts and converts them into an [`HmmModel`].

use std::collections::BTreeSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::decode::MostFrequentTag;
use crate::error::Result;
use crate::estimate::{CountTables, Estimator, DEFAULT_ALPHA};
use crate::model::HmmModel;
use crate::types::{TagSet, Vocabulary, BOS, EOS};

/// Training configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Additive smoothing constant.
    pub alpha: f64,
    /// Estimate matrix rows on the rayon pool.
    pub parallel: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            parallel: true,
        }
    }
}

impl TrainerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the smoothing constant.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Enable or disable parallel estimation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Accumulates tagged sentences against a fixed vocabulary.
///
/// Words are passed through [`Vocabulary::resolve`] before counting, so
/// rare words are counted as `<UNK>`. [`Trainer::finish`] consumes the
/// trainer; the model it returns is immutable.
///
/// # Examples
/// ```
/// use hmmpos_core::{Trainer, TrainerConfig, Vocabulary};
///
/// let vocab = Vocabulary::new(["el", "perro", "come"]);
/// let mut trainer = Trainer::new(vocab, TrainerConfig::default())?;
/// trainer.add_sentence(&[("el", "DET"), ("perro", "NOUN"), ("come", "VERB")]);
/// let model = trainer.finish()?;
///
/// let tagged = model.tagger().tag_sentence(&["el", "perro"])?;
/// assert_eq!(tagged, [("el", "DET"), ("perro", "NOUN")]);
/// # Ok::<(), hmmpos_core::HmmError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Trainer {
    vocab: Vocabulary,
    estimator: Estimator,
    counts: CountTables,
    declared: BTreeSet<String>,
}

impl Trainer {
    /// Create a trainer. Fails with `InvalidConfig` for a bad `alpha`.
    pub fn new(vocab: Vocabulary, config: TrainerConfig) -> Result<Self> {
        let estimator = Estimator::new(config.alpha)?.with_parallel(config.parallel);
        Ok(Self {
            vocab,
            estimator,
            counts: CountTables::new(),
            declared: BTreeSet::new(),
        })
    }

    /// Declare tags that belong to the tag set even if no sentence uses them.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Count one sentence given without sentinels.
    pub fn add_sentence<W, T>(&mut self, pairs: &[(W, T)])
    where
        W: AsRef<str>,
        T: AsRef<str>,
    {
        let vocab = &self.vocab;
        let body = pairs
            .iter()
            .map(|(w, t)| (vocab.resolve(w.as_ref()), t.as_ref()));
        let stream = std::iter::once((BOS, BOS))
            .chain(body)
            .chain(std::iter::once((EOS, EOS)));
        self.counts.observe(stream);
    }

    /// Count a stream that already carries its `<BOS>`/`<EOS>` pairs.
    pub fn add_annotated<W, T>(&mut self, pairs: &[(W, T)])
    where
        W: AsRef<str>,
        T: AsRef<str>,
    {
        let vocab = &self.vocab;
        self.counts.observe(
            pairs
                .iter()
                .map(|(w, t)| (vocab.resolve(w.as_ref()), t.as_ref())),
        );
    }

    /// Counts gathered so far.
    pub fn counts(&self) -> &CountTables {
        &self.counts
    }

    /// The vocabulary words are resolved against.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Estimate the matrices and the baseline table and bundle them.
    pub fn finish(self) -> Result<HmmModel> {
        let begin = Instant::now();
        if self.counts.is_empty() {
            warn!("training without any sentences; every row will be uniform");
        }

        let tags = TagSet::new(self.counts.tags().chain(self.declared.iter().map(String::as_str)));
        let transition = self.estimator.transition_matrix(&self.counts, &tags)?;
        let emission = self.estimator.emission_matrix(&self.counts, &tags, &self.vocab)?;
        let baseline = MostFrequentTag::from_counts(&self.counts, &tags, &self.vocab);

        info!(
            sentences = self.counts.num_sentences(),
            tokens = self.counts.num_tokens(),
            num_tags = tags.len(),
            num_words = self.vocab.len(),
            alpha = self.estimator.alpha(),
            elapsed = ?begin.elapsed(),
            "model trained"
        );
        HmmModel::from_parts(self.vocab, tags, transition, emission, Some(baseline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HmmError;
    use crate::types::UNK;

    fn corpus() -> Vec<Vec<(&'static str, &'static str)>> {
        vec![
            vec![("el", "DET"), ("perro", "NOUN"), ("come", "VERB")],
            vec![("el", "DET"), ("gato", "NOUN"), ("duerme", "VERB")],
            vec![("la", "DET"), ("perro", "NOUN"), ("come", "VERB"), ("pan", "NOUN")],
            vec![("perro", "NOUN"), ("come", "VERB")],
        ]
    }

    fn trained(config: TrainerConfig) -> HmmModel {
        let vocab = Vocabulary::new(["el", "la", "perro", "come", "pan"]);
        let mut trainer = Trainer::new(vocab, config).unwrap();
        for sentence in corpus() {
            trainer.add_sentence(&sentence);
        }
        trainer.finish().unwrap()
    }

    #[test]
    fn test_rows_sum_to_one() {
        let model = trained(TrainerConfig::default());
        for sum in model
            .transition()
            .row_sums()
            .into_iter()
            .chain(model.emission().row_sums())
        {
            assert!((sum - 1.0).abs() < 1e-6, "row sum {sum}");
        }
        assert!(model.transition().as_slice().iter().all(|&p| p > 0.0));
        assert!(model.emission().as_slice().iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_rare_words_counted_as_unknown() {
        let vocab = Vocabulary::new(["perro"]);
        let mut trainer = Trainer::new(vocab, TrainerConfig::default()).unwrap();
        trainer.add_sentence(&[("gato", "NOUN"), ("perro", "NOUN")]);
        assert_eq!(trainer.counts().emission_count("NOUN", UNK), 1);
        assert_eq!(trainer.counts().emission_count("NOUN", "gato"), 0);
        assert_eq!(trainer.counts().num_sentences(), 1);
    }

    #[test]
    fn test_annotated_equals_wrapped() {
        let vocab = Vocabulary::new(["el", "perro"]);
        let mut wrapped = Trainer::new(vocab.clone(), TrainerConfig::default()).unwrap();
        wrapped.add_sentence(&[("el", "DET"), ("perro", "NOUN")]);

        let mut annotated = Trainer::new(vocab, TrainerConfig::default()).unwrap();
        annotated.add_annotated(&[(BOS, BOS), ("el", "DET"), ("perro", "NOUN"), (EOS, EOS)]);

        assert_eq!(wrapped.counts(), annotated.counts());
    }

    #[test]
    fn test_decodes_training_sentence() {
        let model = trained(TrainerConfig::default());
        let tags = model.tagger().tag(&[BOS, "el", "perro", "come", EOS]).unwrap();
        assert_eq!(tags, [BOS, "DET", "NOUN", "VERB", EOS]);
    }

    #[test]
    fn test_declared_tags_join_the_tag_set() {
        let vocab = Vocabulary::new(["perro"]);
        let mut trainer = Trainer::new(vocab, TrainerConfig::default())
            .unwrap()
            .with_tags(["ADJ"]);
        trainer.add_sentence(&[("perro", "NOUN")]);
        let model = trainer.finish().unwrap();
        assert!(model.tags().index_of("ADJ").is_some());
        assert_eq!(model.tags().len(), 4);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let par = trained(TrainerConfig::default());
        let seq = trained(TrainerConfig::default().with_parallel(false));
        assert_eq!(par.transition(), seq.transition());
        assert_eq!(par.emission(), seq.emission());
    }

    #[test]
    fn test_baseline_is_trained() {
        let model = trained(TrainerConfig::default());
        let naive = model.naive_tag(&["come", "perro", "zorro"]).unwrap();
        assert_eq!(naive, [Some("VERB"), Some("NOUN"), None]);
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let vocab = Vocabulary::new(["perro"]);
        let config = TrainerConfig::default().with_alpha(0.0);
        assert!(matches!(
            Trainer::new(vocab, config),
            Err(HmmError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config: TrainerConfig = serde_json::from_str(r#"{"alpha": 0.5}"#).unwrap();
        assert_eq!(config.alpha, 0.5);
        assert!(config.parallel);
    }
}
