//! # Parameter Estimator
//!
//! Turns [`CountTables`] into smoothed transition and emission matrices with
//! additive smoothing:
//!
//! ```text
//! T[i][j] = (count(tag_i, tag_j) + alpha) / (count(tag_i) + alpha * num_tags)
//! E[i][k] = (count(tag_i, word_k) + alpha) / (count(tag_i) + alpha * num_words)
//! ```
//!
//! Each row is written as its smoothed-zero value and then the observed counts
//! are scattered over it, so the cost is `O(cells + observed pairs)`. Rows are
//! independent and can be filled in parallel.

use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use super::counts::CountTables;
use crate::error::{HmmError, Result};
use crate::types::{Matrix, TagSet, Vocabulary};

/// Default additive smoothing constant.
pub const DEFAULT_ALPHA: f64 = 0.001;

/// Additive-smoothing estimator.
#[derive(Debug, Clone, Copy)]
pub struct Estimator {
    alpha: f64,
    parallel: bool,
}

impl Default for Estimator {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            parallel: true,
        }
    }
}

/// Observed counts of one matrix, resolved to indices.
struct SparseRows {
    totals: Vec<u64>,
    entries: Vec<Vec<(usize, u64)>>,
}

impl Estimator {
    /// Create an estimator. `alpha` must be finite and strictly positive.
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(HmmError::InvalidConfig(format!(
                "smoothing alpha must be finite and > 0, got {alpha}"
            )));
        }
        Ok(Self {
            alpha,
            ..Self::default()
        })
    }

    /// Fill rows on the rayon pool (default) or on the calling thread.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The smoothing constant.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// `num_tags x num_tags` matrix of `P(tag_j | tag_i)`.
    pub fn transition_matrix(&self, counts: &CountTables, tags: &TagSet) -> Result<Matrix> {
        let begin = Instant::now();
        let n = tags.len();
        let mut rows = SparseRows::new(counts, tags)?;
        for prev in counts.transition_sources() {
            let i = tags.require(prev)?;
            for (tag, count) in counts.transitions_from(prev) {
                rows.entries[i].push((tags.require(tag)?, count));
            }
        }

        let mut matrix = Matrix::zeros(n, n);
        self.fill(&mut matrix, &rows);
        debug!(num_tags = n, elapsed = ?begin.elapsed(), "transition matrix estimated");
        Ok(matrix)
    }

    /// `num_tags x num_words` matrix of `P(word_k | tag_i)`.
    pub fn emission_matrix(
        &self,
        counts: &CountTables,
        tags: &TagSet,
        vocab: &Vocabulary,
    ) -> Result<Matrix> {
        let begin = Instant::now();
        let mut rows = SparseRows::new(counts, tags)?;
        for (i, tag) in tags.iter().enumerate() {
            for (word, count) in counts.emissions_of(tag) {
                let k = vocab
                    .index_of(word)
                    .ok_or_else(|| HmmError::WordNotIndexed(word.to_string()))?;
                rows.entries[i].push((k, count));
            }
        }

        let mut matrix = Matrix::zeros(tags.len(), vocab.len());
        self.fill(&mut matrix, &rows);
        debug!(
            num_tags = tags.len(),
            num_words = vocab.len(),
            elapsed = ?begin.elapsed(),
            "emission matrix estimated"
        );
        Ok(matrix)
    }

    fn fill(&self, matrix: &mut Matrix, rows: &SparseRows) {
        let alpha = self.alpha;
        let cols = matrix.cols();
        let fill_row = |(i, row): (usize, &mut [f64])| {
            let denom = rows.totals[i] as f64 + alpha * cols as f64;
            row.fill(alpha / denom);
            for &(j, count) in &rows.entries[i] {
                row[j] = (count as f64 + alpha) / denom;
            }
        };

        if self.parallel {
            matrix
                .as_mut_slice()
                .par_chunks_mut(cols)
                .enumerate()
                .for_each(fill_row);
        } else {
            matrix
                .as_mut_slice()
                .chunks_mut(cols)
                .enumerate()
                .for_each(fill_row);
        }
    }
}

impl SparseRows {
    /// Row totals from the tag unigram counts; every counted tag must be in
    /// the tag set.
    fn new(counts: &CountTables, tags: &TagSet) -> Result<Self> {
        let mut totals = vec![0u64; tags.len()];
        for tag in counts.tags() {
            totals[tags.require(tag)?] = counts.tag_count(tag);
        }
        Ok(Self {
            totals,
            entries: vec![Vec::new(); tags.len()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BOS, EOS};

    fn toy_counts() -> CountTables {
        let mut counts = CountTables::new();
        for sentence in [
            vec![("el", "DET"), ("perro", "NOUN"), ("come", "VERB")],
            vec![("el", "DET"), ("gato", "NOUN"), ("duerme", "VERB")],
            vec![("come", "VERB")],
        ] {
            let mut pairs = vec![(BOS, BOS)];
            pairs.extend(sentence);
            pairs.push((EOS, EOS));
            counts.observe_sentence(&pairs);
        }
        counts
    }

    fn toy_vocab() -> Vocabulary {
        Vocabulary::new(["el", "perro", "gato", "come", "duerme"])
    }

    #[test]
    fn test_transition_cell_formula() {
        let counts = toy_counts();
        let tags = TagSet::new(counts.tags());
        let t = Estimator::new(0.001).unwrap().transition_matrix(&counts, &tags).unwrap();

        let det = tags.index_of("DET").unwrap();
        let noun = tags.index_of("NOUN").unwrap();
        let expected = (2.0 + 0.001) / (2.0 + 0.001 * tags.len() as f64);
        assert!((t.get(det, noun) - expected).abs() < 1e-12);

        let unseen = (0.0 + 0.001) / (2.0 + 0.001 * tags.len() as f64);
        assert!((t.get(det, det) - unseen).abs() < 1e-12);
    }

    #[test]
    fn test_rows_normalized_and_positive() {
        let counts = toy_counts();
        let tags = TagSet::new(counts.tags());
        let vocab = toy_vocab();
        let est = Estimator::default();
        let t = est.transition_matrix(&counts, &tags).unwrap();
        let e = est.emission_matrix(&counts, &tags, &vocab).unwrap();

        assert_eq!(t.shape(), (tags.len(), tags.len()));
        assert_eq!(e.shape(), (tags.len(), vocab.len()));
        for sum in t.row_sums().into_iter().chain(e.row_sums()) {
            assert!((sum - 1.0).abs() < 1e-6, "row sum {sum}");
        }
        assert!(t.as_slice().iter().all(|&p| p > 0.0 && p < 1.0));
        assert!(e.as_slice().iter().all(|&p| p > 0.0 && p < 1.0));
    }

    #[test]
    fn test_declared_but_unseen_tag_is_uniform() {
        let counts = toy_counts();
        let tags = TagSet::new(counts.tags().chain(["ADJ"]));
        let t = Estimator::default().transition_matrix(&counts, &tags).unwrap();
        let adj = tags.index_of("ADJ").unwrap();
        let uniform = 1.0 / tags.len() as f64;
        assert!(t.row(adj).iter().all(|&p| (p - uniform).abs() < 1e-12));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let counts = toy_counts();
        let tags = TagSet::new(counts.tags());
        let vocab = toy_vocab();
        let par = Estimator::default();
        let seq = Estimator::default().with_parallel(false);
        assert_eq!(
            par.transition_matrix(&counts, &tags).unwrap(),
            seq.transition_matrix(&counts, &tags).unwrap()
        );
        assert_eq!(
            par.emission_matrix(&counts, &tags, &vocab).unwrap(),
            seq.emission_matrix(&counts, &tags, &vocab).unwrap()
        );
    }

    #[test]
    fn test_unknown_tag_and_word_rejected() {
        let counts = toy_counts();
        let narrow = TagSet::new(["DET", "NOUN"]);
        assert!(matches!(
            Estimator::default().transition_matrix(&counts, &narrow),
            Err(HmmError::UnknownTag(t)) if t == "VERB"
        ));

        let tags = TagSet::new(counts.tags());
        let small = Vocabulary::new(["el"]);
        assert!(matches!(
            Estimator::default().emission_matrix(&counts, &tags, &small),
            Err(HmmError::WordNotIndexed(_))
        ));
    }

    #[test]
    fn test_invalid_alpha() {
        assert!(Estimator::new(0.0).is_err());
        assert!(Estimator::new(-1.0).is_err());
        assert!(Estimator::new(f64::NAN).is_err());
        assert_eq!(Estimator::new(0.5).unwrap().alpha(), 0.5);
    }
}
