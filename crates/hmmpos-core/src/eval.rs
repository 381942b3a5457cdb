//! # Accuracy evaluation
//!
//! Positions whose gold tag is `<BOS>` or `<EOS>` are structural and never
//! scored. [`accuracy`] scores one pair of sequences; [`Evaluation`]
//! accumulates over a test set and also reports sentence accuracy and
//! per-tag precision, recall and F1.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{HmmError, Result};
use crate::types::is_sentinel;

/// Fraction of non-sentinel positions where `predicted` equals `gold`.
///
/// Returns `0.0` when there is nothing to score.
///
/// # Examples
/// ```
/// use hmmpos_core::eval::accuracy;
///
/// let gold = ["<BOS>", "DET", "NOUN", "<EOS>"];
/// let predicted = ["<EOS>", "DET", "VERB", "<BOS>"];
/// assert_eq!(accuracy(&predicted, &gold)?, 0.5);
/// # Ok::<(), hmmpos_core::HmmError>(())
/// ```
pub fn accuracy<P, G>(predicted: &[P], gold: &[G]) -> Result<f64>
where
    P: AsRef<str>,
    G: AsRef<str>,
{
    let (correct, total) = score(predicted, gold)?;
    Ok(ratio(correct, total))
}

/// `(correct, scored)` over the non-sentinel positions.
fn score<P, G>(predicted: &[P], gold: &[G]) -> Result<(usize, usize)>
where
    P: AsRef<str>,
    G: AsRef<str>,
{
    if predicted.len() != gold.len() {
        return Err(HmmError::LengthMismatch {
            predicted: predicted.len(),
            gold: gold.len(),
        });
    }
    let mut correct = 0;
    let mut total = 0;
    for (p, g) in predicted.iter().zip(gold) {
        let g = g.as_ref();
        if is_sentinel(g) {
            continue;
        }
        total += 1;
        if p.as_ref() == g {
            correct += 1;
        }
    }
    Ok((correct, total))
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Counts for one tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelCounts {
    /// Positions where the tag was predicted and correct.
    pub correct: usize,
    /// Positions where the tag was predicted.
    pub predicted: usize,
    /// Positions where the tag is the gold tag.
    pub observed: usize,
}

impl LabelCounts {
    /// `correct / predicted`, 0 when never predicted.
    pub fn precision(&self) -> f64 {
        ratio(self.correct, self.predicted)
    }

    /// `correct / observed`, 0 when never observed.
    pub fn recall(&self) -> f64 {
        ratio(self.correct, self.observed)
    }

    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 }
    }
}

/// Accumulated tagging performance over many sentences.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    labels: BTreeMap<String, LabelCounts>,
    items_correct: usize,
    items_total: usize,
    sentences_correct: usize,
    sentences_total: usize,
}

impl Evaluation {
    /// Create an empty evaluation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sentence. An empty predicted tag stands for "no prediction"
    /// and is simply wrong. Sentences without any scored position are
    /// ignored.
    pub fn accumulate<P, G>(&mut self, predicted: &[P], gold: &[G]) -> Result<()>
    where
        P: AsRef<str>,
        G: AsRef<str>,
    {
        let (correct, total) = score(predicted, gold)?;
        if total == 0 {
            return Ok(());
        }

        for (p, g) in predicted.iter().zip(gold) {
            let (p, g) = (p.as_ref(), g.as_ref());
            if is_sentinel(g) {
                continue;
            }
            self.labels.entry(g.to_string()).or_default().observed += 1;
            if !p.is_empty() {
                let entry = self.labels.entry(p.to_string()).or_default();
                entry.predicted += 1;
                if p == g {
                    entry.correct += 1;
                }
            }
        }

        self.items_correct += correct;
        self.items_total += total;
        self.sentences_total += 1;
        if correct == total {
            self.sentences_correct += 1;
        }
        Ok(())
    }

    /// Correct scored positions over all scored positions.
    pub fn item_accuracy(&self) -> f64 {
        ratio(self.items_correct, self.items_total)
    }

    /// Fraction of sentences tagged entirely correctly.
    pub fn sentence_accuracy(&self) -> f64 {
        ratio(self.sentences_correct, self.sentences_total)
    }

    /// Number of scored positions.
    pub fn num_items(&self) -> usize {
        self.items_total
    }

    /// Number of scored sentences.
    pub fn num_sentences(&self) -> usize {
        self.sentences_total
    }

    /// Counts for a single tag.
    pub fn label(&self, tag: &str) -> Option<LabelCounts> {
        self.labels.get(tag).copied()
    }

    /// Per-tag counts, sorted by tag.
    pub fn labels(&self) -> impl Iterator<Item = (&str, LabelCounts)> {
        self.labels.iter().map(|(t, c)| (t.as_str(), *c))
    }

    /// Macro-averaged `(precision, recall, f1)` over tags present in the gold
    /// data.
    pub fn macro_average(&self) -> (f64, f64, f64) {
        let observed: Vec<&LabelCounts> =
            self.labels.values().filter(|c| c.observed > 0).collect();
        if observed.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let n = observed.len() as f64;
        let sum = observed.iter().fold((0.0, 0.0, 0.0), |acc, c| {
            (acc.0 + c.precision(), acc.1 + c.recall(), acc.2 + c.f1())
        });
        (sum.0 / n, sum.1 / n, sum.2 / n)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Performance by tag (#match, #model, #ref) (precision, recall, F1):"
        )?;
        for (tag, c) in &self.labels {
            if c.observed == 0 {
                writeln!(
                    f,
                    "\t{tag}: ({}, {}, {}) (******, ******, ******)",
                    c.correct, c.predicted, c.observed
                )?;
            } else {
                writeln!(
                    f,
                    "\t{tag}: ({}, {}, {}) ({:.4}, {:.4}, {:.4})",
                    c.correct,
                    c.predicted,
                    c.observed,
                    c.precision(),
                    c.recall(),
                    c.f1()
                )?;
            }
        }
        let (p, r, f1) = self.macro_average();
        writeln!(f, "Macro-average precision, recall, F1: ({p:.4}, {r:.4}, {f1:.4})")?;
        writeln!(
            f,
            "Item accuracy: {}/{} => {:.4}",
            self.items_correct,
            self.items_total,
            self.item_accuracy()
        )?;
        write!(
            f,
            "Sentence accuracy: {}/{} => {:.4}",
            self.sentences_correct,
            self.sentences_total,
            self.sentence_accuracy()
        )
    }
}
