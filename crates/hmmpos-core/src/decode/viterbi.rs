//! # Viterbi Decoding for the bigram HMM
//!
//! Finds the most likely tag sequence for an observation sequence in three
//! phases: initialize, forward (log-space max-product with backpointers) and
//! backward (follow the backpointers from the best terminal tag).
//!
//! The log matrices are computed once per decoder. Both are stored transposed
//! so that the inner maximisation reads contiguous memory: one row per
//! destination tag for the transitions, one row per word for the emissions.

use crate::error::{HmmError, Result};
use crate::types::Matrix;

/// Exact Viterbi decoder over precomputed log probabilities.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    num_tags: usize,
    log_initial: Vec<f64>,
    /// `[num_tags][num_tags]`, element `[j][i]` = `ln T[i][j]`.
    log_transition_in: Matrix,
    /// `[num_words][num_tags]`, element `[k][j]` = `ln E[j][k]`.
    log_emission_by_word: Matrix,
}

/// Forward tables of one decode call.
///
/// Scores and backpointers are stored position-major: cell `(tag, t)` lives at
/// `t * num_tags + tag`.
#[derive(Debug, Clone)]
pub struct Lattice {
    num_tags: usize,
    len: usize,
    scores: Vec<f64>,
    backpointers: Vec<usize>,
}

impl ViterbiDecoder {
    /// Create a decoder.
    ///
    /// # Arguments
    /// * `initial` - distribution of the tag at position 0 (`T[<BOS>]` for a trained model)
    /// * `transition` - `[num_tags][num_tags]` probabilities, row = previous tag
    /// * `emission` - `[num_tags][num_words]` probabilities, row = tag
    ///
    /// Every cell must be a probability in `(0, 1]` so its logarithm is finite.
    pub fn new(initial: &[f64], transition: &Matrix, emission: &Matrix) -> Result<Self> {
        let n = transition.rows();
        transition.check_shape("transition matrix", (n, n))?;
        emission.check_shape("emission matrix", (n, emission.cols()))?;
        if initial.len() != n {
            return Err(HmmError::ShapeMismatch {
                what: "initial distribution",
                expected: (1, n),
                found: (1, initial.len()),
            });
        }
        transition.check_probabilities("transition matrix")?;
        emission.check_probabilities("emission matrix")?;
        for (j, &p) in initial.iter().enumerate() {
            if !(p.is_finite() && p > 0.0 && p <= 1.0) {
                return Err(HmmError::InvalidProbability {
                    matrix: "initial distribution",
                    row: 0,
                    col: j,
                    value: p,
                });
            }
        }

        Ok(Self {
            num_tags: n,
            log_initial: initial.iter().map(|p| p.ln()).collect(),
            log_transition_in: transition.map(f64::ln).transpose(),
            log_emission_by_word: emission.map(f64::ln).transpose(),
        })
    }

    /// Number of hidden states.
    pub fn num_tags(&self) -> usize {
        self.num_tags
    }

    /// Number of distinct observations (vocabulary size).
    pub fn num_observations(&self) -> usize {
        self.log_emission_by_word.rows()
    }

    /// Run the initialize and forward phases.
    pub fn forward(&self, observations: &[usize]) -> Result<Lattice> {
        let len = observations.len();
        if len == 0 {
            return Err(HmmError::EmptyInput);
        }
        if let Some((position, &index)) = observations
            .iter()
            .enumerate()
            .find(|&(_, &o)| o >= self.num_observations())
        {
            return Err(HmmError::ObservationOutOfRange { index, position });
        }

        let n = self.num_tags;
        let mut scores = vec![f64::NEG_INFINITY; len * n];
        let mut backpointers = vec![0usize; len * n];

        // Initialize
        let emit = self.log_emission_by_word.row(observations[0]);
        for (j, score) in scores[..n].iter_mut().enumerate() {
            *score = self.log_initial[j] + emit[j];
        }

        // Forward pass
        for (t, &obs) in observations.iter().enumerate().skip(1) {
            let emit = self.log_emission_by_word.row(obs);
            let (done, rest) = scores.split_at_mut(t * n);
            let prev = &done[(t - 1) * n..];
            let curr = &mut rest[..n];
            let back = &mut backpointers[t * n..(t + 1) * n];

            for j in 0..n {
                let incoming = self.log_transition_in.row(j);
                let (best_prev, best_score) = argmax(
                    prev.iter()
                        .zip(incoming)
                        .map(|(&score, &trans)| score + trans + emit[j]),
                );
                curr[j] = best_score;
                back[j] = best_prev;
            }
        }

        Ok(Lattice {
            num_tags: n,
            len,
            scores,
            backpointers,
        })
    }

    /// Decode the optimal tag sequence as tag indices, one per observation.
    pub fn decode(&self, observations: &[usize]) -> Result<Vec<usize>> {
        Ok(self.forward(observations)?.best_path())
    }
}

impl Lattice {
    /// Number of positions.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; empty inputs are rejected before a lattice exists.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of tags per position.
    pub fn num_tags(&self) -> usize {
        self.num_tags
    }

    /// Log score of the best path ending in `tag` at `position`.
    pub fn score(&self, tag: usize, position: usize) -> f64 {
        self.scores[position * self.num_tags + tag]
    }

    /// Predecessor of `tag` at `position` on its best path; `None` at position 0.
    pub fn backpointer(&self, tag: usize, position: usize) -> Option<usize> {
        (position > 0).then(|| self.backpointers[position * self.num_tags + tag])
    }

    /// Best terminal tag and its log score.
    pub fn best_final(&self) -> (usize, f64) {
        let last = (self.len - 1) * self.num_tags;
        argmax(self.scores[last..last + self.num_tags].iter().copied())
    }

    /// Log probability of the best path.
    pub fn best_score(&self) -> f64 {
        self.best_final().1
    }

    /// Backward phase: start from the terminal argmax and follow the
    /// backpointers, one tag per position.
    pub fn best_path(&self) -> Vec<usize> {
        let mut path = vec![0usize; self.len];
        let (mut tag, _) = self.best_final();
        path[self.len - 1] = tag;
        for t in (1..self.len).rev() {
            tag = self.backpointers[t * self.num_tags + tag];
            path[t - 1] = tag;
        }
        path
    }
}

/// First index holding the maximum; ties go to the lowest index.
fn argmax(values: impl Iterator<Item = f64>) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, v) in values.enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state() -> ViterbiDecoder {
        let transition = Matrix::from_rows(vec![vec![0.7, 0.3], vec![0.4, 0.6]]).unwrap();
        let emission =
            Matrix::from_rows(vec![vec![0.5, 0.4, 0.1], vec![0.1, 0.3, 0.6]]).unwrap();
        ViterbiDecoder::new(&[0.55, 0.45], &transition, &emission).unwrap()
    }

    fn brute_force(observations: &[usize]) -> Vec<usize> {
        let initial = [0.55, 0.45];
        let transition = [[0.7, 0.3], [0.4, 0.6]];
        let emission = [[0.5, 0.4, 0.1], [0.1, 0.3, 0.6]];
        let len = observations.len();

        let mut best = (Vec::new(), f64::NEG_INFINITY);
        for code in 0..(1usize << len) {
            let path: Vec<usize> = (0..len).map(|t| (code >> (len - 1 - t)) & 1).collect();
            let mut p = initial[path[0]] * emission[path[0]][observations[0]];
            for t in 1..len {
                p *= transition[path[t - 1]][path[t]] * emission[path[t]][observations[t]];
            }
            if p > best.1 {
                best = (path, p);
            }
        }
        best.0
    }

    #[test]
    fn test_matches_brute_force() {
        let decoder = two_state();
        for a in 0..3 {
            for b in 0..3 {
                assert_eq!(decoder.decode(&[a, b]).unwrap(), brute_force(&[a, b]), "{a},{b}");
                for c in 0..3 {
                    let obs = [a, b, c];
                    assert_eq!(decoder.decode(&obs).unwrap(), brute_force(&obs), "{obs:?}");
                }
            }
        }
    }

    #[test]
    fn test_hand_computed_path() {
        // A,A: .55*.5*.7*.5 = .09625 beats every other assignment of [0, 0]
        let decoder = two_state();
        let lattice = decoder.forward(&[0, 0]).unwrap();
        assert_eq!(lattice.best_path(), vec![0, 0]);
        assert!((lattice.best_score() - 0.09625f64.ln()).abs() < 1e-12);

        // word 2 strongly prefers B
        assert_eq!(decoder.decode(&[2, 2]).unwrap(), vec![1, 1]);
        assert_eq!(decoder.decode(&[2, 0]).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_path_follows_backpointers() {
        let decoder = two_state();
        let obs = [0, 2, 1, 2, 0];
        let lattice = decoder.forward(&obs).unwrap();
        let path = lattice.best_path();
        assert_eq!(path.len(), obs.len());
        assert_eq!(path[obs.len() - 1], lattice.best_final().0);
        for t in 1..obs.len() {
            assert_eq!(lattice.backpointer(path[t], t), Some(path[t - 1]));
        }
        assert_eq!(lattice.backpointer(path[0], 0), None);
    }

    #[test]
    fn test_ties_prefer_lowest_index() {
        let transition = Matrix::filled(3, 3, 1.0 / 3.0);
        let emission = Matrix::filled(3, 2, 0.5);
        let decoder = ViterbiDecoder::new(&[1.0 / 3.0; 3], &transition, &emission).unwrap();
        assert_eq!(decoder.decode(&[0, 1, 1, 0]).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_single_observation() {
        let decoder = two_state();
        assert_eq!(decoder.decode(&[2]).unwrap(), vec![1]);
        assert_eq!(decoder.decode(&[0]).unwrap(), vec![0]);
    }

    #[test]
    fn test_empty_input_rejected() {
        let decoder = two_state();
        assert!(matches!(decoder.decode(&[]), Err(HmmError::EmptyInput)));
    }

    #[test]
    fn test_out_of_range_observation() {
        let decoder = two_state();
        match decoder.decode(&[0, 7, 1]) {
            Err(HmmError::ObservationOutOfRange { index, position }) => {
                assert_eq!((index, position), (7, 1));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_probability() {
        let transition = Matrix::from_rows(vec![vec![1.0, 0.0], vec![0.5, 0.5]]).unwrap();
        let emission = Matrix::filled(2, 2, 0.5);
        assert!(matches!(
            ViterbiDecoder::new(&[0.5, 0.5], &transition, &emission),
            Err(HmmError::InvalidProbability { row: 0, col: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_mismatched_shapes() {
        let transition = Matrix::filled(2, 2, 0.5);
        let emission = Matrix::filled(3, 4, 0.25);
        assert!(matches!(
            ViterbiDecoder::new(&[0.5, 0.5], &transition, &emission),
            Err(HmmError::ShapeMismatch { .. })
        ));
        let emission = Matrix::filled(2, 4, 0.25);
        assert!(ViterbiDecoder::new(&[1.0], &transition, &emission).is_err());
    }

    #[test]
    fn test_deterministic() {
        let decoder = two_state();
        let obs = [1, 1, 2, 0, 2, 1, 0];
        assert_eq!(decoder.decode(&obs).unwrap(), decoder.decode(&obs).unwrap());
    }
}
