use thiserror::Error;

/// Errors that can occur during training, decoding and model I/O.
#[derive(Debug, Error)]
pub enum HmmError {
    /// The decode input holds no tokens.
    #[error("decode input is empty; at least one token (conventionally <BOS>) is required")]
    EmptyInput,

    /// A word handed to the decoder is not in the vocabulary.
    #[error("word {word:?} at position {position} is not in the vocabulary")]
    UnknownWord {
        /// The unresolved surface word.
        word: String,
        /// Position of the word in the input sequence.
        position: usize,
    },

    /// An observation index is outside the emission matrix.
    #[error("observation index {index} at position {position} is out of range")]
    ObservationOutOfRange {
        /// The offending index.
        index: usize,
        /// Position of the observation in the input sequence.
        position: usize,
    },

    /// A tag appears in the counts but not in the tag set.
    #[error("tag {0:?} is not part of the tag set")]
    UnknownTag(String),

    /// A word has emission counts but no vocabulary index.
    #[error("word {0:?} has emission counts but no vocabulary index")]
    WordNotIndexed(String),

    /// Matrix dimensions disagree with the vocabulary or tag set.
    #[error("{what} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Which component was checked.
        what: &'static str,
        /// Expected `(rows, cols)`.
        expected: (usize, usize),
        /// Actual `(rows, cols)`.
        found: (usize, usize),
    },

    /// A tag list is not in strictly increasing lexicographic order.
    #[error("tag list is not sorted: {0:?} appears out of order")]
    UnsortedTags(String),

    /// A required sentinel symbol is missing.
    #[error("missing sentinel symbol {0}")]
    MissingSentinel(&'static str),

    /// A probability cell is not a finite, strictly positive number.
    #[error("{matrix}[{row}][{col}] = {value} is not a valid probability")]
    InvalidProbability {
        /// Which matrix holds the bad cell.
        matrix: &'static str,
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// The rejected value.
        value: f64,
    },

    /// Invalid training configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Predicted and gold sequences are not aligned.
    #[error("predicted sequence has {predicted} tags but gold has {gold}")]
    LengthMismatch {
        /// Predicted sequence length.
        predicted: usize,
        /// Gold sequence length.
        gold: usize,
    },

    /// The model was built without a baseline table.
    #[error("model carries no baseline table")]
    BaselineUnavailable,

    /// Reading or writing a model file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A model file could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for hmmpos operations.
pub type Result<T> = std::result::Result<T, HmmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = HmmError::UnknownWord {
            word: "gato".into(),
            position: 3,
        };
        assert_eq!(
            err.to_string(),
            "word \"gato\" at position 3 is not in the vocabulary"
        );

        let err = HmmError::ShapeMismatch {
            what: "emission matrix",
            expected: (4, 10),
            found: (4, 9),
        };
        assert!(err.to_string().contains("(4, 9)"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HmmError>();
    }
}
