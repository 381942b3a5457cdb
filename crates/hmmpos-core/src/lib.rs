//! # hmmpos Core
//!
//! Part-of-speech tagging with a bigram Hidden Markov Model. Provides count
//! aggregation over tagged corpora, additive-smoothing parameter estimation,
//! exact log-space Viterbi decoding and a most-frequent-tag baseline.
//!
//! ## Quick Start
//!
//! ```rust
//! use hmmpos_core::{Trainer, TrainerConfig, VocabularyBuilder};
//!
//! let corpus = [
//!     vec![("el", "DET"), ("perro", "NOUN"), ("come", "VERB")],
//!     vec![("el", "DET"), ("gato", "NOUN"), ("come", "VERB")],
//!     vec![("el", "DET"), ("perro", "NOUN"), ("come", "VERB")],
//! ];
//!
//! let mut words = VocabularyBuilder::new();
//! for sentence in &corpus {
//!     words.add_sentence(sentence);
//! }
//! let vocab = words.build(2);
//! assert!(!vocab.contains("gato"));
//!
//! let mut trainer = Trainer::new(vocab, TrainerConfig::default()).unwrap();
//! for sentence in &corpus {
//!     trainer.add_sentence(sentence);
//! }
//! let model = trainer.finish().unwrap();
//!
//! let tagged = model.tagger().tag_sentence(&["el", "perro", "come"]).unwrap();
//! assert_eq!(tagged, [("el", "DET"), ("perro", "NOUN"), ("come", "VERB")]);
//! ```
pub mod decode;
pub mod error;
pub mod estimate;
pub mod eval;
pub mod model;
pub mod train;
pub mod types;

// Re-export primary API
pub use decode::{Lattice, MostFrequentTag, ViterbiDecoder};
pub use error::{HmmError, Result};
pub use estimate::{CountTables, Estimator, DEFAULT_ALPHA};
pub use eval::{accuracy, Evaluation, LabelCounts};
pub use model::{HmmModel, Tagger, FORMAT_VERSION};
pub use train::{Trainer, TrainerConfig};
pub use types::{is_sentinel, Matrix, TagSet, Vocabulary, VocabularyBuilder, BOS, EOS, UNK};
