//! # hmmpos Trainer
//!
//! Corpus loading plus the training and evaluation workflows behind the
//! `train` and `evaluate` binaries.

pub mod data;
pub mod trainer;

pub use data::{load_corpus, load_tag_list, TaggedSentence};
pub use trainer::{evaluate, load_config, CorpusTrainer, EvalReport, EvalSummary, DEFAULT_MIN_COUNT};
