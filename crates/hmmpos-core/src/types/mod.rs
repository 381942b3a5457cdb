pub mod matrix;
pub mod tagset;
pub mod vocab;

pub use matrix::Matrix;
pub use tagset::{is_sentinel, TagSet, BOS, EOS, UNK};
pub use vocab::{Vocabulary, VocabularyBuilder};
