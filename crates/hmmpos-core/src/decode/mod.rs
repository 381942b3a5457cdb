pub mod baseline;
pub mod viterbi;

pub use baseline::MostFrequentTag;
pub use viterbi::{Lattice, ViterbiDecoder};
