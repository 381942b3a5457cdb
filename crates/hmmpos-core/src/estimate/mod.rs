pub mod counts;
pub mod smoothing;

pub use counts::CountTables;
pub use smoothing::{Estimator, DEFAULT_ALPHA};
