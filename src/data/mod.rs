//! Training data: synthetic generation and holdout splitting.

pub mod sample;
pub mod split;

pub use sample::*;
pub use split::*;
