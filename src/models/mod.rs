//! Learned estimator components: the feature scaler and the linear regressor.
//!
//! Both hold their fitted state as an immutable value once trained or loaded,
//! and persist it through `io::state`.

pub mod regressor;
pub mod scaler;

pub use regressor::*;
pub use scaler::*;
