//! Mathematical utilities: least squares, Lasso, summary statistics.

pub mod lasso;
pub mod ols;
pub mod stats;

pub use lasso::*;
pub use ols::*;
pub use stats::*;
