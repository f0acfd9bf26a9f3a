//! Progressive bracket engine.
//!
//! - bracket schedules and their invariants (`brackets`)
//! - the deterministic calculator (`calculator`)

pub mod brackets;
pub mod calculator;

pub use brackets::*;
pub use calculator::*;
