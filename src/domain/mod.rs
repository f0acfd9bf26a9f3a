//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - filing statuses and brackets (`FilingStatus`, `Bracket`)
//! - tax queries and labeled records (`TaxCase`)
//! - persisted fit state (`ScalerState`, `ModelState`)
//! - training configuration (`TrainConfig`, `SampleRanges`)

pub mod types;

pub use types::*;
