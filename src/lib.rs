//! `taxsense` library crate.
//!
//! Progressive-bracket tax calculation plus a small linear regressor trained
//! on calculator-labeled synthetic households. The binary (`taxsense`) is a
//! thin wrapper around this library so that core logic is testable without
//! spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod settings;
pub mod tax;

pub use app::service::{Estimate, Prediction, TaxService};
pub use domain::FilingStatus;
pub use error::{Result, TaxError};
pub use tax::{BracketTable, TaxCalculator};
