//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves settings (environment, `.env`, CLI overrides)
//! - dispatches to the service and prints reports

use clap::Parser;

use crate::cli::{Cli, Command, HouseholdArgs, PredictArgs, TrainArgs};
use crate::error::Result;
use crate::settings::Settings;
use crate::tax::TaxCalculator;

pub mod pipeline;
pub mod service;

use service::TaxService;

/// Entry point for the `taxsense` binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = settings_from(&cli);
    tracing::debug!(model_dir = %settings.model_dir.display(), "resolved settings");

    // Only the commands that serve predictions load persisted model state.
    match cli.command {
        Command::Train(args) => handle_train(&settings, &args),
        Command::Compute(args) => handle_compute(&settings, &args),
        Command::Predict(args) => handle_predict(&TaxService::from_settings(&settings)?, &args),
        Command::Estimate(args) => handle_estimate(&TaxService::from_settings(&settings)?, &args),
    }
}

fn settings_from(cli: &Cli) -> Settings {
    let mut settings = Settings::from_env();
    if let Some(dir) = &cli.model_dir {
        settings.model_dir = dir.clone();
    }
    if let Some(csv) = &cli.brackets {
        settings.bracket_csv = Some(csv.clone());
    }
    settings
}

fn handle_train(settings: &Settings, args: &TrainArgs) -> Result<()> {
    let config = args.to_config()?;
    let calculator = TaxCalculator::new(settings.bracket_table()?);
    let report = pipeline::train_and_persist(&calculator, &config, &settings.model_paths())?;
    println!("{}", crate::report::format_training_report(&report));
    Ok(())
}

fn handle_compute(settings: &Settings, args: &HouseholdArgs) -> Result<()> {
    let calculator = TaxCalculator::new(settings.bracket_table()?);
    let tax = calculator.compute(args.income, args.deductions, args.filing_status)?;
    println!("{}", crate::report::format_money(tax));
    Ok(())
}

fn handle_predict(service: &TaxService, args: &PredictArgs) -> Result<()> {
    let tax = service.predict_tax(args.income, args.deductions)?;
    println!("{}", crate::report::format_money(tax));
    Ok(())
}

fn handle_estimate(service: &TaxService, args: &HouseholdArgs) -> Result<()> {
    let estimate = service.estimate(args.income, args.deductions, args.filing_status)?;
    println!("{}", crate::report::format_estimate(&estimate));
    Ok(())
}
