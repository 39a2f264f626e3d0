//! Run a forecast for an entire loan tape and roll it up by month
//!
//! Usage: cargo run --release --bin portfolio_summary -- <tape.csv> [YYYY-MM] [output.csv]

use anyhow::{Context, Result};
use chrono::Local;
use std::env;
use std::fs::File;
use std::io::Write;
use std::time::Instant;

use loan_forecast::forecast::parse_start_month;
use loan_forecast::loan::load_loans;
use loan_forecast::{BatchRunner, ForecastConfig, Normalizer, PortfolioSummary};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = args
        .get(1)
        .context("usage: portfolio_summary <tape.csv> [YYYY-MM] [output.csv]")?;
    let forecast_start = match args.get(2) {
        Some(month) => parse_start_month(month).with_context(|| format!("Invalid start month '{}'", month))?,
        None => Local::now().date_naive(),
    };
    let output_path = args
        .get(3)
        .cloned()
        .unwrap_or_else(|| "portfolio_summary_output.csv".to_string());

    let start = Instant::now();
    println!("Loading loans from {}...", input);
    let rows = load_loans(input).with_context(|| format!("Failed to load {}", input))?;
    println!("Loaded {} rows in {:?}", rows.len(), start.elapsed());

    let config = ForecastConfig::from_env();
    println!("Running forecasts ({}, tail window {})...", config.strategy, config.tail_window);
    let outcome = BatchRunner::new(config).run_tape(&rows, &Normalizer::new(), forecast_start);
    println!(
        "Forecasts complete in {:?}: {} processed, {} failed",
        outcome.elapsed, outcome.processed_records, outcome.failed_records
    );

    let summary = PortfolioSummary::from_results(&outcome.results);

    let mut file = File::create(&output_path).with_context(|| format!("Failed to create {}", output_path))?;
    writeln!(file, "Month,Balance,Disbursed,ActiveLoans")?;
    for (label, totals) in summary.monthly_rows() {
        writeln!(file, "{},{},{},{}", label, totals.balance, totals.delta, totals.active_loans)?;
    }
    println!("Output written to {}", output_path);

    println!("\nPortfolio Summary:");
    println!("  Loans:                  {}", summary.loan_count);
    println!("  Total Loan Amount:      ${}", summary.total_loan_amount);
    println!("  Total Outstanding:      ${}", summary.total_outstanding);
    println!("  Total Undisbursed:      ${}", summary.total_undisbursed);
    println!("  Total Forecasted:       ${}", summary.total_forecasted_amount);
    if let Some(month) = summary.peak_month {
        println!("  Peak Exposure:          ${} ({})", summary.peak_exposure, month.format("%b-%y"));
    }
    println!("  Exposure by property type:");
    for (property_type, exposure) in &summary.exposure_by_property_type {
        println!("    {:<20} ${}", property_type, exposure);
    }

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
