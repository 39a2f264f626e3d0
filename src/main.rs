//! Loan Forecast CLI
//!
//! Command-line interface for running disbursement forecasts

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::env;
use std::io;
use std::path::PathBuf;

use loan_forecast::forecast::config::ALGORITHM_ENV;
use loan_forecast::forecast::{calculate_range_schedule, parse_start_month, RangeLoan, RangeRequest};
use loan_forecast::loan::load_loans;
use loan_forecast::{report, BatchRunner, ForecastConfig, Normalizer, StrategyRegistry, TailWindow};

#[derive(Parser)]
#[command(name = "loan_forecast", author, version, about = "S-curve disbursement forecasts for construction loans", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every loan on a loan tape
    Forecast(ForecastArgs),
    /// Cumulative schedule for one loan over an explicit window
    Range(RangeArgs),
    /// List the registered forecast algorithms
    Strategies,
}

#[derive(clap::Args)]
struct ForecastArgs {
    /// Loan tape CSV
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Forecast start month, YYYY-MM or YYYY-MM-DD (defaults to the current month)
    #[arg(short, long, value_parser = parse_month_arg)]
    start: Option<NaiveDate>,

    /// Forecast algorithm; FORECAST_ALGORITHM_TYPE takes precedence when set
    #[arg(short, long)]
    algorithm: Option<String>,

    /// Grace period after the extended date, e.g. 6m or 181d
    #[arg(long)]
    tail_window: Option<TailWindow>,

    /// Total progress the start-date solver targets at the forecast start
    #[arg(long)]
    calibration: Option<f64>,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Report path (defaults to <input>_forecast.csv)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print results as JSON to stdout instead of writing a CSV report
    #[arg(long)]
    json: bool,

    /// Date used for unreadable tape dates (defaults to today)
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(clap::Args)]
struct RangeArgs {
    #[arg(long)]
    loan_id: String,

    /// Loan start date (YYYY-MM-DD)
    #[arg(long)]
    start_date: NaiveDate,

    #[arg(long)]
    maturity: NaiveDate,

    #[arg(long)]
    extended: Option<NaiveDate>,

    #[arg(long)]
    amount: Decimal,

    #[arg(long, default_value = "0")]
    outstanding: Decimal,

    /// Reported completion as a fraction (0.45 = 45%)
    #[arg(long, default_value = "0")]
    completion: Decimal,

    /// What-if completion replacing the reported value
    #[arg(long = "override")]
    completion_override: Option<Decimal>,

    #[arg(long)]
    from: NaiveDate,

    #[arg(long)]
    to: NaiveDate,
}

fn parse_month_arg(value: &str) -> Result<NaiveDate, String> {
    parse_start_month(value).ok_or_else(|| format!("expected YYYY-MM or YYYY-MM-DD, got '{}'", value))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Forecast(args) => run_forecast(args),
        Commands::Range(args) => run_range(args),
        Commands::Strategies => {
            let registry = StrategyRegistry::builtin();
            for name in registry.names() {
                if let Some(strategy) = registry.get(name) {
                    println!("{:<14} {}", strategy.name(), strategy.description());
                }
            }
            Ok(())
        }
    }
}

fn run_forecast(args: ForecastArgs) -> Result<()> {
    let mut config = ForecastConfig::from_env();
    if let Some(algorithm) = args.algorithm {
        let env_set = env::var(ALGORITHM_ENV).map(|v| !v.trim().is_empty()).unwrap_or(false);
        if env_set {
            log::warn!("{} is set; ignoring --algorithm {}", ALGORITHM_ENV, algorithm);
        } else {
            config.strategy = algorithm;
        }
    }
    if let Some(tail_window) = args.tail_window {
        config.tail_window = tail_window;
    }
    if let Some(target) = args.calibration {
        anyhow::ensure!(target > 0.0 && target < 1.0, "calibration target must be in (0, 1), got {}", target);
        config.calibration_target = target;
    }

    let forecast_start = args.start.unwrap_or_else(|| Local::now().date_naive());
    let normalizer = match args.today {
        Some(today) => Normalizer::with_today(today),
        None => Normalizer::new(),
    };

    let rows = load_loans(&args.input)
        .with_context(|| format!("Failed to load loan tape {}", args.input.display()))?;
    println!("Loaded {} loan rows from {}", rows.len(), args.input.display());

    let mut runner = BatchRunner::new(config);
    if let Some(threads) = args.threads {
        runner = runner.with_threads(threads);
    }
    let outcome = runner.run_tape(&rows, &normalizer, forecast_start);

    if args.json {
        let json = report::forecast_json(&outcome.results).context("Failed to serialize forecast")?;
        println!("{}", json);
    } else {
        let output = args.output.unwrap_or_else(|| report::default_output_path(&args.input));
        report::write_forecast_csv_file(&output, &outcome.results)
            .with_context(|| format!("Failed to write report {}", output.display()))?;
        println!("Report written to {}", output.display());
    }

    println!("\nForecast Summary:");
    println!("  Total records:     {}", outcome.total_records);
    println!("  Processed records: {}", outcome.processed_records);
    println!("  Failed records:    {}", outcome.failed_records);
    for rejected in &outcome.rejected {
        println!("    {:<16} {}", rejected.loan_number, rejected.reason);
    }
    println!("  Elapsed:           {:?}", outcome.elapsed);

    Ok(())
}

fn run_range(args: RangeArgs) -> Result<()> {
    anyhow::ensure!(args.from <= args.to, "--from {} is after --to {}", args.from, args.to);

    let loan = RangeLoan {
        loan_id: args.loan_id,
        start_date: args.start_date,
        maturity_date: args.maturity,
        extended_date: args.extended,
        loan_amount: args.amount,
        outstanding_balance: args.outstanding,
        completion: args.completion,
    };
    let mut request = RangeRequest::new(args.from, args.to);
    if let Some(completion) = args.completion_override {
        request = request.with_completion(completion);
    }

    let schedule = calculate_range_schedule(&loan, &request);

    let mut wtr = csv::Writer::from_writer(io::stdout());
    wtr.write_record(["Month", "Cumulative Amount", "Monthly Amount"])?;
    for point in &schedule {
        wtr.write_record([point.label(), point.balance.to_string(), point.delta.to_string()])?;
    }
    wtr.flush()?;

    Ok(())
}
