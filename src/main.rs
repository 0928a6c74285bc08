// Runs the scheduling strategies on one day's snapshot and prints the reports.
//
// Usage:
//   port-schedule <snapshot.json> [--date YYYY-MM-DD] [--config config.json] [strategy ...]
//
// Strategies: optimal, greedy, local-search (default: all three).
// The date defaults to today and only labels the response.

use std::fs;

use anyhow::{bail, Context, Result};
use chrono::Local;
use tracing::info;

use port_schedule::catalog::{DaySnapshot, InMemoryCatalog};
use port_schedule::config::SchedulerConfig;
use port_schedule::logging;
use port_schedule::service::{Scheduler, SchedulingRequest, DATE_FORMAT};

struct Args {
    snapshot: String,
    date: Option<String>,
    config: Option<String>,
    strategies: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut snapshot = None;
    let mut date = None;
    let mut config = None;
    let mut strategies = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--date" => date = Some(args.next().context("--date needs a value")?),
            "--config" => config = Some(args.next().context("--config needs a value")?),
            _ if snapshot.is_none() => snapshot = Some(arg),
            _ => strategies.push(arg),
        }
    }

    let Some(snapshot) = snapshot else {
        bail!("usage: port-schedule <snapshot.json> [--date YYYY-MM-DD] [--config config.json] [strategy ...]");
    };
    Ok(Args {
        snapshot,
        date,
        config,
        strategies,
    })
}

fn run() -> Result<()> {
    logging::init();
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {path}"))?;
            SchedulerConfig::from_json_str(&text)
                .with_context(|| format!("invalid config {path}"))?
        }
        None => SchedulerConfig::default(),
    };

    let date = args
        .date
        .unwrap_or_else(|| Local::now().date_naive().format(DATE_FORMAT).to_string());
    let selectors: Vec<&str> = args.strategies.iter().map(String::as_str).collect();
    let request = SchedulingRequest::parse(&date, &selectors)?;

    let snapshot = DaySnapshot::from_json_file(&args.snapshot)
        .with_context(|| format!("failed to load snapshot {}", args.snapshot))?;
    info!(
        path = %args.snapshot,
        operations = snapshot.operations.len(),
        "snapshot loaded"
    );
    let catalog = InMemoryCatalog::new().with_day(request.date, snapshot);

    let response = Scheduler::new(config).run(&catalog, &request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Application error: {:#}", e);
        std::process::exit(1);
    }
}
