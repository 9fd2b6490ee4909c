mod cli;
mod output;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use fieldplan::datasources::ScenarioStore;
use fieldplan::logic::{BatchRunner, FieldAdvisor};
use fieldplan::Config;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over -v
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init = cli.command {
        Config::setup_interactive(cli.config.clone()).context("Setup failed")?;
        return Ok(());
    }

    let config = Config::load(cli.config.clone()).context("Configuration error")?;
    run(&cli, &config).await
}

async fn run(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Commands::Init | Commands::Check => check(cli, config),
        Commands::Irrigation {
            field,
            date,
            moisture,
        } => {
            let rec = advisor(cli, config)?.irrigation_for(field, *date, *moisture)?;
            emit(cli, &rec, output::irrigation)
        }
        Commands::Schedule { field } => {
            let advisor = advisor(cli, config)?;
            let schedule = advisor.irrigation_schedule(field)?;
            if cli.json {
                print_json(&schedule)
            } else {
                let weather = advisor.weather_summary(field)?;
                print!("{}", output::schedule(&schedule, weather.as_ref()));
                Ok(())
            }
        }
        Commands::Plan { field } => {
            let plan = advisor(cli, config)?.season_plan(field)?;
            emit(cli, &plan, output::plan)
        }
        Commands::Balance { field, as_of } => {
            let as_of = as_of.unwrap_or_else(today);
            let balance = advisor(cli, config)?.nutrient_balance(field, as_of)?;
            emit(cli, &balance, output::balance)
        }
        Commands::Batch { as_of } => {
            let as_of = as_of.unwrap_or_else(today);
            let advisor = Arc::new(advisor(cli, config)?);
            let report = BatchRunner::new(advisor, config.batch.max_concurrency)
                .run(as_of)
                .await?;
            emit(cli, &report, output::batch)
        }
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn scenario_path(cli: &Cli, config: &Config) -> Result<PathBuf> {
    match cli.scenario.clone().or_else(|| config.scenario.clone()) {
        Some(path) => Ok(path),
        None => bail!("No scenario file. Pass --scenario or set `scenario` in config.yaml"),
    }
}

fn advisor(cli: &Cli, config: &Config) -> Result<FieldAdvisor<ScenarioStore>> {
    let path = scenario_path(cli, config)?;
    let store = ScenarioStore::load(&path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;
    Ok(FieldAdvisor::new(store, config)?)
}

fn check(cli: &Cli, config: &Config) -> Result<()> {
    println!("Config: OK");
    println!(
        "  {} rules, stage table with {} thresholds, batch concurrency {}",
        fieldplan::logic::RulesEngine::new().list_rules().len(),
        config.growth_stages.thresholds().len(),
        config.batch.max_concurrency
    );

    let path = scenario_path(cli, config)?;
    let advisor = advisor(cli, config)?;
    let field_ids = advisor.field_ids()?;
    println!("Scenario {}: {} field(s)", path.display(), field_ids.len());

    let mut failures = 0;
    for id in &field_ids {
        match advisor.season_plan(id) {
            Ok(plan) => println!(
                "  {:<12} OK ({} planned application(s))",
                id,
                plan.applications.len()
            ),
            Err(e) => {
                failures += 1;
                println!("  {:<12} ERROR: {}", id, e);
            }
        }
    }

    if failures > 0 {
        bail!("{} field(s) failed to resolve", failures);
    }
    Ok(())
}

fn emit<T: Serialize>(cli: &Cli, value: &T, render: fn(&T) -> String) -> Result<()> {
    if cli.json {
        print_json(value)
    } else {
        print!("{}", render(value));
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
