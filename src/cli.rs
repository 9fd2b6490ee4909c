use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fieldplan",
    version,
    about = "Irrigation and fertilizer planning per field"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Scenario file with fields, soils, crops and weather
    #[arg(short, long, global = true)]
    pub scenario: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a config file interactively
    Init,
    /// Validate config and scenario, and resolve every field
    Check,
    /// Irrigation advice for one day
    Irrigation {
        #[arg(short, long)]
        field: String,
        /// Day to evaluate (defaults to the latest observation)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Volumetric soil moisture reading, overrides the stored one
        #[arg(short, long)]
        moisture: Option<f64>,
    },
    /// Root-zone water balance over the field's weather series
    Schedule {
        #[arg(short, long)]
        field: String,
    },
    /// Season fertilizer plan with recorded applications
    Plan {
        #[arg(short, long)]
        field: String,
    },
    /// Nutrient balance and advice
    Balance {
        #[arg(short, long)]
        field: String,
        /// Defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Reports for every field
    Batch {
        /// Defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}
