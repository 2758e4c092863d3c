use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "harvestwise",
    version,
    about = "Post-harvest market advisory for a farm's crop portfolio"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run interactive setup
    Init,
    /// Validate config and test connections
    Check,
    /// Score every crop in the portfolio and print advisories
    Advise {
        /// Reprocess crops even if they were processed recently
        #[arg(long)]
        force: bool,
        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest crops to sow on this farm
    Suggest {
        /// Month to plan for (1-12), defaults to the current month
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// Ambient temperature in °C, defaults to current weather
        #[arg(long, allow_negative_numbers = true)]
        temp: Option<f64>,
    },
    /// Add a crop to the portfolio
    Plant {
        /// Crop name from the catalog
        name: String,
        /// Sowing date (YYYY-MM-DD), defaults to the next ideal sowing date
        #[arg(long)]
        sowing_date: Option<String>,
        /// Drip, Sprinkler, Flood or Rainfed
        #[arg(long)]
        irrigation: Option<String>,
    },
    /// Get a price prediction for a crop
    Predict {
        /// Crop name from the catalog
        name: String,
        /// Target date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// List the crop catalog
    Crops,
    /// Show recent spoilage risk assessments
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}
