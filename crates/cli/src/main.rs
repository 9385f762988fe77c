//! AQI Predictor CLI
//!
//! A command-line front end for the AQI predictor server: one-shot
//! predictions, the description page, an interactive session shell and
//! server health.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{describe, health, predict, shell};

/// AQI Predictor CLI
#[derive(Parser)]
#[command(name = "aqi")]
#[command(author, version, about = "CLI for the AQI Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via AQI_API_URL env var)
    #[arg(long, env = "AQI_API_URL")]
    pub api_url: Option<String>,

    /// Username used to log in
    #[arg(long, short, env = "AQI_USER")]
    pub user: Option<String>,

    /// Password used to log in
    #[arg(long, env = "AQI_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the air quality index from pollutant readings
    Predict {
        /// Carbon monoxide AQI value
        #[arg(long)]
        co: f64,

        /// Ozone AQI value
        #[arg(long)]
        ozone: f64,

        /// Nitrogen dioxide AQI value
        #[arg(long)]
        no2: f64,

        /// PM2.5 AQI value
        #[arg(long)]
        pm25: f64,
    },

    /// Stream the air quality description
    Describe,

    /// Start an interactive session
    Shell,

    /// Show server health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    let api_url = config.api_url(cli.api_url);
    let username = config.username(cli.user);
    let format = config.format(cli.format);

    // Initialize client
    let client = client::ApiClient::new(&api_url)?;

    // Execute command
    let result = match cli.command {
        Commands::Predict {
            co,
            ozone,
            no2,
            pm25,
        } => {
            let request = client::PredictRequest {
                co_aqi: co,
                ozone_aqi: ozone,
                no2_aqi: no2,
                pm25_aqi: pm25,
            };
            predict::run_prediction(&client, &username, &cli.password, &request, format).await
        }
        Commands::Describe => describe::show_description(&client, &username, &cli.password).await,
        Commands::Shell => shell::run_shell(&client, &username, &cli.password, format).await,
        Commands::Health => health::show_health(&client, format).await,
    };

    if let Err(e) = &result {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}
