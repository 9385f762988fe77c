//! Output formatting utilities

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::client::Prediction;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name, e.g. from the config file
    pub fn parse(s: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(s, true).ok()
    }
}

/// Row for the prediction table
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Air Quality Index")]
    aqi_value: i64,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Model")]
    model: String,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

/// Print a prediction as a table or JSON
pub fn print_prediction(prediction: &Prediction, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(prediction),
        OutputFormat::Table => {
            let row = PredictionRow {
                aqi_value: prediction.aqi_value,
                category: color_category(&prediction.category, &prediction.severity_color)
                    .to_string(),
                severity: format!("{} / 5", prediction.severity_rank),
                model: prediction.model_version.clone(),
            };
            let table = Table::new([row]).with(Style::rounded()).to_string();
            println!("{}", table);
            println!("Elapsed time : {}", format_elapsed(prediction.elapsed_seconds));
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a scoring duration the way the predictor UI always has
pub fn format_elapsed(seconds: f64) -> String {
    format!("{:.5} seconds", seconds)
}

/// Color a category label with its severity color token
pub fn color_category(label: &str, color: &str) -> ColoredString {
    match color {
        "green" => label.green(),
        "yellow" => label.yellow(),
        "orange" => label.truecolor(255, 126, 0),
        "red" => label.red(),
        "purple" => label.magenta(),
        "maroon" => label.truecolor(126, 0, 35),
        _ => label.normal(),
    }
    .bold()
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "predict_aqi" | "description" => status.green().to_string(),
        "degraded" | "logged_out" => status.yellow().to_string(),
        "unhealthy" => status.red().to_string(),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed_five_decimals() {
        assert_eq!(format_elapsed(0.000123456), "0.00012 seconds");
        assert_eq!(format_elapsed(1.5), "1.50000 seconds");
    }

    #[test]
    fn test_color_category_keeps_label() {
        colored::control::set_override(false);
        assert_eq!(color_category("Hazardous", "maroon").to_string(), "Hazardous");
        assert_eq!(color_category("Unknown", "teal").to_string(), "Unknown");
    }

    #[test]
    fn test_output_format_parses_case_insensitively() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }
}
