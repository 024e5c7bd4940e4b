use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use datalens::config::Settings;
use datalens::insight::recommend_with_settings;
use datalens::{
    chart_config, csv_reader, preview, resolve, statistics, ChartRequest, ChartType, PreviewMode,
};

#[derive(Parser, Debug)]
#[command(name = "datalens")]
#[command(about = "Explore a CSV file and build chart-ready JSON", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Column names, storage types and shape
    Info { file: PathBuf },
    /// Columns usable on each axis of a chart type
    Columns {
        file: PathBuf,
        #[arg(long)]
        chart: String,
    },
    /// A slice of the raw rows
    Preview {
        file: PathBuf,
        /// full, head, tail or sample
        #[arg(long, default_value = "head")]
        mode: String,
        #[arg(long)]
        html: bool,
    },
    /// Summary statistics of the numeric columns
    Stats {
        file: PathBuf,
        #[arg(long)]
        html: bool,
    },
    /// Chart data and options for a column selection
    Chart {
        file: PathBuf,
        #[arg(long)]
        chart: String,
        #[arg(long)]
        x: String,
        #[arg(long)]
        y: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        stack: Option<String>,
        /// Also ask the AI service for insights
        #[arg(long)]
        insights: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    print_text(&text)
}

fn print_text(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", text).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Info { file } => {
            let dataset = csv_reader::load_path(&file)?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            print_json(&dataset.info(&filename))
        }
        Command::Columns { file, chart } => {
            let dataset = csv_reader::load_path(&file)?;
            print_json(&resolve(&dataset, &chart))
        }
        Command::Preview { file, mode, html } => {
            let dataset = csv_reader::load_path(&file)?;
            let mode: PreviewMode = mode.parse().unwrap_or_default();
            let table = preview(&dataset, mode);
            if html {
                print_text(&table.to_html())
            } else {
                print_json(&table)
            }
        }
        Command::Stats { file, html } => {
            let dataset = csv_reader::load_path(&file)?;
            let stats = statistics(&dataset);
            if html {
                print_text(&stats.to_html())
            } else {
                print_json(&stats)
            }
        }
        Command::Chart { file, chart, x, y, size, stack, insights } => {
            let chart_type: ChartType = chart.parse()?;
            let dataset = csv_reader::load_path(&file)?;
            let request = ChartRequest {
                chart_type,
                x_column: x,
                y_column: y,
                size_column: size,
                stack_column: stack,
            };

            let config = chart_config(&dataset, &request)?;
            info!(chart = %chart_type, kind = ?config.kind, "chart built");

            if insights {
                let recommendations = recommend_with_settings(&Settings::from_env(), &dataset, &request);
                print_json(&json!({ "chart": config, "recommendations": recommendations }))
            } else {
                print_json(&json!({ "chart": config }))
            }
        }
    }
}
