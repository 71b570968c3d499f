//! forecast-prep - Main Entry Point
//!
//! Data-preparation step for a many-models sales forecasting pipeline.

use clap::Parser;
use forecast_prep::cli::{cmd_info, cmd_split, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forecast_prep=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            data,
            step,
            output_path,
            horizon,
            lags,
            time_column,
            label_column,
            partitions,
            file_name,
        } => {
            cmd_split(
                &data,
                &step,
                &output_path,
                horizon,
                &lags,
                &time_column,
                &label_column,
                &partitions,
                &file_name,
            )?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
