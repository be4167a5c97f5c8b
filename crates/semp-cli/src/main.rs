//! SEMP command-line interface.
//!
//! Analyse edge-diffraction sessions from TOML job files:
//! ```sh
//! semp analytic job.toml
//! semp compare job.toml
//! semp collect job.toml
//! semp validate job.toml
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "semp")]
#[command(about = "SEMP: analytic validation and Braunbek reduction of edge-diffraction runs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the configured analytic solution on transverse slices.
    Analytic {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a stored session against the analytic solution.
    Compare {
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Collect Braunbek fields of a stored session for DIFFRAQ.
    Collect {
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running anything.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analytic { config, output } => {
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());
            let out_dir = output.unwrap_or_else(|| job.output.directory.clone());

            let slices = runner::run_analytic(&job)?;
            for slice in &slices {
                let path = out_dir.join(runner::slice_file_name(slice));
                runner::write_slice_csv(slice, &path, &job)?;
            }
            println!("{} slice(s) written to: {}", slices.len(), out_dir.display());
            Ok(())
        }
        Commands::Compare { config, output } => {
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());
            let out_dir = output.unwrap_or_else(|| job.output.directory.clone());

            let reports = runner::run_compare(&job)?;
            runner::write_reports_json(&reports, &out_dir.join("comparison.json"))?;

            let failed = reports
                .iter()
                .filter(|r| !r.passes(job.output.tolerance))
                .count();
            if failed > 0 {
                anyhow::bail!(
                    "{failed} of {} comparison(s) exceed tolerance {}",
                    reports.len(),
                    job.output.tolerance
                );
            }
            println!("All comparisons within tolerance {}.", job.output.tolerance);
            Ok(())
        }
        Commands::Collect { config, output } => {
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());
            let out_dir = output.unwrap_or_else(|| job.output.directory.clone());
            runner::run_collect(&job, &out_dir)?;
            Ok(())
        }
        Commands::Validate { config } => {
            let _job = config::load_config(&config)?;
            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
    }
}
