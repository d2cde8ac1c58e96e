mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::equity::{EquityArgs, TotalCompArgs, VestingArgs};
use commands::pension::{PensionArgs, PensionCompareArgs};

/// UK equity compensation and pension projections
#[derive(Parser)]
#[command(
    name = "eqc",
    version,
    about = "UK equity compensation and pension projections",
    long_about = "A CLI for projecting RSU vesting, ESPP purchases, ISA sheltering, \
                  capital gains tax, total compensation, and multi-pot pension growth \
                  with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Project RSU and ESPP positions year by year with ISA and CGT
    Equity(EquityArgs),
    /// Stack net cash compensation on top of an equity projection
    TotalComp(TotalCompArgs),
    /// Expand RSU grants into their discrete vesting events
    Vesting(VestingArgs),
    /// Project pension pots to retirement with fee drag
    Pension(PensionArgs),
    /// Compare pension pots side by side under the full contribution stream
    PensionCompare(PensionCompareArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Equity(args) => commands::equity::run_equity(args),
        Commands::TotalComp(args) => commands::equity::run_total_comp(args),
        Commands::Vesting(args) => commands::equity::run_vesting(args),
        Commands::Pension(args) => commands::pension::run_pension(args),
        Commands::PensionCompare(args) => commands::pension::run_pension_compare(args),
        Commands::Version => {
            println!("eqc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
