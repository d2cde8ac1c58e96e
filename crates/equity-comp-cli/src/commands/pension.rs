use clap::Args;
use serde_json::Value;

use equity_comp_core::config::PensionConfig;
use equity_comp_core::pension;

use crate::input;

/// Arguments for the pension projection
#[derive(Args)]
pub struct PensionArgs {
    /// Path to a JSON config file (pots, contributions)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_pension(args: PensionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config: PensionConfig = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for pension projection".into());
    };

    let result = pension::project_pension(&config.pots, &config.contributions)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the side-by-side pot comparison
#[derive(Args)]
pub struct PensionCompareArgs {
    /// Path to a JSON config file (pots, contributions)
    #[arg(long)]
    pub input: Option<String>,

    /// Pot ids to compare, up to three (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub pots: Vec<String>,
}

pub fn run_pension_compare(args: PensionCompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config: PensionConfig = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for pot comparison".into());
    };

    // No explicit selection compares every configured pot
    let selected = if args.pots.is_empty() {
        config.pots.iter().map(|p| p.id.clone()).collect()
    } else {
        args.pots
    };

    let result = pension::compare_pots(&config.pots, &config.contributions, &selected)?;
    Ok(serde_json::to_value(result)?)
}
