use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::settings::DEFAULT_SETTINGS_FILE;

#[derive(Parser)]
#[command(name = "codetrend", version, about = "Track code-quality metrics across repository history")]
pub struct Cli {
    /// Settings file (JSON)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_SETTINGS_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Clone every configured repository and save dated snapshots
    Download,
    /// Run the analysis tools over every snapshot
    Analyze,
    /// Build per-snapshot reports and per-project time series
    Extract,
    /// Download, analyze and extract in sequence
    Pipeline,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_settings_file() {
        let cli = Cli::try_parse_from(["codetrend", "extract"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_SETTINGS_FILE));
        assert_eq!(cli.command, Commands::Extract);
    }

    #[test]
    fn accepts_explicit_config() {
        let cli = Cli::try_parse_from(["codetrend", "--config", "other.json", "pipeline"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("other.json"));
        assert_eq!(cli.command, Commands::Pipeline);
    }

    #[test]
    fn requires_a_stage() {
        assert!(Cli::try_parse_from(["codetrend"]).is_err());
    }
}
