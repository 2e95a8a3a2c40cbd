use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tapestry_core::{AnalysisMode, Config, LogType};

/// Rule-driven log analysis and SQLite event log extraction.
///
/// Run without a subcommand for the interactive menu.
#[derive(Parser, Debug)]
#[command(name = "tapestry", about = "Rule-driven log analysis tool")]
pub struct CliArgs {
    /// Raise console log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the rules for a log type and analysis mode against a directory
    Analyze {
        /// 1 XGFW, 2 IIS, 3 General FW, 4 General SSLVPN
        #[arg(long, value_parser = parse_log_type)]
        log_type: LogType,

        /// 1 summary report, 2 rules file
        #[arg(long, value_parser = parse_analysis_mode)]
        mode: AnalysisMode,

        /// Directory containing the combined log file
        #[arg(long)]
        dir: PathBuf,

        /// Rule table (default: TAPESTRY_RULES_FILE or ./rules.txt)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Results directory (default: TAPESTRY_RESULTS_DIR or ./Tapestry_Results)
        #[arg(long)]
        results_dir: Option<PathBuf>,

        /// Restrict rule commands to these programs (repeatable)
        #[arg(long = "allow", value_name = "PROGRAM")]
        allow: Vec<String>,
    },

    /// Convert every *.db file in a directory into CSV
    Extract {
        /// Directory containing the .db files
        #[arg(long)]
        dir: PathBuf,

        /// Output directory (default: TAPESTRY_CONVERTED_DIR or ./converted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the rule file format
    Manual,
}

impl Command {
    /// Apply command line overrides on top of the environment config.
    pub fn apply_overrides(&self, config: &mut Config) {
        match self {
            Command::Analyze {
                rules,
                results_dir,
                allow,
                ..
            } => {
                if let Some(rules) = rules {
                    config.analysis.rules_file = rules.clone();
                }
                if let Some(results_dir) = results_dir {
                    config.analysis.results_dir = results_dir.clone();
                }
                if !allow.is_empty() {
                    config.analysis.allowed_programs = allow.clone();
                }
            }
            Command::Extract { out: Some(out), .. } => {
                config.extraction.converted_dir = out.clone();
            }
            Command::Extract { out: None, .. } | Command::Manual => {}
        }
    }
}

fn parse_log_type(s: &str) -> Result<LogType, String> {
    s.parse().map_err(|e: tapestry_core::TapestryError| e.to_string())
}

fn parse_analysis_mode(s: &str) -> Result<AnalysisMode, String> {
    s.parse().map_err(|e: tapestry_core::TapestryError| e.to_string())
}
