mod cli;
mod commands;
mod logging;
mod menu;
mod report;
mod terminal;

use anyhow::Result;
use clap::Parser;
use tapestry_core::config::{load_dotenv, Config};
use tapestry_core::RuleSelector;

use crate::cli::{CliArgs, Command};
use crate::menu::Menu;
use crate::terminal::Terminal;

fn main() -> Result<()> {
    load_dotenv();
    let args = CliArgs::parse();
    let mut config = Config::from_env();
    if let Some(command) = &args.command {
        command.apply_overrides(&mut config);
    }

    let _log_guard = logging::init(args.verbose, &config.analysis.execution_log)?;
    config.log_summary();

    logging::log_failure(dispatch(args.command, &config))
}

fn dispatch(command: Option<Command>, config: &Config) -> Result<()> {
    match command {
        None => {
            let mut menu = Menu::new(Terminal::new(), config);
            menu.run()?;
        }
        Some(Command::Manual) => {
            Terminal::new().print_plain(commands::MANUAL)?;
        }
        Some(Command::Analyze {
            log_type, mode, dir, ..
        }) => {
            let mut term = Terminal::new();
            let log_file = commands::locate_log_file(&dir, &config.analysis.log_file_name)?;
            let run = commands::run_analysis(
                &config.analysis,
                RuleSelector::new(log_type, mode),
                &log_file,
            )?;
            for failure in &run.failures {
                term.print_warning(&failure.operator_message())?;
            }
            for line in report::analysis_lines(&run) {
                term.print_info(&line)?;
            }
            term.print_success(&format!(
                "Log analysis completed. Check output files in: {}",
                config.analysis.results_dir.display()
            ))?;
        }
        Some(Command::Extract { dir, .. }) => {
            let mut term = Terminal::new();
            let run = commands::run_extraction(&config.extraction, &dir)?;
            for line in report::extraction_lines(&run) {
                term.print_info(&line)?;
            }
        }
    }
    Ok(())
}
