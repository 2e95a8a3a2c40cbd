//! Interactive menu loop.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use tapestry_core::{AnalysisMode, Config, LogType, RuleSelector};
use tracing::error;

use crate::commands::{self, MANUAL};
use crate::report;
use crate::terminal::Terminal;

const MAIN_OPTIONS: [&str; 4] = ["Log Analysis", "Log Extraction", "Manual", "Exit"];
const EXTRACTION_OPTIONS: [&str; 2] = ["XGFW Event Logs", "Other (Not Implemented)"];

pub struct Menu<'a, I, O> {
    term: Terminal<I, O>,
    config: &'a Config,
}

impl<'a, I: BufRead, O: Write> Menu<'a, I, O> {
    pub fn new(term: Terminal<I, O>, config: &'a Config) -> Self {
        Self { term, config }
    }

    #[cfg(test)]
    pub fn into_terminal(self) -> Terminal<I, O> {
        self.term
    }

    /// Run until the operator picks Exit or input ends.
    pub fn run(&mut self) -> Result<()> {
        self.term.print_splash()?;
        loop {
            self.term
                .print_menu("Tapestry - Log Analysis Tool", &MAIN_OPTIONS)?;
            let Some(choice) = self.term.prompt_choice("Select an option: ", &["1", "2", "3", "4"])?
            else {
                return Ok(());
            };
            let keep_going = match choice.as_str() {
                "1" => self.analysis()?,
                "2" => self.extraction()?,
                "3" => {
                    self.term.print_plain(MANUAL)?;
                    true
                }
                _ => false,
            };
            if !keep_going {
                self.term.print_info("Exiting Tapestry. Goodbye!")?;
                return Ok(());
            }
        }
    }

    /// Returns `false` when input ended mid-flow.
    fn analysis(&mut self) -> Result<bool> {
        let log_types: Vec<&str> = LogType::ALL.iter().map(|t| t.label()).collect();
        self.term.print_menu("Log Type Selection:", &log_types)?;
        let Some(log_type) = self.term.prompt_choice("Select log type: ", &["1", "2", "3", "4"])?
        else {
            return Ok(false);
        };

        let mut modes: Vec<&str> = AnalysisMode::ALL.iter().map(|m| m.label()).collect();
        modes.push("Identifier Search (WIP)");
        self.term.print_menu("Analysis Choice:", &modes)?;
        let Some(mode) = self.term.prompt_choice("Select analysis choice: ", &["1", "2"])? else {
            return Ok(false);
        };

        // Both answers were validated against the menu digits above.
        let (Ok(log_type), Ok(mode)) = (log_type.parse::<LogType>(), mode.parse::<AnalysisMode>())
        else {
            return Ok(true);
        };
        let selector = RuleSelector::new(log_type, mode);

        let Some(log_file) = self.prompt_log_file()? else {
            return Ok(false);
        };

        self.term.print_info("Executing rules on logs...")?;
        match commands::run_analysis(&self.config.analysis, selector, &log_file) {
            Ok(run) => {
                for failure in &run.failures {
                    self.term.print_warning(&failure.operator_message())?;
                }
                for line in report::analysis_lines(&run) {
                    self.term.print_info(&line)?;
                }
                self.term.print_success(&format!(
                    "Log analysis completed. Check output files in: {}",
                    self.config.analysis.results_dir.display()
                ))?;
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "log analysis failed");
                self.term.print_error(&format!("{e:#}"))?;
            }
        }
        Ok(true)
    }

    /// Prompt until a directory holding the combined log file is given.
    fn prompt_log_file(&mut self) -> Result<Option<PathBuf>> {
        let name = self.config.analysis.log_file_name.clone();
        loop {
            let Some(raw) = self
                .term
                .prompt("Enter the target directory containing log files: ")?
            else {
                return Ok(None);
            };
            let dir = commands::expand_path(&raw);
            match commands::locate_log_file(&dir, &name) {
                Ok(log_file) => return Ok(Some(log_file)),
                Err(e) => self.term.print_error(&e.to_string())?,
            }
        }
    }

    fn extraction(&mut self) -> Result<bool> {
        self.term.print_menu("Log Extraction:", &EXTRACTION_OPTIONS)?;
        let Some(kind) = self.term.prompt_choice("Select extraction type: ", &["1", "2"])? else {
            return Ok(false);
        };
        if kind != "1" {
            self.term
                .print_warning("Only XGFW Event Logs extraction is implemented for now.")?;
            return Ok(true);
        }

        let Some(raw) = self.term.prompt("Enter the directory containing .db files: ")? else {
            return Ok(false);
        };
        let dir = commands::expand_path(&raw);
        if !dir.is_dir() {
            self.term
                .print_error("Invalid directory. Please enter a valid path.")?;
            return Ok(true);
        }

        self.term
            .print_info(&format!("Extracting event logs from: {}", dir.display()))?;
        match commands::run_extraction(&self.config.extraction, &dir) {
            Ok(run) => {
                for line in report::extraction_lines(&run) {
                    self.term.print_info(&line)?;
                }
                self.term.print_success(&format!(
                    "Conversion complete! All CSV files are in: {}",
                    self.config.extraction.converted_dir.display()
                ))?;
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "log extraction failed");
                self.term.print_error(&format!("{e:#}"))?;
            }
        }
        Ok(true)
    }
}
