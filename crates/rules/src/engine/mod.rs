//! Rule execution engine.
//!
//! Resolves each rule's command template against the target file's field
//! positions, routes stdout into the per-target or shared summary result
//! file, and runs the commands strictly in rule order. A failing or
//! unresolvable rule is recorded and skipped; it never stops the batch.

mod core;
mod error;
mod output;
mod report;


pub use self::core::RuleEngine;
pub use self::error::{EngineError, Result};
pub use self::output::{per_target_file_name, OutputMode, OutputRouter, SUMMARY_FILE_NAME};
pub use self::report::{RuleFailure, RunReport, SkipCause, SkippedRule};
