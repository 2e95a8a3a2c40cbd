//! Rule-driven command dispatch over delimited log files.
//!
//! This crate provides:
//! - Flat `RRRRRR|command` rule table parsing with selector filtering
//! - Header-row field position resolution
//! - `${field}` / `{log_file}` template resolution
//! - Sequential shell execution with summary or per-target result files
//! - A structured, optionally persistent audit log

pub mod audit_log;
pub mod engine;
pub mod fields;
pub mod loader;
pub mod policy;
pub mod rule;
pub mod runner;
pub mod template;

pub use engine::{OutputMode, RuleEngine, RunReport};
pub use fields::{resolve_field_positions, FieldPositions};
pub use loader::{RuleLoader, RuleTable};
pub use rule::Rule;
