//! Rule table loader.
//!
//! Reads the flat `RRRRRR|command` rule table, drops malformed lines without
//! failing, and narrows the result to the rules matching a [`RuleSelector`].
//!
//! [`RuleSelector`]: tapestry_core::RuleSelector

mod core;
mod error;


pub use self::core::{RuleLoader, RuleTable};
pub use self::error::{LineResult, LineStatus, Result, RuleError};
