pub mod config;
pub mod error;
pub mod selector;

pub use config::Config;
pub use error::*;
pub use selector::*;
