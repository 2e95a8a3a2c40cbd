//! Log-type and analysis-mode selectors encoded in rule codes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TapestryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogType {
    Xgfw,
    Iis,
    GeneralFw,
    GeneralSslvpn,
}

impl LogType {
    pub const ALL: [LogType; 4] = [
        LogType::Xgfw,
        LogType::Iis,
        LogType::GeneralFw,
        LogType::GeneralSslvpn,
    ];

    /// Digit stored at index 2 of a rule code.
    pub fn digit(&self) -> u8 {
        match self {
            LogType::Xgfw => 1,
            LogType::Iis => 2,
            LogType::GeneralFw => 3,
            LogType::GeneralSslvpn => 4,
        }
    }

    pub fn from_digit(digit: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.digit() == digit)
    }

    /// Menu label shown to the operator.
    pub fn label(&self) -> &'static str {
        match self {
            LogType::Xgfw => "XGFW Event Logs",
            LogType::Iis => "IIS",
            LogType::GeneralFw => "General FW (Experimental)",
            LogType::GeneralSslvpn => "General SSLVPN (Experimental)",
        }
    }

    /// Only XGFW exports carry a header row worth resolving into field positions.
    pub fn resolves_field_positions(&self) -> bool {
        matches!(self, LogType::Xgfw)
    }
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for LogType {
    type Err = TapestryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Self::from_digit)
            .ok_or_else(|| TapestryError::InvalidLogType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisMode {
    SummaryReport,
    RulesFile,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 2] = [AnalysisMode::SummaryReport, AnalysisMode::RulesFile];

    /// Digit stored at index 3 of a rule code.
    pub fn digit(&self) -> u8 {
        match self {
            AnalysisMode::SummaryReport => 1,
            AnalysisMode::RulesFile => 2,
        }
    }

    pub fn from_digit(digit: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.digit() == digit)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AnalysisMode::SummaryReport => "Generate Summary Report",
            AnalysisMode::RulesFile => "Run Rules File",
        }
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, AnalysisMode::SummaryReport)
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for AnalysisMode {
    type Err = TapestryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Self::from_digit)
            .ok_or_else(|| TapestryError::InvalidAnalysisMode(s.to_string()))
    }
}

/// The (log-type, analysis-mode) pair a run is dispatched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleSelector {
    pub log_type: LogType,
    pub analysis_mode: AnalysisMode,
}

impl RuleSelector {
    pub fn new(log_type: LogType, analysis_mode: AnalysisMode) -> Self {
        Self {
            log_type,
            analysis_mode,
        }
    }

    /// True when both selector digits match the digits carried by a rule code.
    pub fn matches_digits(&self, log_type: u8, analysis_mode: u8) -> bool {
        self.log_type.digit() == log_type && self.analysis_mode.digit() == analysis_mode
    }
}
