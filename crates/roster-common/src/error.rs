//! Error types shared by the roster crates

use thiserror::Error;

/// Result type alias for roster common operations
pub type Result<T> = std::result::Result<T, RosterError>;

/// Configuration level errors surfaced before any work starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("Invalid delimiter '{0}': expected a single ASCII character or 'tab'")]
    InvalidDelimiter(String),

    #[error("Invalid {setting} value: {value}")]
    InvalidSetting { setting: &'static str, value: String },
}

impl RosterError {
    /// Create an invalid setting error for the named setting
    pub fn invalid_setting(setting: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting,
            value: value.into(),
        }
    }
}
