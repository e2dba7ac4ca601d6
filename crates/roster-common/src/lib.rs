//! Roster Common Library
//!
//! Shared utilities for the roster workspace members:
//!
//! - **Logging**: `tracing` subscriber setup driven by environment variables
//! - **Errors**: the [`RosterError`] type for configuration level failures
//! - **Delimiters**: parsing of user supplied CSV delimiters
//!
//! # Example
//!
//! ```no_run
//! use roster_common::logging::{init_logging, LogConfig};
//! use roster_common::delimiter::parse_delimiter;
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     let delimiter = parse_delimiter(";")?;
//!     assert_eq!(delimiter, b';');
//!     Ok(())
//! }
//! ```
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod delimiter;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, RosterError};
