//! CSV delimiter parsing
//!
//! Delimiters arrive as strings from the command line, HTTP requests and
//! environment variables. They are normalised here into the single byte the
//! `csv` reader expects.

use crate::error::{Result, RosterError};

/// Delimiter used when none is configured.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Parse a delimiter string into a single byte.
///
/// Accepts any single printable ASCII character except the quote character,
/// plus the aliases `tab` and `\t` for a tab.
pub fn parse_delimiter(value: &str) -> Result<u8> {
    match value {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        _ => {},
    }

    match value.as_bytes() {
        [byte] if byte.is_ascii_graphic() && *byte != b'"' => Ok(*byte),
        [b' '] => Ok(b' '),
        _ => Err(RosterError::InvalidDelimiter(value.to_string())),
    }
}

/// Render a delimiter byte back into its display form.
pub fn display_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "tab".to_string(),
        other => (other as char).to_string(),
    }
}
