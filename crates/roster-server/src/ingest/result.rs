//! Outcome of an ingestion run

use indexmap::IndexMap;
use serde::Serialize;

/// A row that could not be ingested
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngesterResultFailure {
    /// 1-based physical line in the source document
    pub line_number: u64,
    /// The raw row, column name to value
    pub data: IndexMap<String, String>,
    pub reason: String,
}

impl IngesterResultFailure {
    pub fn new(line_number: u64, data: IndexMap<String, String>, reason: impl Into<String>) -> Self {
        Self {
            line_number,
            data,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngesterResult {
    #[serde(rename = "type")]
    pub type_name: String,
    /// Rows accepted by the ingester
    pub row_count: usize,
    pub dry_run: bool,
    pub failures: Vec<IngesterResultFailure>,
}

impl IngesterResult {
    pub fn new(type_name: impl Into<String>, row_count: usize) -> Self {
        Self {
            type_name: type_name.into(),
            row_count,
            dry_run: false,
            failures: Vec::new(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_failures(mut self, failures: Vec<IngesterResultFailure>) -> Self {
        self.failures = failures;
        self
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn feedback(&self) -> String {
        format!(
            "{} elements of type {} have been ingested.",
            self.row_count, self.type_name
        )
    }
}
