//! Per-identifier outcome of a bulk run

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use super::operation::BulkOperation;

/// Success flag per operation identifier, in the order they were recorded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResult {
    results: IndexMap<String, bool>,
    failures_count: usize,
}

impl BulkResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, operation: &BulkOperation) -> &mut Self {
        self.record(operation.identifier(), true)
    }

    pub fn add_failure(&mut self, operation: &BulkOperation) -> &mut Self {
        self.record(operation.identifier(), false)
    }

    /// Record the outcome for `identifier`, replacing any earlier one
    pub fn record(&mut self, identifier: &str, success: bool) -> &mut Self {
        if let Some(previous) = self.results.insert(identifier.to_string(), success) {
            if !previous {
                self.failures_count -= 1;
            }
        }
        if !success {
            self.failures_count += 1;
        }
        self
    }

    pub fn get(&self, identifier: &str) -> Option<bool> {
        self.results.get(identifier).copied()
    }

    pub fn results(&self) -> &IndexMap<String, bool> {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn failures_count(&self) -> usize {
        self.failures_count
    }

    pub fn has_failures(&self) -> bool {
        self.failures_count > 0
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: &BulkResult) -> &mut Self {
        for (identifier, success) in &other.results {
            self.record(identifier, *success);
        }
        self
    }
}

impl Serialize for BulkResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Data<'a> {
            applied: bool,
            results: &'a IndexMap<String, bool>,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            data: Data<'a>,
        }

        Envelope {
            data: Data {
                applied: !self.has_failures(),
                results: &self.results,
            },
        }
        .serialize(serializer)
    }
}

/// Results of a run split into several batches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResultCollection {
    results: Vec<BulkResult>,
}

impl BulkResultCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: BulkResult) -> &mut Self {
        self.results.push(result);
        self
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BulkResult> {
        self.results.iter()
    }

    pub fn failures_count(&self) -> usize {
        self.results.iter().map(BulkResult::failures_count).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(BulkResult::has_failures)
    }

    /// All batches folded into one result, in batch order
    pub fn merged(&self) -> BulkResult {
        let mut merged = BulkResult::new();
        for result in &self.results {
            merged.merge(result);
        }
        merged
    }
}
