//! A single bulk operation

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BulkOperationError {
    #[error("Bulk operation identifier cannot be empty")]
    EmptyIdentifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkOperationType {
    Create,
    Update,
}

impl BulkOperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            BulkOperationType::Create => "create",
            BulkOperationType::Update => "update",
        }
    }
}

impl fmt::Display for BulkOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of an operation, validated into [`BulkOperation`]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBulkOperation {
    identifier: String,
    #[serde(rename = "type")]
    operation_type: BulkOperationType,
    #[serde(default)]
    attributes: IndexMap<String, String>,
    #[serde(default)]
    dry_run: bool,
}

impl TryFrom<RawBulkOperation> for BulkOperation {
    type Error = BulkOperationError;

    fn try_from(raw: RawBulkOperation) -> Result<Self, Self::Error> {
        let mut operation = BulkOperation::new(raw.identifier, raw.operation_type, raw.attributes)?;
        operation.set_dry_run(raw.dry_run);
        Ok(operation)
    }
}

/// One unit of work in a bulk request, keyed by its identifier.
///
/// Everything but the dry-run flag is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBulkOperation", rename_all = "camelCase")]
pub struct BulkOperation {
    identifier: String,
    #[serde(rename = "type")]
    operation_type: BulkOperationType,
    attributes: IndexMap<String, String>,
    dry_run: bool,
}

impl BulkOperation {
    pub fn new(
        identifier: impl Into<String>,
        operation_type: BulkOperationType,
        attributes: IndexMap<String, String>,
    ) -> Result<Self, BulkOperationError> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(BulkOperationError::EmptyIdentifier);
        }

        Ok(Self {
            identifier,
            operation_type,
            attributes,
            dry_run: false,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn operation_type(&self) -> BulkOperationType {
        self.operation_type
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }
}
