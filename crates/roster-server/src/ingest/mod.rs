//! CSV ingestion
//!
//! - [`source`]: where CSV documents come from and how rows are read
//! - [`ingester`]: the generic per-row runner
//! - [`users`], [`line_items`], [`assignments`]: one ingester per entity
//! - [`assignment_ingester`]: all-or-nothing assignment writes
//! - [`result`]: the run report

pub mod assignment_ingester;
pub mod assignments;
pub mod ingester;
pub mod line_items;
pub mod password;
pub mod result;
pub mod source;
pub mod users;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::Repositories;

pub use assignment_ingester::{AssignmentIngester, AssignmentIngesterError};
pub use assignments::AssignmentRowIngester;
pub use ingester::{ingest, IngestError, RowIngester};
pub use line_items::LineItemRowIngester;
pub use result::{IngesterResult, IngesterResultFailure};
pub use source::{create_source, HeaderPolicy, IngesterSource, SourceError, SourceOptions};
pub use users::UserRowIngester;

/// The entity a CSV document describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IngesterKind {
    User,
    LineItem,
    Assignment,
}

impl IngesterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IngesterKind::User => "user",
            IngesterKind::LineItem => "line-item",
            IngesterKind::Assignment => "assignment",
        }
    }
}

impl fmt::Display for IngesterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngesterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(IngesterKind::User),
            "line-item" => Ok(IngesterKind::LineItem),
            "assignment" => Ok(IngesterKind::Assignment),
            other => Err(format!(
                "unknown ingester '{}': expected user, line-item or assignment",
                other
            )),
        }
    }
}

/// Ingest `source` with the ingester for `kind`
pub async fn run(
    kind: IngesterKind,
    repos: &Repositories,
    source: &dyn IngesterSource,
    dry_run: bool,
) -> Result<IngesterResult, IngestError> {
    match kind {
        IngesterKind::User => {
            ingest(&UserRowIngester::new(repos.users.clone()), source, dry_run).await
        },
        IngesterKind::LineItem => {
            ingest(&LineItemRowIngester::new(repos.line_items.clone()), source, dry_run).await
        },
        IngesterKind::Assignment => {
            let ingester = AssignmentRowIngester::new(
                repos.users.clone(),
                repos.line_items.clone(),
                repos.assignments.clone(),
            );
            ingest(&ingester, source, dry_run).await
        },
    }
}
