//! CSV files on the local filesystem
//!
//! The file is opened asynchronously; its rows are read as the returned
//! iterator advances, which the ingestion runner does on the blocking pool.

use async_trait::async_trait;
use roster_common::delimiter::DEFAULT_DELIMITER;
use std::io::{BufReader, ErrorKind};
use std::path::PathBuf;
use tracing::instrument;

use super::{CsvRows, HeaderPolicy, IngesterSource, SourceError, LOCAL_SOURCE};

#[derive(Debug, Clone)]
pub struct LocalCsvSource {
    path: Option<PathBuf>,
    delimiter: u8,
    headers: HeaderPolicy,
}

impl LocalCsvSource {
    pub fn new() -> Self {
        Self {
            path: None,
            delimiter: DEFAULT_DELIMITER,
            headers: HeaderPolicy::default(),
        }
    }
}

impl Default for LocalCsvSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngesterSource for LocalCsvSource {
    fn name(&self) -> &'static str {
        LOCAL_SOURCE
    }

    fn configure(&mut self, path: &str, delimiter: u8) {
        self.path = Some(PathBuf::from(path));
        self.delimiter = delimiter;
    }

    fn set_header_policy(&mut self, policy: HeaderPolicy) {
        self.headers = policy;
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn read(&self) -> Result<CsvRows, SourceError> {
        let path = self
            .path
            .as_ref()
            .ok_or(SourceError::NotConfigured(LOCAL_SOURCE))?;

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => SourceError::FileNotFound(path.clone()),
                _ => SourceError::Io(err),
            })?
            .into_std()
            .await;

        tracing::debug!("Opened local CSV file");

        Ok(CsvRows::new(BufReader::new(file), self.delimiter, self.headers))
    }
}
