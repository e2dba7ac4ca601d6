//! CSV objects in an S3 bucket
//!
//! The object is fetched with a single `get_object` call and buffered in
//! memory before parsing.

use async_trait::async_trait;
use roster_common::delimiter::DEFAULT_DELIMITER;
use std::io::Cursor;
use std::sync::Arc;
use tracing::instrument;

use super::{CsvRows, HeaderPolicy, IngesterSource, SourceError, S3_SOURCE};
use crate::storage::ObjectStorage;

pub struct S3CsvSource {
    storage: Arc<dyn ObjectStorage>,
    path: Option<String>,
    delimiter: u8,
    headers: HeaderPolicy,
}

impl S3CsvSource {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            storage,
            path: None,
            delimiter: DEFAULT_DELIMITER,
            headers: HeaderPolicy::default(),
        }
    }

    /// Split a configured path into bucket and key.
    ///
    /// `s3://bucket/key` names its own bucket; anything else is a key in the
    /// storage's default bucket. An `s3://` URL without a key is rejected.
    pub fn location(&self, path: &str) -> Result<(String, String), SourceError> {
        if let Some(rest) = path.strip_prefix("s3://") {
            let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
            let key = key.trim_start_matches('/');
            if key.is_empty() {
                return Err(SourceError::S3Access {
                    bucket: bucket.to_string(),
                    key: String::new(),
                    reason: format!("'{}' names no object key", path),
                });
            }
            return Ok((bucket.to_string(), key.to_string()));
        }
        Ok((
            self.storage.default_bucket().to_string(),
            path.trim_start_matches('/').to_string(),
        ))
    }
}

#[async_trait]
impl IngesterSource for S3CsvSource {
    fn name(&self) -> &'static str {
        S3_SOURCE
    }

    fn configure(&mut self, path: &str, delimiter: u8) {
        self.path = Some(path.to_string());
        self.delimiter = delimiter;
    }

    fn set_header_policy(&mut self, policy: HeaderPolicy) {
        self.headers = policy;
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn read(&self) -> Result<CsvRows, SourceError> {
        let path = self
            .path
            .as_deref()
            .ok_or(SourceError::NotConfigured(S3_SOURCE))?;
        let (bucket, key) = self.location(path)?;

        let body = self.storage.get_object(&bucket, &key).await.map_err(|err| {
            SourceError::S3Access {
                bucket: bucket.clone(),
                key: key.clone(),
                reason: format!("{:#}", err),
            }
        })?;

        tracing::debug!(bytes = body.len(), %bucket, %key, "Fetched CSV object");

        Ok(CsvRows::new(Cursor::new(body), self.delimiter, self.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedBucket;

    #[async_trait]
    impl ObjectStorage for NamedBucket {
        fn default_bucket(&self) -> &str {
            "imports"
        }

        async fn get_object(&self, _bucket: &str, _key: &str) -> anyhow::Result<Vec<u8>> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_location_uses_default_bucket() {
        let source = S3CsvSource::new(Arc::new(NamedBucket));
        assert_eq!(
            source.location("/2024/users.csv").unwrap(),
            ("imports".to_string(), "2024/users.csv".to_string())
        );
    }

    #[test]
    fn test_location_with_explicit_bucket() {
        let source = S3CsvSource::new(Arc::new(NamedBucket));
        assert_eq!(
            source.location("s3://archive/2023/users.csv").unwrap(),
            ("archive".to_string(), "2023/users.csv".to_string())
        );
    }

    #[test]
    fn test_location_without_key_is_rejected() {
        let source = S3CsvSource::new(Arc::new(NamedBucket));
        for path in ["s3://archive", "s3://archive/"] {
            match source.location(path) {
                Err(SourceError::S3Access { bucket, key, .. }) => {
                    assert_eq!(bucket, "archive");
                    assert!(key.is_empty());
                },
                other => panic!("expected an S3 access error for {}, got {:?}", path, other),
            }
        }
    }
}
