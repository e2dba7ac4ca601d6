//! CSV row sources
//!
//! An [`IngesterSource`] knows where a CSV document lives and how to open it.
//! Opening yields [`CsvRows`], a lazy iterator that parses one record per call
//! to `next()`. Row level problems are reported per row and iteration goes on;
//! I/O failures end the stream.
//!
//! ```rust,ignore
//! use roster_server::ingest::source::{create_source, SourceOptions, LOCAL_SOURCE};
//!
//! let source = create_source(LOCAL_SOURCE, SourceOptions::new("users.csv"))?;
//! for row in source.read().await? {
//!     let row = row?;
//!     println!("{}: {:?}", row.line_number, row.get("username"));
//! }
//! ```

pub mod local;
pub mod s3;

use async_trait::async_trait;
use indexmap::IndexMap;
use roster_common::delimiter::DEFAULT_DELIMITER;
use roster_common::RosterError;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::storage::ObjectStorage;

pub use local::LocalCsvSource;
pub use s3::S3CsvSource;

/// Registered name of the local file source
pub const LOCAL_SOURCE: &str = "local";

/// Registered name of the S3 object source
pub const S3_SOURCE: &str = "s3";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Cannot read s3://{bucket}/{key}: {reason}")]
    S3Access {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `data` holds whatever could be decoded, empty when nothing could
    #[error("Malformed row at line {line_number}: {reason}")]
    MalformedRow {
        line_number: u64,
        reason: String,
        data: IndexMap<String, String>,
    },

    #[error("Unknown ingestion source '{0}': expected 'local' or 's3'")]
    UnknownSource(String),

    #[error("The s3 source requires object storage, but none is configured")]
    MissingObjectStorage,

    #[error(transparent)]
    InvalidDelimiter(#[from] RosterError),

    #[error("Source '{0}' has no path configured")]
    NotConfigured(&'static str),
}

impl SourceError {
    /// Whether the error concerns a single row and iteration can go on
    pub fn is_row_error(&self) -> bool {
        matches!(self, SourceError::MalformedRow { .. })
    }
}

/// How the first record of a document is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderPolicy {
    /// The first record names the columns and is never yielded as data
    #[default]
    FirstRow,
    /// Every record is data; columns are addressed by position
    None,
}

/// One data record with its physical position in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 1-based line the record starts on
    pub line_number: u64,
    pub values: Vec<String>,
    pub headers: Option<Arc<Vec<String>>>,
}

impl SourceRow {
    /// Value of the named column. Without headers, names are `column_<index>`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let index = match &self.headers {
            Some(headers) => headers.iter().position(|h| h == name)?,
            None => name.strip_prefix("column_")?.parse().ok()?,
        };
        self.value(index)
    }

    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Column name at `index`
    pub fn column_name(&self, index: usize) -> String {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(index).cloned())
            .unwrap_or_else(|| format!("column_{}", index))
    }

    /// Column name to value, in column order
    pub fn to_map(&self) -> IndexMap<String, String> {
        self.values
            .iter()
            .enumerate()
            .map(|(index, value)| (self.column_name(index), value.clone()))
            .collect()
    }
}

/// Lazy iterator over the data records of a CSV document
pub struct CsvRows {
    reader: csv::Reader<Box<dyn Read + Send>>,
    policy: HeaderPolicy,
    headers: Option<Arc<Vec<String>>>,
    header_pending: bool,
    record: csv::ByteRecord,
    finished: bool,
}

impl CsvRows {
    pub fn new<R>(input: R, delimiter: u8, policy: HeaderPolicy) -> Self
    where
        R: Read + Send + 'static,
    {
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(Box::new(input) as Box<dyn Read + Send>);

        Self {
            reader,
            policy,
            headers: None,
            header_pending: policy == HeaderPolicy::FirstRow,
            record: csv::ByteRecord::new(),
            finished: false,
        }
    }

    /// Column names, once the header record has been read
    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_ref().map(|h| h.as_slice())
    }

    /// Read the next raw record. `Ok(None)` at end of input.
    fn read_record(&mut self) -> Result<Option<(u64, Vec<String>)>, SourceError> {
        match self.reader.read_byte_record(&mut self.record) {
            Ok(false) => Ok(None),
            Ok(true) => {
                let line_number = self.record.position().map_or(0, |p| p.line());
                decode_fields(&self.record, line_number).map(|values| Some((line_number, values)))
            },
            Err(err) => {
                let line_number = err.position().map_or(0, |p| p.line());
                match err.into_kind() {
                    csv::ErrorKind::Io(io) => Err(SourceError::Io(io)),
                    other => Err(SourceError::MalformedRow {
                        line_number,
                        reason: format!("{:?}", other),
                        data: IndexMap::new(),
                    }),
                }
            },
        }
    }

    fn next_row(&mut self) -> Option<Result<SourceRow, SourceError>> {
        if self.header_pending {
            self.header_pending = false;
            match self.read_record() {
                Ok(Some((_, names))) => self.headers = Some(Arc::new(names)),
                Ok(None) => return None,
                // A header we cannot read leaves every later row unaddressable
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                },
            }
        }

        let (line_number, values) = match self.read_record() {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(err) => {
                if !err.is_row_error() {
                    self.finished = true;
                }
                return Some(Err(err));
            },
        };

        if let Some(headers) = &self.headers {
            if values.len() != headers.len() {
                return Some(Err(SourceError::MalformedRow {
                    line_number,
                    reason: format!(
                        "expected {} fields, found {}",
                        headers.len(),
                        values.len()
                    ),
                    data: named_values(headers, values),
                }));
            }
        }

        Some(Ok(SourceRow {
            line_number,
            values,
            headers: self.headers.clone(),
        }))
    }
}

fn decode_fields(record: &csv::ByteRecord, line_number: u64) -> Result<Vec<String>, SourceError> {
    record
        .iter()
        .enumerate()
        .map(|(index, field)| {
            std::str::from_utf8(field)
                .map(str::to_string)
                .map_err(|_| SourceError::MalformedRow {
                    line_number,
                    reason: format!("field {} is not valid UTF-8", index + 1),
                    data: IndexMap::new(),
                })
        })
        .collect()
}

/// Pair values with header names; extra values fall back to `column_<index>`
fn named_values(headers: &[String], values: Vec<String>) -> IndexMap<String, String> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let name = headers
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("column_{}", index));
            (name, value)
        })
        .collect()
}

impl Iterator for CsvRows {
    type Item = Result<SourceRow, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.next_row();
        if item.is_none() {
            self.finished = true;
        }
        item
    }
}

impl std::fmt::Debug for CsvRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvRows")
            .field("policy", &self.policy)
            .field("headers", &self.headers)
            .field("finished", &self.finished)
            .finish()
    }
}

/// A place CSV documents are read from
#[async_trait]
pub trait IngesterSource: Send + Sync {
    /// Registered name of the source
    fn name(&self) -> &'static str;

    /// Point the source at a document. No I/O happens here.
    fn configure(&mut self, path: &str, delimiter: u8);

    fn set_header_policy(&mut self, policy: HeaderPolicy);

    /// Open the document and return its rows
    async fn read(&self) -> Result<CsvRows, SourceError>;
}

/// Everything needed to build a configured source
#[derive(Clone)]
pub struct SourceOptions {
    pub path: String,
    pub delimiter: u8,
    pub headers: HeaderPolicy,
    pub object_storage: Option<Arc<dyn ObjectStorage>>,
}

impl SourceOptions {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delimiter: DEFAULT_DELIMITER,
            headers: HeaderPolicy::default(),
            object_storage: None,
        }
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn headers(mut self, headers: HeaderPolicy) -> Self {
        self.headers = headers;
        self
    }

    pub fn object_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.object_storage = Some(storage);
        self
    }
}

/// Build the source registered under `tag`
pub fn create_source(
    tag: &str,
    options: SourceOptions,
) -> Result<Box<dyn IngesterSource>, SourceError> {
    let mut source: Box<dyn IngesterSource> = match tag {
        LOCAL_SOURCE => Box::new(LocalCsvSource::new()),
        S3_SOURCE => {
            let storage = options
                .object_storage
                .clone()
                .ok_or(SourceError::MissingObjectStorage)?;
            Box::new(S3CsvSource::new(storage))
        },
        other => return Err(SourceError::UnknownSource(other.to_string())),
    };

    source.configure(&options.path, options.delimiter);
    source.set_header_policy(options.headers);

    tracing::debug!(
        source = source.name(),
        path = %options.path,
        headers = ?options.headers,
        "Ingestion source created"
    );

    Ok(source)
}
