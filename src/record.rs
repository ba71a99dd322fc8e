//! Input records and the CSV record source.
//!
//! A [`Record`] is one data row keyed by the header row's column names.
//! [`RecordReader`] lazily yields records from a CSV file, one row at a time,
//! so the whole export is never held in memory.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use csv::StringRecord;
use tracing::info;

use crate::error::PipelineError;

/// One parsed input row: an ordered mapping from column name to value.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    headers: Arc<StringRecord>,
    values: StringRecord,
}

impl Record {
    pub fn new(headers: Arc<StringRecord>, values: StringRecord) -> Self {
        Self { headers, values }
    }

    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut headers = StringRecord::new();
        let mut values = StringRecord::new();
        for (column, value) in pairs {
            headers.push_field(column);
            values.push_field(value);
        }
        Self::new(Arc::new(headers), values)
    }

    /// Value of the first column named `column`.
    pub fn get(&self, column: &str) -> Option<&str> {
        let index = self.headers.iter().position(|h| h == column)?;
        self.values.get(index)
    }

    /// Iterate `(column, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().zip(self.values.iter())
    }
}

/// Lazy, finite source of [`Record`]s parsed from a CSV file with a header
/// row.
///
/// The file handle is owned by the reader and released when it is dropped.
/// Malformed rows surface as [`PipelineError::Parse`] items; the caller
/// decides whether to stop.
pub struct RecordReader {
    headers: Arc<StringRecord>,
    rows: csv::StringRecordsIntoIter<File>,
}

impl RecordReader {
    /// Open `path` for reading.
    ///
    /// Fails with [`PipelineError::NotFound`] before opening anything if the
    /// path does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::NotFound {
                path: path.to_path_buf(),
            });
        }

        info!("Opening file {}", path.display());
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        let mut reader = csv::Reader::from_reader(file);
        let headers = Arc::new(reader.headers()?.clone());

        Ok(Self {
            headers,
            rows: reader.into_records(),
        })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }
}

impl Iterator for RecordReader {
    type Item = Result<Record, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(
            row.map(|values| Record::new(Arc::clone(&self.headers), values))
                .map_err(PipelineError::from),
        )
    }
}
