//! # csv-event-filter
//!
//! Streaming filter over CSV exports of user-interaction events.
//!
//! Rows are read one at a time, counted, checked against a field-equality
//! predicate and an event-name discriminator, and deduplicated by `user_id`.
//! Surviving identifiers are written as one comma-joined list, optionally
//! split across numbered files of bounded size.
//!
//! ## Pipeline
//!
//! ```text
//! RecordReader -> RowCounter -> DedupFilter -> ChunkSink
//! ```
//!
//! ## Example
//!
//! ```
//! use csv_event_filter::{DedupFilter, FilterPredicate, Record, Stage};
//!
//! let mut filter = DedupFilter::new(FilterPredicate::new("answer", "Yes"));
//! let row = |id: &'static str| Record::from_pairs([
//!     ("user_id", id),
//!     ("answer", "Yes"),
//!     ("name", "appcues:form_submitted"),
//! ]);
//!
//! let emitted: String = ["u1", "u2", "u1"]
//!     .into_iter()
//!     .filter_map(|id| filter.process(row(id)))
//!     .map(|chunk| chunk.as_str().to_string())
//!     .collect();
//!
//! assert_eq!(emitted, "u1,u2");
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod field;
pub mod record;
pub mod stage;
pub mod writer;

pub use config::{DEFAULT_OUTFILE, RunConfig};
pub use error::PipelineError;
pub use executor::{RunOutput, RunSummary, execute, run};
pub use field::FieldPath;
pub use record::{Record, RecordReader};
pub use stage::{Chunk, DedupFilter, FORM_SUBMITTED, FilterPredicate, RowCounter, Stage};
pub use writer::{BatchLimit, BatchedWriter, ChunkSink, SingleFileWriter, open_sink};
