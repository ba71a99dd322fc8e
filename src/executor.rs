//! Record-at-a-time pipeline executor.
//!
//! Each input record flows through the counter and the filter, and any
//! emitted chunk is written, before the next record is read. Nothing is
//! buffered between stages.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::RunConfig;
use crate::error::PipelineError;
use crate::record::{Record, RecordReader};
use crate::stage::{DedupFilter, RowCounter, Stage};
use crate::writer::{ChunkSink, open_sink};

/// Counts reported once a run completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Records read from the input.
    pub total: usize,
    /// Unique identifiers written to the output.
    pub filtered: usize,
}

/// Result of [`execute`]: the summary plus the files written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub summary: RunSummary,
    pub files: Vec<PathBuf>,
}

/// Drive `records` through `counter` and `filter` into `sink`.
///
/// Stops at the first error. Files already written are left in place.
pub fn execute<I>(
    records: I,
    counter: &mut RowCounter,
    filter: &mut DedupFilter,
    mut sink: Box<dyn ChunkSink>,
) -> Result<RunOutput, PipelineError>
where
    I: IntoIterator<Item = Result<Record, PipelineError>>,
{
    debug!("Running stages {} -> {}", counter.name(), filter.name());
    for record in records {
        if let Some(record) = counter.process(record?)
            && let Some(chunk) = filter.process(record)
        {
            sink.write_chunk(&chunk)?;
        }
    }

    let files = sink.finish()?;
    Ok(RunOutput {
        summary: RunSummary {
            total: counter.count(),
            filtered: filter.emitted(),
        },
        files,
    })
}

/// Run the whole pipeline described by `config`.
///
/// The input is checked before any output file is created, so a missing
/// input leaves the output location untouched. Every call builds fresh
/// stages; no state carries over between runs.
pub fn run(config: &RunConfig) -> Result<RunOutput, PipelineError> {
    if config.input.as_os_str().is_empty() {
        return Err(PipelineError::Usage);
    }

    let records = RecordReader::open(&config.input)?;
    let mut counter = RowCounter::new();
    let mut filter =
        DedupFilter::with_discriminator(config.predicate.clone(), config.discriminator.clone());
    let sink = open_sink(&config.output, config.batch_limit)?;

    let output = execute(records, &mut counter, &mut filter, sink)?;
    info!(
        total = output.summary.total,
        filtered = output.summary.filtered,
        files = output.files.len(),
        "pipeline finished"
    );
    Ok(output)
}
