//! Run configuration.

use std::path::PathBuf;

use crate::stage::{FORM_SUBMITTED, FilterPredicate};
use crate::writer::BatchLimit;

/// Output file used when none is given.
pub const DEFAULT_OUTFILE: &str = "out.txt";

/// Everything one pipeline run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub batch_limit: BatchLimit,
    pub predicate: FilterPredicate,
    /// Event name a record must carry to be considered.
    pub discriminator: String,
}

impl RunConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_batch_limit(mut self, batch_limit: BatchLimit) -> Self {
        self.batch_limit = batch_limit;
        self
    }

    pub fn with_predicate(mut self, predicate: FilterPredicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = discriminator.into();
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::from(DEFAULT_OUTFILE),
            batch_limit: BatchLimit::Unbounded,
            predicate: FilterPredicate::default(),
            discriminator: FORM_SUBMITTED.to_string(),
        }
    }
}
