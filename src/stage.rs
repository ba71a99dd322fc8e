//! Pipeline stages between the record source and the output sink.
//!
//! Each stage consumes one item at a time and produces zero or one item for
//! the next stage. Stages own their state; nothing is shared between runs,
//! so constructing fresh stages gives a fresh run.

use std::collections::HashSet;

use tracing::debug;

use crate::field::FieldPath;
use crate::record::Record;

/// Column holding the identifier that is emitted and deduplicated.
pub const ID_FIELD: &str = "user_id";

/// Column holding the event name.
pub const DISCRIMINATOR_FIELD: &str = "name";

/// Event name of a submitted form.
pub const FORM_SUBMITTED: &str = "appcues:form_submitted";

/// Separator placed in front of every emitted identifier but the first.
pub const SEPARATOR: char = ',';

/// A pipeline stage that processes items one at a time.
pub trait Stage<I> {
    type Output;

    /// Process one input item, returning the item to pass downstream, if any.
    fn process(&mut self, input: I) -> Option<Self::Output>;

    /// The display name of this stage.
    fn name(&self) -> &str;
}

/// COUNT - tallies every record and forwards it unchanged.
#[derive(Debug, Default)]
pub struct RowCounter {
    count: usize,
}

impl RowCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl Stage<Record> for RowCounter {
    type Output = Record;

    fn process(&mut self, record: Record) -> Option<Record> {
        self.count += 1;
        Some(record)
    }

    fn name(&self) -> &str {
        "COUNT"
    }
}

/// Field-equality condition: the value at `field` must equal `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPredicate {
    pub field: FieldPath,
    pub value: String,
}

impl FilterPredicate {
    pub fn new(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: FieldPath::parse(field),
            value: value.into(),
        }
    }

    /// Exact, case-sensitive comparison of the resolved field.
    pub fn matches(&self, record: &Record) -> bool {
        self.field
            .resolve(record)
            .is_some_and(|found| found == self.value.as_str())
    }
}

impl Default for FilterPredicate {
    fn default() -> Self {
        Self::new("attributes.interaction.response.0.value", "Yes")
    }
}

/// An emitted identifier, ready to be appended to the output.
///
/// Every chunk but the first of a run starts with [`SEPARATOR`], so the
/// chunks concatenate into one comma-joined list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk(String);

impl Chunk {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The chunk text without a single leading separator.
    pub fn without_separator(&self) -> &str {
        self.0.strip_prefix(SEPARATOR).unwrap_or(&self.0)
    }
}

/// FILTER + UNIQUE - emits each matching identifier once.
///
/// A record is emitted iff its identifier has not been emitted before, the
/// predicate holds, and its event name equals the discriminator sentinel.
/// The checks run in that order and stop at the first failure.
#[derive(Debug)]
pub struct DedupFilter {
    predicate: FilterPredicate,
    discriminator: String,
    seen: HashSet<String>,
    first: bool,
}

impl DedupFilter {
    pub fn new(predicate: FilterPredicate) -> Self {
        Self::with_discriminator(predicate, FORM_SUBMITTED)
    }

    pub fn with_discriminator(predicate: FilterPredicate, discriminator: impl Into<String>) -> Self {
        let discriminator = discriminator.into();
        debug!(
            "Filtering records on {} === {}",
            predicate.field, predicate.value
        );
        Self {
            predicate,
            discriminator,
            seen: HashSet::new(),
            first: true,
        }
    }

    /// Identifiers emitted so far.
    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    /// Number of unique identifiers emitted so far.
    pub fn emitted(&self) -> usize {
        self.seen.len()
    }

    fn accepts(&self, id: &str, record: &Record) -> bool {
        !self.seen.contains(id)
            && self.predicate.matches(record)
            && record.get(DISCRIMINATOR_FIELD) == Some(self.discriminator.as_str())
    }
}

impl Stage<Record> for DedupFilter {
    type Output = Chunk;

    fn process(&mut self, record: Record) -> Option<Chunk> {
        let id = record.get(ID_FIELD)?;
        if !self.accepts(id, &record) {
            return None;
        }

        let text = if self.first {
            id.to_string()
        } else {
            format!("{SEPARATOR}{id}")
        };
        self.seen.insert(id.to_string());
        self.first = false;
        Some(Chunk(text))
    }

    fn name(&self) -> &str {
        "FILTER"
    }
}
