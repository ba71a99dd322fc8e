//! Output sinks for emitted identifier chunks.
//!
//! Unbatched output goes to a single file as-is. Batched output is split
//! across `<stem>.<index>.<ext>` files; a file is closed once it has taken
//! more than the configured number of chunks.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PipelineError;
use crate::stage::Chunk;

/// How emitted chunks are split across output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchLimit {
    /// Everything goes to one file.
    #[default]
    Unbounded,
    /// Start a new file once the current one holds more than this many
    /// chunks. Zero behaves like `Unbounded`.
    MaxEntries(usize),
}

impl BatchLimit {
    /// Normalize a raw `--maxlen` value. Absent, zero and negative limits
    /// all disable batching.
    pub fn from_max_len(max_len: Option<i64>) -> Self {
        match max_len {
            Some(n) if n > 0 => Self::MaxEntries(n as usize),
            _ => Self::Unbounded,
        }
    }
}

/// Destination for the chunk stream.
pub trait ChunkSink {
    /// Write one chunk.
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<(), PipelineError>;

    /// Flush and close every file this sink opened, in opening order.
    ///
    /// Returns the paths written.
    fn finish(self: Box<Self>) -> Result<Vec<PathBuf>, PipelineError>;
}

/// Open the sink for `path` according to `limit`.
pub fn open_sink(path: &Path, limit: BatchLimit) -> Result<Box<dyn ChunkSink>, PipelineError> {
    match limit {
        BatchLimit::Unbounded | BatchLimit::MaxEntries(0) => {
            Ok(Box::new(SingleFileWriter::create(path)?))
        }
        BatchLimit::MaxEntries(max) => Ok(Box::new(BatchedWriter::create(path, max)?)),
    }
}

/// Name of batch file `index` for output `path`.
///
/// `out.txt` becomes `out.0.txt`; a path without extension gets the index
/// appended (`out` becomes `out.0`).
pub fn batch_file_name(path: &Path, index: usize) -> PathBuf {
    let file_name = match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => format!(
            "{}.{index}.{}",
            stem.to_string_lossy(),
            ext.to_string_lossy()
        ),
        _ => format!(
            "{}.{index}",
            path.file_name().unwrap_or_default().to_string_lossy()
        ),
    };
    path.with_file_name(file_name)
}

struct OutputFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl OutputFile {
    fn create(path: PathBuf) -> Result<Self, PipelineError> {
        let file = File::create(&path).map_err(|e| PipelineError::io(&path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    fn write(&mut self, text: &str) -> Result<(), PipelineError> {
        self.writer
            .write_all(text.as_bytes())
            .map_err(|e| PipelineError::io(&self.path, e))
    }

    fn close(mut self) -> Result<PathBuf, PipelineError> {
        self.writer
            .flush()
            .map_err(|e| PipelineError::io(&self.path, e))?;
        Ok(self.path)
    }
}

/// Writes every chunk verbatim to one file.
pub struct SingleFileWriter {
    file: OutputFile,
}

impl SingleFileWriter {
    pub fn create(path: &Path) -> Result<Self, PipelineError> {
        Ok(Self {
            file: OutputFile::create(path.to_path_buf())?,
        })
    }
}

impl ChunkSink for SingleFileWriter {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<(), PipelineError> {
        self.file.write(chunk.as_str())
    }

    fn finish(self: Box<Self>) -> Result<Vec<PathBuf>, PipelineError> {
        Ok(vec![self.file.close()?])
    }
}

/// Splits chunks across sequentially numbered files.
///
/// File 0 is created up front. A new file is started before a write once
/// the current one holds more than `max_entries` chunks, so every file but
/// the last takes `max_entries + 1`. The first chunk written to any file has
/// its leading separator stripped so no file starts with a comma.
pub struct BatchedWriter {
    base: PathBuf,
    max_entries: usize,
    files: Vec<OutputFile>,
    current_len: usize,
}

impl BatchedWriter {
    pub fn create(base: &Path, max_entries: usize) -> Result<Self, PipelineError> {
        debug!("Creating batches of {max_entries} entries");
        let first = OutputFile::create(batch_file_name(base, 0))?;
        Ok(Self {
            base: base.to_path_buf(),
            max_entries,
            files: vec![first],
            current_len: 0,
        })
    }

    fn roll_over(&mut self) -> Result<(), PipelineError> {
        let next = OutputFile::create(batch_file_name(&self.base, self.files.len()))?;
        self.files.push(next);
        self.current_len = 0;
        Ok(())
    }
}

impl ChunkSink for BatchedWriter {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<(), PipelineError> {
        if self.current_len > self.max_entries {
            self.roll_over()?;
        }

        let text = if self.current_len == 0 {
            chunk.without_separator()
        } else {
            chunk.as_str()
        };
        if let Some(file) = self.files.last_mut() {
            file.write(text)?;
        }
        self.current_len += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<PathBuf>, PipelineError> {
        let paths = self
            .files
            .into_iter()
            .map(OutputFile::close)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Created {} file(s)", paths.len());
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::stage::{DedupFilter, FORM_SUBMITTED, FilterPredicate, SEPARATOR, Stage};
    use std::fs;

    /// Chunks for `n` identifiers, separated the way the filter emits them.
    fn chunks(n: usize) -> Vec<Chunk> {
        let mut filter = DedupFilter::new(FilterPredicate::new("answer", "Yes"));
        (0..n)
            .filter_map(|i| {
                let id = format!("u{i}");
                filter.process(Record::from_pairs([
                    ("user_id", id.as_str()),
                    ("answer", "Yes"),
                    ("name", FORM_SUBMITTED),
                ]))
            })
            .collect()
    }

    fn write_all(sink: Box<dyn ChunkSink>, chunks: &[Chunk]) -> Vec<PathBuf> {
        let mut sink = sink;
        for chunk in chunks {
            sink.write_chunk(chunk).unwrap();
        }
        sink.finish().unwrap()
    }

    fn batched(n: usize, max: usize) -> (tempfile::TempDir, Vec<String>) {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let sink = open_sink(&out, BatchLimit::MaxEntries(max)).unwrap();
        let paths = write_all(sink, &chunks(n));
        let contents = paths
            .iter()
            .map(|p| fs::read_to_string(p).unwrap())
            .collect();
        (dir, contents)
    }

    #[test]
    fn test_from_max_len() {
        assert_eq!(BatchLimit::from_max_len(None), BatchLimit::Unbounded);
        assert_eq!(BatchLimit::from_max_len(Some(0)), BatchLimit::Unbounded);
        assert_eq!(BatchLimit::from_max_len(Some(-3)), BatchLimit::Unbounded);
        assert_eq!(BatchLimit::from_max_len(Some(5)), BatchLimit::MaxEntries(5));
    }

    #[test]
    fn test_batch_file_name() {
        assert_eq!(
            batch_file_name(Path::new("out.txt"), 0),
            PathBuf::from("out.0.txt")
        );
        assert_eq!(
            batch_file_name(Path::new("dir/ids.csv"), 12),
            PathBuf::from("dir/ids.12.csv")
        );
        assert_eq!(batch_file_name(Path::new("ids"), 3), PathBuf::from("ids.3"));
        assert_eq!(
            batch_file_name(Path::new("a.tar.gz"), 1),
            PathBuf::from("a.tar.1.gz")
        );
    }

    #[test]
    fn test_single_file_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let paths = write_all(open_sink(&out, BatchLimit::Unbounded).unwrap(), &chunks(4));
        assert_eq!(paths, vec![out.clone()]);
        assert_eq!(fs::read_to_string(&out).unwrap(), "u0,u1,u2,u3");
    }

    #[test]
    fn test_single_file_empty() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        write_all(open_sink(&out, BatchLimit::Unbounded).unwrap(), &[]);
        assert_eq!(fs::read_to_string(&out).unwrap(), "");
    }

    #[test]
    fn test_batches_split_without_leading_separator() {
        let (_dir, files) = batched(9, 3);
        assert_eq!(files, vec!["u0,u1,u2,u3", "u4,u5,u6,u7", "u8"]);
        assert!(files.iter().all(|f| !f.starts_with(SEPARATOR)));
    }

    #[test]
    fn test_batch_boundary_exact_multiple() {
        let (_dir, files) = batched(3, 3);
        assert_eq!(files, vec!["u0,u1,u2"]);
    }

    #[test]
    fn test_batch_boundary_one_over() {
        let (_dir, files) = batched(4, 3);
        assert_eq!(files, vec!["u0,u1,u2,u3"]);
    }

    #[test]
    fn test_batch_boundary_two_over() {
        let (_dir, files) = batched(5, 3);
        assert_eq!(files, vec!["u0,u1,u2,u3", "u4"]);
    }

    #[test]
    fn test_split_limit_two_of_five() {
        let (_dir, files) = batched(5, 2);
        assert_eq!(files, vec!["u0,u1,u2", "u3,u4"]);
    }

    #[test]
    fn test_batch_no_chunks_leaves_one_empty_file() {
        let (dir, files) = batched(0, 3);
        assert_eq!(files, vec![""]);
        assert!(dir.path().join("out.0.txt").exists());
        assert!(!dir.path().join("out.1.txt").exists());
    }

    #[test]
    fn test_batch_of_one() {
        let (_dir, files) = batched(3, 1);
        assert_eq!(files, vec!["u0,u1", "u2"]);
    }

    #[test]
    fn test_zero_limit_writes_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let paths = write_all(open_sink(&out, BatchLimit::MaxEntries(0)).unwrap(), &chunks(3));
        assert_eq!(paths, vec![out.clone()]);
        assert_eq!(fs::read_to_string(&out).unwrap(), "u0,u1,u2");
        assert!(!dir.path().join("out.0.txt").exists());
    }

    #[test]
    fn test_batch_files_are_named_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("ids.txt");
        let paths = write_all(open_sink(&out, BatchLimit::MaxEntries(1)).unwrap(), &chunks(5));
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["ids.0.txt", "ids.1.txt", "ids.2.txt"]);
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing-dir").join("out.txt");
        let err = open_sink(&out, BatchLimit::Unbounded).err().unwrap();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
