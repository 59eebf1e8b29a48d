//! Exporters (and the structured importer) for [`InstanceCollection`].
//!
//! | format            | in memory                 | on disk                  |
//! |-------------------|---------------------------|--------------------------|
//! | structured (JSON) | `to_structured`           | `write_structured`       |
//! | line              | `to_lines`                | `write_lines`            |
//! | ranking-eval      | `ranking_eval_string`     | `write_ranking_eval`     |
//! | ranking-train     | `ranking_train_string`    | `write_ranking_train`    |
//!
//! Line-oriented file writers flush every `batch_size` instances; the bytes
//! on disk always equal the in-memory rendering.
//!
//! [`InstanceCollection`]: crate::InstanceCollection

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{InstanceError, Result};

pub mod lines;
pub mod ranking_eval;
pub mod ranking_train;
pub mod structured;

pub use ranking_eval::RankedEntry;

/// Accumulates lines and writes them out one batch at a time.
pub(crate) struct BatchWriter {
    file: File,
    path: PathBuf,
    buffer: String,
    pending: usize,
    batch_size: usize,
    lines: usize,
}

impl BatchWriter {
    /// Create (or truncate) `path`.
    pub(crate) fn create(path: &Path, batch_size: usize) -> Result<Self> {
        let file = File::create(path).map_err(|e| InstanceError::io(path, e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            buffer: String::new(),
            pending: 0,
            batch_size: batch_size.max(1),
            lines: 0,
        })
    }

    /// Text that does not count towards the batch (e.g. a header).
    pub(crate) fn push_raw(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub(crate) fn push_line(&mut self, line: &str) -> Result<()> {
        self.buffer.push_str(line);
        self.buffer.push('\n');
        self.pending += 1;
        self.lines += 1;
        if self.pending >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn flush_batch(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.file
                .write_all(self.buffer.as_bytes())
                .map_err(|e| InstanceError::io(&self.path, e))?;
            self.buffer.clear();
        }
        self.pending = 0;
        Ok(())
    }

    /// Write the tail and close the file. Returns the number of lines pushed.
    pub(crate) fn finish(mut self) -> Result<usize> {
        self.flush_batch()?;
        self.file
            .flush()
            .map_err(|e| InstanceError::io(&self.path, e))?;
        Ok(self.lines)
    }
}
