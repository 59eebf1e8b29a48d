//! One instance per line, using the instance's `Display` form.

use std::path::Path;

use crate::error::Result;
use crate::formats::BatchWriter;
use crate::InstanceCollection;

impl InstanceCollection {
    pub fn to_lines(&self) -> String {
        let mut out = String::new();
        for instance in self.iter() {
            out.push_str(&instance.to_string());
            out.push('\n');
        }
        out
    }

    /// Same content as [`to_lines`](Self::to_lines), written in batches.
    pub fn write_lines<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let mut writer = BatchWriter::create(path, self.config().effective_batch_size())?;
        for instance in self.iter() {
            writer.push_line(&instance.to_string())?;
        }
        let written = writer.finish()?;
        tracing::info!(path = %path.display(), lines = written, "string output");
        Ok(written)
    }
}
