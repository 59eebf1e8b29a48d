//! Structured (JSON) snapshots: `{id: {features, properties, score?, target?}}`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{InstanceError, Result};
use crate::instance::{Instance, InstanceRecord};
use crate::InstanceCollection;

/// Id-keyed snapshot. `BTreeMap` keeps ids sorted on output.
pub type StructuredInstances = BTreeMap<String, InstanceRecord>;

impl InstanceCollection {
    /// Every instance's record merged into one id-keyed map.
    pub fn to_structured(&self) -> StructuredInstances {
        let mut out = StructuredInstances::new();
        for instance in self.iter() {
            out.extend(instance.to_structured());
        }
        out
    }

    /// Pretty-print the snapshot to `path` with sorted keys.
    pub fn write_structured<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| InstanceError::io(path, e))?;
        let mut writer = BufWriter::new(file);

        let indent = " ".repeat(self.config().json_indent);
        let mut ser =
            serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(indent.as_bytes()));
        self.to_structured()
            .serialize(&mut ser)
            .map_err(|e| InstanceError::json(path, e))?;
        writer
            .write_all(b"\n")
            .and_then(|_| writer.flush())
            .map_err(|e| InstanceError::io(path, e))?;

        tracing::info!(path = %path.display(), instances = self.len(), "JSON output");
        Ok(())
    }

    /// Inverse of [`to_structured`](Self::to_structured). Iteration order of
    /// the result follows the map's (sorted) id order.
    pub fn from_structured(records: StructuredInstances) -> Self {
        records
            .into_iter()
            .map(|(id, record)| Instance::from_record(id, record))
            .collect()
    }

    pub fn read_structured<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "reading JSON file");
        let text = fs::read_to_string(path).map_err(|e| InstanceError::io(path, e))?;
        let records: StructuredInstances =
            serde_json::from_str(&text).map_err(|e| InstanceError::json(path, e))?;
        Ok(Self::from_structured(records))
    }
}
