//! Export settings shared by every writer.

use serde::{Deserialize, Serialize};

/// Property name that [`InstanceCollection::assign_numeric_ids`] writes to.
///
/// [`InstanceCollection::assign_numeric_ids`]: crate::InstanceCollection::assign_numeric_ids
pub const DEFAULT_QID_PROPERTY: &str = "q_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Instances per write when streaming line and ranking-training output.
    pub batch_size: usize,
    /// Last column of every ranking-evaluation line.
    pub run_tag: String,
    /// Reserved property holding manufactured integer qids.
    pub qid_property: String,
    /// Spaces per indentation level in structured snapshots.
    pub json_indent: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            run_tag: "rankdata".to_string(),
            qid_property: DEFAULT_QID_PROPERTY.to_string(),
            json_indent: 4,
        }
    }
}

impl ExportConfig {
    /// Batch size clamped to at least one instance.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
