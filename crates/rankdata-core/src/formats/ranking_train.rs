//! Sparse ranking-training (LibSVM / RankLib) files.
//!
//! ```text
//! # target id <feature names...>
//! <target> qid:<qid> <feature>:<value> ... # <id>
//! ```
//!
//! Feature columns come from the first instance's feature names, sorted, and
//! are assumed uniform across the collection. Features absent on an instance
//! are omitted, not zero-filled: consumers must read the file as sparse.
//!
//! Lines are ordered by integer qid because trainers expect contiguous query
//! blocks. Every sort key and target is checked before the file is opened.

use std::fs;
use std::path::Path;

use crate::error::{InstanceError, Result};
use crate::formats::BatchWriter;
use crate::instance::Instance;
use crate::InstanceCollection;

/// Validated, sorted view of the collection ready for writing.
struct TrainingPlan<'a> {
    features: Vec<String>,
    instances: Vec<&'a Instance>,
}

impl TrainingPlan<'_> {
    fn header(&self) -> String {
        let mut header = String::from("# target id");
        for name in &self.features {
            header.push(' ');
            header.push_str(name);
        }
        header.push('\n');
        header
    }
}

impl InstanceCollection {
    /// Sorted feature names of the first instance.
    pub fn ranking_feature_columns(&self) -> Vec<String> {
        self.iter()
            .next()
            .map(|ins| ins.features().keys().cloned().collect())
            .unwrap_or_default()
    }

    fn training_plan(&self, qid_property: Option<&str>) -> Result<TrainingPlan<'_>> {
        let mut keyed = Vec::with_capacity(self.len());
        for instance in self.iter() {
            let key = instance.sort_key(qid_property)?;
            if instance.target().is_none() {
                return Err(InstanceError::MissingTarget {
                    id: instance.id().to_string(),
                });
            }
            keyed.push((key, instance));
        }
        keyed.sort_by_key(|(key, _)| *key);

        Ok(TrainingPlan {
            features: self.ranking_feature_columns(),
            instances: keyed.into_iter().map(|(_, ins)| ins).collect(),
        })
    }

    /// In-memory rendering; empty string for an empty collection.
    pub fn ranking_train_string(&self, qid_property: Option<&str>) -> Result<String> {
        if self.is_empty() {
            return Ok(String::new());
        }
        let plan = self.training_plan(qid_property)?;
        let mut out = plan.header();
        for instance in &plan.instances {
            out.push_str(&instance.to_ranking_train(&plan.features, qid_property)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Write the training file in batches; returns the number of instance
    /// lines. An empty collection produces an empty file.
    pub fn write_ranking_train<P: AsRef<Path>>(&self, path: P, qid_property: Option<&str>) -> Result<usize> {
        let path = path.as_ref();
        if self.is_empty() {
            tracing::info!(path = %path.display(), "no instances; writing empty ranking file");
            fs::write(path, "").map_err(|e| InstanceError::io(path, e))?;
            return Ok(0);
        }

        let plan = self.training_plan(qid_property)?;
        tracing::info!(
            instances = plan.instances.len(),
            features = plan.features.len(),
            "converting instances to ranklib format"
        );

        let mut writer = BatchWriter::create(path, self.config().effective_batch_size())?;
        writer.push_raw(&plan.header());
        for instance in &plan.instances {
            writer.push_line(&instance.to_ranking_train(&plan.features, qid_property)?)?;
        }
        let written = writer.finish()?;
        tracing::info!(path = %path.display(), lines = written, "libsvm output");
        Ok(written)
    }
}
