//! Instance collection and the merge-load protocol.
//!
//! Instances live in an arena (`Vec<Instance>`) with an id → slot index next
//! to it. Iteration order is first-insertion order; every loader upserts into
//! the arena, so independently loaded sources converge on one instance per id.

use std::collections::BTreeMap;
use std::path::Path;

use ahash::AHashMap;
use rankdata_ingest_tsv::read_tsv;

use crate::config::ExportConfig;
use crate::error::{InstanceError, Result};
use crate::instance::Instance;

/// Name of the single column a target source carries.
pub const TARGET_COLUMN: &str = "target";

/// Which instance field a delimited source feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Properties,
    Features,
    Target,
}

/// A validated cell, staged until the whole source has been checked.
enum FieldUpdate {
    Property(String, String),
    Feature(String, f64),
    Target(f64),
}

#[derive(Debug, Clone, Default)]
pub struct InstanceCollection {
    instances: Vec<Instance>,
    index: AHashMap<String, usize>,
    config: ExportConfig,
}

impl InstanceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pre-built instances; a later instance with a repeated id
    /// replaces the earlier one.
    pub fn from_instances(instances: impl IntoIterator<Item = Instance>) -> Self {
        let mut collection = Self::new();
        collection.append_instances(instances);
        collection
    }

    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Insert, replacing any instance with the same id in place.
    pub fn add_instance(&mut self, instance: Instance) {
        match self.index.get(instance.id()) {
            Some(&slot) => self.instances[slot] = instance,
            None => {
                self.index
                    .insert(instance.id().to_string(), self.instances.len());
                self.instances.push(instance);
            }
        }
    }

    pub fn append_instances(&mut self, instances: impl IntoIterator<Item = Instance>) {
        for instance in instances {
            self.add_instance(instance);
        }
    }

    /// Look up an instance by id, creating an empty one if it does not exist.
    pub fn upsert(&mut self, id: &str) -> &mut Instance {
        let slot = match self.index.get(id) {
            Some(&slot) => slot,
            None => {
                let slot = self.instances.len();
                self.instances.push(Instance::new(id));
                self.index.insert(id.to_string(), slot);
                slot
            }
        };
        &mut self.instances[slot]
    }

    pub fn get(&self, id: &str) -> Option<&Instance> {
        self.index.get(id).map(|&slot| &self.instances[slot])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Instance> {
        match self.index.get(id) {
            Some(&slot) => Some(&mut self.instances[slot]),
            None => None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.instances.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Instance> {
        self.instances.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(Instance::id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    // ========================================================================
    // Merge-loading from delimited sources
    // ========================================================================

    /// Merge one tab-separated source into the collection.
    ///
    /// The header (minus the id column) must equal `columns` as a set. Every
    /// cell is validated before the first instance is touched, so a failing
    /// load leaves the collection unchanged. Empty feature/target cells are
    /// skipped and leave the field unset; `NaN` and infinities are rejected.
    ///
    /// Returns the number of data rows merged.
    pub fn load_delimited<P, S>(&mut self, path: P, kind: SourceKind, columns: &[S]) -> Result<usize>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let table = read_tsv(path.as_ref(), columns)?;

        let mut staged: Vec<(String, Vec<FieldUpdate>)> = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let mut updates = Vec::with_capacity(columns.len());
            for column in columns {
                let column = column.as_ref();
                let cell = table.value(row, column).unwrap_or_default();
                let update = match kind {
                    SourceKind::Properties => {
                        FieldUpdate::Property(column.to_string(), cell.to_string())
                    }
                    SourceKind::Features | SourceKind::Target => {
                        if cell.trim().is_empty() {
                            continue;
                        }
                        // Non-finite values cannot be written to a JSON snapshot.
                        let value = cell
                            .trim()
                            .parse::<f64>()
                            .ok()
                            .filter(|v| v.is_finite())
                            .ok_or_else(|| InstanceError::InvalidNumber {
                                path: table.path.clone(),
                                id: row.id.clone(),
                                column: column.to_string(),
                                value: cell.to_string(),
                            })?;
                        if kind == SourceKind::Features {
                            FieldUpdate::Feature(column.to_string(), value)
                        } else {
                            FieldUpdate::Target(value)
                        }
                    }
                };
                updates.push(update);
            }
            staged.push((row.id.clone(), updates));
        }

        let before = self.len();
        let rows = staged.len();
        for (id, updates) in staged {
            let instance = self.upsert(&id);
            for update in updates {
                match update {
                    FieldUpdate::Property(name, value) => instance.add_property(name, value),
                    FieldUpdate::Feature(name, value) => instance.add_feature(name, value),
                    FieldUpdate::Target(value) => instance.set_target(value),
                }
            }
        }

        tracing::debug!(
            path = %table.path.display(),
            ?kind,
            rows,
            created = self.len() - before,
            "merged delimited source"
        );
        Ok(rows)
    }

    pub fn add_properties_from_tsv<P: AsRef<Path>, S: AsRef<str>>(
        &mut self,
        path: P,
        properties: &[S],
    ) -> Result<usize> {
        self.load_delimited(path, SourceKind::Properties, properties)
    }

    pub fn add_features_from_tsv<P: AsRef<Path>, S: AsRef<str>>(
        &mut self,
        path: P,
        features: &[S],
    ) -> Result<usize> {
        self.load_delimited(path, SourceKind::Features, features)
    }

    pub fn add_target_from_tsv<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        self.load_delimited(path, SourceKind::Target, &[TARGET_COLUMN])
    }

    // ========================================================================
    // Utilities
    // ========================================================================

    /// Give every distinct value of `property` a sequential integer (from 1,
    /// in first-encounter order) and store it under the configured qid
    /// property. Instances without the property share one id of their own.
    ///
    /// Returns the number of distinct values.
    pub fn assign_numeric_ids(&mut self, property: &str) -> usize {
        let qid_property = self.config.qid_property.clone();
        let mut assigned: AHashMap<Option<String>, usize> = AHashMap::new();
        for instance in &mut self.instances {
            let key = instance.get_property(property).map(str::to_string);
            let next = assigned.len() + 1;
            let qid = *assigned.entry(key).or_insert(next);
            instance.add_property(qid_property.as_str(), qid.to_string());
        }
        tracing::debug!(property, distinct = assigned.len(), "assigned numeric ids");
        assigned.len()
    }

    /// Instances grouped by the value of `property`; `None` collects instances
    /// without it. Collection order is kept inside each group.
    pub fn group_by(&self, property: &str) -> BTreeMap<Option<&str>, Vec<&Instance>> {
        let mut groups: BTreeMap<Option<&str>, Vec<&Instance>> = BTreeMap::new();
        for instance in &self.instances {
            groups
                .entry(instance.get_property(property))
                .or_default()
                .push(instance);
        }
        groups
    }
}

impl<'a> IntoIterator for &'a InstanceCollection {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Instance> for InstanceCollection {
    fn from_iter<T: IntoIterator<Item = Instance>>(iter: T) -> Self {
        Self::from_instances(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn upsert_creates_once() {
        let mut c = InstanceCollection::new();
        c.upsert("a").add_property("p", "1");
        c.upsert("a").add_feature("f", 2.0);
        assert_eq!(c.len(), 1);
        let a = c.get("a").unwrap();
        assert_eq!(a.get_property("p"), Some("1"));
        assert_eq!(a.get_feature("f"), Some(2.0));
    }

    #[test]
    fn add_instance_replaces_in_place() {
        let mut c = InstanceCollection::from_instances([Instance::new("a"), Instance::new("b")]);
        c.add_instance(Instance::new("a").with_target(1.0));
        assert_eq!(c.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(c.get("a").unwrap().target(), Some(1.0));
    }

    #[test]
    fn missing_lookup_is_none() {
        let c = InstanceCollection::new();
        assert!(c.get("nope").is_none());
        assert!(c.is_empty());
    }

    #[test]
    fn bad_number_leaves_collection_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.tsv");
        fs::write(&path, "id\tf\n1\t0.5\n2\toops\n").unwrap();

        let mut c = InstanceCollection::new();
        let err = c.add_features_from_tsv(&path, &["f"]).unwrap_err();
        assert!(matches!(err, InstanceError::InvalidNumber { ref id, .. } if id == "2"));
        assert!(c.is_empty());
    }

    #[test]
    fn non_finite_cells_are_rejected() {
        let dir = tempdir().unwrap();
        for cell in ["NaN", "inf", "-inf"] {
            let path = dir.path().join("f.tsv");
            fs::write(&path, format!("id\tf\n1\t0.5\n2\t{cell}\n")).unwrap();

            let mut c = InstanceCollection::new();
            let err = c.add_features_from_tsv(&path, &["f"]).unwrap_err();
            assert!(
                matches!(err, InstanceError::InvalidNumber { ref id, ref value, .. } if id == "2" && value == cell),
                "{cell}: {err:?}"
            );
            assert!(c.is_empty());

            let err = c.add_target_from_tsv(write_target(dir.path(), cell)).unwrap_err();
            assert!(matches!(err, InstanceError::InvalidNumber { .. }), "{cell}: {err:?}");
        }
    }

    fn write_target(dir: &std::path::Path, cell: &str) -> std::path::PathBuf {
        let path = dir.join("t.tsv");
        fs::write(&path, format!("id\ttarget\n1\t{cell}\n")).unwrap();
        path
    }

    #[test]
    fn finite_features_survive_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.tsv");
        fs::write(&path, "id\tf\n1\t-0.125\n2\t1e300\n").unwrap();
        let mut c = InstanceCollection::new();
        c.add_features_from_tsv(&path, &["f"]).unwrap();

        let snapshot = dir.path().join("snap.json");
        c.write_structured(&snapshot).unwrap();
        let restored = InstanceCollection::read_structured(&snapshot).unwrap();
        assert_eq!(restored.get("1").unwrap().get_feature("f"), Some(-0.125));
        assert_eq!(restored.get("2").unwrap().get_feature("f"), Some(1e300));
    }

    #[test]
    fn empty_feature_cell_stays_unset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.tsv");
        fs::write(&path, "id\tf\tg\n1\t\t3\n").unwrap();

        let mut c = InstanceCollection::new();
        c.add_features_from_tsv(&path, &["f", "g"]).unwrap();
        let ins = c.get("1").unwrap();
        assert_eq!(ins.get_feature("f"), None);
        assert_eq!(ins.get_feature("g"), Some(3.0));
    }

    #[test]
    fn numeric_ids_follow_first_encounter() {
        let mut c = InstanceCollection::from_instances([
            Instance::new("1").with_property("tx", "beta"),
            Instance::new("2").with_property("tx", "alpha"),
            Instance::new("3").with_property("tx", "beta"),
            Instance::new("4"),
        ]);
        assert_eq!(c.assign_numeric_ids("tx"), 3);
        let qid = |id: &str| c.get(id).unwrap().get_property("q_id").unwrap().to_string();
        assert_eq!(qid("1"), "1");
        assert_eq!(qid("2"), "2");
        assert_eq!(qid("3"), "1");
        assert_eq!(qid("4"), "3");
    }

    #[test]
    fn group_by_keeps_order_within_group() {
        let c = InstanceCollection::from_instances([
            Instance::new("1").with_property("q", "x"),
            Instance::new("2").with_property("q", "y"),
            Instance::new("3").with_property("q", "x"),
            Instance::new("4"),
        ]);
        let groups = c.group_by("q");
        let ids = |group: &Vec<&Instance>| {
            group.iter().map(|i| i.id().to_string()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&groups[&Some("x")]), vec!["1", "3"]);
        assert_eq!(ids(&groups[&Some("y")]), vec!["2"]);
        assert_eq!(ids(&groups[&None]), vec!["4"]);
    }
}
