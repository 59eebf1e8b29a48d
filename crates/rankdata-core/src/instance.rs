//! A single labeled record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{InstanceError, Result};

// ============================================================================
// Instance
// ============================================================================

/// One instance: id, string properties, numeric features, optional target and
/// score.
///
/// Every optional field is explicitly optional: an unset property is `None`,
/// which is distinct from a property set to `""`; likewise an unset feature is
/// distinct from a feature set to `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    id: String,
    properties: BTreeMap<String, String>,
    features: BTreeMap<String, f64>,
    target: Option<f64>,
    score: Option<f64>,
}

impl Instance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: BTreeMap::new(),
            features: BTreeMap::new(),
            target: None,
            score: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    /// Insert or overwrite a property.
    pub fn add_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn get_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_property(name, value);
        self
    }

    // ------------------------------------------------------------------------
    // Features
    // ------------------------------------------------------------------------

    /// Insert or overwrite a feature.
    pub fn add_feature(&mut self, name: impl Into<String>, value: f64) {
        self.features.insert(name.into(), value);
    }

    pub fn get_feature(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }

    pub fn features(&self) -> &BTreeMap<String, f64> {
        &self.features
    }

    pub fn with_feature(mut self, name: impl Into<String>, value: f64) -> Self {
        self.add_feature(name, value);
        self
    }

    // ------------------------------------------------------------------------
    // Target / score
    // ------------------------------------------------------------------------

    pub fn target(&self) -> Option<f64> {
        self.target
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = Some(target);
    }

    pub fn with_target(mut self, target: f64) -> Self {
        self.set_target(target);
        self
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn set_score(&mut self, score: f64) {
        self.score = Some(score);
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.set_score(score);
        self
    }

    // ------------------------------------------------------------------------
    // Structured record
    // ------------------------------------------------------------------------

    /// `{id: record}` with a single entry.
    pub fn to_structured(&self) -> BTreeMap<String, InstanceRecord> {
        BTreeMap::from([(self.id.clone(), self.to_record())])
    }

    pub fn to_record(&self) -> InstanceRecord {
        InstanceRecord {
            features: self.features.clone(),
            properties: self.properties.clone(),
            score: self.score,
            target: self.target,
        }
    }

    pub fn from_record(id: impl Into<String>, record: InstanceRecord) -> Self {
        Self {
            id: id.into(),
            properties: record.properties,
            features: record.features,
            target: record.target,
            score: record.score,
        }
    }

    // ------------------------------------------------------------------------
    // Ranking-training line
    // ------------------------------------------------------------------------

    /// Integer ordering key for ranking-training export: the named property
    /// when given, the instance id otherwise.
    pub fn sort_key(&self, qid_property: Option<&str>) -> Result<i64> {
        let (key, raw) = match qid_property {
            Some(prop) => {
                let raw = self
                    .get_property(prop)
                    .ok_or_else(|| InstanceError::MissingSortKey {
                        id: self.id.clone(),
                        property: prop.to_string(),
                    })?;
                (prop, raw)
            }
            None => ("id", self.id.as_str()),
        };
        raw.trim()
            .parse::<i64>()
            .map_err(|_| InstanceError::NonIntegerSortKey {
                id: self.id.clone(),
                key: key.to_string(),
                value: raw.to_string(),
            })
    }

    /// `<target> qid:<n> <idx>:<value> ... # <id>`
    ///
    /// Indices are 1-based positions in `features`. Only features present on
    /// this instance are written; an absent feature is left implicit rather
    /// than written as zero.
    pub fn to_ranking_train(&self, features: &[String], qid_property: Option<&str>) -> Result<String> {
        let qid = self.sort_key(qid_property)?;
        let target = self.target.ok_or_else(|| InstanceError::MissingTarget {
            id: self.id.clone(),
        })?;

        let mut line = format!("{target} qid:{qid}");
        for (idx, name) in features.iter().enumerate() {
            if let Some(value) = self.features.get(name) {
                line.push_str(&format!(" {}:{}", idx + 1, value));
            }
        }
        line.push_str(" # ");
        line.push_str(&self.id);
        Ok(line)
    }
}

/// Line form: `<id>\tproperties={k=v, ...}\tfeatures={k=v, ...}[\ttarget=t][\tscore=s]`.
impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\tproperties={{", self.id)?;
        for (i, (name, value)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}\tfeatures={")?;
        for (i, (name, value)) in self.features.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")?;
        if let Some(target) = self.target {
            write!(f, "\ttarget={target}")?;
        }
        if let Some(score) = self.score {
            write!(f, "\tscore={score}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Structured record
// ============================================================================

/// Serialized body of one instance. Field order is alphabetical so snapshots
/// come out key-sorted.
///
/// Reading is lenient: numbers may arrive as strings, property values may
/// arrive as numbers or booleans, and `null` means "not set".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    #[serde(default, deserialize_with = "lenient::feature_map")]
    pub features: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "lenient::property_map")]
    pub properties: BTreeMap<String, String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_number"
    )]
    pub score: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_number"
    )]
    pub target: Option<f64>,
}

mod lenient {
    use super::*;
    use serde::de::Error;

    fn number<E: Error>(value: &Value) -> std::result::Result<Option<f64>, E> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| E::custom(format!("number out of range: {n}"))),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| E::custom(format!("expected a finite number, got `{s}`"))),
            other => Err(E::custom(format!("expected a number, got {other}"))),
        }
    }

    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
        let value = Value::deserialize(d)?;
        number(&value)
    }

    pub fn feature_map<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<BTreeMap<String, f64>, D::Error> {
        let raw: Option<BTreeMap<String, Value>> = Option::deserialize(d)?;
        let mut out = BTreeMap::new();
        for (name, value) in raw.unwrap_or_default() {
            if let Some(v) = number(&value)? {
                out.insert(name, v);
            }
        }
        Ok(out)
    }

    pub fn property_map<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<BTreeMap<String, String>, D::Error> {
        let raw: Option<BTreeMap<String, Value>> = Option::deserialize(d)?;
        let mut out = BTreeMap::new();
        for (name, value) in raw.unwrap_or_default() {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(D::Error::custom(format!(
                        "property `{name}` must be a scalar, got {other}"
                    )))
                }
            };
            out.insert(name, text);
        }
        Ok(out)
    }
}
