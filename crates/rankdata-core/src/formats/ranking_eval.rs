//! TREC-style run files: `qid\tQ0\tdocid\trank\tscore\trun_tag`.
//!
//! - Only scored instances take part.
//! - A (qid, docid) pair seen more than once keeps its highest score.
//! - Queries are emitted in ascending qid order; documents by descending
//!   score, ties broken by ascending docid.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use ahash::AHashMap;

use crate::error::{InstanceError, Result};
use crate::InstanceCollection;

/// One ranked (query, document) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub qid: String,
    pub docid: String,
    pub rank: usize,
    pub score: f64,
}

impl RankedEntry {
    pub fn display<'a>(&'a self, run_tag: &'a str) -> impl fmt::Display + 'a {
        EvalLine { entry: self, run_tag }
    }
}

struct EvalLine<'a> {
    entry: &'a RankedEntry,
    run_tag: &'a str,
}

impl fmt::Display for EvalLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\tQ0\t{}\t{}\t{:.5}\t{}",
            self.entry.qid, self.entry.docid, self.entry.rank, self.entry.score, self.run_tag
        )
    }
}

impl InstanceCollection {
    /// Deduplicated, ranked entries grouped by `qid_property`.
    pub fn ranking_eval_entries(&self, qid_property: &str, docid_property: &str) -> Vec<RankedEntry> {
        let mut best: BTreeMap<&str, AHashMap<&str, f64>> = BTreeMap::new();
        for instance in self.iter() {
            let Some(score) = instance.score() else {
                continue;
            };
            let (Some(qid), Some(docid)) = (
                instance.get_property(qid_property),
                instance.get_property(docid_property),
            ) else {
                tracing::warn!(
                    id = instance.id(),
                    qid_property,
                    docid_property,
                    "scored instance lacks qid or docid; skipped from run"
                );
                continue;
            };
            let slot = best.entry(qid).or_default().entry(docid).or_insert(score);
            if score > *slot {
                *slot = score;
            }
        }

        let mut entries = Vec::new();
        for (qid, docs) in best {
            let mut docs: Vec<(&str, f64)> = docs.into_iter().collect();
            docs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            for (i, (docid, score)) in docs.into_iter().enumerate() {
                entries.push(RankedEntry {
                    qid: qid.to_string(),
                    docid: docid.to_string(),
                    rank: i + 1,
                    score,
                });
            }
        }
        entries
    }

    pub fn ranking_eval_string(&self, qid_property: &str, docid_property: &str) -> String {
        let run_tag = self.config().run_tag.as_str();
        let mut out = String::new();
        for entry in self.ranking_eval_entries(qid_property, docid_property) {
            out.push_str(&entry.display(run_tag).to_string());
            out.push('\n');
        }
        out
    }

    /// Write the run file; returns the number of ranked lines.
    pub fn write_ranking_eval<P: AsRef<Path>>(
        &self,
        path: P,
        qid_property: &str,
        docid_property: &str,
    ) -> Result<usize> {
        let path = path.as_ref();
        let text = self.ranking_eval_string(qid_property, docid_property);
        fs::write(path, &text).map_err(|e| InstanceError::io(path, e))?;
        let lines = text.lines().count();
        tracing::info!(path = %path.display(), lines, "trec-eval output");
        Ok(lines)
    }
}
