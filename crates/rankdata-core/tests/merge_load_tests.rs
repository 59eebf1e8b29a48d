use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use rankdata_core::{InstanceCollection, InstanceError, SourceKind};
use rankdata_ingest_tsv::TsvError;
use tempfile::{tempdir, TempDir};

const FEATURES: [&str; 2] = ["sentence_length", "sentence_order"];

struct Sources {
    _dir: TempDir,
    properties: PathBuf,
    features: PathBuf,
    target: PathBuf,
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn sources() -> Sources {
    let dir = tempdir().unwrap();
    let properties = write(dir.path(), "props.tsv", "id\tsequence\n1\tAAB\n2\tABB\n3\tBBB\n");
    // Columns deliberately out of order relative to FEATURES.
    let features = write(
        dir.path(),
        "feats.tsv",
        "id\tsentence_order\tsentence_length\n3\t2\t40\n1\t0\t12\n2\t1\t25\n",
    );
    let target = write(dir.path(), "target.tsv", "id\ttarget\n2\t0\n1\t1\n3\t2\n");
    Sources {
        _dir: dir,
        properties,
        features,
        target,
    }
}

fn load(order: &[SourceKind], s: &Sources) -> InstanceCollection {
    let mut c = InstanceCollection::new();
    for kind in order {
        let loaded = match kind {
            SourceKind::Properties => c.add_properties_from_tsv(&s.properties, &["sequence"]),
            SourceKind::Features => c.add_features_from_tsv(&s.features, &FEATURES),
            SourceKind::Target => c.add_target_from_tsv(&s.target),
        };
        loaded.unwrap();
    }
    c
}

#[test]
fn three_sources_merge_into_one_instance_per_id() {
    let s = sources();
    let c = load(
        &[SourceKind::Properties, SourceKind::Features, SourceKind::Target],
        &s,
    );
    assert_eq!(c.len(), 3);

    let two = c.get("2").unwrap();
    assert_eq!(two.get_property("sequence"), Some("ABB"));
    assert_relative_eq!(two.get_feature("sentence_length").unwrap(), 25.0);
    assert_relative_eq!(two.get_feature("sentence_order").unwrap(), 1.0);
    assert_eq!(two.target(), Some(0.0));
}

#[test]
fn load_order_does_not_change_merged_state() {
    let s = sources();
    let reference = load(
        &[SourceKind::Properties, SourceKind::Features, SourceKind::Target],
        &s,
    );
    let orders = [
        [SourceKind::Target, SourceKind::Features, SourceKind::Properties],
        [SourceKind::Features, SourceKind::Properties, SourceKind::Target],
        [SourceKind::Target, SourceKind::Properties, SourceKind::Features],
    ];
    for order in orders {
        let other = load(&order, &s);
        assert_eq!(other.to_structured(), reference.to_structured(), "{order:?}");
    }
}

#[test]
fn later_loads_enrich_without_replacing() {
    let s = sources();
    let mut c = load(&[SourceKind::Properties, SourceKind::Features], &s);
    let extra = write(s._dir.path(), "extra.tsv", "id\tarticle_length\n1\t300\n4\t120\n");
    c.add_features_from_tsv(&extra, &["article_length"]).unwrap();

    let one = c.get("1").unwrap();
    assert_eq!(one.get_property("sequence"), Some("AAB"));
    assert_eq!(one.features().len(), 3);

    // New id from a feature-only source is created with no properties.
    let four = c.get("4").unwrap();
    assert!(four.properties().is_empty());
    assert_eq!(four.get_feature("article_length"), Some(120.0));
}

#[test]
fn header_missing_a_column_fails_before_mutation() {
    let s = sources();
    let mut c = load(&[SourceKind::Properties], &s);
    let before = c.to_structured();

    let bad = write(s._dir.path(), "bad.tsv", "id\tsentence_length\n1\t99\n");
    let err = c.add_features_from_tsv(&bad, &FEATURES).unwrap_err();
    match err {
        InstanceError::Source(TsvError::SchemaMismatch {
            path,
            expected,
            actual,
        }) => {
            assert_eq!(path, bad);
            assert_eq!(expected, FEATURES.to_vec());
            assert_eq!(actual, vec!["sentence_length"]);
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
    assert_eq!(c.to_structured(), before);
}

#[test]
fn load_delimited_reports_rows_merged() {
    let s = sources();
    let mut c = InstanceCollection::new();
    let rows = c
        .load_delimited(&s.target, SourceKind::Target, &["target"])
        .unwrap();
    assert_eq!(rows, 3);
    assert_eq!(c.ids().collect::<Vec<_>>(), vec!["2", "1", "3"]);
}
