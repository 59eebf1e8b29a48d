//! Tab-separated source ingestion for rankdata
//!
//! Reads header-tagged, tab-separated sources where:
//! - the first column holds the instance id
//! - the remaining columns are named by the header
//! - quoting is disabled (a `"` is an ordinary character)
//!
//! The expected columns are a *set*: column order in the file is irrelevant,
//! only presence matters. A header naming a column twice is a mismatch too,
//! since a cell lookup by name would be ambiguous. A mismatch is reported
//! before any row is returned, so callers never observe a partially read
//! source.
//!
//! Every data row must have exactly as many cells as the header. A short or
//! long row fails the whole read with [`TsvError::Csv`] instead of being
//! padded or truncated.
//!
//! This crate knows nothing about instances; it hands back an owned table and
//! leaves the merge to `rankdata-core`.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum TsvError {
    #[error("failed to open `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed TSV in `{}`: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("`{}` has no header row", path.display())]
    EmptyHeader { path: PathBuf },

    #[error(
        "TSV header does not match params \"{}\" (found \"{}\") in file:\n\t{}",
        expected.join(","),
        actual.join(","),
        path.display()
    )]
    SchemaMismatch {
        path: PathBuf,
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

// ============================================================================
// Table representation
// ============================================================================

/// One data row. `values` is aligned with [`TsvTable::columns`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvRow {
    /// 1-based line number in the source (header is line 1).
    pub line: u64,
    pub id: String,
    pub values: Vec<String>,
}

/// A fully read source whose header has already been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvTable {
    pub path: PathBuf,
    /// Name of the first header cell (conventionally `id`).
    pub id_column: String,
    /// Non-id columns, in file order.
    pub columns: Vec<String>,
    pub rows: Vec<TsvRow>,
}

impl TsvTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup by column name.
    pub fn value<'a>(&self, row: &'a TsvRow, column: &str) -> Option<&'a str> {
        self.column_index(column)
            .and_then(|idx| row.values.get(idx))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Set-equality check between the expected columns and the non-id header cells.
pub fn header_matches<S: AsRef<str>>(expected: &[S], actual: &[String]) -> bool {
    let expected: BTreeSet<&str> = expected.iter().map(AsRef::as_ref).collect();
    let actual: BTreeSet<&str> = actual.iter().map(String::as_str).collect();
    expected == actual
}

/// Read and header-check a TSV file.
pub fn read_tsv<P, S>(path: P, expected: &[S]) -> Result<TsvTable, TsvError>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tsv(file, path, expected)
}

/// Parse TSV from any reader; `source` only labels errors and the table.
pub fn parse_tsv<R, S>(reader: R, source: &Path, expected: &[S]) -> Result<TsvTable, TsvError>
where
    R: Read,
    S: AsRef<str>,
{
    let csv_err = |err: csv::Error| TsvError::Csv {
        path: source.to_path_buf(),
        source: err,
    };

    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let header: StringRecord = rdr.headers().map_err(csv_err)?.clone();
    let Some(id_column) = header.get(0) else {
        return Err(TsvError::EmptyHeader {
            path: source.to_path_buf(),
        });
    };
    let id_column = id_column.to_string();
    let columns: Vec<String> = header.iter().skip(1).map(str::to_string).collect();

    let distinct: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
    if distinct.len() != columns.len() || !header_matches(expected, &columns) {
        return Err(TsvError::SchemaMismatch {
            path: source.to_path_buf(),
            expected: expected.iter().map(|s| s.as_ref().to_string()).collect(),
            actual: columns,
        });
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let mut cells = record.iter().map(str::to_string);
        let id = cells.next().unwrap_or_default();
        rows.push(TsvRow {
            line,
            id,
            values: cells.collect(),
        });
    }

    tracing::debug!(
        path = %source.display(),
        rows = rows.len(),
        columns = columns.len(),
        "read TSV source"
    );

    Ok(TsvTable {
        path: source.to_path_buf(),
        id_column,
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, expected: &[&str]) -> Result<TsvTable, TsvError> {
        parse_tsv(text.as_bytes(), Path::new("mem.tsv"), expected)
    }

    #[test]
    fn header_check_ignores_order() {
        let table = parse("id\tb\ta\n1\tx\ty\n", &["a", "b"]).unwrap();
        assert_eq!(table.columns, vec!["b", "a"]);
        assert_eq!(table.value(&table.rows[0], "a"), Some("y"));
        assert_eq!(table.value(&table.rows[0], "b"), Some("x"));
    }

    #[test]
    fn missing_column_is_schema_mismatch() {
        let err = parse("id\ta\n1\tx\n", &["a", "b"]).unwrap_err();
        match err {
            TsvError::SchemaMismatch {
                path,
                expected,
                actual,
            } => {
                assert_eq!(path, PathBuf::from("mem.tsv"));
                assert_eq!(expected, vec!["a", "b"]);
                assert_eq!(actual, vec!["a"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn extra_column_is_schema_mismatch() {
        let err = parse("id\ta\tb\tc\n", &["a", "b"]).unwrap_err();
        assert!(matches!(err, TsvError::SchemaMismatch { .. }));
    }

    #[test]
    fn duplicate_header_column_is_schema_mismatch() {
        let err = parse("id\ta\ta\n1\tx\ty\n", &["a"]).unwrap_err();
        match err {
            TsvError::SchemaMismatch { expected, actual, .. } => {
                assert_eq!(expected, vec!["a"]);
                assert_eq!(actual, vec!["a", "a"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn short_row_fails_the_read() {
        let err = parse("id\ta\tb\n1\tx\ty\n2\tx\n", &["a", "b"]).unwrap_err();
        assert!(matches!(err, TsvError::Csv { .. }));
    }

    #[test]
    fn quotes_are_literal() {
        let table = parse("id\tname\n7\t\"quoted\tcell\n", &["name"]);
        // A quote does not protect the tab, so the row has one cell too many.
        assert!(matches!(table, Err(TsvError::Csv { .. })));

        let table = parse("id\tname\n7\t\"quoted\"\n", &["name"]).unwrap();
        assert_eq!(table.rows[0].values[0], "\"quoted\"");
    }

    #[test]
    fn empty_source_has_no_header() {
        let err = parse("", &["a"]).unwrap_err();
        assert!(matches!(err, TsvError::EmptyHeader { .. }));
    }

    #[test]
    fn rows_keep_line_numbers() {
        let table = parse("id\tt\na\t1\nb\t0\n", &["t"]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].id, "a");
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[1].line, 3);
        assert_eq!(table.id_column, "id");
    }
}
