//! Semicolon-delimited CSV readers for BYB exports.

use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::{debug, warn};

/// Column holding the fork position in a BYB telemetry export.
pub const FORK_COLUMN: usize = 1;
/// Column holding the shock position in a BYB telemetry export.
pub const SHOCK_COLUMN: usize = 2;

/// Reads two numeric columns of a BYB CSV export into parallel vectors.
///
/// The first row is a header and is skipped. Rows keep file order. A field
/// that is not a number reads as `0.0` and is logged; a row too short to
/// hold both columns is an error.
pub fn read_column_pairs(
    path: impl AsRef<Path>,
    first: usize,
    second: usize,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut a = Vec::new();
    let mut b = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("failed to read {}", path.display()))?;
        // Row 1 is the header.
        let row = idx + 2;
        a.push(lenient_field(&record, first, row)?);
        b.push(lenient_field(&record, second, row)?);
    }

    debug!(path = %path.display(), rows = a.len(), "CSV loaded");
    Ok((a, b))
}

/// Loads the fork and shock position samples of a telemetry export.
#[tracing::instrument(skip_all, fields(file = %path.as_ref().display()))]
pub fn load_samples(path: impl AsRef<Path>) -> Result<(Vec<f64>, Vec<f64>)> {
    read_column_pairs(path, FORK_COLUMN, SHOCK_COLUMN)
}

fn lenient_field(record: &StringRecord, column: usize, row: usize) -> Result<f64> {
    let raw = record
        .get(column)
        .ok_or_else(|| anyhow!("row {row} has no column {column}"))?;
    Ok(raw.parse::<f64>().unwrap_or_else(|_| {
        warn!(row, column, value = raw, "Non-numeric field read as 0");
        0.0
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn write_temp(name: &str, content: &str) -> String {
        let path = format!("{}/{}", env::temp_dir().display(), name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_samples_skips_header_and_keeps_order() {
        let path = write_temp(
            "byb2psst_test_samples.csv",
            "time;fork;shock\n0;10.5;4\n1;11;3.5\n2;12;3\n",
        );

        let (fork, shock) = load_samples(&path).unwrap();

        assert_eq!(fork, vec![10.5, 11.0, 12.0]);
        assert_eq!(shock, vec![4.0, 3.5, 3.0]);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_non_numeric_field_reads_as_zero() {
        let path = write_temp(
            "byb2psst_test_lenient.csv",
            "time;fork;shock\n0;abc;4\n1;2;\n",
        );

        let (fork, shock) = load_samples(&path).unwrap();

        assert_eq!(fork, vec![0.0, 2.0]);
        assert_eq!(shock, vec![4.0, 0.0]);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let path = write_temp("byb2psst_test_header_only.csv", "time;fork;shock\n");

        let (fork, shock) = load_samples(&path).unwrap();

        assert!(fork.is_empty());
        assert!(shock.is_empty());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_short_rows_are_an_error() {
        let path = write_temp("byb2psst_test_short.csv", "time;fork\n0;1\n");

        let err = load_samples(&path).unwrap_err();

        assert!(err.to_string().contains("row 2"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_samples("/nonexistent/byb2psst.csv").is_err());
    }
}
