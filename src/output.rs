//! Local persistence and logging of processed recordings.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::recording::Telemetry;
use std::fs;
use std::path::Path;

/// Logs a one-line summary of each suspension end.
pub fn print_summary(telemetry: &Telemetry) {
    for (end, suspension) in [("front", &telemetry.front), ("rear", &telemetry.rear)] {
        debug!(
            end,
            present = suspension.present,
            samples = suspension.travel.len(),
            compressions = suspension.strokes.compressions.len(),
            rebounds = suspension.strokes.rebounds.len(),
            "Suspension summary"
        );
    }
}

/// Writes encoded telemetry to a `.psst` file, creating parent directories.
pub fn write_psst(path: impl AsRef<Path>, psst: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    fs::write(path, psst).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = psst.len(), "PSST file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_write_psst_creates_file() {
        let path = temp_path("byb2psst_test_write.psst");
        let _ = fs::remove_file(&path);

        write_psst(&path, b"\x80").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"\x80");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_psst_creates_parent_directories() {
        let dir = temp_path("byb2psst_test_nested");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("data").join("ride.psst");

        write_psst(&path, b"\x80").unwrap();

        assert!(path.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_psst_overwrites() {
        let path = temp_path("byb2psst_test_overwrite.psst");
        write_psst(&path, b"first").unwrap();
        write_psst(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        fs::remove_file(&path).unwrap();
    }
}
