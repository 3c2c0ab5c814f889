//! Run configuration resolved once from the command line.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Format accepted for the session start time, interpreted as UTC.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything one import run needs, with defaults already applied.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub byb_file: PathBuf,
    pub leverage_file: PathBuf,
    pub start: DateTime<Utc>,
    pub head_angle: f64,
    pub max_front_stroke: f64,
    pub max_rear_stroke: f64,
    pub api_url: String,
    pub token: String,
    pub output: Option<PathBuf>,
    pub timeout: Duration,
}

impl ImportConfig {
    /// Session name: the telemetry file name without its extension.
    pub fn session_name(&self) -> String {
        base_name(&self.byb_file)
    }

    pub fn session_description(&self) -> String {
        format!("imported from {}", self.byb_file.display())
    }
}

/// Parses a session start time, falling back to the current time when the
/// value is missing or does not match [`START_TIME_FORMAT`].
pub fn parse_start_time(value: Option<&str>) -> DateTime<Utc> {
    match value {
        None => Utc::now(),
        Some(raw) => match NaiveDateTime::parse_from_str(raw, START_TIME_FORMAT) {
            Ok(naive) => naive.and_utc(),
            Err(e) => {
                warn!(value = raw, error = %e, "Unparsable start time, using current time");
                Utc::now()
            }
        },
    }
}

/// File name of `path` with its last extension removed.
pub fn base_name(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Strips trailing slashes so endpoint paths can be appended.
pub fn normalize_api_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
