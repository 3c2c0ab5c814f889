//! Telemetry record types, serialized with the PascalCase keys the
//! dashboard reads.

use crate::calibration::Calibration;
use crate::linkage::Linkage;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Session metadata stamped on every recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Meta {
    pub name: String,
    pub version: u8,
    pub sample_rate: u16,
    /// Session start, Unix seconds.
    pub timestamp: i64,
}

impl Meta {
    pub const VERSION: u8 = 1;
    pub const SAMPLE_RATE: u16 = 1000;

    pub fn new(name: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            version: Self::VERSION,
            sample_rate: Self::SAMPLE_RATE,
            timestamp: start.timestamp(),
        }
    }
}

/// Accumulated statistics of one stroke.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StrokeStat {
    pub sum_travel: f64,
    pub max_travel: f64,
    pub sum_velocity: f64,
    /// Largest speed in the stroke direction; negative for rebounds.
    pub max_velocity: f64,
    pub bottomouts: usize,
    pub count: usize,
}

/// A monotonic travel movement between two sample indices (inclusive).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stroke {
    pub start: usize,
    pub end: usize,
    pub stat: StrokeStat,
    pub digitized_travel: Vec<usize>,
    pub digitized_velocity: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Strokes {
    pub compressions: Vec<Stroke>,
    pub rebounds: Vec<Stroke>,
}

/// Processed data of one suspension end.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Suspension {
    pub present: bool,
    pub calibration: Calibration,
    /// Wheel travel per sample, mm.
    pub travel: Vec<f64>,
    /// Wheel velocity per sample, mm/s.
    pub velocity: Vec<f64>,
    pub strokes: Strokes,
    pub travel_bins: Vec<f64>,
    pub velocity_bins: Vec<f64>,
    pub digitized_travel: Vec<usize>,
    pub digitized_velocity: Vec<usize>,
}

/// A span where every present end sat topped out, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Airtime {
    pub start: f64,
    pub end: f64,
}

/// The processed recording uploaded as a session's raw data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Telemetry {
    pub name: String,
    pub version: u8,
    pub sample_rate: u16,
    pub timestamp: i64,
    pub front: Suspension,
    pub rear: Suspension,
    pub linkage: Linkage,
    pub airtimes: Vec<Airtime>,
}
