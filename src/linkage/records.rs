//! Leverage-ratio characterization of a linkage.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One row of a linkage characterization: a shock position, the wheel travel
/// it produces and the leverage ratio of the segment starting there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkageRecord {
    pub shock_travel: f64,
    pub wheel_travel: f64,
    pub leverage_ratio: f64,
}

/// Derives the leverage-ratio curve from `(shock travel, wheel travel)` pairs.
///
/// Record `i` carries the forward-difference ratio of samples `i` and `i + 1`.
/// The last record repeats the ratio of the final segment. A single sample
/// has a ratio of `0.0`.
///
/// Equal consecutive shock travels divide by zero and yield an infinite or
/// NaN ratio; those are kept as is and logged.
pub fn leverage_records(shock: &[f64], wheel: &[f64]) -> Vec<LinkageRecord> {
    let n = shock.len().min(wheel.len());

    let ratios: Vec<f64> = (1..n)
        .map(|i| {
            let sdiff = shock[i] - shock[i - 1];
            let wdiff = wheel[i] - wheel[i - 1];
            if sdiff == 0.0 {
                warn!(
                    // Row 1 is the header.
                    row = i + 2,
                    shock_travel = shock[i],
                    "Repeated shock travel, leverage ratio is not finite"
                );
            }
            wdiff / sdiff
        })
        .collect();

    (0..n)
        .map(|i| LinkageRecord {
            shock_travel: shock[i],
            wheel_travel: wheel[i],
            leverage_ratio: ratios
                .get(i)
                .or_else(|| ratios.last())
                .copied()
                .unwrap_or_default(),
        })
        .collect()
}
