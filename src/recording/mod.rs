//! Recording processor.
//!
//! Converts raw fork and shock samples into wheel travel and velocity using
//! the prepared calibrations and the processed linkage, then annotates the
//! traces with histograms, strokes and airtimes.

pub mod histogram;
pub mod strokes;
pub mod types;

pub use types::{Airtime, Meta, Stroke, StrokeStat, Strokes, Suspension, Telemetry};

use crate::calibration::{Calibration, CalibrationError};
use crate::linkage::Linkage;
use histogram::Bins;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("fork and shock sample counts differ ({front} vs {rear})")]
    LengthMismatch { front: usize, rear: usize },

    #[error("recording has no samples")]
    Empty,

    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

/// Builds the [`Telemetry`] record of one session.
///
/// An end whose samples are all zero is marked absent and carries no traces.
#[tracing::instrument(skip_all, fields(name = %meta.name, samples = front.len()))]
pub fn process_recording(
    front: &[f64],
    rear: &[f64],
    meta: Meta,
    linkage: &Linkage,
    front_calibration: &Calibration,
    rear_calibration: &Calibration,
) -> Result<Telemetry, RecordingError> {
    if front.len() != rear.len() {
        return Err(RecordingError::LengthMismatch {
            front: front.len(),
            rear: rear.len(),
        });
    }
    if front.is_empty() {
        return Err(RecordingError::Empty);
    }

    let rate = f64::from(meta.sample_rate);
    let head = linkage.head_angle.to_radians().sin();

    let mut front_end = process_end(
        front,
        front_calibration,
        linkage.max_front_stroke,
        linkage.max_front_travel,
        rate,
        |stroke| stroke * head,
    )?;
    let mut rear_end = process_end(
        rear,
        rear_calibration,
        linkage.max_rear_stroke,
        linkage.max_rear_travel,
        rate,
        |stroke| linkage.wheel_travel(stroke),
    )?;

    front_end.strokes = strokes::detect_strokes(&front_end, linkage.max_front_travel);
    rear_end.strokes = strokes::detect_strokes(&rear_end, linkage.max_rear_travel);
    let airtimes = strokes::detect_airtimes(&[&front_end, &rear_end], meta.sample_rate);

    debug!(
        front_present = front_end.present,
        rear_present = rear_end.present,
        front_compressions = front_end.strokes.compressions.len(),
        rear_compressions = rear_end.strokes.compressions.len(),
        airtimes = airtimes.len(),
        "Recording processed"
    );

    Ok(Telemetry {
        name: meta.name,
        version: meta.version,
        sample_rate: meta.sample_rate,
        timestamp: meta.timestamp,
        front: front_end,
        rear: rear_end,
        linkage: linkage.clone(),
        airtimes,
    })
}

fn process_end(
    samples: &[f64],
    calibration: &Calibration,
    max_stroke: f64,
    max_travel: f64,
    rate: f64,
    to_wheel: impl Fn(f64) -> f64,
) -> Result<Suspension, CalibrationError> {
    let present = samples.iter().any(|s| *s != 0.0);
    let mut end = Suspension {
        present,
        calibration: calibration.clone(),
        travel: Vec::new(),
        velocity: Vec::new(),
        strokes: Strokes::default(),
        travel_bins: Vec::new(),
        velocity_bins: Vec::new(),
        digitized_travel: Vec::new(),
        digitized_velocity: Vec::new(),
    };
    if !present {
        return Ok(end);
    }

    let mut evaluator = calibration.evaluator()?;
    end.travel = samples
        .iter()
        .map(|s| -> Result<f64, CalibrationError> {
            let stroke = bound(evaluator.evaluate(*s)?, max_stroke);
            Ok(bound(to_wheel(stroke), max_travel))
        })
        .collect::<Result<_, _>>()?;
    end.velocity = gradient(&end.travel, rate);

    let travel_bins = Bins::travel(max_travel);
    let velocity_bins = Bins::velocity(&end.velocity);
    end.digitized_travel = travel_bins.digitize(&end.travel);
    end.digitized_velocity = velocity_bins.digitize(&end.velocity);
    end.travel_bins = travel_bins.edges;
    end.velocity_bins = velocity_bins.edges;
    Ok(end)
}

/// Limits `value` to `0..=max` without panicking on odd bounds.
fn bound(value: f64, max: f64) -> f64 {
    value.max(0.0).min(max)
}

/// Per-sample derivative of `values` scaled by `rate`: central differences
/// inside, one-sided differences at both ends.
pub fn gradient(values: &[f64], rate: f64) -> Vec<f64> {
    let n = values.len();
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n)
            .map(|i| match i {
                0 => (values[1] - values[0]) * rate,
                i if i == n - 1 => (values[i] - values[i - 1]) * rate,
                i => (values[i + 1] - values[i - 1]) / 2.0 * rate,
            })
            .collect(),
    }
}
