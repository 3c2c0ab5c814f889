use super::types::{Airtime, Stroke, StrokeStat, Strokes, Suspension};
use std::cmp::Ordering;

/// Movements shorter than this (mm) are idling, not strokes.
pub const STROKE_LENGTH_THRESHOLD: f64 = 5.0;
/// Travel within this distance (mm) of max travel counts as bottoming out.
pub const BOTTOMOUT_THRESHOLD: f64 = 3.0;
/// Travel at or below this (mm) counts as topped out.
pub const TOPOUT_THRESHOLD: f64 = 3.0;
/// Shortest airtime, seconds.
pub const AIRTIME_THRESHOLD: f64 = 0.2;

/// Splits a travel trace into compressions and rebounds at every change of
/// velocity direction. Zero velocity continues the current direction, and
/// the turning sample belongs to both neighbouring strokes.
pub fn detect_strokes(suspension: &Suspension, max_travel: f64) -> Strokes {
    let len = suspension.travel.len().min(suspension.velocity.len());
    let mut strokes = Strokes::default();
    if len == 0 {
        return strokes;
    }

    let mut start = 0;
    let mut heading = Ordering::Equal;
    for i in 0..len {
        let d = suspension.velocity[i]
            .partial_cmp(&0.0)
            .unwrap_or(Ordering::Equal);
        if d == Ordering::Equal || d == heading {
            continue;
        }
        if heading != Ordering::Equal {
            push_stroke(&mut strokes, suspension, start, i - 1, max_travel);
            start = i - 1;
        }
        heading = d;
    }
    push_stroke(&mut strokes, suspension, start, len - 1, max_travel);

    strokes
}

fn push_stroke(
    strokes: &mut Strokes,
    suspension: &Suspension,
    start: usize,
    end: usize,
    max_travel: f64,
) {
    let travel = &suspension.travel[start..=end];
    let delta = travel[travel.len() - 1] - travel[0];
    if delta.abs() < STROKE_LENGTH_THRESHOLD {
        return;
    }

    let stroke = Stroke {
        start,
        end,
        stat: stroke_stat(travel, &suspension.velocity[start..=end], max_travel),
        digitized_travel: suspension.digitized_travel[start..=end].to_vec(),
        digitized_velocity: suspension.digitized_velocity[start..=end].to_vec(),
    };
    if delta > 0.0 {
        strokes.compressions.push(stroke);
    } else {
        strokes.rebounds.push(stroke);
    }
}

fn stroke_stat(travel: &[f64], velocity: &[f64], max_travel: f64) -> StrokeStat {
    let mut stat = StrokeStat {
        count: travel.len(),
        ..Default::default()
    };

    let mut bottomed = false;
    for (t, v) in travel.iter().zip(velocity) {
        stat.sum_travel += t;
        stat.max_travel = stat.max_travel.max(*t);
        stat.sum_velocity += v;
        if v.abs() > stat.max_velocity.abs() {
            stat.max_velocity = *v;
        }

        let bottom = *t >= max_travel - BOTTOMOUT_THRESHOLD;
        if bottom && !bottomed {
            stat.bottomouts += 1;
        }
        bottomed = bottom;
    }

    stat
}

/// Finds spans where every present end is topped out for at least
/// [`AIRTIME_THRESHOLD`] seconds, with ridden samples on both sides.
pub fn detect_airtimes(ends: &[&Suspension], sample_rate: u16) -> Vec<Airtime> {
    let present: Vec<&Suspension> = ends.iter().copied().filter(|s| s.present).collect();
    let Some(len) = present.iter().map(|s| s.travel.len()).min() else {
        return Vec::new();
    };

    let rate = f64::from(sample_rate);
    let topped = |i: usize| present.iter().all(|s| s.travel[i] <= TOPOUT_THRESHOLD);
    let mut airtimes = Vec::new();
    let mut i = 0;
    while i < len {
        if !topped(i) {
            i += 1;
            continue;
        }
        let start = i;
        while i < len && topped(i) {
            i += 1;
        }
        let bounded = start > 0 && i < len;
        if bounded && (i - start) as f64 / rate >= AIRTIME_THRESHOLD {
            airtimes.push(Airtime {
                start: start as f64 / rate,
                end: (i - 1) as f64 / rate,
            });
        }
    }

    airtimes
}
