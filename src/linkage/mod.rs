//! Linkage characterization.
//!
//! A BYB leverage export lists shock travel against wheel travel. This module
//! turns it into [`LinkageRecord`]s carrying the leverage-ratio curve, then
//! processes them into a [`Linkage`] with the maximum wheel travel of each
//! end and a polynomial mapping shock travel to rear wheel travel.

pub mod polynomial;
pub mod records;

pub use records::{LinkageRecord, leverage_records};

use crate::loader::read_column_pairs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Column holding shock travel in a BYB leverage export.
pub const SHOCK_TRAVEL_COLUMN: usize = 1;
/// Column holding wheel travel in a BYB leverage export.
pub const WHEEL_TRAVEL_COLUMN: usize = 2;

/// Highest degree of the shock-to-wheel travel polynomial.
const SHOCK_WHEEL_DEGREE: usize = 3;

#[derive(Error, Debug, PartialEq)]
pub enum LinkageError {
    #[error("linkage has no records")]
    NoRecords,

    #[error("shock to wheel travel fit is singular ({records} records)")]
    SingularFit { records: usize },
}

/// Frame geometry shared by the front and rear calibrations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Linkage {
    pub name: String,
    pub head_angle: f64,
    pub max_front_stroke: f64,
    pub max_rear_stroke: f64,
    pub max_front_travel: f64,
    pub max_rear_travel: f64,
    /// `[wheel travel, leverage ratio]` pairs.
    pub leverage_ratio: Vec<[f64; 2]>,
    pub shock_wheel_coeffs: Vec<f64>,
    #[serde(skip)]
    pub records: Vec<LinkageRecord>,
}

impl Linkage {
    /// A linkage with only its static inputs set.
    pub fn new(
        name: impl Into<String>,
        head_angle: f64,
        max_front_stroke: f64,
        max_rear_stroke: f64,
    ) -> Self {
        Self {
            name: name.into(),
            head_angle,
            max_front_stroke,
            max_rear_stroke,
            ..Default::default()
        }
    }

    /// Derives the leverage curve, the shock-to-wheel polynomial and the
    /// maximum travels from `records`.
    ///
    /// The fit degree drops below cubic until the fit is solvable, which
    /// happens with few records or repeated shock travels.
    pub fn process(&mut self, records: Vec<LinkageRecord>) -> Result<(), LinkageError> {
        if records.is_empty() {
            return Err(LinkageError::NoRecords);
        }

        let shock: Vec<f64> = records.iter().map(|r| r.shock_travel).collect();
        let wheel: Vec<f64> = records.iter().map(|r| r.wheel_travel).collect();
        // Repeated shock travels leave fewer distinct points than coefficients.
        let max_degree = SHOCK_WHEEL_DEGREE.min(records.len() - 1);
        let coeffs = (0..=max_degree)
            .rev()
            .find_map(|degree| polynomial::fit(&shock, &wheel, degree))
            .ok_or(LinkageError::SingularFit {
                records: records.len(),
            })?;
        if coeffs.len() <= max_degree {
            debug!(degree = coeffs.len() - 1, max_degree, "Shock to wheel fit degree reduced");
        }

        self.leverage_ratio = records
            .iter()
            .map(|r| [r.wheel_travel, r.leverage_ratio])
            .collect();
        self.max_front_travel = self.head_angle.to_radians().sin() * self.max_front_stroke;
        self.max_rear_travel = polynomial::evaluate(&coeffs, self.max_rear_stroke);
        self.shock_wheel_coeffs = coeffs;
        self.records = records;
        Ok(())
    }

    /// Rear wheel travel produced by `shock_travel` millimetres of shock stroke.
    pub fn wheel_travel(&self, shock_travel: f64) -> f64 {
        polynomial::evaluate(&self.shock_wheel_coeffs, shock_travel)
    }
}

/// Reads a BYB leverage export and returns the processed [`Linkage`].
///
/// The linkage is named after the file, without its extension.
#[tracing::instrument(skip(path), fields(file = %path.as_ref().display()))]
pub fn create_linkage(
    path: impl AsRef<Path>,
    head_angle: f64,
    max_front_stroke: f64,
    max_rear_stroke: f64,
) -> Result<Linkage> {
    let path = path.as_ref();
    let (shock, wheel) = read_column_pairs(path, SHOCK_TRAVEL_COLUMN, WHEEL_TRAVEL_COLUMN)?;

    let mut linkage = Linkage::new(
        crate::config::base_name(path),
        head_angle,
        max_front_stroke,
        max_rear_stroke,
    );
    linkage
        .process(leverage_records(&shock, &wheel))
        .with_context(|| format!("failed to process linkage {}", path.display()))?;

    debug!(
        name = %linkage.name,
        records = linkage.records.len(),
        max_front_travel = linkage.max_front_travel,
        max_rear_travel = linkage.max_rear_travel,
        "Linkage processed"
    );
    Ok(linkage)
}
