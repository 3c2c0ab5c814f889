//! One import run: CSV exports in, uploaded session out.

use crate::calibration::create_calibrations;
use crate::config::ImportConfig;
use crate::fetch::HttpClient;
use crate::linkage::create_linkage;
use crate::loader::load_samples;
use crate::output::{print_summary, write_psst};
use crate::recording::{Meta, Telemetry, process_recording};
use crate::session::{Session, encode_psst, put_session};
use anyhow::{Context, Result};

/// Loads both exports and processes them into telemetry.
#[tracing::instrument(skip_all, fields(byb_file = %config.byb_file.display()))]
pub fn build_telemetry(config: &ImportConfig) -> Result<Telemetry> {
    let linkage = create_linkage(
        &config.leverage_file,
        config.head_angle,
        config.max_front_stroke,
        config.max_rear_stroke,
    )?;

    let (front_calibration, rear_calibration) =
        create_calibrations(&linkage).context("failed to prepare calibrations")?;

    let meta = Meta::new(config.session_name(), config.start);
    let (fork, shock) = load_samples(&config.byb_file)?;

    let telemetry = process_recording(
        &fork,
        &shock,
        meta,
        &linkage,
        &front_calibration,
        &rear_calibration,
    )
    .context("failed to process recording")?;
    print_summary(&telemetry);
    Ok(telemetry)
}

/// Encodes the telemetry into a [`Session`], writing the `.psst` bytes to
/// the configured output file if there is one.
pub fn build_session(config: &ImportConfig, telemetry: &Telemetry) -> Result<Session> {
    let psst = encode_psst(telemetry).context("failed to encode telemetry")?;
    if let Some(output) = &config.output {
        write_psst(output, &psst)?;
    }

    Ok(Session::new(
        config.session_name(),
        config.session_description(),
        &psst,
    ))
}

/// Runs the whole import and returns the id of the created session.
pub async fn run<C: HttpClient>(config: &ImportConfig, client: &C) -> Result<i64> {
    let telemetry = build_telemetry(config)?;
    let session = build_session(config, &telemetry)?;

    let id = put_session(client, &session, &config.api_url)
        .await
        .with_context(|| format!("failed to upload session to {}", config.api_url))?;
    Ok(id)
}
