use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use byb2psst::calibration::create_calibrations;
use byb2psst::config::{DEFAULT_API_URL, ImportConfig, parse_start_time};
use byb2psst::fetch::HttpClient;
use byb2psst::linkage::create_linkage;
use byb2psst::pipeline::{build_session, build_telemetry, run};
use byb2psst::session::UploadError;
use std::path::PathBuf;
use std::time::Duration;

const RIDE: &str = "tests/fixtures/ride_fixture.csv";
const FRAME: &str = "tests/fixtures/frame_fixture.csv";

fn config() -> ImportConfig {
    ImportConfig {
        byb_file: PathBuf::from(RIDE),
        leverage_file: PathBuf::from(FRAME),
        start: parse_start_time(Some("2023-06-01 09:30:00")),
        head_angle: 65.0,
        max_front_stroke: 160.0,
        max_rear_stroke: 60.0,
        api_url: DEFAULT_API_URL.to_string(),
        token: "token".to_string(),
        output: None,
        timeout: Duration::from_secs(5),
    }
}

struct CannedApi(&'static str);

#[async_trait]
impl HttpClient for CannedApi {
    async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        Ok(http::Response::new(self.0).into())
    }
}

#[test]
fn test_linkage_and_calibrations_from_fixture() {
    let linkage = create_linkage(FRAME, 65.0, 160.0, 60.0).expect("Failed to build linkage");

    assert_eq!(linkage.name, "frame_fixture");
    assert_eq!(linkage.records.len(), 13);
    assert_eq!(linkage.records[0].leverage_ratio, 2.95);
    assert_eq!(linkage.records[1].leverage_ratio, 2.85);
    assert_eq!(linkage.records[11].leverage_ratio, 1.85);
    assert_eq!(linkage.records[12].leverage_ratio, 1.85);
    assert!((linkage.max_rear_travel - 144.0).abs() < 1e-6);
    assert!((linkage.max_front_travel - 160.0 * 65f64.to_radians().sin()).abs() < 1e-9);

    let (front, rear) = create_calibrations(&linkage).expect("Failed to prepare calibrations");
    assert_eq!(front.intermediate("factor"), Some(1.6));
    assert_eq!(rear.intermediate("factor"), Some(0.6));
}

#[test]
fn test_full_pipeline() {
    let telemetry = build_telemetry(&config()).expect("Failed to build telemetry");

    assert_eq!(telemetry.name, "ride_fixture");
    assert_eq!(telemetry.sample_rate, 1000);
    assert_eq!(telemetry.timestamp, 1685611800);
    assert!(telemetry.front.present);
    assert!(telemetry.rear.present);
    assert_eq!(telemetry.front.travel.len(), 1200);
    assert_eq!(telemetry.rear.velocity.len(), 1200);
    assert!(!telemetry.front.strokes.compressions.is_empty());
    assert!(!telemetry.rear.strokes.rebounds.is_empty());
    assert_eq!(telemetry.airtimes.len(), 1);
    assert_eq!(telemetry.airtimes[0].start, 0.3);
    assert_eq!(telemetry.airtimes[0].end, 0.599);
}

#[test]
fn test_session_payload_decodes() {
    let config = config();
    let telemetry = build_telemetry(&config).unwrap();

    let session = build_session(&config, &telemetry).unwrap();

    assert_eq!(session.name, "ride_fixture");
    assert_eq!(session.description, format!("imported from {RIDE}"));
    let psst = general_purpose::STANDARD.decode(&session.raw_data).unwrap();
    let decoded: serde_json::Value = rmp_serde::from_slice(&psst).unwrap();
    assert_eq!(decoded["Name"], "ride_fixture");
    assert_eq!(decoded["SampleRate"], 1000);
    assert_eq!(decoded["Front"]["Present"], true);
    assert_eq!(decoded["Front"]["Calibration"]["Method"]["Name"], "percentage");
    assert_eq!(decoded["Linkage"]["Name"], "frame_fixture");
}

#[test]
fn test_session_is_written_to_output() {
    let output = std::env::temp_dir().join("byb2psst_integration.psst");
    let _ = std::fs::remove_file(&output);
    let config = ImportConfig {
        output: Some(output.clone()),
        ..config()
    };
    let telemetry = build_telemetry(&config).unwrap();

    let session = build_session(&config, &telemetry).unwrap();

    let written = std::fs::read(&output).unwrap();
    assert_eq!(general_purpose::STANDARD.encode(&written), session.raw_data);
    std::fs::remove_file(&output).unwrap();
}

#[tokio::test]
async fn test_run_uploads_session() {
    let id = run(&config(), &CannedApi(r#"{"id": 5, "error": ""}"#))
        .await
        .unwrap();

    assert_eq!(id, 5);
}

#[tokio::test]
async fn test_run_reports_api_error() {
    let err = run(&config(), &CannedApi(r#"{"id": 0, "error": "duplicate session"}"#))
        .await
        .unwrap_err();

    let api = err.downcast_ref::<UploadError>().unwrap();
    assert!(matches!(api, UploadError::Api(m) if m == "duplicate session"));
}

#[test]
fn test_missing_leverage_file_fails() {
    let config = ImportConfig {
        leverage_file: PathBuf::from("tests/fixtures/missing.csv"),
        ..config()
    };

    assert!(build_telemetry(&config).is_err());
}
