//! CLI entry point: imports a BYB telemetry export into GoSST.
//!
//! Reads the telemetry and leverage CSVs, builds the linkage and the
//! percentage calibrations, processes the recording and uploads it as a
//! PSST session.

use anyhow::Result;
use byb2psst::config::{
    DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, ImportConfig, normalize_api_url, parse_start_time,
};
use byb2psst::fetch::{BasicClient, auth::ApiKey};
use byb2psst::pipeline;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser, Debug)]
#[command(name = "byb2psst")]
#[command(about = "Import a BYB telemetry export into GoSST", long_about = None)]
struct Cli {
    /// BYB CSV data file
    #[arg(short = 'b', long = "bybfile")]
    byb_file: PathBuf,

    /// Session start time in UTC (YYYY-MM-DD HH:mm:ss)
    #[arg(short = 'd', long = "datetime")]
    time: Option<String>,

    /// BYB leverage file
    #[arg(short = 'l', long = "leverage")]
    leverage_file: PathBuf,

    /// Head tube angle (deg)
    #[arg(short = 'a', long = "headangle")]
    head_angle: f64,

    /// Maximum front stroke (mm)
    #[arg(short = 'f', long = "frontstroke")]
    max_front_stroke: f64,

    /// Maximum rear stroke (mm)
    #[arg(short = 'r', long = "rearstroke")]
    max_rear_stroke: f64,

    /// GoSST HTTP API URL
    #[arg(short = 'g', long = "gosstapi", env = "GOSST_API", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// GoSST HTTP API token
    #[arg(short = 't', long = "token", env = "GOSST_TOKEN", hide_env_values = true)]
    token: String,

    /// Also write the encoded PSST file here
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Upload timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
}

impl Cli {
    fn into_config(self) -> ImportConfig {
        ImportConfig {
            start: parse_start_time(self.time.as_deref()),
            byb_file: self.byb_file,
            leverage_file: self.leverage_file,
            head_angle: self.head_angle,
            max_front_stroke: self.max_front_stroke,
            max_rear_stroke: self.max_rear_stroke,
            api_url: normalize_api_url(&self.api_url),
            token: self.token,
            output: self.output,
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: quiet stderr + optional JSON rolling log file
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")));

    let mut _file_guard = None;
    let json_layer = std::env::var("LOG_FILE_PATH").ok().map(|log_file_path| {
        let path = Path::new(&log_file_path);
        let log_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let log_file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "byb2psst.log".into());

        let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
        _file_guard = Some(guard);

        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking_file)
            .with_filter(
                EnvFilter::try_from_env("RUST_LOG_JSON")
                    .unwrap_or_else(|_| EnvFilter::new("debug")),
            )
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let config = Cli::parse().into_config();
    info!(
        byb_file = %config.byb_file.display(),
        leverage_file = %config.leverage_file.display(),
        start = %config.start,
        api_url = %config.api_url,
        "Starting import"
    );

    let client = ApiKey::x_token(BasicClient::with_timeout(config.timeout)?, &config.token)?;
    match pipeline::run(&config, &client).await {
        Ok(id) => {
            info!(id, "Import finished");
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Import failed");
            Err(e)
        }
    }
}
