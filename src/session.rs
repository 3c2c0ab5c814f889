//! Session payload and upload to the GoSST HTTP API.

use crate::fetch::HttpClient;
use crate::recording::Telemetry;
use base64::{Engine as _, engine::general_purpose};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("invalid API URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("upload request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unreadable API response: {0}")]
    Decode(#[source] reqwest::Error),

    /// Reported by the API itself; displays exactly the server's message.
    #[error("{0}")]
    Api(String),
}

/// Body of the `PUT /session/psst` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub name: String,
    pub description: String,
    /// Base64 of the MessagePack-encoded telemetry.
    #[serde(rename = "data")]
    pub raw_data: String,
}

impl Session {
    pub fn new(name: impl Into<String>, description: impl Into<String>, psst: &[u8]) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            raw_data: general_purpose::STANDARD.encode(psst),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

/// Encodes telemetry as a MessagePack map with named fields.
pub fn encode_psst(telemetry: &Telemetry) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::to_vec_named(telemetry)
}

/// Uploads `session` with a single `PUT {api_url}/session/psst` and returns
/// the id the API assigned.
///
/// Authentication is the caller's concern, usually an
/// [`ApiKey`](crate::fetch::auth::ApiKey) wrapped around `client`.
#[tracing::instrument(skip_all, fields(name = %session.name, api_url = %api_url))]
pub async fn put_session<C: HttpClient>(
    client: &C,
    session: &Session,
    api_url: &str,
) -> Result<i64, UploadError> {
    let endpoint = format!("{}/session/psst", api_url.trim_end_matches('/'));
    let url = reqwest::Url::parse(&endpoint).map_err(|e| UploadError::InvalidUrl {
        url: endpoint.clone(),
        message: e.to_string(),
    })?;

    let mut req = reqwest::Request::new(reqwest::Method::PUT, url);
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *req.body_mut() = Some(serde_json::to_vec(session)?.into());

    let resp = client.execute(req).await?;
    let status = resp.status();
    debug!(%status, "Session API responded");

    let body: ApiResponse = resp.json().await.map_err(UploadError::Decode)?;
    if let Some(error) = body.error.filter(|e| !e.is_empty()) {
        return Err(UploadError::Api(error));
    }

    let id = body.id.unwrap_or_default();
    info!(id, "Session uploaded");
    Ok(id)
}
