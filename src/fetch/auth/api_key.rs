use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects a static API token as an HTTP header.
///
/// The header name and value are validated once at construction, so a bad
/// token fails the run before any request is sent.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid header name '{header_name}'"))?;
        let mut key = HeaderValue::from_str(key).context("API token is not a valid header value")?;
        key.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    /// Uses the `X-Token` header expected by the GoSST session API.
    pub fn x_token(inner: C, token: &str) -> Result<Self> {
        Self::new(inner, "X-Token", token)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}
