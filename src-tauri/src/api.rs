use crate::config::IndicatorConfig;
use crate::error::{ErrorEnvelope, FetchError};
use crate::state::PingResult;
use std::future::Future;
use std::time::Duration;
use wreq::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use wreq::{Client, ClientBuilder};

/// Path of the ping endpoint relative to the site base URL
pub const STATUS_PATH: &str = "/api/ping";

/// Anything that can answer "what is the server doing right now"
pub trait StatusSource: Send + Sync + 'static {
    fn fetch_status(&self) -> impl Future<Output = Result<PingResult, FetchError>> + Send;
}

/// Status source backed by the site's HTTP ping endpoint
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: Client,
    url: String,
}

impl HttpStatusSource {
    pub fn new(config: &IndicatorConfig) -> Result<Self, FetchError> {
        Self::with_base_url(&config.status_base_url, config.request_timeout())
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: status_url(base_url),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self) -> Result<PingResult, FetchError> {
        fetch_status_with_client(&self.client, &self.url).await
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("server-status-indicator/", env!("CARGO_PKG_VERSION"))),
    );

    ClientBuilder::new()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::Network(format!("Failed to build client: {}", e)))
}

fn status_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), STATUS_PATH)
}

/// Fetch status from a ping endpoint under a custom base URL (for testing)
#[doc(hidden)]
pub async fn fetch_status_with_base_url(base_url: &str) -> Result<PingResult, FetchError> {
    let client = build_client(Duration::from_secs(5))?;
    fetch_status_with_client(&client, &status_url(base_url)).await
}

async fn fetch_status_with_client(client: &Client, url: &str) -> Result<PingResult, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Network(format!("Failed to send request: {}", e)))?;

    let status = response.status();
    let response_text = response
        .text()
        .await
        .map_err(|e| FetchError::Network(format!("Failed to read response: {}", e)))?;

    // The endpoint reports ping failures in the body, whatever the HTTP status
    match parse_status_body(&response_text) {
        Err(FetchError::Parse(_)) if !status.is_success() => Err(FetchError::Http(status.as_u16())),
        other => other,
    }
}

/// Interpret a ping endpoint body: an `error` object means the ping failed,
/// anything else has to be a complete success payload.
pub fn parse_status_body(body: &str) -> Result<PingResult, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    if value.get("error").is_some_and(|e| !e.is_null()) {
        let envelope: ErrorEnvelope = serde_json::from_value(value)?;
        return Err(FetchError::from_upstream(
            envelope.error.code,
            envelope.error.message,
        ));
    }

    Ok(serde_json::from_value(value)?)
}
