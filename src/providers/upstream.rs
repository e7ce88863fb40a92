use std::time::Duration;

use anyhow::{Result, anyhow};
use log::debug;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::provider::ProviderError;
use crate::transcript::{RawSegment, Transcript, normalize_segments};

/// Transcript body shared by the backend, captions and whisper services.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamTranscript {
    #[serde(default = "default_available")]
    pub available: bool,
    pub language: Option<String>,
    pub language_code: Option<String>,
    pub is_generated: Option<bool>,
    #[serde(default)]
    pub segments: Vec<UpstreamSegment>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpstreamSegment {
    pub start: f64,
    pub duration: Option<f64>,
    pub end: Option<f64>,
    #[serde(default)]
    pub text: String,
}

fn default_available() -> bool {
    true
}

impl UpstreamTranscript {
    /// Converts the body into a normalized transcript. `requested_language`
    /// fills in a missing language code. The `source` is left empty for the
    /// resolver to fill in.
    pub fn into_transcript(self, requested_language: &str) -> Result<Transcript, ProviderError> {
        if !self.available {
            return Err(ProviderError::Unavailable(
                self.message
                    .unwrap_or_else(|| "no transcript available".to_string()),
            ));
        }

        let raw = self
            .segments
            .into_iter()
            .map(|seg| RawSegment {
                start: seg.start,
                duration: seg.duration,
                end: seg.end,
                text: seg.text,
            })
            .collect();
        let segments = normalize_segments(raw);
        if segments.is_empty() {
            return Err(ProviderError::Unavailable(
                "transcript has no usable segments".to_string(),
            ));
        }

        let language_code = self
            .language_code
            .or_else(|| self.language.clone())
            .unwrap_or_else(|| requested_language.to_string());
        let language = self.language.unwrap_or_else(|| language_code.clone());

        Ok(Transcript {
            language,
            language_code,
            is_generated: self.is_generated.unwrap_or(false),
            segments,
            source: String::new(),
        })
    }
}

/// Maps a non-success status to the provider error taxonomy. Returns `None`
/// for 2xx.
pub fn classify_status(status: StatusCode, body: &str) -> Option<ProviderError> {
    if status.is_success() {
        return None;
    }

    let message = upstream_message(body).unwrap_or_else(|| format!("upstream returned {status}"));
    let error = match status {
        StatusCode::NOT_FOUND => ProviderError::Unavailable(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            ProviderError::Transient(message)
        }
        s if s.is_server_error() => ProviderError::Transient(format!("{status}: {message}")),
        _ => ProviderError::Invalid(format!("{status}: {message}")),
    };
    Some(error)
}

/// Pulls a human readable message out of an upstream error body. Knows the
/// `message`, `error` and FastAPI style `detail` shapes.
pub fn upstream_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let field = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);

    field(&value, "message")
        .or_else(|| match value.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(detail) => field(detail, "message"),
            None => None,
        })
        .or_else(|| field(&value, "error"))
}

fn transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Transient("request timed out".to_string())
    } else {
        ProviderError::Transient(format!("request failed: {error}"))
    }
}

/// Bounds connection setup only. Whole-call deadlines belong to the caller
/// (the resolver's per-slot or per-request timeout), so a longer request
/// timeout is never cut short here.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin reqwest wrapper bound to one upstream base URL.
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow!("Invalid upstream URL '{}': {}", base_url, e))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Upstream URL '{}' cannot be a base URL", base_url));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client, base_url })
    }

    /// Appends percent-encoded path segments to the base URL.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Invalid(format!("bad base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get_transcript(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<UpstreamTranscript, ProviderError> {
        let url = self.endpoint(segments)?;
        debug!("GET {url} {query:?}");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        let body = self.read_body(response).await?;

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::Invalid(format!("failed to parse transcript body: {e}")))
    }

    pub async fn post_multipart(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        form: reqwest::multipart::Form,
    ) -> Result<Value, ProviderError> {
        let url = self.endpoint(segments)?;
        debug!("POST {url} {query:?} (multipart)");

        let response = self
            .client
            .post(url)
            .query(query)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let body = self.read_body(response).await?;

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::Invalid(format!("failed to parse response body: {e}")))
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<String, ProviderError> {
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        match classify_status(status, &body) {
            Some(error) => Err(error),
            None => Ok(body),
        }
    }
}
