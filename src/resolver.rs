use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;

use crate::provider::{ProviderError, TranscriptProvider};
use crate::transcript::Transcript;

/// One position in the fallback chain.
#[derive(Clone)]
pub struct ProviderSlot {
    pub provider: Arc<dyn TranscriptProvider>,
    /// Upper bound for a single call to this provider.
    pub timeout: Option<Duration>,
}

impl ProviderSlot {
    pub fn new(provider: Arc<dyn TranscriptProvider>, timeout: Option<Duration>) -> Self {
        Self { provider, timeout }
    }
}

#[derive(Clone, Debug)]
pub struct TranscriptRequest {
    pub video_id: String,
    pub language: String,
    /// Overrides every slot's timeout for this request.
    pub timeout: Option<Duration>,
}

impl TranscriptRequest {
    pub fn new(video_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            language: language.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Unavailable,
    Transient,
    Invalid,
}

/// Record of a single provider call made while resolving a request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attempt {
    pub provider: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Attempt {
    fn success(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            outcome: Outcome::Success,
            message: None,
        }
    }

    fn failed(provider: &str, error: &ProviderError) -> Self {
        let (outcome, message) = match error {
            ProviderError::Unavailable(msg) => (Outcome::Unavailable, msg),
            ProviderError::Transient(msg) => (Outcome::Transient, msg),
            ProviderError::Invalid(msg) => (Outcome::Invalid, msg),
        };
        Self {
            provider: provider.to_string(),
            outcome,
            message: Some(message.clone()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Resolution {
    pub transcript: Transcript,
    pub attempts: Vec<Attempt>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("no provider could supply a transcript for {video_id} ({} attempts)", .attempts.len())]
    AllProvidersExhausted {
        video_id: String,
        attempts: Vec<Attempt>,
    },
}

/// Walks an ordered list of providers and returns the first transcript any
/// of them produces. Calls are strictly sequential and stop at the first
/// success, so later (more expensive) providers only run when every earlier
/// one failed.
#[derive(Clone)]
pub struct TranscriptResolver {
    slots: Arc<[ProviderSlot]>,
}

impl TranscriptResolver {
    pub fn new(slots: Vec<ProviderSlot>) -> Self {
        Self {
            slots: slots.into(),
        }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|slot| slot.provider.name().to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub async fn resolve(&self, request: &TranscriptRequest) -> Result<Resolution, ResolveError> {
        let video_id = request.video_id.trim();
        if video_id.is_empty() {
            return Err(ResolveError::InvalidRequest(
                "video id must not be empty".to_string(),
            ));
        }

        let mut attempts = Vec::with_capacity(self.slots.len());

        for slot in self.slots.iter() {
            let name = slot.provider.name();
            let limit = request.timeout.or(slot.timeout);
            debug!("Trying provider {name} for {video_id} (timeout: {limit:?})");

            let fetch = slot.provider.fetch(video_id, &request.language);
            let result = match limit {
                Some(limit) => match tokio::time::timeout(limit, fetch).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Transient(format!(
                        "timed out after {}ms",
                        limit.as_millis()
                    ))),
                },
                None => fetch.await,
            };

            let result = result.map(|mut transcript| {
                transcript.normalize();
                transcript
            });
            let error = match result {
                Ok(transcript) if transcript.segments.is_empty() => {
                    ProviderError::Unavailable("provider returned an empty transcript".to_string())
                }
                Ok(mut transcript) => {
                    transcript.source = name.to_string();
                    attempts.push(Attempt::success(name));
                    info!(
                        "Resolved {} via {}: {} segments, {:.1}s",
                        video_id,
                        name,
                        transcript.total_segments(),
                        transcript.total_duration()
                    );
                    return Ok(Resolution {
                        transcript,
                        attempts,
                    });
                }
                Err(error) => error,
            };

            if error.is_unavailable() {
                info!("Provider {name} has no transcript for {video_id}: {error}");
            } else {
                warn!("Provider {name} failed for {video_id}: {error}");
            }
            attempts.push(Attempt::failed(name, &error));
        }

        warn!(
            "All {} providers exhausted for {}",
            attempts.len(),
            video_id
        );
        Err(ResolveError::AllProvidersExhausted {
            video_id: video_id.to_string(),
            attempts,
        })
    }
}
