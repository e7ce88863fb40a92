use anyhow::Result;
use async_trait::async_trait;

use crate::provider::{ProviderError, ProviderKind, TranscriptProvider};
use crate::providers::upstream::UpstreamClient;
use crate::transcript::Transcript;

/// First-party transcript store. Cheapest lookup, always tried first.
///
/// `GET {base}/transcripts/{videoId}?language={lang}`
pub struct BackendProvider {
    upstream: UpstreamClient,
}

impl BackendProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            upstream: UpstreamClient::new(base_url)?,
        })
    }
}

#[async_trait]
impl TranscriptProvider for BackendProvider {
    fn name(&self) -> &str {
        ProviderKind::Backend.as_str()
    }

    async fn fetch(&self, video_id: &str, language: &str) -> Result<Transcript, ProviderError> {
        self.upstream
            .get_transcript(&["transcripts", video_id], &[("language", language)])
            .await?
            .into_transcript(language)
    }
}
