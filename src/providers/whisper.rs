use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use serde_json::Value;

use crate::provider::{ProviderError, ProviderKind, TranscriptProvider};
use crate::providers::upstream::UpstreamClient;
use crate::transcript::Transcript;

/// Speech-recognition service. Billed per call and slow, so it belongs at the
/// end of any chain.
pub struct WhisperProvider {
    upstream: UpstreamClient,
    upload_timeout: Option<Duration>,
}

impl WhisperProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            upstream: UpstreamClient::new(base_url)?,
            upload_timeout: None,
        })
    }

    /// Deadline for direct uploads. Chain lookups are bounded by the resolver.
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = Some(timeout);
        self
    }

    /// Sends an audio file straight to `{base}/transcribe/audio?language=` and returns
    /// the service's JSON answer untouched.
    pub async fn transcribe_upload(
        &self,
        audio: Vec<u8>,
        filename: String,
        language: &str,
    ) -> Result<Value, ProviderError> {
        info!(
            "Uploading {} bytes ({}) to whisper service",
            audio.len(),
            filename
        );
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(audio).file_name(filename),
        );

        let query = [("language", language)];
        let upload = self
            .upstream
            .post_multipart(&["transcribe", "audio"], &query, form);
        match self.upload_timeout {
            Some(limit) => tokio::time::timeout(limit, upload).await.unwrap_or_else(|_| {
                Err(ProviderError::Transient(format!(
                    "upload timed out after {}s",
                    limit.as_secs()
                )))
            }),
            None => upload.await,
        }
    }
}

#[async_trait]
impl TranscriptProvider for WhisperProvider {
    fn name(&self) -> &str {
        ProviderKind::Whisper.as_str()
    }

    async fn fetch(&self, video_id: &str, language: &str) -> Result<Transcript, ProviderError> {
        let mut transcript = self
            .upstream
            .get_transcript(
                &["transcribe"],
                &[("videoId", video_id), ("language", language)],
            )
            .await?
            .into_transcript(language)?;
        transcript.is_generated = true;
        Ok(transcript)
    }
}
