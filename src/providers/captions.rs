use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::provider::{ProviderError, ProviderKind, TranscriptProvider};
use crate::providers::upstream::UpstreamClient;
use crate::transcript::Transcript;

/// Captions-extraction service. Prefers uploaded captions over auto-generated
/// ones on its side and reports `available: false` when the video has none.
pub struct CaptionsProvider {
    upstream: UpstreamClient,
}

impl CaptionsProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            upstream: UpstreamClient::new(base_url)?,
        })
    }
}

/// Compares primary language subtags, so `ja` matches `ja-JP`.
pub(crate) fn same_language(a: &str, b: &str) -> bool {
    let primary = |code: &str| code.split(['-', '_']).next().unwrap_or("").to_ascii_lowercase();
    primary(a) == primary(b)
}

#[async_trait]
impl TranscriptProvider for CaptionsProvider {
    fn name(&self) -> &str {
        ProviderKind::Captions.as_str()
    }

    async fn fetch(&self, video_id: &str, language: &str) -> Result<Transcript, ProviderError> {
        let transcript = self
            .upstream
            .get_transcript(
                &["get-japanese-transcript"],
                &[("videoId", video_id), ("language", language)],
            )
            .await?
            .into_transcript(language)?;

        if !same_language(&transcript.language_code, language) {
            debug!(
                "Captions for {} are in {}, wanted {}",
                video_id, transcript.language_code, language
            );
            return Err(ProviderError::Unavailable(format!(
                "captions only available in {}",
                transcript.language_code
            )));
        }

        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::same_language;

    #[test]
    fn language_match_uses_primary_subtag() {
        assert!(same_language("ja", "ja"));
        assert!(same_language("ja-JP", "ja"));
        assert!(same_language("EN_us", "en"));
        assert!(!same_language("en", "ja"));
    }
}
