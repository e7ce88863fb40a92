use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::transcript::Transcript;

/// Something that can answer a transcript request for a video id.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Stable name, recorded as the transcript `source` on success.
    fn name(&self) -> &str;

    async fn fetch(&self, video_id: &str, language: &str) -> Result<Transcript, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// The provider has no transcript for this id. Expected, not a fault.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// Timeout, connection failure or a 5xx answer.
    #[error("transient failure: {0}")]
    Transient(String),
    /// The provider answered with something we could not use.
    #[error("invalid response: {0}")]
    Invalid(String),
}

impl ProviderError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ProviderError::Unavailable(_))
    }
}

/// The closed set of upstream services a chain can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Backend,
    Captions,
    Whisper,
}

impl ProviderKind {
    pub const DEFAULT_ORDER: [ProviderKind; 3] = [
        ProviderKind::Backend,
        ProviderKind::Captions,
        ProviderKind::Whisper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Backend => "backend",
            ProviderKind::Captions => "captions",
            ProviderKind::Whisper => "whisper",
        }
    }

    /// Relative cost of one call. Chains must be ordered by ascending rank.
    pub fn cost_rank(&self) -> u8 {
        match self {
            ProviderKind::Backend => 0,
            ProviderKind::Captions => 1,
            ProviderKind::Whisper => 2,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backend" | "cache" => Ok(ProviderKind::Backend),
            "captions" => Ok(ProviderKind::Captions),
            "whisper" => Ok(ProviderKind::Whisper),
            other => Err(format!("Unknown transcript provider: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names() {
        assert_eq!("backend".parse(), Ok(ProviderKind::Backend));
        assert_eq!(" Cache ".parse(), Ok(ProviderKind::Backend));
        assert_eq!("WHISPER".parse(), Ok(ProviderKind::Whisper));
        assert!("youtube".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn default_order_is_cost_ascending() {
        let ranks: Vec<u8> = ProviderKind::DEFAULT_ORDER
            .iter()
            .map(ProviderKind::cost_rank)
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }
}
