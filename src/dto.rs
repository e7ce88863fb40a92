use serde::{Deserialize, Serialize};

use crate::resolver::{Attempt, Resolution};
use crate::transcript::Segment;
use crate::video_id::extract_video_id;

/// Transcript lookup parameters, from the query string or a JSON body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptQuery {
    pub video_id: Option<String>,
    pub url: Option<String>,
    pub language: Option<String>,
}

impl TranscriptQuery {
    /// `videoId` is taken as given; `url` has to contain a recognisable id.
    pub fn resolve_video_id(&self) -> Option<String> {
        let explicit = self
            .video_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        explicit.or_else(|| self.url.as_deref().and_then(extract_video_id))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptDto {
    pub available: bool,
    pub video_id: String,
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub segments: Vec<Segment>,
    pub total_segments: usize,
    pub total_duration: f64,
    pub source: String,
    pub attempts: Vec<Attempt>,
}

impl TranscriptDto {
    pub fn new(video_id: String, resolution: Resolution) -> Self {
        let Resolution {
            transcript,
            attempts,
        } = resolution;
        Self {
            available: true,
            video_id,
            total_segments: transcript.total_segments(),
            total_duration: transcript.total_duration(),
            language: transcript.language,
            language_code: transcript.language_code,
            is_generated: transcript.is_generated,
            segments: transcript.segments,
            source: transcript.source,
            attempts,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDto {
    pub available: bool,
    pub video_id: String,
    pub message: String,
    pub attempts: Vec<Attempt>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDto {
    pub error: String,
    pub message: String,
}

impl ErrorDto {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Transcript;

    #[test]
    fn explicit_video_id_wins_over_url() {
        let query = TranscriptQuery {
            video_id: Some(" ABC123 ".into()),
            url: Some("https://youtu.be/dQw4w9WgXcQ".into()),
            language: None,
        };
        assert_eq!(query.resolve_video_id().as_deref(), Some("ABC123"));
    }

    #[test]
    fn falls_back_to_url() {
        let query = TranscriptQuery {
            video_id: Some("".into()),
            url: Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".into()),
            language: None,
        };
        assert_eq!(query.resolve_video_id().as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(TranscriptQuery::default().resolve_video_id(), None);
    }

    #[test]
    fn serializes_in_camel_case() {
        let resolution = Resolution {
            transcript: Transcript {
                language: "Japanese".into(),
                language_code: "ja".into(),
                is_generated: true,
                segments: vec![Segment::new(0.0, 2.0, "テスト")],
                source: "whisper".into(),
            },
            attempts: Vec::new(),
        };
        let json = serde_json::to_value(TranscriptDto::new("abc".into(), resolution)).unwrap();
        assert_eq!(json["videoId"], "abc");
        assert_eq!(json["languageCode"], "ja");
        assert_eq!(json["isGenerated"], true);
        assert_eq!(json["totalSegments"], 1);
        assert_eq!(json["totalDuration"], 2.0);
        assert_eq!(json["segments"][0]["end"], 2.0);
    }
}
