use serde::Serialize;

/// Tolerance used when checking `end == start + duration`.
pub const TIME_EPSILON: f64 = 1e-6;

/// A timestamped span of transcript text. Times are in seconds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Segment {
    pub start: f64,
    pub duration: f64,
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        let duration = duration.max(0.0);
        Self {
            start,
            duration,
            end: start + duration,
            text: text.into(),
        }
    }

    pub fn from_bounds(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self::new(start, end - start, text)
    }

    pub fn is_consistent(&self) -> bool {
        (self.start + self.duration - self.end).abs() <= TIME_EPSILON
    }
}

/// A segment as an upstream reported it, before normalization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSegment {
    pub start: f64,
    pub duration: Option<f64>,
    pub end: Option<f64>,
    pub text: String,
}

/// Keeps the segment's own `duration` and `end`, so normalizing it again
/// re-derives `end` from `start + duration`.
impl From<Segment> for RawSegment {
    fn from(seg: Segment) -> Self {
        Self {
            start: seg.start,
            duration: Some(seg.duration),
            end: Some(seg.end),
            text: seg.text,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transcript {
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub segments: Vec<Segment>,
    /// Name of the provider that produced this transcript.
    pub source: String,
}

impl Transcript {
    pub fn total_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn total_duration(&self) -> f64 {
        self.segments.last().map(|seg| seg.end).unwrap_or(0.0)
    }

    /// Re-applies [`normalize_segments`] to segments that may have been
    /// built by hand or by a provider that skipped normalization.
    pub fn normalize(&mut self) {
        let raw = std::mem::take(&mut self.segments)
            .into_iter()
            .map(RawSegment::from)
            .collect();
        self.segments = normalize_segments(raw);
    }
}

/// Sound annotations such as `[音楽]` or `[Music]` carry no speech.
fn is_annotation(text: &str) -> bool {
    text.starts_with('[') && text.ends_with(']')
}

/// Brings an upstream segment list into the common shape: trimmed text,
/// no empty or annotation-only entries, `end == start + duration`, ordered
/// by start time.
pub fn normalize_segments(raw: Vec<RawSegment>) -> Vec<Segment> {
    let mut segments: Vec<Segment> = raw
        .into_iter()
        .filter_map(|seg| {
            let text = seg.text.trim();
            if text.is_empty() || is_annotation(text) {
                return None;
            }
            let duration = match (seg.duration, seg.end) {
                (Some(duration), _) => duration,
                (None, Some(end)) => end - seg.start,
                (None, None) => 0.0,
            };
            Some(Segment::new(seg.start, duration, text))
        })
        .collect();

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    segments
}
