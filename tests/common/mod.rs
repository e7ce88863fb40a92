#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use transcript_relay::provider::{ProviderError, TranscriptProvider};
use transcript_relay::resolver::{ProviderSlot, TranscriptResolver};
use transcript_relay::transcript::{Segment, Transcript};

/// Shared record of every provider call, in call order.
pub type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Clone, Debug)]
pub enum Behavior {
    Segments(Vec<Segment>),
    Empty,
    Unavailable,
    Transient,
    Invalid,
    Hang(Duration),
}

pub struct MockProvider {
    name: String,
    behavior: Behavior,
    calls: AtomicUsize,
    journal: Journal,
}

impl MockProvider {
    pub fn new(name: &str, behavior: Behavior, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
            journal: journal.clone(),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn transcript(&self, language: &str, segments: Vec<Segment>) -> Transcript {
        Transcript {
            language: language.to_string(),
            language_code: language.to_string(),
            is_generated: false,
            segments,
            source: "set-by-resolver".to_string(),
        }
    }
}

#[async_trait]
impl TranscriptProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, video_id: &str, language: &str) -> Result<Transcript, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}:{}", self.name, video_id, language));

        match &self.behavior {
            Behavior::Segments(segments) => Ok(self.transcript(language, segments.clone())),
            Behavior::Empty => Ok(self.transcript(language, Vec::new())),
            Behavior::Unavailable => Err(ProviderError::Unavailable("no captions".to_string())),
            Behavior::Transient => Err(ProviderError::Transient("503 Service Unavailable".to_string())),
            Behavior::Invalid => Err(ProviderError::Invalid("unexpected body".to_string())),
            Behavior::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(self.transcript(language, sample_segments(1)))
            }
        }
    }
}

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

pub fn sample_segments(count: usize) -> Vec<Segment> {
    (0..count)
        .map(|i| Segment::new(i as f64 * 2.0, 1.5, format!("セグメント{i}")))
        .collect()
}

pub fn chain(providers: &[Arc<MockProvider>]) -> TranscriptResolver {
    chain_with_timeout(providers, None)
}

pub fn chain_with_timeout(
    providers: &[Arc<MockProvider>],
    timeout: Option<Duration>,
) -> TranscriptResolver {
    TranscriptResolver::new(
        providers
            .iter()
            .map(|p| ProviderSlot::new(p.clone() as Arc<dyn TranscriptProvider>, timeout))
            .collect(),
    )
}
