use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};

use crate::config::RelayConfig;
use crate::provider::{ProviderKind, TranscriptProvider};
use crate::resolver::{ProviderSlot, TranscriptResolver};

use super::backend::BackendProvider;
use super::captions::CaptionsProvider;
use super::whisper::WhisperProvider;

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(kind: ProviderKind, base_url: &str) -> Result<Arc<dyn TranscriptProvider>> {
        match kind {
            ProviderKind::Backend => Ok(Arc::new(BackendProvider::new(base_url)?)),
            ProviderKind::Captions => Ok(Arc::new(CaptionsProvider::new(base_url)?)),
            ProviderKind::Whisper => Ok(Arc::new(WhisperProvider::new(base_url)?)),
        }
    }

    /// Builds the fallback chain in configured order. Providers without a
    /// URL are left out. Timeouts live on the slots only, so a request-level
    /// timeout can lengthen a call as well as shorten it.
    pub fn build_resolver(config: &RelayConfig) -> Result<TranscriptResolver> {
        let mut slots = Vec::with_capacity(config.provider_order.len());

        for kind in &config.provider_order {
            let Some(base_url) = config.provider_url(*kind) else {
                warn!("No URL configured for provider {kind}, leaving it out of the chain");
                continue;
            };
            let timeout = config.provider_timeout(*kind);
            info!("Chain position {}: {kind} at {base_url} (timeout {timeout:?})", slots.len() + 1);
            let provider = Self::create(*kind, base_url)?;
            slots.push(ProviderSlot::new(provider, Some(timeout)));
        }

        if slots.is_empty() {
            warn!("Transcript chain is empty; every request will be reported as not found");
        }

        Ok(TranscriptResolver::new(slots))
    }

    /// The whisper service doubles as the target for direct audio uploads.
    pub fn whisper_uploader(config: &RelayConfig) -> Result<Option<Arc<WhisperProvider>>> {
        match config.whisper_url.as_deref() {
            Some(url) => {
                let timeout = config.provider_timeout(ProviderKind::Whisper);
                Ok(Some(Arc::new(
                    WhisperProvider::new(url)?.with_upload_timeout(timeout),
                )))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(order: Vec<ProviderKind>) -> RelayConfig {
        RelayConfig {
            provider_order: order,
            backend_url: Some("http://backend.internal".to_string()),
            captions_url: None,
            whisper_url: Some("http://whisper.internal".to_string()),
            ..RelayConfig::default()
        }
    }

    #[test]
    fn skips_providers_without_url() {
        let resolver = ProviderFactory::build_resolver(&config(ProviderKind::DEFAULT_ORDER.to_vec()))
            .unwrap();
        assert_eq!(resolver.provider_names(), vec!["backend", "whisper"]);
    }

    #[test]
    fn honours_configured_subset() {
        let resolver = ProviderFactory::build_resolver(&config(vec![ProviderKind::Whisper])).unwrap();
        assert_eq!(resolver.provider_names(), vec!["whisper"]);
    }

    #[test]
    fn uploader_requires_whisper_url() {
        let mut cfg = config(Vec::new());
        assert!(ProviderFactory::whisper_uploader(&cfg).unwrap().is_some());
        cfg.whisper_url = None;
        assert!(ProviderFactory::whisper_uploader(&cfg).unwrap().is_none());
    }

    #[test]
    fn invalid_url_is_an_error() {
        assert!(ProviderFactory::create(ProviderKind::Captions, "::nope::").is_err());
    }
}
