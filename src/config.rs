use std::time::Duration;

use anyhow::{Result, anyhow, bail};

use crate::provider::ProviderKind;

pub const DEFAULT_LANGUAGE: &str = "ja";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_WHISPER_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 100;

/// Server side settings, read from the environment (and `.env`).
#[derive(Clone, Debug, PartialEq)]
pub struct RelayConfig {
    pub provider_order: Vec<ProviderKind>,
    pub backend_url: Option<String>,
    pub captions_url: Option<String>,
    pub whisper_url: Option<String>,
    pub provider_timeout: Duration,
    pub whisper_timeout: Duration,
    pub default_language: String,
    /// Largest audio upload the relay buffers before forwarding it.
    pub max_upload_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            provider_order: ProviderKind::DEFAULT_ORDER.to_vec(),
            backend_url: None,
            captions_url: None,
            whisper_url: None,
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            whisper_timeout: Duration::from_secs(DEFAULT_WHISPER_TIMEOUT_SECS),
            default_language: DEFAULT_LANGUAGE.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let provider_order = match non_empty("TRANSCRIPT_PROVIDERS") {
            Some(list) => parse_provider_order(&list)?,
            None => defaults.provider_order,
        };
        let provider_timeout = match non_empty("PROVIDER_TIMEOUT_SECS") {
            Some(v) => parse_timeout("PROVIDER_TIMEOUT_SECS", &v)?,
            None => defaults.provider_timeout,
        };
        let whisper_timeout = match non_empty("WHISPER_TIMEOUT_SECS") {
            Some(v) => parse_timeout("WHISPER_TIMEOUT_SECS", &v)?,
            None => defaults.whisper_timeout,
        };
        let max_upload_bytes = match non_empty("MAX_UPLOAD_MB") {
            Some(v) => parse_upload_limit(&v)?,
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            provider_order,
            backend_url: non_empty("TRANSCRIPT_BACKEND_URL"),
            captions_url: non_empty("CAPTIONS_SERVICE_URL"),
            whisper_url: non_empty("WHISPER_SERVICE_URL"),
            provider_timeout,
            whisper_timeout,
            default_language: non_empty("TRANSCRIPT_LANGUAGE").unwrap_or(defaults.default_language),
            max_upload_bytes,
        })
    }

    pub fn provider_url(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Backend => self.backend_url.as_deref(),
            ProviderKind::Captions => self.captions_url.as_deref(),
            ProviderKind::Whisper => self.whisper_url.as_deref(),
        }
    }

    pub fn provider_timeout(&self, kind: ProviderKind) -> Duration {
        match kind {
            ProviderKind::Whisper => self.whisper_timeout,
            _ => self.provider_timeout,
        }
    }
}

/// Parses a comma separated chain such as `backend,captions,whisper`. The
/// result must be free of duplicates and ordered by ascending call cost.
pub fn parse_provider_order(list: &str) -> Result<Vec<ProviderKind>> {
    let mut order: Vec<ProviderKind> = Vec::new();

    for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let kind: ProviderKind = name.parse().map_err(|e: String| anyhow!(e))?;
        if order.contains(&kind) {
            bail!("Provider '{}' is listed more than once", kind);
        }
        if let Some(prev) = order.last() {
            if prev.cost_rank() > kind.cost_rank() {
                bail!(
                    "Provider '{}' is cheaper than '{}' and must come before it",
                    kind,
                    prev
                );
            }
        }
        order.push(kind);
    }

    Ok(order)
}

fn parse_timeout(key: &str, value: &str) -> Result<Duration> {
    let secs: u64 = value
        .parse()
        .map_err(|_| anyhow!("{} must be a whole number of seconds, got '{}'", key, value))?;
    if secs == 0 {
        bail!("{} must be greater than zero", key);
    }
    Ok(Duration::from_secs(secs))
}

fn parse_upload_limit(value: &str) -> Result<usize> {
    let mb: usize = value
        .parse()
        .map_err(|_| anyhow!("MAX_UPLOAD_MB must be a whole number of megabytes, got '{}'", value))?;
    if mb == 0 {
        bail!("MAX_UPLOAD_MB must be greater than zero");
    }
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow!("MAX_UPLOAD_MB is too large: {}", value))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientTarget {
    Video(String),
    AudioFile(String),
}

#[derive(Debug)]
pub struct ClientConfig {
    pub server_url: String,
    pub language: Option<String>,
    pub target: ClientTarget,
}

impl ClientConfig {
    pub fn new_fetch_mode(server_url: String, video: String, language: Option<String>) -> Self {
        Self {
            server_url,
            language,
            target: ClientTarget::Video(video),
        }
    }

    pub fn new_upload_mode(
        server_url: String,
        audio_file: String,
        language: Option<String>,
    ) -> Self {
        Self {
            server_url,
            language,
            target: ClientTarget::AudioFile(audio_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<RelayConfig> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RelayConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = load(&[]).unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.default_language, "ja");
        assert_eq!(config.provider_timeout(ProviderKind::Whisper), Duration::from_secs(600));
        assert_eq!(config.provider_timeout(ProviderKind::Captions), Duration::from_secs(15));
    }

    #[test]
    fn reads_urls_and_timeouts() {
        let config = load(&[
            ("TRANSCRIPT_BACKEND_URL", "http://backend.internal:8080"),
            ("CAPTIONS_SERVICE_URL", "  "),
            ("WHISPER_SERVICE_URL", "https://whisper.example.run"),
            ("PROVIDER_TIMEOUT_SECS", "5"),
            ("TRANSCRIPT_LANGUAGE", "en"),
        ])
        .unwrap();
        assert_eq!(config.provider_url(ProviderKind::Backend), Some("http://backend.internal:8080"));
        assert_eq!(config.provider_url(ProviderKind::Captions), None);
        assert_eq!(config.provider_timeout, Duration::from_secs(5));
        assert_eq!(config.default_language, "en");
    }

    #[test]
    fn rejects_bad_timeouts() {
        assert!(load(&[("PROVIDER_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("WHISPER_TIMEOUT_SECS", "ten")]).is_err());
    }

    #[test]
    fn upload_limit_is_read_in_megabytes() {
        assert_eq!(load(&[]).unwrap().max_upload_bytes, 100 * 1024 * 1024);
        assert_eq!(
            load(&[("MAX_UPLOAD_MB", "2")]).unwrap().max_upload_bytes,
            2 * 1024 * 1024
        );
        assert!(load(&[("MAX_UPLOAD_MB", "0")]).is_err());
        assert!(load(&[("MAX_UPLOAD_MB", "lots")]).is_err());
    }

    #[test]
    fn provider_order_parsing() {
        assert_eq!(
            parse_provider_order("captions, whisper").unwrap(),
            vec![ProviderKind::Captions, ProviderKind::Whisper]
        );
        assert!(parse_provider_order("backend,backend").is_err());
        assert!(parse_provider_order("whisper,captions").is_err());
        assert!(parse_provider_order("backend,youtube").is_err());
        assert!(parse_provider_order("").unwrap().is_empty());
    }
}
