use anyhow::{Result, anyhow};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::config::{ClientConfig, ClientTarget};

/// Query parameter carrying the video: URLs go in `url`, anything else is
/// passed through as `videoId`.
fn video_param(video: &str) -> (&'static str, &str) {
    if video.contains("://") || video.contains("youtu") {
        ("url", video)
    } else {
        ("videoId", video)
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let response_text = response
        .text()
        .await
        .map_err(|e| anyhow!("Failed to read response: {}", e))?;

    if !status.is_success() {
        return Err(anyhow!(
            "Server returned error {}: {}",
            status,
            response_text
        ));
    }

    serde_json::from_str(&response_text).map_err(|e| anyhow!("Failed to parse JSON response: {}", e))
}

pub async fn request_transcript(config: &ClientConfig, video: &str) -> Result<Value> {
    let client = reqwest::Client::new();

    let mut query = vec![video_param(video)];
    if let Some(language) = config.language.as_deref() {
        query.push(("language", language));
    }

    println!(
        "🚀 Requesting transcript from: {}/api/v1/transcript",
        config.server_url
    );

    let response = client
        .get(format!("{}/api/v1/transcript", config.server_url))
        .query(&query)
        .send()
        .await
        .map_err(|e| anyhow!("Failed to send request: {}", e))?;

    read_json(response).await
}

pub async fn upload_audio(config: &ClientConfig, audio_file: &str) -> Result<Value> {
    let client = reqwest::Client::new();

    if !Path::new(audio_file).exists() {
        return Err(anyhow!("Audio file not found: {}", audio_file));
    }
    let audio_data =
        fs::read(audio_file).map_err(|e| anyhow!("Failed to read audio file: {}", e))?;

    println!("📁 Audio file: {} ({} bytes)", audio_file, audio_data.len());

    let filename = Path::new(audio_file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("audio.mp3")
        .to_string();

    let mut form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(audio_data).file_name(filename),
    );
    if let Some(language) = config.language.clone() {
        form = form.text("language", language);
    }

    println!(
        "🚀 Uploading audio to: {}/api/v1/transcribe/audio",
        config.server_url
    );

    let response = client
        .post(format!("{}/api/v1/transcribe/audio", config.server_url))
        .multipart(form)
        .send()
        .await
        .map_err(|e| anyhow!("Failed to send request: {}", e))?;

    read_json(response).await
}

/// Provider names from a health response, in chain order.
fn chain_from_health(health: &Value) -> Vec<&str> {
    health
        .get("providers")
        .and_then(Value::as_array)
        .map(|providers| providers.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Confirms the relay is up and returns its fallback chain. An empty chain is
/// reported but not treated as a failure, since uploads can still work.
pub async fn check_server_health(server_url: &str) -> Result<Vec<String>> {
    let client = reqwest::Client::new();

    println!("🔍 Checking relay at: {server_url}/api/v1/health");

    let response = client
        .get(format!("{server_url}/api/v1/health"))
        .send()
        .await
        .map_err(|e| anyhow!("Failed to connect to relay: {}", e))?;
    let health = read_json(response)
        .await
        .map_err(|e| anyhow!("Relay health check failed: {}", e))?;

    let chain: Vec<String> = chain_from_health(&health)
        .into_iter()
        .map(str::to_string)
        .collect();
    if chain.is_empty() {
        println!("⚠️  Relay is up but has no transcript providers configured");
    } else {
        println!("✅ Relay is up, fallback chain: {}", chain.join(" -> "));
    }
    Ok(chain)
}

pub async fn run_client(config: ClientConfig) -> Result<()> {
    println!("📜 Transcript Relay Client");
    println!("==========================");

    if let Err(e) = check_server_health(&config.server_url).await {
        eprintln!("❌ {e}");
        eprintln!("💡 Make sure the server is running: transcript-relay serve");
        return Err(e);
    }

    let result = match &config.target {
        ClientTarget::Video(video) => request_transcript(&config, video).await,
        ClientTarget::AudioFile(audio_file) => upload_audio(&config, audio_file).await,
    };

    match result {
        Ok(result) => {
            println!("\n✅ Transcript received!");
            println!("📝 Result:");
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Err(e) => {
            eprintln!("❌ Request failed: {e}");
            return Err(e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{chain_from_health, video_param};

    #[test]
    fn health_chain_keeps_provider_order() {
        let health = json!({
            "status": "ok",
            "service": "transcript-relay",
            "providers": ["backend", "captions", "whisper"]
        });
        assert_eq!(chain_from_health(&health), vec!["backend", "captions", "whisper"]);
        assert!(chain_from_health(&json!({"status": "ok"})).is_empty());
    }

    #[test]
    fn urls_are_sent_as_url_parameter() {
        assert_eq!(
            video_param("https://youtu.be/dQw4w9WgXcQ"),
            ("url", "https://youtu.be/dQw4w9WgXcQ")
        );
        assert_eq!(
            video_param("www.youtube.com/watch?v=dQw4w9WgXcQ"),
            ("url", "www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
        assert_eq!(video_param("ABC123"), ("videoId", "ABC123"));
    }
}
