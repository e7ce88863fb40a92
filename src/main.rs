use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;
use log::{error, info};

use transcript_relay::cli::{Cli, Commands};
use transcript_relay::client::run_client;
use transcript_relay::config::{ClientConfig, RelayConfig};
use transcript_relay::dto::TranscriptDto;
use transcript_relay::providers::ProviderFactory;
use transcript_relay::resolver::{ResolveError, TranscriptRequest};
use transcript_relay::server::run_server;
use transcript_relay::video_id::extract_video_id;

async fn serve(host: String, port: u16) -> Result<()> {
    let config = RelayConfig::from_env()?;
    run_server(host, port, config).await
}

async fn run_resolve(video: String, language: Option<String>, timeout: Option<u64>) -> Result<()> {
    let config = RelayConfig::from_env()?;
    let resolver = ProviderFactory::build_resolver(&config)?;

    // Anything that is not a recognisable URL is taken as an opaque id.
    let video_id = extract_video_id(&video).unwrap_or(video);
    let language = language.unwrap_or_else(|| config.default_language.clone());

    let mut request = TranscriptRequest::new(video_id.clone(), language);
    if let Some(secs) = timeout {
        request = request.with_timeout(Duration::from_secs(secs));
    }

    info!("Resolving {} through [{}]", video_id, resolver.provider_names().join(", "));

    match resolver.resolve(&request).await {
        Ok(resolution) => {
            let dto = TranscriptDto::new(video_id, resolution);
            println!("{}", serde_json::to_string_pretty(&dto)?);
            Ok(())
        }
        Err(ResolveError::AllProvidersExhausted { video_id, attempts }) => {
            eprintln!("{}", serde_json::to_string_pretty(&attempts)?);
            Err(anyhow!("No transcript available for {}", video_id))
        }
        Err(e) => Err(e.into()),
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { host, port } => serve(host, port).await,
        Commands::Resolve {
            video,
            language,
            timeout,
        } => run_resolve(video, language, timeout).await,
        Commands::Fetch {
            video,
            language,
            server_url,
        } => run_client(ClientConfig::new_fetch_mode(server_url, video, language)).await,
        Commands::Upload {
            audio_file,
            language,
            server_url,
        } => run_client(ClientConfig::new_upload_mode(server_url, audio_file, language)).await,
    };

    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}
