use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "transcript-relay",
    about = "Transcript Relay - fetch video transcripts through a provider fallback chain",
    long_about = "Serves transcripts over HTTP by asking a first-party backend, then a captions service, then a speech recognition service, stopping at the first one that answers.",
    after_help = "EXAMPLES:\n    # Start the relay server\n    transcript-relay serve --port 8080\n\n    # Resolve a transcript in-process using the configured providers\n    transcript-relay resolve dQw4w9WgXcQ\n\n    # Ask a running relay for a transcript\n    transcript-relay fetch https://youtu.be/dQw4w9WgXcQ --language ja\n\n    # Transcribe a local audio file through the relay\n    transcript-relay upload lecture.mp3 --server-url http://my-server:8080"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(name = "serve")]
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value = "8080")]
        port: u16,
    },
    #[command(name = "resolve")]
    Resolve {
        /// Video id or URL
        video: String,

        #[arg(long, short = 'l')]
        language: Option<String>,

        /// Per-provider timeout in seconds, overriding the configured ones
        #[arg(long, value_parser = validate_timeout)]
        timeout: Option<u64>,
    },
    #[command(name = "fetch")]
    Fetch {
        /// Video id or URL
        video: String,

        #[arg(long, short = 'l')]
        language: Option<String>,

        #[arg(long, default_value = "http://localhost:8080")]
        server_url: String,
    },
    #[command(name = "upload")]
    Upload {
        audio_file: String,

        #[arg(long, short = 'l')]
        language: Option<String>,

        #[arg(long, default_value = "http://localhost:8080")]
        server_url: String,
    },
}

pub fn validate_timeout(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("Timeout must be at least one second".to_string()),
        Ok(secs) => Ok(secs),
        Err(_) => Err("Invalid timeout value".to_string()),
    }
}
