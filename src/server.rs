use std::sync::Arc;

use actix_cors::Cors;
use actix_multipart::{Field, Multipart};
use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer, Responder, ResponseError, get, middleware::Logger,
    post, web,
};
use anyhow::Result;
use futures_util::TryStreamExt;
use log::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::dto::{ErrorDto, NotFoundDto, TranscriptDto, TranscriptQuery};
use crate::providers::{ProviderFactory, WhisperProvider};
use crate::resolver::{ResolveError, TranscriptRequest, TranscriptResolver};

pub const SERVICE_NAME: &str = "transcript-relay";

/// Upper bound for JSON request bodies.
pub const JSON_LIMIT: usize = 64 * 1024;

/// Upper bound for non-file multipart fields such as `language`.
const TEXT_FIELD_LIMIT: usize = 1024;

pub struct AppState {
    pub resolver: TranscriptResolver,
    pub whisper: Option<Arc<WhisperProvider>>,
    pub default_language: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        resolver: TranscriptResolver,
        whisper: Option<Arc<WhisperProvider>>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            whisper,
            default_language: default_language.into(),
            max_upload_bytes: RelayConfig::default().max_upload_bytes,
        }
    }

    pub fn with_upload_limit(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        Ok(Self::new(
            ProviderFactory::build_resolver(config)?,
            ProviderFactory::whisper_uploader(config)?,
            config.default_language.clone(),
        )
        .with_upload_limit(config.max_upload_bytes))
    }

    fn language(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.default_language.as_str())
            .to_string()
    }
}

#[get("/")]
pub async fn service_info() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "transcript_get": "GET /api/v1/transcript?videoId={id}&language=ja",
            "transcript_post": "POST /api/v1/transcript",
            "transcribe_audio": "POST /api/v1/transcribe/audio (multipart 'file')",
            "health": "GET /api/v1/health"
        }
    }))
}

#[get("/api/v1/health")]
pub async fn health_check(data: web::Data<AppState>) -> impl Responder {
    debug!("Health check endpoint called");
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "providers": data.resolver.provider_names(),
    }))
}

#[get("/api/v1/transcript")]
pub async fn transcript_get(
    data: web::Data<AppState>,
    query: web::Query<TranscriptQuery>,
) -> impl Responder {
    resolve_transcript(&data, query.into_inner()).await
}

#[post("/api/v1/transcript")]
pub async fn transcript_post(
    data: web::Data<AppState>,
    body: web::Json<TranscriptQuery>,
) -> impl Responder {
    resolve_transcript(&data, body.into_inner()).await
}

async fn resolve_transcript(state: &AppState, query: TranscriptQuery) -> HttpResponse {
    let Some(video_id) = query.resolve_video_id() else {
        warn!("Transcript request without a usable video id");
        return HttpResponse::BadRequest().json(ErrorDto::new(
            "Video ID is required",
            "Please provide videoId or a YouTube url as query parameter or in the request body",
        ));
    };
    let language = state.language(query.language.as_deref());

    info!("Processing transcript request for video {video_id} ({language})");

    let request = TranscriptRequest::new(video_id.clone(), language);
    match state.resolver.resolve(&request).await {
        Ok(resolution) => HttpResponse::Ok().json(TranscriptDto::new(video_id, resolution)),
        Err(ResolveError::AllProvidersExhausted { attempts, .. }) => {
            HttpResponse::NotFound().json(NotFoundDto {
                available: false,
                message: format!("No transcript available for {video_id}"),
                video_id,
                attempts,
            })
        }
        Err(ResolveError::InvalidRequest(message)) => {
            HttpResponse::BadRequest().json(ErrorDto::new("Invalid request", message))
        }
    }
}

#[post("/api/v1/transcribe/audio")]
pub async fn transcribe_audio(
    data: web::Data<AppState>,
    mut payload: Multipart,
) -> impl Responder {
    let Some(whisper) = data.whisper.clone() else {
        warn!("Audio upload received but no whisper service is configured");
        return HttpResponse::ServiceUnavailable().json(ErrorDto::new(
            "Transcription unavailable",
            "No speech recognition service is configured",
        ));
    };

    let mut audio: Option<(Vec<u8>, String)> = None;
    let mut language: Option<String> = None;

    loop {
        let field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read multipart payload: {e}");
                return HttpResponse::BadRequest()
                    .json(ErrorDto::new("Invalid upload", e.to_string()));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") | Some("audio") => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string)
                    .unwrap_or_else(|| "upload.mp3".to_string());
                match read_field_data(field, data.max_upload_bytes).await {
                    Ok(bytes) => {
                        debug!("Audio data received: {} bytes", bytes.len());
                        audio = Some((bytes, filename));
                    }
                    Err(UploadError::TooLarge(limit)) => {
                        warn!("Audio upload exceeds {limit} bytes");
                        return HttpResponse::PayloadTooLarge().json(ErrorDto::new(
                            "Audio file too large",
                            format!("Uploads are limited to {limit} bytes"),
                        ));
                    }
                    Err(e) => {
                        error!("Failed to read audio data: {e}");
                        return HttpResponse::BadRequest().json(ErrorDto::new(
                            "Invalid upload",
                            "Failed to read audio data",
                        ));
                    }
                }
            }
            Some("language") => {
                if let Ok(bytes) = read_field_data(field, TEXT_FIELD_LIMIT).await {
                    if let Ok(text) = String::from_utf8(bytes) {
                        language = Some(text.trim().to_string());
                    }
                }
            }
            _ => continue,
        }
    }

    let Some((bytes, filename)) = audio.filter(|(bytes, _)| !bytes.is_empty()) else {
        warn!("No audio file provided in transcription request");
        return HttpResponse::BadRequest().json(ErrorDto::new(
            "No audio file provided",
            "Send the audio as multipart field 'file'",
        ));
    };
    let language = data.language(language.as_deref());

    match whisper.transcribe_upload(bytes, filename, &language).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => {
            error!("Audio transcription failed: {e}");
            HttpResponse::BadGateway().json(ErrorDto::new("Transcription failed", e.to_string()))
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum UploadError {
    #[error(transparent)]
    Multipart(#[from] actix_multipart::MultipartError),
    #[error("field exceeds {0} bytes")]
    TooLarge(usize),
}

/// Buffers one multipart field, giving up as soon as it grows past `limit`.
async fn read_field_data(mut field: Field, limit: usize) -> Result<Vec<u8>, UploadError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if data.len() + chunk.len() > limit {
            return Err(UploadError::TooLarge(limit));
        }
        data.extend_from_slice(&chunk);
    }
    debug!("Read field data: {} bytes", data.len());
    Ok(data)
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    warn!("Rejected JSON body: {err}");
    let response = HttpResponse::build(err.status_code())
        .json(ErrorDto::new("Invalid JSON body", err.to_string()));
    InternalError::from_response(err, response).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    warn!("Rejected query string: {err}");
    let response =
        HttpResponse::BadRequest().json(ErrorDto::new("Invalid query string", err.to_string()));
    InternalError::from_response(err, response).into()
}

/// Registers every route and the JSON/query extractor settings; shared by the
/// server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(json_error_handler),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .service(service_info)
        .service(health_check)
        .service(transcript_get)
        .service(transcript_post)
        .service(transcribe_audio);
}

pub async fn run_server(host: String, port: u16, config: RelayConfig) -> Result<()> {
    info!("Starting transcript relay");
    info!(
        "Using configuration: providers={:?}, default_language={}, provider_timeout={:?}, whisper_timeout={:?}, max_upload_bytes={}",
        config.provider_order,
        config.default_language,
        config.provider_timeout,
        config.whisper_timeout,
        config.max_upload_bytes
    );

    let app_state = web::Data::new(AppState::from_config(&config)?);
    info!(
        "Fallback chain: [{}]",
        app_state.resolver.provider_names().join(" -> ")
    );

    info!("Starting HTTP server on {host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
