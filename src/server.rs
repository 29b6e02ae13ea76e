//! HTTP server implementation using axum

use crate::compress::{
    CompressionLevel, CompressionOutcome, CompressionRequest, Ghostscript, Orchestrator,
};
use crate::error::Error;
use crate::storage::WorkingStorage;
use anyhow::Result;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Multipart overhead allowed on top of the file ceiling
const MULTIPART_SLACK_BYTES: usize = 64 * 1024;

const NOT_COMPRESSED_MESSAGE: &str =
    "The file could not be compressed any further. The original is returned.";

/// Runtime configuration for the compression server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind (default: 0.0.0.0)
    pub host: String,
    /// Port to listen on (default: 3000)
    pub port: u16,
    /// Root of the uploads/ and compressed/ directories (default: current dir)
    pub work_dir: PathBuf,
    /// External tool executable (default: gs)
    pub gs_binary: PathBuf,
    /// Run the external tool at all (default: true)
    pub external_tool_enabled: bool,
    /// Bounded wait for one external tool run (default: 120s)
    pub gs_timeout: Duration,
    /// Largest accepted upload in bytes (default: 50MB)
    pub max_upload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            work_dir: PathBuf::from("."),
            gs_binary: PathBuf::from("gs"),
            external_tool_enabled: true,
            gs_timeout: Duration::from_secs(120),
            max_upload_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

impl ServerConfig {
    /// Orchestrator matching this configuration
    pub fn orchestrator(&self) -> Orchestrator {
        let tool = self
            .external_tool_enabled
            .then(|| Ghostscript::new(&self.gs_binary, self.gs_timeout));
        Orchestrator::new(tool)
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    storage: Arc<WorkingStorage>,
    config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, storage: WorkingStorage) -> Self {
        Self {
            orchestrator: Arc::new(config.orchestrator()),
            storage: Arc::new(storage),
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressResponse {
    pub success: bool,
    pub original_size: u64,
    pub compressed_size: u64,
    /// Percentage saved, formatted with two decimals
    pub compression_ratio: String,
    /// Bytes saved
    pub savings: u64,
    pub download_url: String,
    pub filename: String,
    pub compression_level: String,
    pub was_compressed: bool,
    /// Strategy that produced the returned file
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CompressResponse {
    fn from_outcome(outcome: &CompressionOutcome, level: CompressionLevel) -> Self {
        let filename = outcome.final_filename();
        Self {
            success: true,
            original_size: outcome.original_size,
            compressed_size: outcome.final_size,
            compression_ratio: format!("{:.2}", outcome.savings_ratio),
            savings: outcome.bytes_saved(),
            download_url: format!("/download/{}", filename),
            filename,
            compression_level: level.to_string(),
            was_compressed: outcome.was_compressed,
            strategy: outcome.strategy_used.as_str().to_string(),
            message: (!outcome.was_compressed)
                .then(|| NOT_COMPRESSED_MESSAGE.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_client_error() {
            tracing::debug!(error = %self, "request rejected");
        } else {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Build the application router.
///
/// Routes:
/// - `POST /compress` - upload a PDF and compress it
/// - `GET /download/:filename` - fetch a result as an attachment
/// - `GET /api/status` - liveness probe
pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_SLACK_BYTES);

    Router::new()
        .route("/compress", post(compress))
        .route("/download/:filename", get(download))
        .route("/api/status", get(status))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

struct Upload {
    data: Bytes,
    level: CompressionLevel,
}

/// Drain the multipart form. Rejects a non-PDF file as soon as its part
/// header is seen.
async fn read_upload(multipart: &mut Multipart, max_bytes: u64) -> crate::error::Result<Upload> {
    let mut data = None;
    let mut level_token = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error(max_bytes))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("pdf") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !is_pdf_content_type(&content_type) {
                    return Err(Error::UnsupportedFileType { content_type });
                }
                let bytes = field.bytes().await.map_err(multipart_error(max_bytes))?;
                if bytes.len() as u64 > max_bytes {
                    return Err(Error::UploadTooLarge { max_bytes });
                }
                data = Some(bytes);
            }
            Some("compressionLevel") => {
                level_token = Some(field.text().await.map_err(multipart_error(max_bytes))?);
            }
            _ => {}
        }
    }

    let data = data.filter(|d| !d.is_empty()).ok_or(Error::NoFile)?;
    let level = level_token
        .as_deref()
        .map(CompressionLevel::from_token)
        .unwrap_or_default();

    Ok(Upload { data, level })
}

fn multipart_error(max_bytes: u64) -> impl Fn(axum::extract::multipart::MultipartError) -> Error {
    move |e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Error::UploadTooLarge { max_bytes }
        } else {
            Error::MalformedUpload {
                reason: e.body_text(),
            }
        }
    }
}

fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        .unwrap_or(false)
}

async fn compress(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CompressResponse>, Error> {
    let upload = read_upload(&mut multipart, state.config.max_upload_bytes).await?;

    let upload_name = WorkingStorage::unique_upload_name();
    let source_path = state.storage.upload_path(&upload_name);
    tokio::fs::write(&source_path, &upload.data)
        .await
        .map_err(|e| Error::CompressionFailed {
            reason: format!("could not store upload: {}", e.kind()),
        })?;

    let destination = state.storage.output_path_for(&upload_name);
    let request = CompressionRequest {
        source_bytes: upload.data,
        level: upload.level,
        source_path,
    };

    let outcome = state
        .orchestrator
        .compress(&request, &destination)
        .await
        .map_err(|e| match e {
            Error::Io(io) => Error::CompressionFailed {
                reason: format!("storage error: {}", io.kind()),
            },
            other => other,
        })?;

    let response = CompressResponse::from_outcome(&outcome, request.level);
    Ok(Json(response))
}

async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, Error> {
    let not_found = || Error::FileNotFound {
        filename: filename.clone(),
    };

    let path = state.storage.locate(&filename).ok_or_else(not_found)?;
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| not_found())?;
    let len = file.metadata().await.map(|m| m.len()).ok();

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(PDF_CONTENT_TYPE),
    );
    if let Ok(value) =
        header::HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
    {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some(len) = len {
        headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(len));
    }

    Ok(response)
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "running",
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "externalTool": state.orchestrator.has_external_tool(),
    }))
}

// ============================================================================
// Entry points
// ============================================================================

/// Run the server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    let storage = WorkingStorage::init(&config.work_dir)?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    if config.external_tool_enabled {
        tracing::info!(
            binary = %config.gs_binary.display(),
            timeout_secs = config.gs_timeout.as_secs(),
            "external tool enabled"
        );
    } else {
        tracing::info!("external tool disabled, using in-process rewrite only");
    }

    let app = router(AppState::new(config, storage));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "PDF compression server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
