//! HTTP Server for the sheetjson API.
//!
//! Presentation layer for the conversion pipeline and the recommendation
//! service. Conversions run on a blocking task, one request at a time per task.
//!
//! # API Endpoints
//!
//! | Method | Path                    | Description                               |
//! |--------|-------------------------|-------------------------------------------|
//! | GET    | `/health`               | Health check                              |
//! | POST   | `/api/convert`          | Upload a workbook, get summary + document |
//! | POST   | `/api/convert/download` | Upload a workbook, get `resultado.json`   |
//! | POST   | `/api/recommend`        | Send a prompt, get the reply text         |
//! | GET    | `/api/logs`             | SSE stream for real-time logs             |
//!
//! Upload endpoints take a multipart form with a `file` part and an optional
//! `modifications` part (JSON). Without it the standard modifications apply,
//! stamped with the request time.

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, log_success, LOG_BROADCASTER};
use super::types::{error_response, ConvertResponse, RecommendRequest, RecommendResponse};
use crate::ai::RecommendationClient;
use crate::config;
use crate::error::{RemoteServiceError, ServerError, ServerResult};
use crate::transform::modifications::ModificationSpec;
use crate::transform::pipeline::{convert_bytes, Conversion, DEFAULT_OUTPUT_FILE_NAME};

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the application router.
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/convert", post(convert))
        .route("/api/convert/download", post(convert_download))
        .route("/api/recommend", post(recommend))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Sheetjson server running on http://localhost:{}", port);
    println!("   POST /api/convert           - Upload workbook");
    println!("   POST /api/convert/download  - Upload workbook, download JSON");
    println!("   POST /api/recommend         - Prompt the assistant");
    println!("   GET  /api/logs              - SSE log stream");
    println!("   GET  /health                - Health check");
    if !config::global().recommendations_enabled() {
        println!();
        println!("⚠️  OPENAI_API_KEY not set: /api/recommend is disabled");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sheetjson",
        "version": env!("CARGO_PKG_VERSION"),
        "recommendations": config::global().recommendations_enabled(),
        "endpoints": {
            "convert": "POST /api/convert",
            "download": "POST /api/convert/download",
            "recommend": "POST /api/recommend",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Convert endpoint: summary plus embedded document
async fn convert(multipart: Multipart) -> ServerResult<Json<ConvertResponse>> {
    let upload = read_upload(multipart).await?;
    let source_file = upload.file_name.clone();
    let conversion = run_conversion(upload).await?;

    let response = ConvertResponse::new(conversion, source_file)
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(Json(response))
}

/// Download endpoint: the document alone, as an attachment
async fn convert_download(multipart: Multipart) -> ServerResult<Response> {
    let upload = read_upload(multipart).await?;
    let conversion = run_conversion(upload).await?;

    let disposition = format!("attachment; filename=\"{}\"", DEFAULT_OUTPUT_FILE_NAME);
    Ok((
        [
            (header::CONTENT_TYPE, "application/json; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        conversion.json,
    )
        .into_response())
}

/// Recommendation endpoint
async fn recommend(Json(request): Json<RecommendRequest>) -> ServerResult<Json<RecommendResponse>> {
    let client = RecommendationClient::from_config(config::global())?;

    log_info("🤖 Sending prompt to the recommendation service...");
    let text = client.recommend(&request.prompt).await.map_err(|e| {
        log_error(format!("Recommendation failed: {}", e));
        e
    })?;
    log_success("Reply received");

    Ok(Json(RecommendResponse { text }))
}

/// A parsed upload form.
struct Upload {
    file_name: Option<String>,
    bytes: Vec<u8>,
    spec: ModificationSpec,
}

async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    let mut file_name = None;
    let mut file_data: Option<Vec<u8>> = None;
    let mut spec = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file_data = Some(bytes.to_vec());
            }
            "modifications" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                let parsed = ModificationSpec::from_json(&text)
                    .map_err(|e| ServerError::BadRequest(format!("Invalid modifications: {}", e)))?;
                spec = Some(parsed);
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    println!("\n{}", "=".repeat(70));
    println!(
        "📄 NEW UPLOAD: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    );
    println!("{}\n", "=".repeat(70));

    Ok(Upload {
        file_name,
        bytes,
        spec: spec.unwrap_or_else(ModificationSpec::standard_now),
    })
}

async fn run_conversion(upload: Upload) -> ServerResult<Conversion> {
    let conversion = tokio::task::spawn_blocking(move || convert_bytes(&upload.bytes, &upload.spec))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;
    Ok(conversion)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, step) = match &self {
            ServerError::Conversion(e) => (StatusCode::UNPROCESSABLE_ENTITY, Some(e.step().as_str())),
            ServerError::Remote(RemoteServiceError::MissingApiKey) => (StatusCode::SERVICE_UNAVAILABLE, None),
            ServerError::Remote(RemoteServiceError::EmptyPrompt) => (StatusCode::BAD_REQUEST, None),
            ServerError::Remote(_) => (StatusCode::BAD_GATEWAY, None),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        (status, Json(error_response(&self.to_string(), step))).into_response()
    }
}
