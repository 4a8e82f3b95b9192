//! HTTP server for the csv-tokens API.
//!
//! Stateless: every request carries its CSV and gets its files back.
//!
//! # API Endpoints
//!
//! | Method | Path                 | Description                          |
//! |--------|----------------------|--------------------------------------|
//! | GET    | `/health`            | Health check                         |
//! | POST   | `/api/headers`       | Detect encoding, delimiter, columns  |
//! | POST   | `/api/process`       | Manifest + token files as JSON       |
//! | POST   | `/api/files/{name}`  | Download one generated file          |
//! | POST   | `/api/bundle`        | Download every file as a zip         |
//! | GET    | `/api/logs`          | SSE stream for real-time logs        |
//!
//! POST bodies are `multipart/form-data` with a `file` part (or a `csv`
//! text part for pasted data) and, except for `/api/headers`, a `modeKey`
//! part. Optional parts: `collection`, `sanitize`, `dynamicTyping`.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderName, Method, StatusCode},
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

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, HeadersResponse, ProcessResponse};
use crate::archive;
use crate::config::Config;
use crate::error::{ArchiveError, PipelineError, ServerError, ServerResult};
use crate::models::ARCHIVE_FILE_NAME;
use crate::parser::ParseOptions;
use crate::transform::pipeline::{analyze_bytes, process_bytes, ProcessOptions, ProcessOutput};
use crate::transform::TransformOptions;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Csv(_))
            | ServerError::Pipeline(PipelineError::Transform(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(PipelineError::Archive(ArchiveError::UnknownFile(_))) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        log_error(self.to_string());
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Build the router. Split from [`start_server`] so it can be served elsewhere.
pub fn router(config: Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let body_limit = config.max_upload_bytes;

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/headers", post(analyze_headers))
        .route("/api/process", post(process_csv))
        .route("/api/files/{name}", post(download_file))
        .route("/api/bundle", post(download_bundle))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(config)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 csv-tokens server running on http://localhost:{}", port);
    println!("   POST /api/headers       - Analyze CSV columns");
    println!("   POST /api/process       - Generate manifest and token files");
    println!("   POST /api/files/{{name}}  - Download one generated file");
    println!("   POST /api/bundle        - Download all files (zip)");
    println!("   GET  /api/logs          - SSE log stream");
    println!("   GET  /health            - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "csv-tokens",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "headers": "POST /api/headers",
            "process": "POST /api/process",
            "file": "POST /api/files/{name}",
            "bundle": "POST /api/bundle",
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

/// Parts of an upload form.
#[derive(Debug, Default)]
struct UploadForm {
    bytes: Option<Vec<u8>>,
    file_name: Option<String>,
    mode_keys: Option<String>,
    collection: Option<String>,
    sanitize: bool,
    dynamic_typing: Option<bool>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ServerResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" => {
                    form.file_name = field.file_name().map(|s| s.to_string());
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                    form.bytes = Some(bytes.to_vec());
                }
                "csv" => form.bytes = Some(read_text(field).await?.into_bytes()),
                "modeKey" => form.mode_keys = Some(read_text(field).await?),
                "collection" => form.collection = Some(read_text(field).await?),
                "sanitize" => form.sanitize = is_truthy(&read_text(field).await?),
                "dynamicTyping" => form.dynamic_typing = Some(is_truthy(&read_text(field).await?)),
                _ => {}
            }
        }

        Ok(form)
    }

    fn csv_bytes(&self) -> ServerResult<&[u8]> {
        self.bytes
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| ServerError::BadRequest("No CSV provided".to_string()))
    }

    fn parse_options(&self, config: &Config) -> ParseOptions {
        ParseOptions {
            delimiter: None,
            dynamic_typing: self.dynamic_typing.unwrap_or(config.dynamic_typing),
            ..ParseOptions::default()
        }
    }

    fn process_options(&self, config: &Config) -> ServerResult<ProcessOptions> {
        let keys = self
            .mode_keys
            .as_deref()
            .ok_or_else(|| ServerError::BadRequest("No modeKey provided".to_string()))?;

        let mut transform = TransformOptions::default()
            .with_mode_keys_str(keys)
            .sanitized(self.sanitize);
        if let Some(collection) = self.collection.as_deref().filter(|c| !c.trim().is_empty()) {
            transform = transform.with_collection_name(collection.trim());
        }

        Ok(ProcessOptions {
            parse: self.parse_options(config),
            transform,
        })
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ServerResult<String> {
    field
        .text()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Run the pipeline off the async workers.
async fn run_process(form: UploadForm, config: Config) -> ServerResult<ProcessOutput> {
    log_info(format!(
        "📄 New upload: {}",
        form.file_name.as_deref().unwrap_or("pasted CSV data")
    ));
    let options = form.process_options(&config)?;
    let bytes = form.csv_bytes()?.to_vec();

    tokio::task::spawn_blocking(move || process_bytes(&bytes, &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(ServerError::from)
}

/// Header analysis endpoint
async fn analyze_headers(
    State(config): State<Config>,
    multipart: Multipart,
) -> ServerResult<Json<HeadersResponse>> {
    let form = UploadForm::read(multipart).await?;
    let options = form.parse_options(&config);
    let bytes = form.csv_bytes()?.to_vec();

    let info = tokio::task::spawn_blocking(move || analyze_bytes(&bytes, &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(HeadersResponse::from(info)))
}

/// Processing endpoint
async fn process_csv(
    State(config): State<Config>,
    multipart: Multipart,
) -> ServerResult<Json<ProcessResponse>> {
    let form = UploadForm::read(multipart).await?;
    let output = run_process(form, config).await?;
    Ok(Json(ProcessResponse::from(output)))
}

/// Single file download endpoint
async fn download_file(
    State(config): State<Config>,
    Path(name): Path<String>,
    multipart: Multipart,
) -> ServerResult<Response> {
    let form = UploadForm::read(multipart).await?;
    let output = run_process(form, config).await?;

    let content = archive::file_content(&output.result, &name).map_err(PipelineError::from)?;
    Ok(attachment("application/json", &name, content.into_bytes()))
}

/// Zip bundle download endpoint
async fn download_bundle(
    State(config): State<Config>,
    multipart: Multipart,
) -> ServerResult<Response> {
    let form = UploadForm::read(multipart).await?;
    let output = run_process(form, config).await?;

    let bytes = archive::bundle(&output.result).map_err(PipelineError::from)?;
    Ok(attachment("application/zip", ARCHIVE_FILE_NAME, bytes))
}

fn attachment(content_type: &str, file_name: &str, body: Vec<u8>) -> Response {
    let headers: [(HeaderName, String); 2] = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(file_name)),
    ];
    (headers, body).into_response()
}

fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;

    #[test]
    fn test_error_status_codes() {
        let bad = ServerError::BadRequest("No CSV provided".into()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let invalid: ServerError = PipelineError::from(TransformError::EmptyInput).into();
        assert_eq!(invalid.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let missing: ServerError =
            PipelineError::from(ArchiveError::UnknownFile("X.tokens.json".into())).into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_form_options() {
        let form = UploadForm {
            bytes: Some(b"Theme,Color\nLight,#fff".to_vec()),
            mode_keys: Some("Theme, Color".into()),
            collection: Some(" Colors ".into()),
            sanitize: true,
            dynamic_typing: Some(false),
            ..UploadForm::default()
        };
        let options = form.process_options(&Config::default()).unwrap();

        assert_eq!(options.transform.mode_key(), Some("Theme"));
        assert_eq!(options.transform.collection_name.as_deref(), Some("Colors"));
        assert!(options.transform.sanitize_file_names);
        assert!(!options.parse.dynamic_typing);
    }

    #[test]
    fn test_form_requires_mode_key_and_csv() {
        let form = UploadForm::default();
        assert!(matches!(
            form.process_options(&Config::default()),
            Err(ServerError::BadRequest(_))
        ));
        assert!(matches!(form.csv_bytes(), Err(ServerError::BadRequest(_))));
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("Theme.Light.tokens.json"),
            "attachment; filename=\"Theme.Light.tokens.json\""
        );
        assert_eq!(content_disposition("a\"b"), "attachment; filename=\"a_b\"");
    }

    #[test]
    fn test_attachment_headers() {
        let response = attachment("application/zip", ARCHIVE_FILE_NAME, vec![1, 2, 3]);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("processed-files.zip"));
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "csv-tokens");
    }

    #[tokio::test]
    async fn test_run_process() {
        let form = UploadForm {
            bytes: Some(b"Theme,Color\nLight,#fff\nDark,#000\n".to_vec()),
            mode_keys: Some("Theme".into()),
            ..UploadForm::default()
        };
        let output = run_process(form, Config::default()).await.unwrap();
        assert_eq!(output.result.modes, vec!["Light", "Dark"]);
    }
}
