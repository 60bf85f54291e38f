//! HTTP service
//!
//! # Routes
//!
//! - `GET /` - liveness message
//! - `POST /analyze-text` - JSON `{"text": "..."}`, returns an analysis report
//! - `POST /upload` - multipart form with either a `text` field or a `file`
//!   image of a handwritten page

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use mood_core::{EmotionClassifier, Error, ErrorReport, Result, TextExtractor};

use crate::analyzer::EmotionAnalyzer;
use crate::handwriting::HandwritingReader;

/// Bind address, CORS origin and request size cap for the HTTP service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: String,
    pub cors_origin: String,
    /// Largest accepted request body, in bytes
    pub body_limit: usize,
}

impl ServerConfig {
    pub const DEFAULT_ADDR: &'static str = "127.0.0.1:5000";
    pub const DEFAULT_CORS_ORIGIN: &'static str = "http://localhost:3000";
    pub const DEFAULT_BODY_LIMIT: usize = 32 * 1024 * 1024;

    /// Create configuration from `MOOD_LENS_ADDR`, `MOOD_LENS_CORS_ORIGIN`
    /// and `MOOD_LENS_BODY_LIMIT_BYTES`
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with a custom variable lookup.
    /// Blank values count as unset; an unparsable body limit keeps the default.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            addr: non_empty("MOOD_LENS_ADDR").unwrap_or_else(|| Self::DEFAULT_ADDR.to_string()),
            cors_origin: non_empty("MOOD_LENS_CORS_ORIGIN")
                .unwrap_or_else(|| Self::DEFAULT_CORS_ORIGIN.to_string()),
            body_limit: non_empty("MOOD_LENS_BODY_LIMIT_BYTES")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(Self::DEFAULT_BODY_LIMIT),
        }
    }

    fn cors_layer(&self) -> Result<CorsLayer> {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if self.cors_origin == "*" {
            return Ok(layer.allow_origin(Any));
        }

        let origin = HeaderValue::from_str(&self.cors_origin).map_err(|_| {
            Error::Configuration(format!("Invalid CORS origin '{}'", self.cors_origin))
        })?;
        Ok(layer.allow_origin(origin))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: Self::DEFAULT_ADDR.to_string(),
            cors_origin: Self::DEFAULT_CORS_ORIGIN.to_string(),
            body_limit: Self::DEFAULT_BODY_LIMIT,
        }
    }
}

/// Application state shared across handlers
pub struct AppState<C: EmotionClassifier, E: TextExtractor> {
    pub analyzer: EmotionAnalyzer<C>,
    pub extractor: Option<E>,
    pub reader: HandwritingReader,
}

impl<C: EmotionClassifier, E: TextExtractor> AppState<C, E> {
    pub fn new(analyzer: EmotionAnalyzer<C>, extractor: Option<E>) -> Self {
        Self {
            analyzer,
            extractor,
            reader: HandwritingReader::page(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeTextRequest {
    #[serde(default)]
    text: String,
}

/// Build the router
pub fn create_router<C, E>(state: Arc<AppState<C, E>>, config: &ServerConfig) -> Result<Router>
where
    C: EmotionClassifier + 'static,
    E: TextExtractor + 'static,
{
    let router = Router::new()
        .route("/", get(home))
        .route("/analyze-text", post(analyze_text::<C, E>))
        .route("/upload", post(upload::<C, E>))
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(config.cors_layer()?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    Ok(router)
}

/// Bind and serve until ctrl-c
pub async fn serve<C, E>(state: Arc<AppState<C, E>>, config: &ServerConfig) -> Result<()>
where
    C: EmotionClassifier + 'static,
    E: TextExtractor + 'static,
{
    let app = create_router(state, config)?;
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!(addr = %listener.local_addr()?, "mood-lens backend listening");

    tokio::select! {
        result = axum::serve(listener, app) => result?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }
    Ok(())
}

fn error_response(status: StatusCode, message: impl ToString) -> Response {
    (status, Json(ErrorReport::new(message))).into_response()
}

async fn home() -> Json<Value> {
    Json(json!({ "message": "Backend is running" }))
}

async fn analyze_text<C, E>(
    State(state): State<Arc<AppState<C, E>>>,
    body: std::result::Result<Json<AnalyzeTextRequest>, JsonRejection>,
) -> Response
where
    C: EmotionClassifier + 'static,
    E: TextExtractor + 'static,
{
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            error!(error = %rejection.body_text(), "error processing text");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, rejection.body_text());
        }
    };

    let report = state.analyzer.analyze(&request.text).await;
    (StatusCode::OK, Json(report)).into_response()
}

async fn upload<C, E>(
    State(state): State<Arc<AppState<C, E>>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response
where
    C: EmotionClassifier + 'static,
    E: TextExtractor + 'static,
{
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "No file uploaded"),
    };

    let mut text: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "error during processing");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.body_text());
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => match field.text().await {
                Ok(value) => text = Some(value),
                Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.body_text()),
            },
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => file = Some((file_name, bytes.to_vec())),
                    Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.body_text()),
                }
            }
            _ => {}
        }
    }

    if let Some(text) = text {
        let report = state.analyzer.analyze(&text).await;
        return (StatusCode::OK, Json(report)).into_response();
    }

    let Some((file_name, image)) = file else {
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };
    if file_name.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No selected file");
    }

    let Some(extractor) = &state.extractor else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "Text extractor is not available");
    };

    match state.reader.read(extractor, &image).await {
        Ok(extracted) => {
            let report = state.analyzer.analyze(&extracted).await;
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            error!(error = %e, file = %file_name, "error during processing");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}
