//! HTTP adapter over the [`Brevity`] facade.
//!
//! Rejects empty input before the core is invoked and runs inference on the
//! blocking pool. Responses mirror the core result types.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::Brevity;
use crate::model::{SlotId, SlotState};

/// Error message for requests without usable text.
pub const TEXT_REQUIRED: &str = "Text is required";

/// Body of every text endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

impl TextRequest {
    /// The trimmed text, or `None` when nothing is left.
    fn admitted(&self) -> Option<String> {
        let text = self.text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub device: &'static str,
    pub models: ModelsHealth,
}

#[derive(Debug, Serialize)]
pub struct ModelsHealth {
    pub summarizer: SlotState,
    pub sentiment_classifier: SlotState,
}

/// Build the router with permissive CORS.
pub fn router(brevity: Arc<Brevity>) -> Router {
    Router::new()
        .route("/api/summarize", post(summarize))
        .route("/api/sentiment", post(sentiment))
        .route("/api/digest", post(digest))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(brevity)
}

/// `POST /api/summarize`
pub async fn summarize(
    State(brevity): State<Arc<Brevity>>,
    Json(request): Json<TextRequest>,
) -> Response {
    let Some(text) = request.admitted() else {
        return bad_request(json!({ "error": TEXT_REQUIRED, "summary": "" }));
    };
    info!(chars = text.chars().count(), "summarize request");
    run_blocking(brevity, move |b| b.summarize(&text)).await
}

/// `POST /api/sentiment`
pub async fn sentiment(
    State(brevity): State<Arc<Brevity>>,
    Json(request): Json<TextRequest>,
) -> Response {
    let Some(text) = request.admitted() else {
        return bad_request(json!({ "error": TEXT_REQUIRED }));
    };
    info!(chars = text.chars().count(), "sentiment request");
    run_blocking(brevity, move |b| b.sentiment_report(&text)).await
}

/// `POST /api/digest`
pub async fn digest(
    State(brevity): State<Arc<Brevity>>,
    Json(request): Json<TextRequest>,
) -> Response {
    let Some(text) = request.admitted() else {
        return bad_request(json!({ "error": TEXT_REQUIRED, "summary": "" }));
    };
    info!(chars = text.chars().count(), "digest request");
    run_blocking(brevity, move |b| b.digest(&text)).await
}

/// `GET /api/health`
pub async fn health(State(brevity): State<Arc<Brevity>>) -> Json<HealthResponse> {
    let registry = brevity.registry();
    Json(HealthResponse {
        status: "healthy",
        version: crate::version_string(),
        device: brevity.device().name(),
        models: ModelsHealth {
            summarizer: registry.state(SlotId::Summarizer),
            sentiment_classifier: registry.state(SlotId::SentimentClassifier),
        },
    })
}

fn bad_request(body: serde_json::Value) -> Response {
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Run a facade call on the blocking pool and serialize its result.
async fn run_blocking<T, F>(brevity: Arc<Brevity>, call: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Brevity) -> T + Send + 'static,
{
    match tokio::task::spawn_blocking(move || call(&brevity)).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            error!(error = %e, "inference task did not complete");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response()
        }
    }
}
