//! HTTP API gateway for riskiq.
//!
//! The server starts listening immediately and builds the pipeline (ingest,
//! embed, load or rebuild the vector index) in a background task. Until that
//! finishes, `/health` reports `initializing` and every `/v1` route answers
//! 503. If initialization fails the state becomes `failed` and stays there.
//!
//! Built on Axum.

pub mod api_v1;
pub mod bootstrap;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::Json,
    routing::get,
};
use riskiq_assessment::AssessmentService;
use riskiq_config::AppConfig;
use riskiq_index::{Corpus, VectorIndex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

/// Pipeline lifecycle as seen by the readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Initializing,
    Ready { chunks: usize },
    Failed(String),
}

/// The live index and the folder it is rebuilt from.
struct IndexHandle {
    index: Arc<VectorIndex>,
    corpus: Corpus,
}

/// Shared application state for the gateway.
pub struct AppState {
    pub config: AppConfig,
    pub start_time: chrono::DateTime<chrono::Utc>,
    readiness: RwLock<Readiness>,
    service: OnceCell<Arc<AssessmentService>>,
    index: OnceCell<IndexHandle>,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            start_time: chrono::Utc::now(),
            readiness: RwLock::new(Readiness::Initializing),
            service: OnceCell::new(),
            index: OnceCell::new(),
        }
    }

    pub async fn readiness(&self) -> Readiness {
        self.readiness.read().await.clone()
    }

    pub async fn mark_ready(&self, service: Arc<AssessmentService>, chunks: usize) {
        if self.service.set(service).is_err() {
            warn!("Assessment service was already initialized");
        }
        *self.readiness.write().await = Readiness::Ready { chunks };
    }

    /// Make the index available to `/v1/index/rebuild`.
    pub fn attach_index(&self, index: Arc<VectorIndex>, corpus: Corpus) {
        if self.index.set(IndexHandle { index, corpus }).is_err() {
            warn!("Vector index was already attached");
        }
    }

    /// Re-ingest the corpus and swap in the new index. Queries keep reading the
    /// old index until the swap; on failure the old index stays in place.
    pub async fn rebuild_index(&self) -> Result<usize, ApiError> {
        self.service().await?;
        let Some(handle) = self.index.get() else {
            return Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Service not ready: no vector index attached",
            ));
        };
        let chunks = handle.index.rebuild(&handle.corpus).await.map_err(|e| {
            error!(error = %e, corpus = %handle.corpus.dir().display(), "Index rebuild failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Index rebuild failed: {e}"))
        })?;
        *self.readiness.write().await = Readiness::Ready { chunks };
        Ok(chunks)
    }

    pub async fn mark_failed(&self, reason: impl Into<String>) {
        *self.readiness.write().await = Readiness::Failed(reason.into());
    }

    /// The service, or a 503 carrying the reason it is unavailable.
    pub async fn service(&self) -> Result<Arc<AssessmentService>, ApiError> {
        match (&*self.readiness.read().await, self.service.get()) {
            (Readiness::Ready { .. }, Some(service)) => Ok(service.clone()),
            (Readiness::Failed(reason), _) => Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Service not ready: initialization failed: {reason}"),
            )),
            _ => Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Service not ready: the document index is still being built",
            )),
        }
    }
}

/// Build the full router: `/health`, the `/v1` API, and the HTTP layers.
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway.allowed_origins);
    let body_limit = state.config.gateway.max_body_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Build the pipeline and publish the outcome to `state`.
pub async fn initialize(state: SharedState) {
    match bootstrap::build_pipeline(&state.config).await {
        Ok(pipeline) => {
            let chunks = pipeline.index.len().await;
            state.attach_index(pipeline.index, pipeline.corpus);
            state.mark_ready(pipeline.service, chunks).await;
            info!(chunks, "Gateway ready");
        }
        Err(e) => {
            error!(error = %e, "Pipeline initialization failed; service will report not-ready");
            state.mark_failed(e.to_string()).await;
        }
    }
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state: SharedState = Arc::new(AppState::new(config));

    tokio::spawn(initialize(state.clone()));

    let app = build_router(state);
    info!(addr = %addr, "Gateway listening; building document index in the background");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub version: String,
    pub uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let uptime_secs = (chrono::Utc::now() - state.start_time).num_seconds();
    let (code, status, chunks, detail) = match state.readiness().await {
        Readiness::Ready { chunks } => (StatusCode::OK, "ready", chunks, None),
        Readiness::Initializing => (
            StatusCode::SERVICE_UNAVAILABLE,
            "initializing",
            0,
            Some("Building the document index".to_string()),
        ),
        Readiness::Failed(reason) => (StatusCode::SERVICE_UNAVAILABLE, "failed", 0, Some(reason)),
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            chunks,
            detail,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs,
        }),
    )
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn health(state: SharedState) -> (StatusCode, HealthResponse) {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_while_initializing() {
        let state = Arc::new(AppState::new(AppConfig::default()));
        let (status, body) = health(state).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "initializing");
    }

    #[tokio::test]
    async fn health_when_ready() {
        let state = test_support::ready_state(vec![]).await;
        let (status, body) = health(state).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");
        assert_eq!(body.chunks, 3);
        assert!(body.detail.is_none());
    }

    #[tokio::test]
    async fn health_after_failure() {
        let state = Arc::new(AppState::new(AppConfig::default()));
        state.mark_failed("No extractable documents in data/").await;
        let (status, body) = health(state.clone()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "failed");
        assert!(body.detail.unwrap().contains("data/"));

        let err = state.service().await.err().unwrap();
        assert_eq!(err.0, StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.1.error.contains("No extractable documents"));
    }

    #[tokio::test]
    async fn initialize_with_missing_corpus_fails() {
        let mut config = AppConfig::default();
        config.corpus.data_dir = "/nonexistent/riskiq-corpus".into();
        config.index.path = std::env::temp_dir().join("riskiq-gateway-missing-corpus-index");
        let state = Arc::new(AppState::new(config));
        initialize(state.clone()).await;
        match state.readiness().await {
            Readiness::Failed(reason) => assert!(reason.contains("riskiq-corpus")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn cors_accepts_lists_and_wildcard() {
        let _ = cors_layer(&["*".to_string()]);
        let _ = cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
    }
}
