//! HTTP API v1: the assessment surface.
//!
//! Endpoints:
//!
//! - `GET  /v1/categories`                       - The risk catalogue
//! - `POST /v1/assessments`                      - Submit a company profile, get questions
//! - `POST /v1/assessments/{session_id}/answers` - Submit answers, get the report
//! - `POST /v1/query`                            - Ask a question against the corpus
//! - `POST /v1/index/rebuild`                    - Re-ingest the corpus and swap in a new index

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use riskiq_assessment::{Answer, AssessmentReport, AssessmentStart};
use riskiq_core::error::AssessmentError;
use riskiq_core::risk::{CompanyProfile, RiskAnswer, RiskCategory};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{ApiError, SharedState, api_error};

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/categories", get(list_categories_handler))
        .route("/assessments", post(create_assessment_handler))
        .route("/assessments/{session_id}/answers", post(submit_answers_handler))
        .route("/query", post(query_handler))
        .route("/index/rebuild", post(rebuild_index_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub categories: Vec<RiskCategory>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswersRequest {
    #[serde(default)]
    pub answers: Vec<RiskAnswer>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RebuildResponse {
    pub chunks: usize,
}

/// Map a pipeline error to a status code and a human-readable cause.
fn assessment_error(err: AssessmentError) -> ApiError {
    let status = match &err {
        AssessmentError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        AssessmentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AssessmentError::Generation(_) => StatusCode::BAD_GATEWAY,
        AssessmentError::Catalogue(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if err.is_client_error() {
        warn!(error = %err, "Rejected request");
    } else {
        error!(error = %err, "Request failed");
    }
    api_error(status, err.to_string())
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn list_categories_handler(State(state): State<SharedState>) -> Result<Json<CategoryListResponse>, ApiError> {
    let service = state.service().await?;
    let categories = service.categories().to_vec();
    Ok(Json(CategoryListResponse { count: categories.len(), categories }))
}

async fn create_assessment_handler(
    State(state): State<SharedState>,
    Json(profile): Json<CompanyProfile>,
) -> Result<(StatusCode, Json<AssessmentStart>), ApiError> {
    let service = state.service().await?;
    info!(industry = %profile.industry, size = %profile.size, "v1/assessments request");
    let start = service.initialize_assessment(profile).await.map_err(assessment_error)?;
    Ok((StatusCode::CREATED, Json(start)))
}

async fn submit_answers_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<Json<AssessmentReport>, ApiError> {
    let service = state.service().await?;
    info!(session_id = %session_id, answers = payload.answers.len(), "v1/assessments answers request");
    let report = service
        .submit_answers(&session_id, payload.answers)
        .await
        .map_err(assessment_error)?;
    Ok(Json(report))
}

async fn query_handler(
    State(state): State<SharedState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<Answer>, ApiError> {
    let service = state.service().await?;
    info!(question_len = payload.question.len(), "v1/query request");
    let answer = service.ask(&payload.question).await.map_err(assessment_error)?;
    Ok(Json(answer))
}

async fn rebuild_index_handler(State(state): State<SharedState>) -> Result<Json<RebuildResponse>, ApiError> {
    info!("v1/index/rebuild request");
    let chunks = state.rebuild_index().await?;
    Ok(Json(RebuildResponse { chunks }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppState;
    use crate::test_support::{attach_stix_index, ready_state, ready_state_with_failing_provider};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use riskiq_config::AppConfig;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    const ADVICE: &str = r#"{"recommendations":["Enforce MFA for contractors"],"resources":[{"title":"CIS Controls","url":"https://www.cisecurity.org/controls"}],"rawLLMOutput":"Elevated risk."}"#;

    async fn send(state: SharedState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = crate::build_router(state).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn routes_are_gated_until_ready() {
        let state = Arc::new(AppState::new(AppConfig::default()));
        let (status, body) = send(state.clone(), "GET", "/v1/categories", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("not ready"));

        let (status, _) = send(state, "POST", "/v1/assessments", Some(json!({"industry": "Retail"}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn list_categories() {
        let (status, body) = send(ready_state(vec![]).await, "GET", "/v1/categories", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["count"].as_u64().unwrap() >= 20);
        assert!(body["categories"][0]["scoringFocus"].is_string());
    }

    #[tokio::test]
    async fn assessment_round_trip() {
        let state = ready_state(vec![ADVICE]).await;

        let (status, start) = send(
            state.clone(),
            "POST",
            "/v1/assessments",
            Some(json!({"industry": "Healthcare", "size": "Small", "emergingTechnologies": ["AI"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let session_id = start["sessionId"].as_str().unwrap().to_string();
        let questions = start["questions"].as_array().unwrap();
        assert!(questions.len() >= 20);
        assert!(questions.iter().all(|q| !q["questionText"].as_str().unwrap().is_empty()));

        let (status, report) = send(
            state,
            "POST",
            &format!("/v1/assessments/{session_id}/answers"),
            Some(json!({"answers": [
                {"categoryId": "identity_access", "answerText": "We have comprehensive, fully implemented MFA and RBAC across all systems"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["recommendations"], json!(["Enforce MFA for contractors"]));
        assert_eq!(report["resources"][0]["title"], "CIS Controls");
        assert!(report["overallWeightedScore"].as_f64().unwrap() > 0.0);
        assert_eq!(report["riskLevel"], "Critical");
        assert!(report["riskTable"].as_array().unwrap().len() >= 20);
        assert!(report["dataInsights"].as_array().unwrap().len() >= 2);
        assert_eq!(report["rawModelOutput"], ADVICE);
    }

    #[tokio::test]
    async fn answers_for_unknown_session_are_rejected() {
        let (status, body) = send(
            ready_state(vec![]).await,
            "POST",
            "/v1/assessments/does-not-exist/answers",
            Some(json!({"answers": []})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("does-not-exist"));
    }

    #[tokio::test]
    async fn malformed_body_is_client_error() {
        let (status, _) = send(ready_state(vec![]).await, "POST", "/v1/query", Some(json!({"nope": 1}))).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn query_returns_answer_and_sources() {
        let state = ready_state(vec!["Enable MFA on all remote access."]).await;
        let (status, body) = send(state, "POST", "/v1/query", Some(json!({"question": "What about MFA?"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "Enable MFA on all remote access.");
        assert_eq!(body["sources"].as_array().unwrap().len(), 3);
        assert_eq!(body["sources"][0]["source"], "handbook.pdf");
    }

    #[tokio::test]
    async fn blank_query_is_bad_request() {
        let (status, _) = send(ready_state(vec![]).await, "POST", "/v1/query", Some(json!({"question": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generation_failure_is_bad_gateway() {
        let state = ready_state_with_failing_provider().await;
        let (status, body) = send(state, "POST", "/v1/query", Some(json!({"question": "What about MFA?"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("Rate limited"));
    }

    #[tokio::test]
    async fn rebuild_swaps_in_the_current_corpus() {
        let state = ready_state(vec![]).await;
        let corpus_dir = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        attach_stix_index(&state, corpus_dir.path(), index_dir.path(), &["Phishing", "Valid Accounts"]).await;

        crate::test_support::write_stix(corpus_dir.path(), &["Phishing"]);
        let (status, body) = send(state.clone(), "POST", "/v1/index/rebuild", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chunks"], 1);

        let (status, health) = send(state, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["chunks"], 1);
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_the_old_index() {
        let state = ready_state(vec![]).await;
        let corpus_dir = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        attach_stix_index(&state, corpus_dir.path(), index_dir.path(), &["Phishing", "Valid Accounts"]).await;

        std::fs::remove_file(corpus_dir.path().join("enterprise-attack.json")).unwrap();
        let (status, body) = send(state.clone(), "POST", "/v1/index/rebuild", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("rebuild failed"));

        let (_, health) = send(state, "GET", "/health", None).await;
        assert_eq!(health["chunks"], 3);
    }

    #[tokio::test]
    async fn rebuild_without_index_is_unavailable() {
        let (status, _) = send(ready_state(vec![]).await, "POST", "/v1/index/rebuild", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let pending = Arc::new(AppState::new(AppConfig::default()));
        let (status, _) = send(pending, "POST", "/v1/index/rebuild", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
