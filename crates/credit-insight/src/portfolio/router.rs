use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use super::domain::{RecommendationDecision, UserCreditProfile};
use super::report::{InsightKind, ReportKind};
use super::repository::{PortfolioRepository, RepositoryError};
use super::service::{PortfolioService, PortfolioServiceError};
use crate::commentary::{CommentaryError, CommentaryProvider};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default)]
    pub decision: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadQuery {
    /// Normalize loosely typed entries instead of rejecting them.
    #[serde(default)]
    pub lenient: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub report_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Router builder exposing portfolio, scoring, and reporting endpoints.
pub fn portfolio_router<R, C>(service: Arc<PortfolioService<R, C>>) -> Router
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    Router::new()
        .route("/api/v1/portfolio/generate", post(generate_handler::<R, C>))
        .route(
            "/api/v1/portfolio/users",
            get(users_handler::<R, C>).put(load_handler::<R, C>),
        )
        .route(
            "/api/v1/portfolio/users/:user_id",
            get(user_detail_handler::<R, C>),
        )
        .route(
            "/api/v1/portfolio/users/:user_id/analysis",
            get(user_analysis_handler::<R, C>),
        )
        .route(
            "/api/v1/portfolio/users/:user_id/insights/:kind",
            get(user_insight_handler::<R, C>),
        )
        .route("/api/v1/portfolio/chat", post(chat_handler::<R, C>))
        .route(
            "/api/v1/portfolio/recommendations",
            get(recommendations_handler::<R, C>),
        )
        .route("/api/v1/portfolio/metrics", get(metrics_handler::<R, C>))
        .route("/api/v1/portfolio/reports", post(report_handler::<R, C>))
        .route(
            "/api/v1/recommendations/evaluate",
            post(evaluate_handler::<R, C>),
        )
        .route(
            "/api/v1/metrics/calculate",
            post(calculate_handler::<R, C>),
        )
        .with_state(service)
}

pub(crate) async fn generate_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
    axum::Json(request): axum::Json<GenerateRequest>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    match service.generate(request.count) {
        Ok(users) => {
            let payload = json!({
                "count": users.len(),
                "users": users,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn load_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
    Query(query): Query<LoadQuery>,
    axum::Json(entries): axum::Json<Vec<Value>>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    let outcome = if query.lenient {
        service.load_lenient(&entries)
    } else {
        match serde_json::from_value::<Vec<UserCreditProfile>>(Value::Array(entries)) {
            Ok(profiles) => service.load(profiles),
            Err(error) => {
                let payload = json!({ "error": format!("invalid profile payload: {error}") });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
        }
    };

    match outcome {
        Ok(count) => (StatusCode::OK, axum::Json(json!({ "count": count }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn users_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    match service.users() {
        Ok(users) => (StatusCode::OK, axum::Json(json!({ "users": users }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn user_detail_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    match service.user_detail(&user_id) {
        Ok(detail) => (StatusCode::OK, axum::Json(detail)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn user_analysis_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    match offload(move || service.analyze_user(&user_id)).await {
        Ok(analysis) => (StatusCode::OK, axum::Json(analysis)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn user_insight_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
    Path((user_id, kind)): Path<(String, String)>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    let kind = match kind.parse::<InsightKind>() {
        Ok(kind) => kind,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match offload(move || service.user_insight(&user_id, kind)).await {
        Ok(insight) => (StatusCode::OK, axum::Json(insight)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn chat_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
    axum::Json(request): axum::Json<ChatRequest>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    let ChatRequest { question, user_id } = request;

    match offload(move || service.chat(&question, user_id.as_deref())).await {
        Ok(answer) => (StatusCode::OK, axum::Json(json!({ "answer": answer }))).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn recommendations_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
    Query(query): Query<RecommendationQuery>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    let decision = match query.decision.as_deref() {
        Some(raw) => match raw.parse::<RecommendationDecision>() {
            Ok(decision) => Some(decision),
            Err(error) => {
                let payload = json!({ "error": format!("invalid decision filter: {error}") });
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
        },
        None => None,
    };

    match service.recommendations(decision) {
        Ok(recommendations) => (
            StatusCode::OK,
            axum::Json(json!({ "recommendations": recommendations })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn metrics_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    match service.metrics() {
        Ok(metrics) => (StatusCode::OK, axum::Json(metrics)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
    axum::Json(request): axum::Json<ReportRequest>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    let kind = match request.report_type.parse::<ReportKind>() {
        Ok(kind) => kind,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match offload(move || service.report(kind)).await {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn evaluate_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
    axum::Json(profile): axum::Json<UserCreditProfile>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    let recommendation = service.evaluate(&profile);
    (StatusCode::OK, axum::Json(recommendation)).into_response()
}

pub(crate) async fn calculate_handler<R, C>(
    State(service): State<Arc<PortfolioService<R, C>>>,
    axum::Json(profiles): axum::Json<Vec<UserCreditProfile>>,
) -> Response
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    let assessment = service.assess_batch(&profiles);
    (StatusCode::OK, axum::Json(assessment)).into_response()
}

/// Runs service work that may wait on the commentary transport on the blocking pool.
async fn offload<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, PortfolioServiceError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(outcome) => outcome.map_err(error_response),
        Err(join_error) => {
            error!(error = %join_error, "portfolio task did not complete");
            let payload = json!({ "error": "portfolio task did not complete" });
            Err((StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response())
        }
    }
}

fn error_response(error: PortfolioServiceError) -> Response {
    let status = match &error {
        PortfolioServiceError::InvalidCount { .. } | PortfolioServiceError::EmptyQuestion => {
            StatusCode::BAD_REQUEST
        }
        PortfolioServiceError::UserNotFound(_) => StatusCode::NOT_FOUND,
        PortfolioServiceError::Repository(RepositoryError::DuplicateUser(_)) => {
            StatusCode::CONFLICT
        }
        PortfolioServiceError::Commentary(CommentaryError::NotConfigured) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        PortfolioServiceError::Commentary(_) => StatusCode::BAD_GATEWAY,
        PortfolioServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
