use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CandidateFilter, CandidateId, Priority};
use super::repository::{CandidateRepository, RepositoryError};
use super::service::{PipelineService, PipelineServiceError};
use super::stages::StageId;

/// Router builder exposing the pipeline read models and mutations.
pub fn pipeline_router<R>(service: Arc<PipelineService<R>>) -> Router
where
    R: CandidateRepository + 'static,
{
    Router::new()
        .route("/api/v1/pipeline/stages", get(stages_handler::<R>))
        .route("/api/v1/pipeline/candidates", get(candidates_handler::<R>))
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/history",
            get(history_handler::<R>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/stage",
            post(move_handler::<R>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/priority",
            post(priority_handler::<R>),
        )
        .route("/api/v1/pipeline/analytics", get(analytics_handler::<R>))
        .route("/api/v1/pipeline/board", get(board_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CandidateQuery {
    pub(crate) job_id: Option<String>,
    pub(crate) priority: Option<String>,
    pub(crate) search: Option<String>,
}

impl CandidateQuery {
    fn into_filter(self) -> Result<CandidateFilter, String> {
        let priority = match self.priority.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Priority::parse(raw).ok_or_else(|| format!("unknown priority '{raw}'"))?,
            ),
        };
        Ok(CandidateFilter {
            job_id: self.job_id.filter(|value| !value.trim().is_empty()),
            priority,
            search: self.search,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoveRequest {
    pub(crate) stage_id: StageId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PriorityRequest {
    pub(crate) priority: Priority,
}

pub(crate) async fn stages_handler<R>(State(service): State<Arc<PipelineService<R>>>) -> Response
where
    R: CandidateRepository + 'static,
{
    let stages: Vec<_> = service.stages().into_iter().cloned().collect();
    (StatusCode::OK, axum::Json(stages)).into_response()
}

pub(crate) async fn candidates_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Query(query): Query<CandidateQuery>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    let filter = match query.into_filter() {
        Ok(filter) => filter,
        Err(message) => return bad_request(message),
    };
    match service.get_candidates(&filter) {
        Ok(candidates) => (StatusCode::OK, axum::Json(candidates)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn history_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    match service.stage_history(&CandidateId(candidate_id)) {
        Ok(history) => (StatusCode::OK, axum::Json(history)).into_response(),
        Err(err) => service_error(err),
    }
}

/// Commit phase only: no stage-change e-mail or toast is produced here.
/// Callers that need those go through
/// [`BoardController`](super::board::BoardController), which runs the
/// notification phase after the commit.
pub(crate) async fn move_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Path(candidate_id): Path<String>,
    axum::Json(request): axum::Json<MoveRequest>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    let id = CandidateId(candidate_id);
    match service.move_candidate_to_stage(&id, &request.stage_id) {
        Ok(Some(candidate)) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        Ok(None) => not_found(&id),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn priority_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Path(candidate_id): Path<String>,
    axum::Json(request): axum::Json<PriorityRequest>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    let id = CandidateId(candidate_id);
    match service.update_candidate_priority(&id, request.priority) {
        Ok(Some(candidate)) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        Ok(None) => not_found(&id),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn analytics_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    match service.get_pipeline_analytics() {
        Ok(analytics) => (StatusCode::OK, axum::Json(analytics)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn board_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Query(query): Query<CandidateQuery>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    let filter = match query.into_filter() {
        Ok(filter) => filter,
        Err(message) => return bad_request(message),
    };
    match service.group_by_stage(&filter) {
        Ok(groups) => (StatusCode::OK, axum::Json(groups)).into_response(),
        Err(err) => service_error(err),
    }
}

fn bad_request(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

fn not_found(id: &CandidateId) -> Response {
    let payload = json!({
        "candidate_id": id.0,
        "error": "candidate or stage not found",
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn service_error(err: PipelineServiceError) -> Response {
    let status = match &err {
        PipelineServiceError::TerminalStage { .. }
        | PipelineServiceError::Repository(RepositoryError::VersionConflict { .. }) => {
            StatusCode::CONFLICT
        }
        PipelineServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
