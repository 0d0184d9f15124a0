use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use bc_common::api::MatchingResultResponse;
use bc_common::db;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

const MAX_RESULT_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResultsQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub above_threshold: Option<bool>,
}

/// Results for one student, best first. Optional `limit` (top-N) and
/// `aboveThreshold=true` narrowing.
pub async fn list_for_student(
    State(state): State<SharedState>,
    Path(student_id): Path<i64>,
    Query(query): Query<StudentResultsQuery>,
    _auth: AuthUser,
) -> Result<Json<Vec<MatchingResultResponse>>, ApiError> {
    if !db::student_exists(&state.pool, student_id).await? {
        return Err(ApiError::NotFound(format!("student {student_id} not found")));
    }

    let limit = match query.limit {
        Some(limit) if limit <= 0 => {
            return Err(ApiError::BadRequest("limit must be positive".into()));
        }
        Some(limit) => Some(limit.min(MAX_RESULT_LIMIT)),
        None => None,
    };

    let results = db::fetch_results_by_student(
        &state.pool,
        student_id,
        query.above_threshold.unwrap_or(false),
        limit,
    )
    .await?;

    Ok(Json(results.into_iter().map(Into::into).collect()))
}

/// Results for one project, best first.
pub async fn list_for_project(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    _auth: AuthUser,
) -> Result<Json<Vec<MatchingResultResponse>>, ApiError> {
    if !db::project_exists(&state.pool, project_id).await? {
        return Err(ApiError::NotFound(format!("project {project_id} not found")));
    }

    let results = db::fetch_results_by_project(&state.pool, project_id).await?;

    Ok(Json(results.into_iter().map(Into::into).collect()))
}

/// Every record one session produced, grouped by student, best first.
pub async fn list_for_session(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<Vec<MatchingResultResponse>>, ApiError> {
    let results = db::fetch_results_by_session(&state.pool, &session_id).await?;

    Ok(Json(results.into_iter().map(Into::into).collect()))
}

/// Drop every record one session produced.
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = db::delete_results_by_session(&state.pool, &session_id).await?;

    Ok(Json(json!({ "sessionId": session_id, "deleted": deleted })))
}
