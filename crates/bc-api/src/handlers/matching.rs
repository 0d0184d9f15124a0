use axum::{extract::State, Json};

use bc_common::api::MatchingRunResponse;
use bc_common::matching::MatchingRunRequest;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

/// Run the requested algorithm and return its statistics.
pub async fn run(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<MatchingRunRequest>,
) -> Result<Json<MatchingRunResponse>, ApiError> {
    let result = state.matching.run(&request).await?;
    Ok(Json(MatchingRunResponse::from(result)))
}

/// Same as [`run`] but with `recompute` forced on, wiping prior results in
/// the requested scope before scoring.
pub async fn recompute(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<MatchingRunRequest>,
) -> Result<Json<MatchingRunResponse>, ApiError> {
    let forced = request.with_recompute(true);

    let result = state.matching.run(&forced).await?;
    Ok(Json(MatchingRunResponse::from(result)))
}
