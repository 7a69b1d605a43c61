//! Arm catalog reads.

use axum::extract::State;
use axum::Json;

use crate::error::ApiResult;
use crate::models::ArmResponse;
use crate::router::ApiState;

/// List the requestable arms.
pub async fn list(State(state): State<ApiState>) -> ApiResult<Json<Vec<ArmResponse>>> {
    let arms = state.engine.list_arms().await?;
    Ok(Json(arms.into_iter().map(Into::into).collect()))
}
