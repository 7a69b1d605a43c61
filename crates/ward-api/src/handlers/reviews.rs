//! Administrative review endpoints: approve, reject, revoke, and the
//! on-demand inactivity sweep.

use axum::extract::State;
use axum::Json;
use validator::Validate;
use ward_governance::conditions::{check_all, Precondition};

use crate::error::ApiResult;
use crate::models::{GrantListResponse, ReviewRequest, SweepResponse};
use crate::router::ApiState;
use crate::session::Session;

/// Approve the targeted grants.
pub async fn approve(
    State(state): State<ApiState>,
    Session(session): Session,
    Json(body): Json<ReviewRequest>,
) -> ApiResult<Json<GrantListResponse>> {
    body.validate()?;
    let grants = state.engine.approve_access(&session, body.into()).await?;
    Ok(Json(grants.into()))
}

/// Reject the targeted grants.
pub async fn reject(
    State(state): State<ApiState>,
    Session(session): Session,
    Json(body): Json<ReviewRequest>,
) -> ApiResult<Json<GrantListResponse>> {
    body.validate()?;
    let grants = state.engine.reject_access(&session, body.into()).await?;
    Ok(Json(grants.into()))
}

/// Revoke the targeted grants.
pub async fn revoke(
    State(state): State<ApiState>,
    Session(session): Session,
    Json(body): Json<ReviewRequest>,
) -> ApiResult<Json<GrantListResponse>> {
    body.validate()?;
    let grants = state.engine.revoke_access(&session, body.into()).await?;
    Ok(Json(grants.into()))
}

/// Run the inactivity sweep now. Admin only; the scheduler calls the same
/// engine entry point.
pub async fn run_sweep(
    State(state): State<ApiState>,
    Session(session): Session,
) -> ApiResult<Json<SweepResponse>> {
    let (caller, _) = state.engine.access_list(&session).await?;
    check_all(&[Precondition::AdminPermission(&caller)])?;

    let outcome = state.engine.run_inactivity_sweep().await?;
    Ok(Json(outcome.into()))
}
