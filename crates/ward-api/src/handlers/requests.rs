//! Access request filing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::error::ApiResult;
use crate::models::{GrantListResponse, RequestAccessRequest};
use crate::router::ApiState;
use crate::session::Session;

/// File an access request for one or more arms.
pub async fn create(
    State(state): State<ApiState>,
    Session(session): Session,
    Json(body): Json<RequestAccessRequest>,
) -> ApiResult<(StatusCode, Json<GrantListResponse>)> {
    body.validate()?;
    let grants = state.engine.request_access(&session, body.into()).await?;
    Ok((StatusCode::CREATED, Json(grants.into())))
}
