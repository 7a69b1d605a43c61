//! User registration, login recording, self-service reads, and admin edits.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::error::ApiResult;
use crate::models::{
    AccessListResponse, EditUserRequest, RegisterRequest, UserResponse,
};
use crate::router::ApiState;
use crate::session::Session;

/// Register the authenticated identity as a new user.
pub async fn register(
    State(state): State<ApiState>,
    Session(session): Session,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    body.validate()?;
    let user = state.engine.register_user(&session, body.into()).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Record a successful login for the authenticated identity.
pub async fn record_login(
    State(state): State<ApiState>,
    Session(session): Session,
) -> ApiResult<StatusCode> {
    state.engine.record_login(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own record and live grants.
pub async fn my_access(
    State(state): State<ApiState>,
    Session(session): Session,
) -> ApiResult<Json<AccessListResponse>> {
    let (user, grants) = state.engine.access_list(&session).await?;
    Ok(Json(AccessListResponse {
        user: user.into(),
        grants: grants.into_iter().map(Into::into).collect(),
    }))
}

/// Administrative edit of another user.
pub async fn edit_user(
    State(state): State<ApiState>,
    Session(session): Session,
    Json(body): Json<EditUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    body.validate()?;
    let user = state.engine.edit_user(&session, body.into()).await?;
    Ok(Json(user.into()))
}
