use axum::{
    Extension, Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};

use dreams_types::api::{
    SetEmailRequest, SetHandleRequest, SetNameRequest, UserResponse, UsersResponse,
};
use dreams_types::models::UserId;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::extract::{JsonBody, PathParam};
use crate::middleware::AuthUser;
use crate::store::with_db;

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UsersResponse>> {
    let users = with_db(&state, |db| db.users_all()).await?;
    Ok(Json(UsersResponse { users }))
}

pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(u_id), _): PathParam<UserId>,
) -> ApiResult<Json<UserResponse>> {
    let user = with_db(&state, move |db| db.user_profile(u_id)).await?;
    Ok(Json(UserResponse { user }))
}

pub async fn set_name(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): JsonBody<SetNameRequest>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| {
        db.set_name(user.user_id, &req.name_first, &req.name_last)
    })
    .await?;
    Ok(Json(json!({})))
}

pub async fn set_email(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): JsonBody<SetEmailRequest>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.set_email(user.user_id, &req.email)).await?;
    Ok(Json(json!({})))
}

pub async fn set_handle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): JsonBody<SetHandleRequest>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.set_handle(user.user_id, &req.handle_str)).await?;
    Ok(Json(json!({})))
}
