use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};

use dreams_types::api::{CreateDmRequest, DmDetails, DmsResponse, TargetUserRequest};
use dreams_types::models::DmId;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::extract::{JsonBody, PathParam};
use crate::middleware::AuthUser;
use crate::store::with_db;

pub async fn create_dm(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): JsonBody<CreateDmRequest>,
) -> ApiResult<impl IntoResponse> {
    let created = with_db(&state, move |db| db.create_dm(user.user_id, &req.u_ids)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_dms(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<DmsResponse>> {
    let dms = with_db(&state, move |db| db.dm_list(user.user_id)).await?;
    Ok(Json(DmsResponse { dms }))
}

pub async fn dm_details(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(dm_id), _): PathParam<DmId>,
) -> ApiResult<Json<DmDetails>> {
    let details = with_db(&state, move |db| db.dm_details(user.user_id, dm_id)).await?;
    Ok(Json(details))
}

pub async fn remove_dm(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(dm_id), _): PathParam<DmId>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.remove_dm(user.user_id, dm_id)).await?;
    Ok(Json(json!({})))
}

pub async fn invite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(dm_id), _): PathParam<DmId>,
    WithRejection(Json(req), _): JsonBody<TargetUserRequest>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.dm_invite(user.user_id, dm_id, req.u_id)).await?;
    Ok(Json(json!({})))
}

pub async fn leave(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(dm_id), _): PathParam<DmId>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.dm_leave(user.user_id, dm_id)).await?;
    Ok(Json(json!({})))
}
