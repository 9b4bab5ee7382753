use axum::{
    Extension, Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};

use dreams_types::api::ReactRequest;
use dreams_types::models::MessageId;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::extract::{JsonBody, PathParam};
use crate::middleware::AuthUser;
use crate::store::with_db;

pub async fn react(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(message_id), _): PathParam<MessageId>,
    WithRejection(Json(req), _): JsonBody<ReactRequest>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.react(user.user_id, message_id, req.react_id)).await?;
    Ok(Json(json!({})))
}

pub async fn unreact(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(message_id), _): PathParam<MessageId>,
    WithRejection(Json(req), _): JsonBody<ReactRequest>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.unreact(user.user_id, message_id, req.react_id)).await?;
    Ok(Json(json!({})))
}
