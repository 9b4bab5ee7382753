use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};

use dreams_types::api::{
    ChannelDetails, ChannelIdResponse, ChannelsResponse, CreateChannelRequest, TargetUserRequest,
};
use dreams_types::models::{ChannelId, UserId};

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::extract::{JsonBody, PathParam};
use crate::middleware::AuthUser;
use crate::store::with_db;

pub async fn create_channel(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): JsonBody<CreateChannelRequest>,
) -> ApiResult<impl IntoResponse> {
    let channel_id = with_db(&state, move |db| {
        db.create_channel(user.user_id, &req.name, req.is_public)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(ChannelIdResponse { channel_id })))
}

/// Channels the caller is in.
pub async fn list_channels(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ChannelsResponse>> {
    let channels = with_db(&state, move |db| db.channels_list(user.user_id)).await?;
    Ok(Json(ChannelsResponse { channels }))
}

pub async fn list_all_channels(State(state): State<AppState>) -> ApiResult<Json<ChannelsResponse>> {
    let channels = with_db(&state, |db| db.channels_listall()).await?;
    Ok(Json(ChannelsResponse { channels }))
}

pub async fn channel_details(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(channel_id), _): PathParam<ChannelId>,
) -> ApiResult<Json<ChannelDetails>> {
    let details = with_db(&state, move |db| db.channel_details(user.user_id, channel_id)).await?;
    Ok(Json(details))
}

pub async fn invite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(channel_id), _): PathParam<ChannelId>,
    WithRejection(Json(req), _): JsonBody<TargetUserRequest>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.channel_invite(user.user_id, channel_id, req.u_id)).await?;
    Ok(Json(json!({})))
}

pub async fn join(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(channel_id), _): PathParam<ChannelId>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.channel_join(user.user_id, channel_id)).await?;
    Ok(Json(json!({})))
}

pub async fn leave(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(channel_id), _): PathParam<ChannelId>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.channel_leave(user.user_id, channel_id)).await?;
    Ok(Json(json!({})))
}

pub async fn add_owner(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(channel_id), _): PathParam<ChannelId>,
    WithRejection(Json(req), _): JsonBody<TargetUserRequest>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.channel_add_owner(user.user_id, channel_id, req.u_id)).await?;
    Ok(Json(json!({})))
}

pub async fn remove_owner(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path((channel_id, target)), _): PathParam<(ChannelId, UserId)>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.channel_remove_owner(user.user_id, channel_id, target)).await?;
    Ok(Json(json!({})))
}
