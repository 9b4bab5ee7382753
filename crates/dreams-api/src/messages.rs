use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{Value, json};

use dreams_types::api::{
    EditMessageRequest, MessageIdResponse, MessagesPage, SearchResponse, SendMessageRequest,
    ShareMessageRequest, SharedMessageResponse,
};
use dreams_types::models::{ChannelId, ContainerRef, DmId, MessageId};

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::middleware::AuthUser;
use crate::store::with_db;

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// How many messages back from the newest to begin the page.
    #[serde(default)]
    pub start: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query_str: String,
}

async fn send_to(
    state: &AppState,
    user: AuthUser,
    container: ContainerRef,
    body: String,
) -> ApiResult<(StatusCode, Json<MessageIdResponse>)> {
    let message_id = with_db(state, move |db| db.send(user.user_id, container, &body)).await?;
    Ok((StatusCode::CREATED, Json(MessageIdResponse { message_id })))
}

pub async fn send_channel_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(channel_id), _): PathParam<ChannelId>,
    WithRejection(Json(req), _): JsonBody<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    send_to(&state, user, ContainerRef::Channel(channel_id), req.message).await
}

pub async fn send_dm_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(dm_id), _): PathParam<DmId>,
    WithRejection(Json(req), _): JsonBody<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    send_to(&state, user, ContainerRef::Dm(dm_id), req.message).await
}

pub async fn channel_messages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(channel_id), _): PathParam<ChannelId>,
    WithRejection(Query(query), _): QueryParams<MessagesQuery>,
) -> ApiResult<Json<MessagesPage>> {
    let container = ContainerRef::Channel(channel_id);
    let page = with_db(&state, move |db| db.messages(user.user_id, container, query.start)).await?;
    Ok(Json(page))
}

pub async fn dm_messages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(dm_id), _): PathParam<DmId>,
    WithRejection(Query(query), _): QueryParams<MessagesQuery>,
) -> ApiResult<Json<MessagesPage>> {
    let container = ContainerRef::Dm(dm_id);
    let page = with_db(&state, move |db| db.messages(user.user_id, container, query.start)).await?;
    Ok(Json(page))
}

pub async fn edit_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(message_id), _): PathParam<MessageId>,
    WithRejection(Json(req), _): JsonBody<EditMessageRequest>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.edit(user.user_id, message_id, &req.message)).await?;
    Ok(Json(json!({})))
}

pub async fn remove_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(message_id), _): PathParam<MessageId>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.remove(user.user_id, message_id)).await?;
    Ok(Json(json!({})))
}

pub async fn pin_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(message_id), _): PathParam<MessageId>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.pin(user.user_id, message_id)).await?;
    Ok(Json(json!({})))
}

pub async fn unpin_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(message_id), _): PathParam<MessageId>,
) -> ApiResult<Json<Value>> {
    with_db(&state, move |db| db.unpin(user.user_id, message_id)).await?;
    Ok(Json(json!({})))
}

pub async fn share_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(message_id), _): PathParam<MessageId>,
    WithRejection(Json(req), _): JsonBody<ShareMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let shared_message_id = with_db(&state, move |db| {
        db.share(user.user_id, message_id, &req.message, req.target)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(SharedMessageResponse { shared_message_id }),
    ))
}

pub async fn search(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Query(query), _): QueryParams<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let messages = with_db(&state, move |db| db.search(user.user_id, &query.query_str)).await?;
    Ok(Json(SearchResponse { messages }))
}
