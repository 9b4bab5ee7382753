use serde::{Deserialize, Serialize};

use crate::models::{ChannelId, ContainerRef, DmId, MessageId, ReactId, UserId};

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name_first: String,
    pub name_last: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub auth_user_id: UserId,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub is_success: bool,
}

// -- Users --

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub u_id: UserId,
    pub email: String,
    pub name_first: String,
    pub name_last: String,
    pub handle_str: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetNameRequest {
    pub name_first: String,
    pub name_last: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetHandleRequest {
    pub handle_str: String,
}

// -- Channels --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChannelRequest {
    pub name: String,
    pub is_public: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelIdResponse {
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel_id: ChannelId,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelsResponse {
    pub channels: Vec<ChannelSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDetails {
    pub name: String,
    pub is_public: bool,
    pub owner_members: Vec<UserProfile>,
    pub all_members: Vec<UserProfile>,
}

/// Body for invite / add-owner style calls that name one other user.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetUserRequest {
    pub u_id: UserId,
}

// -- DMs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDmRequest {
    pub u_ids: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmCreatedResponse {
    pub dm_id: DmId,
    pub dm_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmSummary {
    pub dm_id: DmId,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DmsResponse {
    pub dms: Vec<DmSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmDetails {
    pub name: String,
    pub members: Vec<UserProfile>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageIdResponse {
    pub message_id: MessageId,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditMessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareMessageRequest {
    /// Optional text appended after the shared message.
    #[serde(default)]
    pub message: String,
    pub target: ContainerRef,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SharedMessageResponse {
    pub shared_message_id: MessageId,
}

/// A message as clients see it; the container is implied by the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    pub message_id: MessageId,
    pub u_id: UserId,
    pub message: String,
    /// Unix seconds.
    pub time_created: i64,
    pub reacts: Vec<ReactView>,
    pub is_pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactView {
    pub react_id: ReactId,
    pub u_ids: Vec<UserId>,
    pub is_this_user_reacted: bool,
}

/// One page of history, newest first. `end` is -1 once the oldest message
/// has been returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesPage {
    pub messages: Vec<MessageView>,
    pub start: usize,
    pub end: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub messages: Vec<MessageView>,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactRequest {
    pub react_id: ReactId,
}

// -- Notifications --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationView {
    pub container: ContainerRef,
    pub notification_message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<NotificationView>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
