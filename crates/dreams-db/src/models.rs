//! Stored entity types. These carry private fields (password hashes, container
//! refs) and are projected into `dreams_types::api` views before leaving the crate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dreams_types::api::{ChannelSummary, DmSummary, MessageView, ReactView, UserProfile};
use dreams_types::models::{
    ChannelId, ContainerRef, DmId, MessageId, Permission, ReactId, SessionId, UserId,
};

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub name_first: String,
    pub name_last: String,
    pub handle: String,
    pub permission: Permission,
}

impl UserRow {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            u_id: self.id,
            email: self.email.clone(),
            name_first: self.name_first.clone(),
            name_last: self.name_last.clone(),
            handle_str: self.handle.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRow {
    pub id: ChannelId,
    pub name: String,
    pub is_public: bool,
    /// Always a subset of `all_members`.
    pub owner_members: Vec<UserId>,
    pub all_members: Vec<UserId>,
}

impl ChannelRow {
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.all_members.contains(&user_id)
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_members.contains(&user_id)
    }

    pub fn summary(&self) -> ChannelSummary {
        ChannelSummary {
            channel_id: self.id,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmRow {
    pub id: DmId,
    /// Fixed at creation; later invites and leaves do not rename the DM.
    pub name: String,
    pub creator: UserId,
    pub members: Vec<UserId>,
}

impl DmRow {
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }

    pub fn summary(&self) -> DmSummary {
        DmSummary {
            dm_id: self.id,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionRow {
    pub react_id: ReactId,
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: MessageId,
    pub container: ContainerRef,
    pub sender: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub is_pinned: bool,
    pub reactions: Vec<ReactionRow>,
}

impl MessageRow {
    /// Public projection as seen by `viewer`.
    pub fn view(&self, viewer: UserId) -> MessageView {
        MessageView {
            message_id: self.id,
            u_id: self.sender,
            message: self.body.clone(),
            time_created: self.created_at.timestamp(),
            reacts: self
                .reactions
                .iter()
                .map(|r| ReactView {
                    react_id: r.react_id,
                    u_ids: r.user_ids.clone(),
                    is_this_user_reacted: r.user_ids.contains(&viewer),
                })
                .collect(),
            is_pinned: self.is_pinned,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRow {
    pub recipient: UserId,
    pub container: ContainerRef,
    pub message: String,
}

/// Everything the server knows, persisted as one unit by a `Repository`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: BTreeMap<UserId, UserRow>,
    pub sessions: BTreeMap<SessionId, UserId>,
    pub channels: BTreeMap<ChannelId, ChannelRow>,
    pub dms: BTreeMap<DmId, DmRow>,
    /// Append-only log ordered by id.
    pub messages: Vec<MessageRow>,
    pub notifications: Vec<NotificationRow>,
    pub next_dm_id: u32,
    pub next_message_id: u32,
}

impl Snapshot {
    pub fn user(&self, id: UserId) -> Option<&UserRow> {
        self.users.get(&id)
    }

    pub fn is_global_owner(&self, id: UserId) -> bool {
        self.user(id)
            .is_some_and(|u| u.permission == Permission::Owner)
    }

    pub fn profile(&self, id: UserId) -> Option<UserProfile> {
        self.user(id).map(UserRow::profile)
    }

    pub fn profiles(&self, ids: &[UserId]) -> Vec<UserProfile> {
        ids.iter().filter_map(|id| self.profile(*id)).collect()
    }

    pub fn handle_taken(&self, handle: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.handle == handle && Some(u.id) != except)
    }

    pub fn channel(&self, id: ChannelId) -> DbResult<&ChannelRow> {
        self.channels
            .get(&id)
            .ok_or_else(|| DbError::not_found(format!("channel {}", id)))
    }

    pub fn channel_mut(&mut self, id: ChannelId) -> DbResult<&mut ChannelRow> {
        self.channels
            .get_mut(&id)
            .ok_or_else(|| DbError::not_found(format!("channel {}", id)))
    }

    pub fn dm(&self, id: DmId) -> DbResult<&DmRow> {
        self.dms
            .get(&id)
            .ok_or_else(|| DbError::not_found(format!("dm {}", id)))
    }

    pub fn dm_mut(&mut self, id: DmId) -> DbResult<&mut DmRow> {
        self.dms
            .get_mut(&id)
            .ok_or_else(|| DbError::not_found(format!("dm {}", id)))
    }

    pub fn members(&self, container: ContainerRef) -> DbResult<&[UserId]> {
        match container {
            ContainerRef::Channel(id) => Ok(&self.channel(id)?.all_members),
            ContainerRef::Dm(id) => Ok(&self.dm(id)?.members),
        }
    }

    pub fn container_name(&self, container: ContainerRef) -> DbResult<&str> {
        match container {
            ContainerRef::Channel(id) => Ok(&self.channel(id)?.name),
            ContainerRef::Dm(id) => Ok(&self.dm(id)?.name),
        }
    }

    /// `NotFound` if the container is unknown, `Auth` if `actor` is not in it.
    pub fn require_member(&self, container: ContainerRef, actor: UserId) -> DbResult<()> {
        if self.members(container)?.contains(&actor) {
            Ok(())
        } else {
            Err(DbError::auth(format!("user {} is not a member of {}", actor, container)))
        }
    }

    pub fn message_index(&self, id: MessageId) -> DbResult<usize> {
        // The log is sorted by id.
        self.messages
            .binary_search_by_key(&id, |m| m.id)
            .map_err(|_| DbError::not_found(format!("message {}", id)))
    }

    pub fn handle_of(&self, id: UserId) -> &str {
        self.user(id).map(|u| u.handle.as_str()).unwrap_or("unknown")
    }
}

/// Push `id` unless already present. Returns whether it was added.
pub(crate) fn insert_unique(ids: &mut Vec<UserId>, id: UserId) -> bool {
    if ids.contains(&id) {
        false
    } else {
        ids.push(id);
        true
    }
}
