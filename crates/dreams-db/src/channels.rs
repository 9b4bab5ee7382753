use std::ops::RangeInclusive;

use tracing::info;

use dreams_types::api::{ChannelDetails, ChannelSummary};
use dreams_types::models::{ChannelId, ContainerRef, UserId};

use crate::Database;
use crate::error::{DbError, DbResult};
use crate::models::{ChannelRow, Snapshot, insert_unique};
use crate::notifications;

const CHANNEL_NAME_LEN: RangeInclusive<usize> = 1..=20;

fn require_user(tables: &Snapshot, id: UserId) -> DbResult<()> {
    match tables.user(id) {
        Some(_) => Ok(()),
        None => Err(DbError::not_found(format!("user {}", id))),
    }
}

/// Channel owners and global owners may manage a channel's owner list.
fn require_channel_admin(tables: &Snapshot, channel: &ChannelRow, actor: UserId) -> DbResult<()> {
    if channel.is_owner(actor) || tables.is_global_owner(actor) {
        Ok(())
    } else {
        Err(DbError::auth(format!(
            "user {} cannot manage owners of channel {}",
            actor, channel.id
        )))
    }
}

impl Database {
    pub fn create_channel(&self, owner: UserId, name: &str, is_public: bool) -> DbResult<ChannelId> {
        if !CHANNEL_NAME_LEN.contains(&name.chars().count()) {
            return Err(DbError::validation("channel name must be 1-20 characters"));
        }

        self.with_tables_mut(|t| {
            require_user(t, owner)?;

            let id = ChannelId(t.channels.len() as u32);
            t.channels.insert(
                id,
                ChannelRow {
                    id,
                    name: name.to_string(),
                    is_public,
                    owner_members: vec![owner],
                    all_members: vec![owner],
                },
            );
            info!("User {} created channel {} '{}'", owner, id, name);
            Ok(id)
        })
    }

    /// Channels `actor` belongs to.
    pub fn channels_list(&self, actor: UserId) -> DbResult<Vec<ChannelSummary>> {
        self.with_tables(|t| {
            Ok(t.channels
                .values()
                .filter(|c| c.is_member(actor))
                .map(ChannelRow::summary)
                .collect())
        })
    }

    /// Every channel, private ones included.
    pub fn channels_listall(&self) -> DbResult<Vec<ChannelSummary>> {
        self.with_tables(|t| Ok(t.channels.values().map(ChannelRow::summary).collect()))
    }

    pub fn channel_details(&self, actor: UserId, channel_id: ChannelId) -> DbResult<ChannelDetails> {
        self.with_tables(|t| {
            t.require_member(ContainerRef::Channel(channel_id), actor)?;
            let channel = t.channel(channel_id)?;
            Ok(ChannelDetails {
                name: channel.name.clone(),
                is_public: channel.is_public,
                owner_members: t.profiles(&channel.owner_members),
                all_members: t.profiles(&channel.all_members),
            })
        })
    }

    pub fn channel_invite(&self, actor: UserId, channel_id: ChannelId, target: UserId) -> DbResult<()> {
        self.with_tables_mut(|t| {
            t.channel(channel_id)?;
            require_user(t, target)?;
            t.require_member(ContainerRef::Channel(channel_id), actor)?;

            if insert_unique(&mut t.channel_mut(channel_id)?.all_members, target) {
                info!("User {} invited {} to channel {}", actor, target, channel_id);
                notifications::on_membership_change(t, actor, target, ContainerRef::Channel(channel_id))?;
            }
            Ok(())
        })
    }

    pub fn channel_join(&self, actor: UserId, channel_id: ChannelId) -> DbResult<()> {
        self.with_tables_mut(|t| {
            let channel = t.channel(channel_id)?;
            if channel.is_member(actor) {
                return Ok(());
            }
            if !channel.is_public && !t.is_global_owner(actor) {
                return Err(DbError::auth(format!("channel {} is private", channel_id)));
            }

            t.channel_mut(channel_id)?.all_members.push(actor);
            info!("User {} joined channel {}", actor, channel_id);
            Ok(())
        })
    }

    /// Owners are demoted before they leave.
    pub fn channel_leave(&self, actor: UserId, channel_id: ChannelId) -> DbResult<()> {
        self.with_tables_mut(|t| {
            t.require_member(ContainerRef::Channel(channel_id), actor)?;

            let channel = t.channel_mut(channel_id)?;
            channel.owner_members.retain(|id| *id != actor);
            channel.all_members.retain(|id| *id != actor);
            info!("User {} left channel {}", actor, channel_id);
            Ok(())
        })
    }

    /// A target who is not yet a member joins as well, keeping owners a
    /// subset of members.
    pub fn channel_add_owner(&self, actor: UserId, channel_id: ChannelId, target: UserId) -> DbResult<()> {
        self.with_tables_mut(|t| {
            let channel = t.channel(channel_id)?;
            require_user(t, target)?;
            if channel.is_owner(target) {
                return Err(DbError::validation(format!(
                    "user {} already owns channel {}",
                    target, channel_id
                )));
            }
            require_channel_admin(t, channel, actor)?;

            let channel = t.channel_mut(channel_id)?;
            channel.owner_members.push(target);
            insert_unique(&mut channel.all_members, target);
            info!("User {} made {} an owner of channel {}", actor, target, channel_id);
            Ok(())
        })
    }

    pub fn channel_remove_owner(&self, actor: UserId, channel_id: ChannelId, target: UserId) -> DbResult<()> {
        self.with_tables_mut(|t| {
            let channel = t.channel(channel_id)?;
            require_user(t, target)?;
            if !channel.is_owner(target) {
                return Err(DbError::validation(format!(
                    "user {} does not own channel {}",
                    target, channel_id
                )));
            }
            require_channel_admin(t, channel, actor)?;

            t.channel_mut(channel_id)?
                .owner_members
                .retain(|id| *id != target);
            info!("User {} removed {} as owner of channel {}", actor, target, channel_id);
            Ok(())
        })
    }
}
