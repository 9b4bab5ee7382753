//! The message log: send, edit, remove, pin, share, paging and search.
//!
//! Messages live in one `Vec` ordered by id. Ids come from a counter that
//! only ever grows, so removal never frees an id.

use chrono::Utc;
use tracing::{debug, info};

use dreams_types::api::{MessageView, MessagesPage};
use dreams_types::models::{ContainerRef, MessageId, UserId};

use crate::Database;
use crate::error::{DbError, DbResult};
use crate::models::{MessageRow, Snapshot};
use crate::notifications;

pub const MAX_MESSAGE_LEN: usize = 1000;
pub const PAGE_SIZE: usize = 50;

fn check_body_len(body: &str) -> DbResult<()> {
    if body.chars().count() > MAX_MESSAGE_LEN {
        Err(DbError::validation(format!(
            "message is longer than {} characters",
            MAX_MESSAGE_LEN
        )))
    } else {
        Ok(())
    }
}

/// Appends a message to the log. Shared by `send` and `share`.
fn append(
    tables: &mut Snapshot,
    actor: UserId,
    container: ContainerRef,
    body: String,
) -> DbResult<MessageId> {
    check_body_len(&body)?;
    tables.require_member(container, actor)?;

    let id = MessageId(tables.next_message_id);
    tables.next_message_id += 1;
    notifications::on_message(tables, actor, container, &body)?;
    tables.messages.push(MessageRow {
        id,
        container,
        sender: actor,
        body,
        created_at: Utc::now(),
        is_pinned: false,
        reactions: Vec::new(),
    });
    debug!("User {} sent message {} to {}", actor, id, container);
    Ok(id)
}

/// The sender may always change a message. In a channel its owners and the
/// global owners may too; in a DM nobody else may.
fn require_editor(tables: &Snapshot, message: &MessageRow, actor: UserId) -> DbResult<()> {
    if message.sender == actor {
        return Ok(());
    }
    let allowed = match message.container {
        ContainerRef::Channel(id) => {
            tables.is_global_owner(actor) || tables.channel(id).is_ok_and(|c| c.is_owner(actor))
        }
        ContainerRef::Dm(_) => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(DbError::auth(format!(
            "user {} may not change message {}",
            actor, message.id
        )))
    }
}

fn remove_at(tables: &mut Snapshot, index: usize, actor: UserId) {
    let removed = tables.messages.remove(index);
    info!("User {} removed message {}", actor, removed.id);
}

impl Database {
    pub fn send(&self, actor: UserId, container: ContainerRef, body: &str) -> DbResult<MessageId> {
        self.with_tables_mut(|t| append(t, actor, container, body.to_string()))
    }

    /// Replaces the body. An empty body removes the message.
    pub fn edit(&self, actor: UserId, message_id: MessageId, body: &str) -> DbResult<()> {
        self.with_tables_mut(|t| {
            let index = t.message_index(message_id)?;
            require_editor(t, &t.messages[index], actor)?;
            check_body_len(body)?;

            if body.is_empty() {
                remove_at(t, index, actor);
                return Ok(());
            }

            let container = t.messages[index].container;
            t.messages[index].body = body.to_string();
            notifications::on_message(t, actor, container, body)?;
            info!("User {} edited message {}", actor, message_id);
            Ok(())
        })
    }

    pub fn remove(&self, actor: UserId, message_id: MessageId) -> DbResult<()> {
        self.with_tables_mut(|t| {
            let index = t.message_index(message_id)?;
            require_editor(t, &t.messages[index], actor)?;
            remove_at(t, index, actor);
            Ok(())
        })
    }

    pub fn pin(&self, actor: UserId, message_id: MessageId) -> DbResult<()> {
        self.set_pinned(actor, message_id, true)
    }

    pub fn unpin(&self, actor: UserId, message_id: MessageId) -> DbResult<()> {
        self.set_pinned(actor, message_id, false)
    }

    fn set_pinned(&self, actor: UserId, message_id: MessageId, pinned: bool) -> DbResult<()> {
        self.with_tables_mut(|t| {
            let index = t.message_index(message_id)?;
            t.require_member(t.messages[index].container, actor)?;

            let message = &mut t.messages[index];
            if message.is_pinned == pinned {
                let state = if pinned { "pinned" } else { "unpinned" };
                return Err(DbError::validation(format!(
                    "message {} is already {}",
                    message_id, state
                )));
            }
            message.is_pinned = pinned;
            Ok(())
        })
    }

    /// Posts a copy of `source` into `target`, with `extra` appended after a
    /// `" | "` separator when given.
    pub fn share(
        &self,
        actor: UserId,
        source: MessageId,
        extra: &str,
        target: ContainerRef,
    ) -> DbResult<MessageId> {
        self.with_tables_mut(|t| {
            let original = &t.messages[t.message_index(source)?].body;
            let body = if extra.is_empty() {
                original.clone()
            } else {
                format!("{} | {}", original, extra)
            };

            let id = append(t, actor, target, body)?;
            info!("User {} shared message {} to {} as {}", actor, source, target, id);
            Ok(id)
        })
    }

    /// Page of `container`'s history starting `start` messages back from the
    /// newest one.
    pub fn messages(
        &self,
        actor: UserId,
        container: ContainerRef,
        start: usize,
    ) -> DbResult<MessagesPage> {
        self.with_tables(|t| {
            t.require_member(container, actor)?;

            let total = t.messages.iter().filter(|m| m.container == container).count();
            if start > total {
                return Err(DbError::validation(format!(
                    "start {} is past the {} messages in {}",
                    start, total, container
                )));
            }

            let messages = t
                .messages
                .iter()
                .rev()
                .filter(|m| m.container == container)
                .skip(start)
                .take(PAGE_SIZE)
                .map(|m| m.view(actor))
                .collect();
            let end = if start + PAGE_SIZE >= total {
                -1
            } else {
                (start + PAGE_SIZE) as i64
            };
            Ok(MessagesPage { messages, start, end })
        })
    }

    /// Messages containing `query` in any channel or DM `actor` belongs to,
    /// newest first.
    pub fn search(&self, actor: UserId, query: &str) -> DbResult<Vec<MessageView>> {
        if !(1..=MAX_MESSAGE_LEN).contains(&query.chars().count()) {
            return Err(DbError::validation("query must be 1-1000 characters"));
        }

        self.with_tables(|t| {
            Ok(t.messages
                .iter()
                .rev()
                .filter(|m| m.body.contains(query))
                .filter(|m| t.members(m.container).is_ok_and(|ids| ids.contains(&actor)))
                .map(|m| m.view(actor))
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreams_types::models::{ChannelId, DmId};

    struct Fixture {
        db: Database,
        dreams_owner: UserId,
        a: UserId,
        b: UserId,
        channel: ContainerRef,
        dm: ContainerRef,
    }

    fn setup() -> Fixture {
        let db = Database::in_memory();
        let dreams_owner = db.register("owner@x.com", "abcdef", "Dream", "Owner").unwrap();
        let a = db.register("a@x.com", "abcdef", "Steve", "Irwin").unwrap();
        let b = db.register("b@x.com", "abcdef", "Jonah", "Lomu").unwrap();

        let channel_id = db.create_channel(a, "General", true).unwrap();
        db.channel_join(b, channel_id).unwrap();
        db.channel_join(dreams_owner, channel_id).unwrap();
        let dm = db.create_dm(a, &[b]).unwrap();

        Fixture {
            db,
            dreams_owner,
            a,
            b,
            channel: ContainerRef::Channel(channel_id),
            dm: ContainerRef::Dm(dm.dm_id),
        }
    }

    #[test]
    fn send_then_list_round_trips() {
        let f = setup();
        let id = f.db.send(f.a, f.channel, "hello world").unwrap();

        let page = f.db.messages(f.b, f.channel, 0).unwrap();
        assert_eq!(page.start, 0);
        assert_eq!(page.end, -1);
        assert_eq!(page.messages.len(), 1);

        let view = &page.messages[0];
        assert_eq!(view.message_id, id);
        assert_eq!(view.u_id, f.a);
        assert_eq!(view.message, "hello world");
        assert!(view.reacts.is_empty());
        assert!(!view.is_pinned);
    }

    #[test]
    fn send_checks_length_and_membership() {
        let f = setup();
        let outsider = f.db.register("c@x.com", "abcdef", "Rock", "Sand").unwrap();

        assert!(matches!(
            f.db.send(f.a, f.channel, &"x".repeat(MAX_MESSAGE_LEN + 1)),
            Err(DbError::Validation(_))
        ));
        f.db.send(f.a, f.channel, &"x".repeat(MAX_MESSAGE_LEN)).unwrap();
        assert!(matches!(f.db.send(outsider, f.channel, "hi"), Err(DbError::Auth(_))));
        assert!(matches!(
            f.db.send(f.a, ContainerRef::Channel(ChannelId(8)), "hi"),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn ids_increase_across_containers() {
        let f = setup();
        let first = f.db.send(f.a, f.channel, "one").unwrap();
        let second = f.db.send(f.a, f.dm, "two").unwrap();
        f.db.remove(f.a, second).unwrap();
        let third = f.db.send(f.a, f.channel, "three").unwrap();

        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn fifty_one_messages_span_two_pages() {
        let f = setup();
        for i in 0..51 {
            f.db.send(f.a, f.channel, &format!("message {}", i)).unwrap();
        }

        let first = f.db.messages(f.a, f.channel, 0).unwrap();
        assert_eq!(first.messages.len(), PAGE_SIZE);
        assert_eq!(first.end, 50);
        assert_eq!(first.messages[0].message, "message 50");

        let second = f.db.messages(f.a, f.channel, 50).unwrap();
        assert_eq!(second.messages.len(), 1);
        assert_eq!(second.end, -1);
        assert_eq!(second.messages[0].message, "message 0");

        assert!(matches!(f.db.messages(f.a, f.channel, 52), Err(DbError::Validation(_))));
    }

    #[test]
    fn empty_container_lists_from_zero() {
        let f = setup();
        let page = f.db.messages(f.a, f.dm, 0).unwrap();
        assert!(page.messages.is_empty());
        assert_eq!(page.end, -1);
        assert!(matches!(f.db.messages(f.a, f.dm, 1), Err(DbError::Validation(_))));
        assert!(matches!(
            f.db.messages(f.a, ContainerRef::Dm(DmId(40)), 0),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn edit_to_empty_removes() {
        let f = setup();
        let id = f.db.send(f.a, f.channel, "soon gone").unwrap();
        f.db.edit(f.a, id, "").unwrap();

        assert!(f.db.messages(f.a, f.channel, 0).unwrap().messages.is_empty());
        assert!(matches!(f.db.edit(f.a, id, "back"), Err(DbError::NotFound(_))));
        assert!(matches!(f.db.remove(f.a, id), Err(DbError::NotFound(_))));
    }

    #[test]
    fn edit_permissions_differ_between_channels_and_dms() {
        let f = setup();
        let in_channel = f.db.send(f.b, f.channel, "from b").unwrap();
        let in_dm = f.db.send(f.b, f.dm, "from b").unwrap();

        // Channel owner and global owner may edit someone else's channel message
        f.db.edit(f.a, in_channel, "edited by owner").unwrap();
        f.db.edit(f.dreams_owner, in_channel, "edited by admin").unwrap();
        // Nobody but the sender touches a DM message
        assert!(matches!(f.db.edit(f.a, in_dm, "nope"), Err(DbError::Auth(_))));
        assert!(matches!(f.db.remove(f.a, in_dm), Err(DbError::Auth(_))));

        let mine = f.db.send(f.a, f.channel, "from a").unwrap();
        assert!(matches!(f.db.edit(f.b, mine, "nope"), Err(DbError::Auth(_))));
        assert!(matches!(
            f.db.edit(f.a, mine, &"y".repeat(MAX_MESSAGE_LEN + 1)),
            Err(DbError::Validation(_))
        ));

        let page = f.db.messages(f.a, f.channel, 0).unwrap();
        assert_eq!(page.messages[1].message, "edited by admin");
    }

    #[test]
    fn pin_twice_fails() {
        let f = setup();
        let outsider = f.db.register("c@x.com", "abcdef", "Rock", "Sand").unwrap();
        let id = f.db.send(f.a, f.channel, "important").unwrap();

        f.db.pin(f.b, id).unwrap();
        assert!(matches!(f.db.pin(f.a, id), Err(DbError::Validation(_))));
        assert!(f.db.messages(f.a, f.channel, 0).unwrap().messages[0].is_pinned);

        assert!(matches!(f.db.unpin(outsider, id), Err(DbError::Auth(_))));
        f.db.unpin(f.a, id).unwrap();
        assert!(matches!(f.db.unpin(f.a, id), Err(DbError::Validation(_))));
        assert!(matches!(f.db.pin(f.a, MessageId(99)), Err(DbError::NotFound(_))));
    }

    #[test]
    fn share_composes_body() {
        let f = setup();
        let source = f.db.send(f.a, f.channel, "original").unwrap();

        let plain = f.db.share(f.a, source, "", f.dm).unwrap();
        let noted = f.db.share(f.b, source, "look", f.dm).unwrap();
        assert!(plain > source);

        let page = f.db.messages(f.a, f.dm, 0).unwrap();
        let bodies: Vec<&str> = page.messages.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(bodies, vec!["original | look", "original"]);
        assert_eq!(page.messages[0].message_id, noted);

        let outsider = f.db.register("c@x.com", "abcdef", "Rock", "Sand").unwrap();
        assert!(matches!(f.db.share(outsider, source, "", f.dm), Err(DbError::Auth(_))));
        assert!(matches!(
            f.db.share(f.a, MessageId(77), "", f.dm),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn search_is_limited_to_own_containers() {
        let f = setup();
        let outsider = f.db.register("c@x.com", "abcdef", "Rock", "Sand").unwrap();
        f.db.send(f.a, f.channel, "find the needle").unwrap();
        f.db.send(f.b, f.dm, "needle in a dm").unwrap();
        f.db.send(f.a, f.channel, "nothing here").unwrap();

        let found: Vec<String> = f
            .db
            .search(f.b, "needle")
            .unwrap()
            .into_iter()
            .map(|m| m.message)
            .collect();
        assert_eq!(found, vec!["needle in a dm", "find the needle"]);

        assert!(f.db.search(outsider, "needle").unwrap().is_empty());
        assert!(matches!(f.db.search(f.a, ""), Err(DbError::Validation(_))));
    }
}
