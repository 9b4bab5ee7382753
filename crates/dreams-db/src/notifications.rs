//! Notification records: @-tags in message bodies and "added you" events.
//! The `on_*` hooks run inside the caller's mutation so they commit or roll
//! back together with it.

use tracing::debug;

use dreams_types::api::NotificationView;
use dreams_types::models::{ContainerRef, UserId};

use crate::Database;
use crate::error::DbResult;
use crate::models::{NotificationRow, Snapshot, insert_unique};

/// How many notifications `Database::notifications` returns.
pub const NOTIFICATION_LIMIT: usize = 20;
const TAG_PREVIEW_LEN: usize = 20;

/// Raw `@word` tokens in `body`, in order of appearance.
pub fn tag_tokens(body: &str) -> Vec<&str> {
    body.match_indices('@')
        .map(|(i, _)| {
            let rest = &body[i + 1..];
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '@')
                .unwrap_or(rest.len());
            &rest[..end]
        })
        .filter(|token| !token.is_empty())
        .collect()
}

/// Exact handle first, then with trailing punctuation ("@bob," / "@bob.") cut.
fn resolve_tag(tables: &Snapshot, token: &str) -> Option<UserId> {
    let trimmed = token.trim_end_matches(|c: char| c.is_ascii_punctuation());
    [token, trimmed]
        .into_iter()
        .filter(|candidate| !candidate.is_empty())
        .find_map(|candidate| {
            tables
                .users
                .values()
                .find(|u| u.handle == candidate)
                .map(|u| u.id)
        })
}

/// One notification per distinct tagged member of `container`.
pub(crate) fn on_message(
    tables: &mut Snapshot,
    actor: UserId,
    container: ContainerRef,
    body: &str,
) -> DbResult<()> {
    let members = tables.members(container)?.to_vec();
    let text = format!(
        "{} tagged you in {}: {}",
        tables.handle_of(actor),
        tables.container_name(container)?,
        body.chars().take(TAG_PREVIEW_LEN).collect::<String>()
    );

    let mut notified = Vec::new();
    for token in tag_tokens(body) {
        let Some(user_id) = resolve_tag(tables, token) else {
            continue;
        };
        if !members.contains(&user_id) || !insert_unique(&mut notified, user_id) {
            continue;
        }
        tables.notifications.push(NotificationRow {
            recipient: user_id,
            container,
            message: text.clone(),
        });
    }

    if !notified.is_empty() {
        debug!("{} tagged {} user(s) in {}", actor, notified.len(), container);
    }
    Ok(())
}

pub(crate) fn on_membership_change(
    tables: &mut Snapshot,
    actor: UserId,
    target: UserId,
    container: ContainerRef,
) -> DbResult<()> {
    let message = format!(
        "{} added you to {}",
        tables.handle_of(actor),
        tables.container_name(container)?
    );
    tables.notifications.push(NotificationRow {
        recipient: target,
        container,
        message,
    });
    Ok(())
}

impl Database {
    /// The most recent notifications for `actor`, newest first.
    pub fn notifications(&self, actor: UserId) -> DbResult<Vec<NotificationView>> {
        self.with_tables(|t| {
            Ok(t.notifications
                .iter()
                .rev()
                .filter(|n| n.recipient == actor)
                .take(NOTIFICATION_LIMIT)
                .map(|n| NotificationView {
                    container: n.container,
                    notification_message: n.message.clone(),
                })
                .collect())
        })
    }
}
