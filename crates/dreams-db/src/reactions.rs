use tracing::debug;

use dreams_types::models::{MessageId, ReactId, UserId};

use crate::Database;
use crate::error::{DbError, DbResult};
use crate::models::ReactionRow;

fn check_kind(react_id: ReactId) -> DbResult<()> {
    if react_id == ReactId::THUMBS_UP {
        Ok(())
    } else {
        Err(DbError::validation(format!("unsupported react id {}", react_id)))
    }
}

impl Database {
    pub fn react(&self, actor: UserId, message_id: MessageId, react_id: ReactId) -> DbResult<()> {
        check_kind(react_id)?;
        self.with_tables_mut(|t| {
            let index = t.message_index(message_id)?;
            t.require_member(t.messages[index].container, actor)?;

            let reactions = &mut t.messages[index].reactions;
            match reactions.iter_mut().find(|r| r.react_id == react_id) {
                Some(entry) if entry.user_ids.contains(&actor) => {
                    return Err(DbError::validation(format!(
                        "user {} already reacted to message {}",
                        actor, message_id
                    )));
                }
                Some(entry) => entry.user_ids.push(actor),
                None => reactions.push(ReactionRow {
                    react_id,
                    user_ids: vec![actor],
                }),
            }
            debug!("User {} reacted {} to message {}", actor, react_id, message_id);
            Ok(())
        })
    }

    /// Entries whose last user unreacts are dropped.
    pub fn unreact(&self, actor: UserId, message_id: MessageId, react_id: ReactId) -> DbResult<()> {
        check_kind(react_id)?;
        self.with_tables_mut(|t| {
            let index = t.message_index(message_id)?;
            t.require_member(t.messages[index].container, actor)?;

            let reactions = &mut t.messages[index].reactions;
            let entry = reactions
                .iter_mut()
                .find(|r| r.react_id == react_id && r.user_ids.contains(&actor))
                .ok_or_else(|| {
                    DbError::not_found(format!(
                        "user {} has no reaction on message {}",
                        actor, message_id
                    ))
                })?;
            entry.user_ids.retain(|id| *id != actor);
            reactions.retain(|r| !r.user_ids.is_empty());

            debug!("User {} unreacted {} on message {}", actor, react_id, message_id);
            Ok(())
        })
    }
}
