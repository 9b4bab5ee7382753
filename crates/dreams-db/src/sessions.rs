use tracing::{info, warn};
use uuid::Uuid;

use dreams_types::models::{SessionId, UserId};

use crate::Database;
use crate::error::{DbError, DbResult};
use crate::password;

impl Database {
    /// Starts a new session for an existing user.
    pub fn open_session(&self, user_id: UserId) -> DbResult<SessionId> {
        self.with_tables_mut(|t| {
            if t.user(user_id).is_none() {
                return Err(DbError::not_found(format!("user {}", user_id)));
            }
            let session_id = Uuid::new_v4();
            t.sessions.insert(session_id, user_id);
            Ok(session_id)
        })
    }

    /// Checks credentials and opens a session. Unknown email and wrong
    /// password are both validation errors.
    pub fn login(&self, email: &str, password: &str) -> DbResult<(UserId, SessionId)> {
        let (user_id, hash) = self.with_tables(|t| {
            t.users
                .values()
                .find(|u| u.email == email)
                .map(|u| (u.id, u.password_hash.clone()))
                .ok_or_else(|| DbError::validation(format!("'{}' is not registered", email)))
        })?;

        // Verify outside the store lock
        if !password::verify_password(password, &hash) {
            warn!("Failed login for user {}", user_id);
            return Err(DbError::validation("incorrect password"));
        }

        let session_id = self.open_session(user_id)?;
        info!("User {} logged in", user_id);
        Ok((user_id, session_id))
    }

    /// `Auth` unless `session_id` is live and belongs to `user_id`.
    pub fn validate_session(&self, user_id: UserId, session_id: SessionId) -> DbResult<()> {
        self.with_tables(|t| match t.sessions.get(&session_id) {
            Some(owner) if *owner == user_id => Ok(()),
            _ => Err(DbError::auth("session is invalid or has ended")),
        })
    }

    pub fn close_session(&self, user_id: UserId, session_id: SessionId) -> DbResult<()> {
        self.with_tables_mut(|t| {
            if t.sessions.get(&session_id) != Some(&user_id) {
                return Err(DbError::auth("session is invalid or has ended"));
            }
            t.sessions.remove(&session_id);
            info!("User {} logged out", user_id);
            Ok(())
        })
    }
}
