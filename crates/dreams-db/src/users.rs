use std::ops::RangeInclusive;

use tracing::info;

use dreams_types::api::UserProfile;
use dreams_types::models::{Permission, UserId};

use crate::Database;
use crate::error::{DbError, DbResult};
use crate::models::{Snapshot, UserRow};
use crate::password;

pub const HANDLE_MAX_LEN: usize = 20;
pub const MIN_PASSWORD_LEN: usize = 6;
const NAME_LEN: RangeInclusive<usize> = 1..=50;
const CUSTOM_HANDLE_LEN: RangeInclusive<usize> = 3..=20;

/// `local@domain.tld`: local is one or two alphanumeric runs joined by a
/// single `.` or `_`, domain is word characters, tld is 2-3 word characters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let alnum_run = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric());
    let local_ok = match local.split_once(['.', '_']) {
        Some((head, tail)) => alnum_run(head) && alnum_run(tail),
        None => alnum_run(local),
    };

    let word = |s: &str| s.chars().all(|c| c.is_alphanumeric() || c == '_');
    let domain_ok = match domain.split_once('.') {
        Some((name, tld)) => {
            !name.is_empty() && word(name) && (2..=3).contains(&tld.chars().count()) && word(tld)
        }
        None => false,
    };

    local_ok && domain_ok
}

/// Lowercased first+last name without whitespace or `@`, cut to 20 chars.
pub fn handle_base(name_first: &str, name_last: &str) -> String {
    format!("{}{}", name_first, name_last)
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '@')
        .take(HANDLE_MAX_LEN)
        .collect()
}

/// `base` itself if free, otherwise `base` + 0, 1, 2, ... with the base
/// shortened so the result never exceeds `HANDLE_MAX_LEN`.
pub(crate) fn unique_handle(tables: &Snapshot, base: &str) -> String {
    if !base.is_empty() && !tables.handle_taken(base, None) {
        return base.to_string();
    }

    let mut n: u32 = 0;
    loop {
        let suffix = n.to_string();
        let keep = HANDLE_MAX_LEN.saturating_sub(suffix.len());
        let candidate: String = base.chars().take(keep).chain(suffix.chars()).collect();
        if !tables.handle_taken(&candidate, None) {
            return candidate;
        }
        n += 1;
    }
}

fn validate_email_format(email: &str) -> DbResult<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(DbError::validation(format!("'{}' is not a valid email", email)))
    }
}

fn validate_names(name_first: &str, name_last: &str) -> DbResult<()> {
    if !NAME_LEN.contains(&name_first.chars().count()) {
        return Err(DbError::validation("name_first must be 1-50 characters"));
    }
    if !NAME_LEN.contains(&name_last.chars().count()) {
        return Err(DbError::validation("name_last must be 1-50 characters"));
    }
    Ok(())
}

fn email_taken(tables: &Snapshot, email: &str, except: Option<UserId>) -> bool {
    tables
        .users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

fn user_mut(tables: &mut Snapshot, id: UserId) -> DbResult<&mut UserRow> {
    tables
        .users
        .get_mut(&id)
        .ok_or_else(|| DbError::not_found(format!("user {}", id)))
}

impl Database {
    // -- Registration --

    pub fn register(
        &self,
        email: &str,
        password: &str,
        name_first: &str,
        name_last: &str,
    ) -> DbResult<UserId> {
        validate_email_format(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DbError::validation("password must be at least 6 characters"));
        }
        validate_names(name_first, name_last)?;

        // Hash before taking the store lock
        let password_hash = password::hash_password(password)?;

        self.with_tables_mut(|t| {
            if email_taken(t, email, None) {
                return Err(DbError::validation(format!("'{}' is already registered", email)));
            }

            let id = UserId(t.users.len() as u32);
            let permission = if t.users.is_empty() {
                Permission::Owner
            } else {
                Permission::Member
            };
            let handle = unique_handle(t, &handle_base(name_first, name_last));

            info!("Registered user {} as @{}", id, handle);
            t.users.insert(
                id,
                UserRow {
                    id,
                    email: email.to_string(),
                    password_hash,
                    name_first: name_first.to_string(),
                    name_last: name_last.to_string(),
                    handle,
                    permission,
                },
            );
            Ok(id)
        })
    }

    // -- Profiles --

    pub fn user_profile(&self, u_id: UserId) -> DbResult<UserProfile> {
        self.with_tables(|t| {
            t.profile(u_id)
                .ok_or_else(|| DbError::validation(format!("user {} does not exist", u_id)))
        })
    }

    pub fn users_all(&self) -> DbResult<Vec<UserProfile>> {
        self.with_tables(|t| Ok(t.users.values().map(UserRow::profile).collect()))
    }

    pub fn set_name(&self, actor: UserId, name_first: &str, name_last: &str) -> DbResult<()> {
        validate_names(name_first, name_last)?;
        self.with_tables_mut(|t| {
            let user = user_mut(t, actor)?;
            user.name_first = name_first.to_string();
            user.name_last = name_last.to_string();
            Ok(())
        })
    }

    pub fn set_email(&self, actor: UserId, email: &str) -> DbResult<()> {
        validate_email_format(email)?;
        self.with_tables_mut(|t| {
            if email_taken(t, email, Some(actor)) {
                return Err(DbError::validation(format!("'{}' is already registered", email)));
            }
            user_mut(t, actor)?.email = email.to_string();
            Ok(())
        })
    }

    pub fn set_handle(&self, actor: UserId, handle: &str) -> DbResult<()> {
        if !CUSTOM_HANDLE_LEN.contains(&handle.chars().count()) {
            return Err(DbError::validation("handle_str must be 3-20 characters"));
        }
        if handle.chars().any(|c| c.is_whitespace() || c == '@') {
            return Err(DbError::validation("handle_str may not contain whitespace or '@'"));
        }

        self.with_tables_mut(|t| {
            if t.handle_taken(handle, Some(actor)) {
                return Err(DbError::validation(format!("handle '{}' is taken", handle)));
            }
            let user = user_mut(t, actor)?;
            info!("User {} renamed @{} -> @{}", actor, user.handle, handle);
            user.handle = handle.to_string();
            Ok(())
        })
    }
}
