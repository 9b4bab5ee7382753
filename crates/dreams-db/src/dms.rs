use tracing::info;

use dreams_types::api::{DmCreatedResponse, DmDetails, DmSummary};
use dreams_types::models::{ContainerRef, DmId, UserId};

use crate::Database;
use crate::error::{DbError, DbResult};
use crate::models::{DmRow, Snapshot, insert_unique};
use crate::notifications;

/// Member handles sorted and joined with ", ".
fn dm_name(tables: &Snapshot, members: &[UserId]) -> String {
    let mut handles: Vec<&str> = members.iter().map(|id| tables.handle_of(*id)).collect();
    handles.sort_unstable();
    handles.join(", ")
}

impl Database {
    /// Creates a DM between `creator` and `u_ids`. DM ids grow monotonically
    /// and are never handed out again after removal.
    pub fn create_dm(&self, creator: UserId, u_ids: &[UserId]) -> DbResult<DmCreatedResponse> {
        self.with_tables_mut(|t| {
            if let Some(unknown) = std::iter::once(&creator)
                .chain(u_ids)
                .find(|id| t.user(**id).is_none())
            {
                return Err(DbError::validation(format!("user {} does not exist", unknown)));
            }

            let mut members = vec![creator];
            for id in u_ids {
                insert_unique(&mut members, *id);
            }

            let id = DmId(t.next_dm_id);
            t.next_dm_id += 1;
            let name = dm_name(t, &members);
            t.dms.insert(
                id,
                DmRow {
                    id,
                    name: name.clone(),
                    creator,
                    members: members.clone(),
                },
            );

            for member in members.into_iter().filter(|m| *m != creator) {
                notifications::on_membership_change(t, creator, member, ContainerRef::Dm(id))?;
            }
            info!("User {} created dm {} '{}'", creator, id, name);
            Ok(DmCreatedResponse { dm_id: id, dm_name: name })
        })
    }

    /// Creator only. Messages sent in the DM go with it.
    pub fn remove_dm(&self, actor: UserId, dm_id: DmId) -> DbResult<()> {
        self.with_tables_mut(|t| {
            if t.dm(dm_id)?.creator != actor {
                return Err(DbError::auth(format!("user {} did not create dm {}", actor, dm_id)));
            }

            t.dms.remove(&dm_id);
            let before = t.messages.len();
            t.messages.retain(|m| m.container != ContainerRef::Dm(dm_id));
            info!(
                "User {} removed dm {} ({} messages dropped)",
                actor,
                dm_id,
                before - t.messages.len()
            );
            Ok(())
        })
    }

    pub fn dm_invite(&self, actor: UserId, dm_id: DmId, target: UserId) -> DbResult<()> {
        self.with_tables_mut(|t| {
            t.dm(dm_id)?;
            if t.user(target).is_none() {
                return Err(DbError::not_found(format!("user {}", target)));
            }
            t.require_member(ContainerRef::Dm(dm_id), actor)?;

            if insert_unique(&mut t.dm_mut(dm_id)?.members, target) {
                info!("User {} invited {} to dm {}", actor, target, dm_id);
                notifications::on_membership_change(t, actor, target, ContainerRef::Dm(dm_id))?;
            }
            Ok(())
        })
    }

    pub fn dm_leave(&self, actor: UserId, dm_id: DmId) -> DbResult<()> {
        self.with_tables_mut(|t| {
            t.require_member(ContainerRef::Dm(dm_id), actor)?;
            t.dm_mut(dm_id)?.members.retain(|id| *id != actor);
            info!("User {} left dm {}", actor, dm_id);
            Ok(())
        })
    }

    pub fn dm_list(&self, actor: UserId) -> DbResult<Vec<DmSummary>> {
        self.with_tables(|t| {
            Ok(t.dms
                .values()
                .filter(|d| d.is_member(actor))
                .map(DmRow::summary)
                .collect())
        })
    }

    pub fn dm_details(&self, actor: UserId, dm_id: DmId) -> DbResult<DmDetails> {
        self.with_tables(|t| {
            t.require_member(ContainerRef::Dm(dm_id), actor)?;
            let dm = t.dm(dm_id)?;
            Ok(DmDetails {
                name: dm.name.clone(),
                members: t.profiles(&dm.members),
            })
        })
    }
}
