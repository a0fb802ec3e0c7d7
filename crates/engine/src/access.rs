//! Access-control collaborator seam.
//!
//! Ownership and requester vetting belong to the identity system, which
//! sits outside this engine. The façade calls through this trait exactly
//! once per method instead of re-implementing checks at every call site.

use async_trait::async_trait;
use reserva_core::types::DbId;
use reserva_db::repositories::RoomRepo;
use reserva_db::DbPool;

use crate::ledger::postgres::classify;
use crate::ledger::LedgerError;

#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Whether `operator_id` operates the property `room_id` belongs to.
    async fn is_owner_of_room(
        &self,
        operator_id: DbId,
        room_id: DbId,
    ) -> Result<bool, LedgerError>;

    /// Whether `requester_id` names a usable requester profile.
    async fn is_requester(&self, requester_id: DbId) -> Result<bool, LedgerError>;
}

/// Answers ownership from the `rooms.owner_id` column.
///
/// Requester vetting is delegated upstream; this implementation only
/// rejects references that cannot name a profile at all.
pub struct PgAccessControl {
    pool: DbPool,
}

impl PgAccessControl {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessControl for PgAccessControl {
    async fn is_owner_of_room(
        &self,
        operator_id: DbId,
        room_id: DbId,
    ) -> Result<bool, LedgerError> {
        RoomRepo::is_owned_by(&self.pool, room_id, operator_id)
            .await
            .map_err(classify)
    }

    async fn is_requester(&self, requester_id: DbId) -> Result<bool, LedgerError> {
        Ok(requester_id > 0)
    }
}
