//! Ledger abstraction over the booking store.
//!
//! Implementations own the per-room serialization boundary: for one room,
//! `admit` and `delete_room` are mutually atomic. PostgreSQL serializes
//! them with a row lock on the room, the in-memory store with a per-room
//! mutex. Everything else is plain reads or compare-and-swap updates and
//! never takes the boundary.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use reserva_core::status::BookingStatus;
use reserva_core::stay::StayRange;
use reserva_core::types::DbId;
use reserva_db::models::booking::{Booking, NewBooking};
use reserva_db::models::room::Room;

pub use reserva_db::repositories::booking_repo::{AdmitOutcome, TransitionOutcome};
pub use reserva_db::repositories::room_repo::DeleteRoomOutcome;

pub use memory::{MemoryAccessControl, MemoryLedger};
pub use postgres::PgLedger;

/// Storage failure as seen by the admission coordinator.
///
/// `Unavailable` is the transient class the coordinator's bounded retry
/// loop keys off; `Permanent` is surfaced after a single attempt.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("ledger failure: {0}")]
    Permanent(String),
}

impl LedgerError {
    /// Whether a fresh attempt against the store could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_))
    }
}

#[async_trait]
pub trait Ledger: Send + Sync {
    async fn find_room(&self, id: DbId) -> Result<Option<Room>, LedgerError>;

    /// Availability calculator: inventory-holding bookings for `room_id`
    /// overlapping `stay`. Pure read, no boundary taken.
    async fn count_overlapping(
        &self,
        room_id: DbId,
        stay: &StayRange,
        exclude_booking: Option<DbId>,
    ) -> Result<i64, LedgerError>;

    /// The admission critical section: recheck, recount, insert, atomic
    /// per room.
    async fn admit(&self, input: &NewBooking) -> Result<AdmitOutcome, LedgerError>;

    async fn find_booking(&self, id: DbId) -> Result<Option<Booking>, LedgerError>;

    async fn list_for_requester(&self, requester_id: DbId)
        -> Result<Vec<Booking>, LedgerError>;

    async fn list_for_operator(&self, operator_id: DbId)
        -> Result<Vec<Booking>, LedgerError>;

    /// Compare-and-swap status transition; the row is untouched unless its
    /// status still equals `from`.
    async fn apply_transition(
        &self,
        booking_id: DbId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<TransitionOutcome, LedgerError>;

    /// Guarded room deletion, sharing the admission serialization boundary.
    async fn delete_room(&self, room_id: DbId) -> Result<DeleteRoomOutcome, LedgerError>;
}
