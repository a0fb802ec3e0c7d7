//! PostgreSQL-backed ledger.
//!
//! Thin adapter over the `reserva-db` repositories; the serialization
//! boundary is the `FOR UPDATE` lock the repositories take on the room row.

use async_trait::async_trait;
use reserva_core::status::BookingStatus;
use reserva_core::stay::StayRange;
use reserva_core::types::DbId;
use reserva_db::models::booking::{Booking, NewBooking};
use reserva_db::models::room::Room;
use reserva_db::repositories::{BookingRepo, RoomRepo};
use reserva_db::DbPool;

use super::{AdmitOutcome, DeleteRoomOutcome, Ledger, LedgerError, TransitionOutcome};

#[derive(Clone)]
pub struct PgLedger {
    pool: DbPool,
}

impl PgLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Map a sqlx error into the transient/permanent split the coordinator's
/// retry loop keys off.
///
/// Deadlocks (40P01), serialization failures (40001), admin shutdown
/// (57P01), and connection-level errors are worth retrying with a fresh
/// overlap count; everything else is surfaced as-is.
pub(crate) fn classify(err: sqlx::Error) -> LedgerError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => LedgerError::Unavailable(err.to_string()),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("40001") | Some("40P01") | Some("57P01") => {
                LedgerError::Unavailable(err.to_string())
            }
            _ => LedgerError::Permanent(err.to_string()),
        },
        _ => LedgerError::Permanent(err.to_string()),
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn find_room(&self, id: DbId) -> Result<Option<Room>, LedgerError> {
        RoomRepo::find_by_id(&self.pool, id).await.map_err(classify)
    }

    async fn count_overlapping(
        &self,
        room_id: DbId,
        stay: &StayRange,
        exclude_booking: Option<DbId>,
    ) -> Result<i64, LedgerError> {
        BookingRepo::count_overlapping(
            &self.pool,
            room_id,
            stay.check_in(),
            stay.check_out(),
            exclude_booking,
        )
        .await
        .map_err(classify)
    }

    async fn admit(&self, input: &NewBooking) -> Result<AdmitOutcome, LedgerError> {
        match BookingRepo::admit(&self.pool, input).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                // A unique-key violation here means the same logical request
                // committed on another connection after our replay check;
                // surface the row it wrote.
                if let sqlx::Error::Database(db) = &err {
                    if db.constraint() == Some("uq_bookings_idempotency_key") {
                        return match BookingRepo::find_by_idempotency_key(
                            &self.pool,
                            &input.idempotency_key,
                        )
                        .await
                        .map_err(classify)?
                        {
                            Some(existing) => Ok(AdmitOutcome::Replayed(existing)),
                            None => Err(LedgerError::Unavailable(
                                "idempotency key not readable after unique violation".into(),
                            )),
                        };
                    }
                }
                Err(classify(err))
            }
        }
    }

    async fn find_booking(&self, id: DbId) -> Result<Option<Booking>, LedgerError> {
        BookingRepo::find_by_id(&self.pool, id).await.map_err(classify)
    }

    async fn list_for_requester(
        &self,
        requester_id: DbId,
    ) -> Result<Vec<Booking>, LedgerError> {
        BookingRepo::list_by_requester(&self.pool, requester_id)
            .await
            .map_err(classify)
    }

    async fn list_for_operator(
        &self,
        operator_id: DbId,
    ) -> Result<Vec<Booking>, LedgerError> {
        BookingRepo::list_by_operator(&self.pool, operator_id)
            .await
            .map_err(classify)
    }

    async fn apply_transition(
        &self,
        booking_id: DbId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<TransitionOutcome, LedgerError> {
        BookingRepo::apply_transition(&self.pool, booking_id, from, to)
            .await
            .map_err(classify)
    }

    async fn delete_room(&self, room_id: DbId) -> Result<DeleteRoomOutcome, LedgerError> {
        RoomRepo::delete_guarded(&self.pool, room_id)
            .await
            .map_err(classify)
    }
}
