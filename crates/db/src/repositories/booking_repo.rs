//! Repository for the `bookings` table.
//!
//! `admit` is the only insert path. It runs the availability check and the
//! insert inside one transaction, serialized per room by a `FOR UPDATE`
//! lock on the room row: admissions for the same room queue behind each
//! other, admissions for different rooms lock different rows and proceed in
//! parallel.

use chrono::NaiveDate;
use reserva_core::status::{BookingStatus, PaymentStatus, RoomStatus, StatusId};
use reserva_core::types::DbId;
use sqlx::PgPool;

use crate::models::booking::{Booking, NewBooking};

/// Column list for `bookings` queries.
const COLUMNS: &str = "\
    id, room_id, requester_id, check_in, check_out, party_size, total_price, \
    status_id, payment_method_id, payment_status_id, \
    contact_name, contact_email, contact_phone, special_requests, \
    idempotency_key, cancelled_at, created_at, updated_at";

/// Inventory-holding statuses; must match `BookingStatus::ACTIVE`.
const ACTIVE_STATUSES: [StatusId; 3] = [
    BookingStatus::Pending as StatusId,
    BookingStatus::Confirmed as StatusId,
    BookingStatus::CheckedIn as StatusId,
];

/// Half-open overlap count over inventory-holding bookings. `$5` is the
/// candidate check-out, `$6` the candidate check-in, `$7` an optional
/// booking id to exclude.
const OVERLAP_SQL: &str = "\
    SELECT COUNT(*) FROM bookings \
    WHERE room_id = $1 AND status_id IN ($2, $3, $4) \
      AND check_in < $5 AND check_out > $6 \
      AND ($7::BIGINT IS NULL OR id <> $7)";

/// Outcome of an atomic admission attempt.
#[derive(Debug, Clone)]
pub enum AdmitOutcome {
    /// A new booking row was written.
    Admitted(Booking),
    /// The same logical request already committed; here is the existing row.
    Replayed(Booking),
    /// The room vanished between the caller's precondition check and the lock.
    RoomMissing,
    /// The room stopped accepting bookings.
    RoomNotBookable,
    /// Admitting would exceed the room's quantity on some night.
    FullyBooked,
}

/// Outcome of a compare-and-swap status transition.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    Applied(Booking),
    /// The row's status no longer matches the expected source status.
    StatusChanged,
    NotFound,
}

/// Provides booking reads, the atomic admission insert, and CAS status
/// transitions.
pub struct BookingRepo;

impl BookingRepo {
    /// Count inventory-holding bookings for `room_id` whose range overlaps
    /// the half-open `[check_in, check_out)`.
    ///
    /// Pure read; correctness under concurrent admissions comes from
    /// `admit` re-running this count inside its transaction.
    pub async fn count_overlapping(
        pool: &PgPool,
        room_id: DbId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        exclude_booking: Option<DbId>,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(OVERLAP_SQL)
            .bind(room_id)
            .bind(ACTIVE_STATUSES[0])
            .bind(ACTIVE_STATUSES[1])
            .bind(ACTIVE_STATUSES[2])
            .bind(check_out)
            .bind(check_in)
            .bind(exclude_booking)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Atomically admit a booking against the room's remaining capacity.
    ///
    /// Inside one transaction: lock the room row (`FOR UPDATE`), recheck
    /// its operational status under the lock, replay an already-committed
    /// idempotency key, recount overlaps, and only then insert with status
    /// `CONFIRMED`. Nothing is written on any non-`Admitted` outcome.
    pub async fn admit(pool: &PgPool, input: &NewBooking) -> Result<AdmitOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let room: Option<(i32, StatusId)> =
            sqlx::query_as("SELECT quantity, status_id FROM rooms WHERE id = $1 FOR UPDATE")
                .bind(input.room_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((quantity, room_status)) = room else {
            return Ok(AdmitOutcome::RoomMissing);
        };
        if RoomStatus::try_from_id(room_status) != Some(RoomStatus::Available) {
            return Ok(AdmitOutcome::RoomNotBookable);
        }

        // A retried request that already committed must not insert twice.
        let replay_query = format!(
            "SELECT {COLUMNS} FROM bookings WHERE idempotency_key = $1"
        );
        let existing = sqlx::query_as::<_, Booking>(&replay_query)
            .bind(&input.idempotency_key)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(booking) = existing {
            return Ok(AdmitOutcome::Replayed(booking));
        }

        let taken: (i64,) = sqlx::query_as(OVERLAP_SQL)
            .bind(input.room_id)
            .bind(ACTIVE_STATUSES[0])
            .bind(ACTIVE_STATUSES[1])
            .bind(ACTIVE_STATUSES[2])
            .bind(input.check_out)
            .bind(input.check_in)
            .bind(None::<DbId>)
            .fetch_one(&mut *tx)
            .await?;
        if taken.0 >= quantity as i64 {
            return Ok(AdmitOutcome::FullyBooked);
        }

        let insert = format!(
            "INSERT INTO bookings \
                 (room_id, requester_id, check_in, check_out, party_size, \
                  total_price, status_id, payment_method_id, payment_status_id, \
                  contact_name, contact_email, contact_phone, special_requests, \
                  idempotency_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&insert)
            .bind(input.room_id)
            .bind(input.requester_id)
            .bind(input.check_in)
            .bind(input.check_out)
            .bind(input.party_size)
            .bind(input.total_price)
            .bind(BookingStatus::Confirmed.id())
            .bind(input.payment_method.id())
            .bind(PaymentStatus::Pending.id())
            .bind(&input.contact_name)
            .bind(&input.contact_email)
            .bind(&input.contact_phone)
            .bind(&input.special_requests)
            .bind(&input.idempotency_key)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(
            booking_id = booking.id,
            room_id = input.room_id,
            "booking admitted"
        );
        Ok(AdmitOutcome::Admitted(booking))
    }

    /// Find a booking by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the booking committed under a given idempotency key, if any.
    pub async fn find_by_idempotency_key(
        pool: &PgPool,
        key: &str,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE idempotency_key = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// List a requester's bookings, newest first.
    pub async fn list_by_requester(
        pool: &PgPool,
        requester_id: DbId,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM bookings \
             WHERE requester_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(requester_id)
            .fetch_all(pool)
            .await
    }

    /// List all bookings on rooms the operator owns, newest first.
    pub async fn list_by_operator(
        pool: &PgPool,
        operator_id: DbId,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM bookings b \
             JOIN rooms r ON r.id = b.room_id \
             WHERE r.owner_id = $1 \
             ORDER BY b.created_at DESC, b.id DESC",
            qualified_columns()
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(operator_id)
            .fetch_all(pool)
            .await
    }

    /// Apply `from -> to` only if the row still has status `from`.
    ///
    /// Cancellations also stamp `cancelled_at`. A `StatusChanged` outcome
    /// means a concurrent transition won the race; the prior row state is
    /// untouched either way.
    pub async fn apply_transition(
        pool: &PgPool,
        booking_id: DbId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        let set_cancelled = if to == BookingStatus::Cancelled {
            ", cancelled_at = NOW()"
        } else {
            ""
        };
        let query = format!(
            "UPDATE bookings \
             SET status_id = $1, updated_at = NOW(){set_cancelled} \
             WHERE id = $2 AND status_id = $3 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Booking>(&query)
            .bind(to.id())
            .bind(booking_id)
            .bind(from.id())
            .fetch_optional(pool)
            .await?;

        match updated {
            Some(booking) => Ok(TransitionOutcome::Applied(booking)),
            None => match Self::find_by_id(pool, booking_id).await? {
                Some(_) => Ok(TransitionOutcome::StatusChanged),
                None => Ok(TransitionOutcome::NotFound),
            },
        }
    }
}

/// Column list qualified with the `b.` alias for joined queries.
fn qualified_columns() -> String {
    COLUMNS
        .split(',')
        .map(|column| format!("b.{}", column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
