//! Repository for the `rooms` table.
//!
//! Rooms are created and edited by the catalog collaborator; this engine
//! treats them as read-only except for the booking-guarded delete, which
//! shares the per-room serialization boundary with admission (both lock the
//! room row first).

use reserva_core::status::{BookingStatus, RoomStatus, StatusId};
use reserva_core::types::DbId;
use sqlx::PgPool;

use crate::models::room::{CreateRoom, Room};

/// Column list for `rooms` queries.
const COLUMNS: &str = "\
    id, property_id, owner_id, name, quantity, nightly_rate, \
    max_occupancy, status_id, created_at, updated_at";

/// Outcome of a guarded room deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRoomOutcome {
    Deleted,
    NotFound,
    /// The room still has bookings in a non-terminal status.
    HasActiveBookings,
}

/// Provides room reads, catalog-side writes, and the guarded delete.
pub struct RoomRepo;

impl RoomRepo {
    /// Insert a new room, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateRoom) -> Result<Room, sqlx::Error> {
        let query = format!(
            "INSERT INTO rooms \
                 (property_id, owner_id, name, quantity, nightly_rate, \
                  max_occupancy, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Room>(&query)
            .bind(input.property_id)
            .bind(input.owner_id)
            .bind(&input.name)
            .bind(input.quantity)
            .bind(input.nightly_rate)
            .bind(input.max_occupancy)
            .bind(input.status.id())
            .fetch_one(pool)
            .await
    }

    /// Find a room by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE id = $1");
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set the operational status. Returns the updated row, or `None` if
    /// the room does not exist.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: RoomStatus,
    ) -> Result<Option<Room>, sqlx::Error> {
        let query = format!(
            "UPDATE rooms SET status_id = $1, updated_at = NOW() \
             WHERE id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Room>(&query)
            .bind(status.id())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether `owner_id` operates `room_id`.
    pub async fn is_owned_by(
        pool: &PgPool,
        room_id: DbId,
        owner_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM rooms WHERE id = $1 AND owner_id = $2")
                .bind(room_id)
                .bind(owner_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0 > 0)
    }

    /// Delete a room unless it still has inventory-holding bookings.
    ///
    /// Locks the room row before checking, so the check cannot race a
    /// concurrent admission for the same room: admission takes the same
    /// lock before counting and inserting. Terminal bookings are history
    /// and are dropped together with the room so no row is left pointing
    /// at a deleted room.
    pub async fn delete_guarded(
        pool: &PgPool,
        id: DbId,
    ) -> Result<DeleteRoomOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM rooms WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(DeleteRoomOutcome::NotFound);
        }

        let active: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings \
             WHERE room_id = $1 AND status_id IN ($2, $3, $4)",
        )
        .bind(id)
        .bind(BookingStatus::Pending as StatusId)
        .bind(BookingStatus::Confirmed as StatusId)
        .bind(BookingStatus::CheckedIn as StatusId)
        .fetch_one(&mut *tx)
        .await?;
        if active.0 > 0 {
            return Ok(DeleteRoomOutcome::HasActiveBookings);
        }

        sqlx::query("DELETE FROM bookings WHERE room_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(room_id = id, "room deleted");
        Ok(DeleteRoomOutcome::Deleted)
    }
}
