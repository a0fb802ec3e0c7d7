//! Room rows: sellable unit types with a finite number of interchangeable
//! physical units.

use reserva_core::status::{RoomStatus, StatusId};
use reserva_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `rooms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: DbId,
    /// Property this room belongs to (catalog-managed, opaque here).
    pub property_id: DbId,
    /// Operator the access-control collaborator resolves ownership against.
    pub owner_id: DbId,
    pub name: String,
    /// Number of interchangeable physical units. Always >= 1.
    pub quantity: i32,
    /// Nightly rate in minor currency units.
    pub nightly_rate: i64,
    /// Occupancy limit per unit.
    pub max_occupancy: i32,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Room {
    /// Decode `status_id`. Unknown ids decode to `None` and are treated as
    /// not bookable.
    pub fn status(&self) -> Option<RoomStatus> {
        RoomStatus::try_from_id(self.status_id)
    }

    /// Whether the room admits new bookings at all, regardless of remaining
    /// numeric capacity.
    pub fn is_bookable(&self) -> bool {
        self.status() == Some(RoomStatus::Available)
    }
}

/// Write DTO for inserting a room (catalog collaborator and test fixtures).
#[derive(Debug, Clone)]
pub struct CreateRoom {
    pub property_id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub quantity: i32,
    pub nightly_rate: i64,
    pub max_occupancy: i32,
    pub status: RoomStatus,
}
