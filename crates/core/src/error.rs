//! Error taxonomy for the reservation engine.
//!
//! Input-validation failures, business-rule rejections, authorization
//! failures, and infrastructure failures are distinct variants so callers
//! can tell "no rooms left for these dates" apart from "please try again"
//! apart from "you don't have permission".

use chrono::NaiveDate;

use crate::status::BookingStatus;
use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReservationError {
    // --- Input validation: rejected before any ledger access ---
    #[error("check-out {check_out} must be strictly after check-in {check_in}")]
    InvalidDateRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("check-in {check_in} is in the past")]
    CheckInInPast { check_in: NaiveDate },

    #[error("validation failed: {0}")]
    Validation(String),

    // --- Business-rule rejections: surfaced verbatim, never retried ---
    #[error("room {room_id} has no free unit for the requested dates")]
    RoomFullyBooked { room_id: DbId },

    #[error("room {room_id} is not accepting bookings")]
    RoomNotBookable { room_id: DbId },

    #[error("room {room_id} still has active bookings")]
    RoomHasActiveBookings { room_id: DbId },

    #[error("no transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("booking is already in terminal status {status:?}")]
    AlreadyTerminal { status: BookingStatus },

    // --- Lookups ---
    #[error("room {room_id} not found")]
    RoomNotFound { room_id: DbId },

    #[error("booking {booking_id} not found")]
    BookingNotFound { booking_id: DbId },

    #[error("requester reference is missing or not eligible")]
    RequesterNotEligible,

    // --- Authorization ---
    /// Deliberately vague: the message must not confirm or deny that the
    /// resource exists.
    #[error("forbidden")]
    Forbidden,

    // --- Infrastructure: transient, retried inside the coordinator only ---
    #[error("reservation system unavailable: {0}")]
    Infrastructure(String),
}

impl ReservationError {
    /// Whether the caller may usefully retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReservationError::Infrastructure(_))
    }
}
