//! Booking rows and write DTOs.

use chrono::NaiveDate;
use reserva_core::status::{BookingStatus, PaymentMethod, PaymentStatus, StatusId};
use reserva_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `bookings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub room_id: DbId,
    pub requester_id: DbId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub party_size: i32,
    /// Total price in minor currency units, fixed at admission time.
    pub total_price: i64,
    pub status_id: StatusId,
    pub payment_method_id: StatusId,
    pub payment_status_id: StatusId,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub special_requests: Option<String>,
    /// Derived from the logical request; unique, so a retried admission
    /// cannot insert twice.
    pub idempotency_key: String,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// Decode `status_id`.
    pub fn status(&self) -> Option<BookingStatus> {
        BookingStatus::try_from_id(self.status_id)
    }

    /// Decode `payment_status_id`.
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        PaymentStatus::try_from_id(self.payment_status_id)
    }
}

/// Write DTO for the admission insert. Built by the admission coordinator;
/// never inserted outside its atomic section.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub room_id: DbId,
    pub requester_id: DbId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub party_size: i32,
    pub total_price: i64,
    pub payment_method: PaymentMethod,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub special_requests: Option<String>,
    pub idempotency_key: String,
}
