//! Reservation admission: the only path that creates bookings.
//!
//! The coordinator runs every precondition and the price computation
//! before the serialization boundary, then hands the ledger one atomic
//! check-then-insert. Transient ledger failures are retried a bounded
//! number of times, and every retry re-runs the overlap count inside the
//! boundary; a stale count is never reused.
//!
//! Date-range validation happens even earlier: [`StayRange`] cannot be
//! constructed with `check_out <= check_in`, so an `InvalidDateRange`
//! surfaces when the request is built, before any ledger access.

use std::sync::Arc;

use chrono::Utc;
use reserva_core::contact::ContactInfo;
use reserva_core::error::ReservationError;
use reserva_core::pricing;
use reserva_core::status::PaymentMethod;
use reserva_core::stay::StayRange;
use reserva_core::types::DbId;
use reserva_db::models::booking::{Booking, NewBooking};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use validator::Validate;

use crate::config::AdmissionConfig;
use crate::ledger::{AdmitOutcome, Ledger, LedgerError};

/// One logical booking request as submitted by a caller.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub room_id: DbId,
    pub requester_id: DbId,
    pub stay: StayRange,
    pub party_size: i32,
    pub contact: ContactInfo,
    pub payment_method: PaymentMethod,
    pub special_requests: Option<String>,
    /// Client-chosen submission nonce. Resubmitting with the same nonce
    /// (and the same everything else) replays the original admission
    /// instead of creating a second booking.
    pub nonce: Uuid,
}

impl BookingRequest {
    /// Deterministic idempotency key for this logical request.
    fn idempotency_key(&self) -> String {
        let material = format!(
            "{}|{}|{}|{}|{}",
            self.requester_id,
            self.room_id,
            self.stay.check_in(),
            self.stay.check_out(),
            self.nonce
        );
        let digest = Sha256::digest(material.as_bytes());
        format!("{digest:x}")
    }
}

/// Coordinates precondition checks, pricing, and the atomic admit.
pub struct AdmissionCoordinator {
    ledger: Arc<dyn Ledger>,
    config: AdmissionConfig,
}

impl AdmissionCoordinator {
    pub fn new(ledger: Arc<dyn Ledger>, config: AdmissionConfig) -> Self {
        Self { ledger, config }
    }

    /// Admit or reject `request`.
    ///
    /// The whole call, retries included, runs under the configured admit
    /// timeout. An expired in-flight attempt is dropped and its transaction
    /// rolls back, so either a full booking row was committed or nothing
    /// was written.
    pub async fn admit(&self, request: &BookingRequest) -> Result<Booking, ReservationError> {
        match tokio::time::timeout(self.config.admit_timeout, self.admit_inner(request)).await {
            Ok(result) => result,
            Err(_) => Err(ReservationError::Infrastructure(format!(
                "admission timed out after {:?}",
                self.config.admit_timeout
            ))),
        }
    }

    async fn admit_inner(&self, request: &BookingRequest) -> Result<Booking, ReservationError> {
        let room = self
            .ledger
            .find_room(request.room_id)
            .await
            .map_err(infrastructure)?
            .ok_or(ReservationError::RoomNotFound {
                room_id: request.room_id,
            })?;

        if !room.is_bookable() {
            return Err(ReservationError::RoomNotBookable { room_id: room.id });
        }

        let today = Utc::now().date_naive();
        if request.stay.check_in() < today {
            return Err(ReservationError::CheckInInPast {
                check_in: request.stay.check_in(),
            });
        }

        if request.requester_id <= 0 {
            return Err(ReservationError::RequesterNotEligible);
        }

        request
            .contact
            .validate()
            .map_err(|err| ReservationError::Validation(err.to_string()))?;

        if request.party_size < 1 {
            return Err(ReservationError::Validation(
                "party size must be at least 1".into(),
            ));
        }
        if request.party_size > room.max_occupancy {
            return Err(ReservationError::Validation(format!(
                "party of {} exceeds the room's occupancy limit of {}",
                request.party_size, room.max_occupancy
            )));
        }

        let total_price = pricing::total_for_stay(room.nightly_rate, &request.stay);

        let input = NewBooking {
            room_id: request.room_id,
            requester_id: request.requester_id,
            check_in: request.stay.check_in(),
            check_out: request.stay.check_out(),
            party_size: request.party_size,
            total_price,
            payment_method: request.payment_method,
            contact_name: request.contact.name.clone(),
            contact_email: request.contact.email.clone(),
            contact_phone: request.contact.phone.clone(),
            special_requests: request.special_requests.clone(),
            idempotency_key: request.idempotency_key(),
        };

        let mut attempt: u32 = 0;
        loop {
            match self.ledger.admit(&input).await {
                Ok(AdmitOutcome::Admitted(booking)) => {
                    tracing::info!(
                        booking_id = booking.id,
                        room_id = request.room_id,
                        total_price,
                        "booking created"
                    );
                    return Ok(booking);
                }
                Ok(AdmitOutcome::Replayed(booking)) => {
                    tracing::info!(
                        booking_id = booking.id,
                        room_id = request.room_id,
                        "admission replayed an already-committed booking"
                    );
                    return Ok(booking);
                }
                Ok(AdmitOutcome::RoomMissing) => {
                    return Err(ReservationError::RoomNotFound {
                        room_id: request.room_id,
                    })
                }
                Ok(AdmitOutcome::RoomNotBookable) => {
                    return Err(ReservationError::RoomNotBookable {
                        room_id: request.room_id,
                    })
                }
                Ok(AdmitOutcome::FullyBooked) => {
                    return Err(ReservationError::RoomFullyBooked {
                        room_id: request.room_id,
                    })
                }
                Err(LedgerError::Unavailable(message)) if attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        room_id = request.room_id,
                        attempt,
                        error = %message,
                        "transient ledger failure during admission; retrying with a fresh count"
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                Err(err) => {
                    tracing::error!(
                        room_id = request.room_id,
                        error = %err,
                        "admission failed"
                    );
                    return Err(ReservationError::Infrastructure(err.to_string()));
                }
            }
        }
    }
}

fn infrastructure(err: LedgerError) -> ReservationError {
    ReservationError::Infrastructure(err.to_string())
}
