//! The reservation service façade.
//!
//! Sole entry point for external callers. Each method dispatches exactly
//! one authorization decision through the access-control collaborator,
//! then defers to the admission coordinator or the lifecycle state
//! machine; no other business rules live here.

use std::sync::Arc;

use reserva_core::error::ReservationError;
use reserva_core::lifecycle;
use reserva_core::roles::CallerRole;
use reserva_core::status::BookingStatus;
use reserva_core::types::DbId;
use reserva_db::models::booking::Booking;
use reserva_db::DbPool;

use crate::access::{AccessControl, PgAccessControl};
use crate::admission::{AdmissionCoordinator, BookingRequest};
use crate::config::AdmissionConfig;
use crate::ledger::{DeleteRoomOutcome, Ledger, LedgerError, PgLedger, TransitionOutcome};

/// Attempts at a compare-and-swap transition before giving up on a row
/// whose status keeps moving underneath us.
const TRANSITION_ATTEMPTS: u32 = 2;

pub struct ReservationService {
    ledger: Arc<dyn Ledger>,
    access: Arc<dyn AccessControl>,
    coordinator: AdmissionCoordinator,
}

impl ReservationService {
    /// Build a service over explicit collaborators.
    ///
    /// The hosting process owns the ledger's lifecycle: it constructs the
    /// pool at startup, passes it in here, and closes it at shutdown.
    /// There is no ambient global handle.
    pub fn new(
        ledger: Arc<dyn Ledger>,
        access: Arc<dyn AccessControl>,
        config: AdmissionConfig,
    ) -> Self {
        let coordinator = AdmissionCoordinator::new(Arc::clone(&ledger), config);
        Self {
            ledger,
            access,
            coordinator,
        }
    }

    /// Wire the PostgreSQL ledger and access control over one pool.
    pub fn over_postgres(pool: DbPool, config: AdmissionConfig) -> Self {
        let ledger = Arc::new(PgLedger::new(pool.clone()));
        let access = Arc::new(PgAccessControl::new(pool));
        Self::new(ledger, access, config)
    }

    /// Create a booking through the admission coordinator.
    pub async fn create_booking(
        &self,
        request: &BookingRequest,
    ) -> Result<Booking, ReservationError> {
        if !self
            .access
            .is_requester(request.requester_id)
            .await
            .map_err(infrastructure)?
        {
            return Err(ReservationError::RequesterNotEligible);
        }
        self.coordinator.admit(request).await
    }

    /// Fetch a booking the caller is allowed to see.
    pub async fn get_booking(
        &self,
        id: DbId,
        caller_id: DbId,
        role: CallerRole,
    ) -> Result<Booking, ReservationError> {
        let booking = self.find(id).await?;
        self.authorize(&booking, caller_id, role).await?;
        Ok(booking)
    }

    /// All bookings a requester has made, newest first.
    pub async fn list_for_requester(
        &self,
        requester_id: DbId,
    ) -> Result<Vec<Booking>, ReservationError> {
        self.ledger
            .list_for_requester(requester_id)
            .await
            .map_err(infrastructure)
    }

    /// All bookings on rooms an operator owns, newest first.
    pub async fn list_for_operator(
        &self,
        operator_id: DbId,
    ) -> Result<Vec<Booking>, ReservationError> {
        self.ledger
            .list_for_operator(operator_id)
            .await
            .map_err(infrastructure)
    }

    /// Cancel a booking.
    ///
    /// Requesters may cancel their own pending bookings; operators may
    /// cancel pending or confirmed bookings on rooms they own.
    pub async fn cancel(
        &self,
        id: DbId,
        caller_id: DbId,
        role: CallerRole,
    ) -> Result<Booking, ReservationError> {
        let booking = self.find(id).await?;
        self.authorize(&booking, caller_id, role).await?;
        self.transition(id, BookingStatus::Cancelled, role).await
    }

    /// Advance a booking's status (operator only). Valid targets are the
    /// forward statuses; cancellation goes through [`Self::cancel`].
    pub async fn advance_status(
        &self,
        id: DbId,
        operator_id: DbId,
        target: BookingStatus,
    ) -> Result<Booking, ReservationError> {
        if !matches!(
            target,
            BookingStatus::Confirmed | BookingStatus::CheckedIn | BookingStatus::CheckedOut
        ) {
            return Err(ReservationError::Validation(format!(
                "{target:?} is not a forward status"
            )));
        }
        let booking = self.find(id).await?;
        self.authorize(&booking, operator_id, CallerRole::Operator)
            .await?;
        self.transition(id, target, CallerRole::Operator).await
    }

    /// Delete a room the operator owns, refusing while any booking on it
    /// still holds inventory.
    pub async fn delete_room(
        &self,
        room_id: DbId,
        operator_id: DbId,
    ) -> Result<(), ReservationError> {
        if !self
            .access
            .is_owner_of_room(operator_id, room_id)
            .await
            .map_err(infrastructure)?
        {
            return Err(ReservationError::Forbidden);
        }
        match self.ledger.delete_room(room_id).await.map_err(infrastructure)? {
            DeleteRoomOutcome::Deleted => Ok(()),
            DeleteRoomOutcome::NotFound => Err(ReservationError::RoomNotFound { room_id }),
            DeleteRoomOutcome::HasActiveBookings => {
                Err(ReservationError::RoomHasActiveBookings { room_id })
            }
        }
    }

    async fn find(&self, id: DbId) -> Result<Booking, ReservationError> {
        self.ledger
            .find_booking(id)
            .await
            .map_err(infrastructure)?
            .ok_or(ReservationError::BookingNotFound { booking_id: id })
    }

    /// Requesters may touch their own bookings, operators those on rooms
    /// they own. The error stays silent about what exists.
    async fn authorize(
        &self,
        booking: &Booking,
        caller_id: DbId,
        role: CallerRole,
    ) -> Result<(), ReservationError> {
        let allowed = match role {
            CallerRole::Requester => booking.requester_id == caller_id,
            CallerRole::Operator => self
                .access
                .is_owner_of_room(caller_id, booking.room_id)
                .await
                .map_err(infrastructure)?,
        };
        if allowed {
            Ok(())
        } else {
            Err(ReservationError::Forbidden)
        }
    }

    /// Re-read, validate, and compare-and-swap. Losing the CAS means a
    /// concurrent transition landed first; the fresh status is re-validated
    /// so the caller gets the precise rejection for the state the row is
    /// actually in.
    async fn transition(
        &self,
        booking_id: DbId,
        target: BookingStatus,
        role: CallerRole,
    ) -> Result<Booking, ReservationError> {
        for _ in 0..TRANSITION_ATTEMPTS {
            let booking = self.find(booking_id).await?;
            let current = decode_status(&booking)?;

            lifecycle::validate_transition(current, target)?;
            if !lifecycle::can_trigger(role, current, target) {
                return Err(ReservationError::Forbidden);
            }

            match self
                .ledger
                .apply_transition(booking_id, current, target)
                .await
                .map_err(infrastructure)?
            {
                TransitionOutcome::Applied(updated) => {
                    tracing::info!(
                        booking_id,
                        from = ?current,
                        to = ?target,
                        "booking transitioned"
                    );
                    return Ok(updated);
                }
                TransitionOutcome::StatusChanged => continue,
                TransitionOutcome::NotFound => {
                    return Err(ReservationError::BookingNotFound { booking_id })
                }
            }
        }
        Err(ReservationError::Infrastructure(
            "booking status kept changing concurrently".into(),
        ))
    }
}

fn decode_status(booking: &Booking) -> Result<BookingStatus, ReservationError> {
    booking.status().ok_or_else(|| {
        ReservationError::Infrastructure(format!(
            "booking {} has unrecognized status id {}",
            booking.id, booking.status_id
        ))
    })
}

fn infrastructure(err: LedgerError) -> ReservationError {
    ReservationError::Infrastructure(err.to_string())
}
