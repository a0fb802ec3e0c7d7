//! In-memory ledger.
//!
//! Backs the engine's integration tests and embedded use without a running
//! PostgreSQL. The per-room serialization boundary is a per-room
//! `tokio::sync::Mutex` held across the whole check-then-insert sequence,
//! mirroring what the row lock gives the PostgreSQL ledger. Transient
//! faults can be injected between the overlap count and the insert to
//! exercise the coordinator's retry path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;
use reserva_core::status::{BookingStatus, PaymentStatus, RoomStatus};
use reserva_core::stay::StayRange;
use reserva_core::types::DbId;
use reserva_db::models::booking::{Booking, NewBooking};
use reserva_db::models::room::{CreateRoom, Room};
use tokio::sync::Mutex as AsyncMutex;

use crate::access::AccessControl;

use super::{AdmitOutcome, DeleteRoomOutcome, Ledger, LedgerError, TransitionOutcome};

#[derive(Default)]
struct State {
    rooms: HashMap<DbId, Room>,
    bookings: HashMap<DbId, Booking>,
    by_idempotency_key: HashMap<String, DbId>,
    next_room_id: DbId,
    next_booking_id: DbId,
}

impl State {
    fn count_overlapping(
        &self,
        room_id: DbId,
        check_in: chrono::NaiveDate,
        check_out: chrono::NaiveDate,
        exclude_booking: Option<DbId>,
    ) -> i64 {
        self.bookings
            .values()
            .filter(|b| {
                b.room_id == room_id
                    && b.status().is_some_and(|s| s.holds_inventory())
                    && b.check_in < check_out
                    && b.check_out > check_in
                    && exclude_booking.map_or(true, |id| id != b.id)
            })
            .count() as i64
    }

    fn insert_booking(&mut self, input: &NewBooking, status: BookingStatus) -> Booking {
        self.next_booking_id += 1;
        let now = Utc::now();
        let booking = Booking {
            id: self.next_booking_id,
            room_id: input.room_id,
            requester_id: input.requester_id,
            check_in: input.check_in,
            check_out: input.check_out,
            party_size: input.party_size,
            total_price: input.total_price,
            status_id: status.id(),
            payment_method_id: input.payment_method.id(),
            payment_status_id: PaymentStatus::Pending.id(),
            contact_name: input.contact_name.clone(),
            contact_email: input.contact_email.clone(),
            contact_phone: input.contact_phone.clone(),
            special_requests: input.special_requests.clone(),
            idempotency_key: input.idempotency_key.clone(),
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };
        self.by_idempotency_key
            .insert(booking.idempotency_key.clone(), booking.id);
        self.bookings.insert(booking.id, booking.clone());
        booking
    }
}

pub struct MemoryLedger {
    state: StdMutex<State>,
    room_locks: StdMutex<HashMap<DbId, Arc<AsyncMutex<()>>>>,
    /// Remaining injected faults; each one fails a single `admit` attempt
    /// after its overlap count and before its insert.
    faults: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            state: StdMutex::new(State::default()),
            room_locks: StdMutex::new(HashMap::new()),
            faults: AtomicUsize::new(0),
        }
    }

    /// Insert a room, assigning it an id (catalog collaborator stand-in).
    pub fn insert_room(&self, input: &CreateRoom) -> Room {
        let mut state = self.state.lock().expect("ledger state poisoned");
        state.next_room_id += 1;
        let now = Utc::now();
        let room = Room {
            id: state.next_room_id,
            property_id: input.property_id,
            owner_id: input.owner_id,
            name: input.name.clone(),
            quantity: input.quantity,
            nightly_rate: input.nightly_rate,
            max_occupancy: input.max_occupancy,
            status_id: input.status.id(),
            created_at: now,
            updated_at: now,
        };
        state.rooms.insert(room.id, room.clone());
        room
    }

    /// Flip a room's operational status.
    pub fn set_room_status(&self, room_id: DbId, status: RoomStatus) {
        let mut state = self.state.lock().expect("ledger state poisoned");
        if let Some(room) = state.rooms.get_mut(&room_id) {
            room.status_id = status.id();
            room.updated_at = Utc::now();
        }
    }

    /// Seed a booking directly with the given status, bypassing admission.
    /// Fixture support for lifecycle tests that need a `PENDING` row.
    pub fn seed_booking(&self, input: &NewBooking, status: BookingStatus) -> Booking {
        let mut state = self.state.lock().expect("ledger state poisoned");
        state.insert_booking(input, status)
    }

    /// Arrange for the next `n` admit attempts to fail transiently after
    /// their overlap count and before their insert.
    pub fn inject_transient_faults(&self, n: usize) {
        self.faults.store(n, Ordering::Release);
    }

    /// Total bookings currently stored, regardless of status.
    pub fn booking_count(&self) -> usize {
        self.state.lock().expect("ledger state poisoned").bookings.len()
    }

    fn lock_for_room(&self, room_id: DbId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.room_locks.lock().expect("room lock registry poisoned");
        Arc::clone(locks.entry(room_id).or_default())
    }

    fn take_fault(&self) -> Result<(), LedgerError> {
        let mut current = self.faults.load(Ordering::Acquire);
        while current > 0 {
            match self.faults.compare_exchange(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Err(LedgerError::Unavailable("injected transient fault".into()))
                }
                Err(actual) => current = actual,
            }
        }
        Ok(())
    }

    fn room_owner(&self, room_id: DbId) -> Option<DbId> {
        self.state
            .lock()
            .expect("ledger state poisoned")
            .rooms
            .get(&room_id)
            .map(|room| room.owner_id)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn find_room(&self, id: DbId) -> Result<Option<Room>, LedgerError> {
        let state = self.state.lock().expect("ledger state poisoned");
        Ok(state.rooms.get(&id).cloned())
    }

    async fn count_overlapping(
        &self,
        room_id: DbId,
        stay: &StayRange,
        exclude_booking: Option<DbId>,
    ) -> Result<i64, LedgerError> {
        let state = self.state.lock().expect("ledger state poisoned");
        Ok(state.count_overlapping(room_id, stay.check_in(), stay.check_out(), exclude_booking))
    }

    async fn admit(&self, input: &NewBooking) -> Result<AdmitOutcome, LedgerError> {
        let room_lock = self.lock_for_room(input.room_id);
        let _guard = room_lock.lock().await;

        let mut state = self.state.lock().expect("ledger state poisoned");

        let Some(room) = state.rooms.get(&input.room_id).cloned() else {
            return Ok(AdmitOutcome::RoomMissing);
        };
        if !room.is_bookable() {
            return Ok(AdmitOutcome::RoomNotBookable);
        }

        if let Some(id) = state.by_idempotency_key.get(&input.idempotency_key) {
            let existing = state.bookings[id].clone();
            return Ok(AdmitOutcome::Replayed(existing));
        }

        let taken =
            state.count_overlapping(input.room_id, input.check_in, input.check_out, None);
        if taken >= room.quantity as i64 {
            return Ok(AdmitOutcome::FullyBooked);
        }

        self.take_fault()?;

        let booking = state.insert_booking(input, BookingStatus::Confirmed);
        tracing::info!(
            booking_id = booking.id,
            room_id = input.room_id,
            "booking admitted"
        );
        Ok(AdmitOutcome::Admitted(booking))
    }

    async fn find_booking(&self, id: DbId) -> Result<Option<Booking>, LedgerError> {
        let state = self.state.lock().expect("ledger state poisoned");
        Ok(state.bookings.get(&id).cloned())
    }

    async fn list_for_requester(
        &self,
        requester_id: DbId,
    ) -> Result<Vec<Booking>, LedgerError> {
        let state = self.state.lock().expect("ledger state poisoned");
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.requester_id == requester_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }

    async fn list_for_operator(
        &self,
        operator_id: DbId,
    ) -> Result<Vec<Booking>, LedgerError> {
        let state = self.state.lock().expect("ledger state poisoned");
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| {
                state
                    .rooms
                    .get(&b.room_id)
                    .is_some_and(|room| room.owner_id == operator_id)
            })
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }

    async fn apply_transition(
        &self,
        booking_id: DbId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<TransitionOutcome, LedgerError> {
        let mut state = self.state.lock().expect("ledger state poisoned");
        let Some(booking) = state.bookings.get_mut(&booking_id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if booking.status_id != from.id() {
            return Ok(TransitionOutcome::StatusChanged);
        }
        booking.status_id = to.id();
        booking.updated_at = Utc::now();
        if to == BookingStatus::Cancelled {
            booking.cancelled_at = Some(booking.updated_at);
        }
        Ok(TransitionOutcome::Applied(booking.clone()))
    }

    async fn delete_room(&self, room_id: DbId) -> Result<DeleteRoomOutcome, LedgerError> {
        let room_lock = self.lock_for_room(room_id);
        let _guard = room_lock.lock().await;

        let mut state = self.state.lock().expect("ledger state poisoned");
        if !state.rooms.contains_key(&room_id) {
            return Ok(DeleteRoomOutcome::NotFound);
        }

        let has_active = state.bookings.values().any(|b| {
            b.room_id == room_id && b.status().is_some_and(|s| s.holds_inventory())
        });
        if has_active {
            return Ok(DeleteRoomOutcome::HasActiveBookings);
        }

        state.bookings.retain(|_, b| b.room_id != room_id);
        state.rooms.remove(&room_id);
        Ok(DeleteRoomOutcome::Deleted)
    }
}

/// Access control answering ownership from the in-memory rooms table.
/// Pairs with [`MemoryLedger`] in tests and embedded use.
pub struct MemoryAccessControl {
    ledger: Arc<MemoryLedger>,
}

impl MemoryAccessControl {
    pub fn new(ledger: Arc<MemoryLedger>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl AccessControl for MemoryAccessControl {
    async fn is_owner_of_room(
        &self,
        operator_id: DbId,
        room_id: DbId,
    ) -> Result<bool, LedgerError> {
        Ok(self.ledger.room_owner(room_id) == Some(operator_id))
    }

    async fn is_requester(&self, requester_id: DbId) -> Result<bool, LedgerError> {
        Ok(requester_id > 0)
    }
}
