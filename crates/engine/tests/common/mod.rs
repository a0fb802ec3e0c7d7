//! Shared fixtures for the engine integration tests.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use reserva_core::contact::ContactInfo;
use reserva_core::status::{PaymentMethod, RoomStatus};
use reserva_core::stay::StayRange;
use reserva_core::types::DbId;
use reserva_db::models::room::{CreateRoom, Room};
use reserva_engine::ledger::{Ledger, MemoryAccessControl, MemoryLedger};
use reserva_engine::{AdmissionConfig, BookingRequest, ReservationService};
use uuid::Uuid;

/// Operator who owns every room created by [`make_room`].
pub const OWNER: DbId = 42;

/// One in-memory ledger plus the service built over it.
pub struct TestRig {
    pub ledger: Arc<MemoryLedger>,
    pub service: ReservationService,
}

pub fn rig() -> TestRig {
    rig_with_config(AdmissionConfig::default())
}

pub fn rig_with_config(config: AdmissionConfig) -> TestRig {
    init_tracing();
    let ledger = Arc::new(MemoryLedger::new());
    let access = Arc::new(MemoryAccessControl::new(Arc::clone(&ledger)));
    let service =
        ReservationService::new(Arc::clone(&ledger) as Arc<dyn Ledger>, access, config);
    TestRig { ledger, service }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn make_room(ledger: &MemoryLedger, quantity: i32, nightly_rate: i64) -> Room {
    ledger.insert_room(&CreateRoom {
        property_id: 1,
        owner_id: OWNER,
        name: "Seaview Double".into(),
        quantity,
        nightly_rate,
        max_occupancy: 4,
        status: RoomStatus::Available,
    })
}

/// A calendar date `offset` days from today. Admission rejects past
/// check-ins, so every fixture stay sits in the future.
pub fn day(offset: u64) -> NaiveDate {
    Utc::now().date_naive() + Days::new(offset)
}

pub fn stay(from_offset: u64, to_offset: u64) -> StayRange {
    StayRange::new(day(from_offset), day(to_offset)).unwrap()
}

pub fn contact() -> ContactInfo {
    ContactInfo {
        name: "Ada Guest".into(),
        email: "ada@example.com".into(),
        phone: "+1-555-0100".into(),
    }
}

pub fn request(room_id: DbId, requester_id: DbId, stay: StayRange) -> BookingRequest {
    BookingRequest {
        room_id,
        requester_id,
        stay,
        party_size: 2,
        contact: contact(),
        payment_method: PaymentMethod::Card,
        special_requests: None,
        nonce: Uuid::new_v4(),
    }
}
