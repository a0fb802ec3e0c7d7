//! Façade behavior: status transitions, authorization, listings, and the
//! room deletion guard.

mod common;

use assert_matches::assert_matches;
use reserva_core::error::ReservationError;
use reserva_core::roles::CallerRole;
use reserva_core::status::{BookingStatus, PaymentMethod};
use reserva_core::stay::StayRange;
use reserva_core::types::DbId;
use reserva_db::models::booking::{Booking, NewBooking};

use common::{contact, make_room, request, rig, stay, TestRig, OWNER};

const GUEST: DbId = 7;
const STRANGER: DbId = 8;
const OTHER_OPERATOR: DbId = 43;

async fn confirmed_booking(rig: &TestRig, room_id: DbId) -> Booking {
    rig.service
        .create_booking(&request(room_id, GUEST, stay(10, 12)))
        .await
        .unwrap()
}

/// Seed a booking in an arbitrary status, for flows admission cannot
/// produce directly (admission always lands on `Confirmed`).
fn seeded_booking(rig: &TestRig, room_id: DbId, status: BookingStatus) -> Booking {
    let range = stay(10, 12);
    let c = contact();
    rig.ledger.seed_booking(
        &NewBooking {
            room_id,
            requester_id: GUEST,
            check_in: range.check_in(),
            check_out: range.check_out(),
            party_size: 2,
            total_price: 16000,
            payment_method: PaymentMethod::Onsite,
            contact_name: c.name,
            contact_email: c.email,
            contact_phone: c.phone,
            special_requests: None,
            idempotency_key: format!("seed-{room_id}-{status:?}"),
        },
        status,
    )
}

#[tokio::test]
async fn operator_advances_the_full_lifecycle() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = confirmed_booking(&rig, room.id).await;

    let checked_in = rig
        .service
        .advance_status(booking.id, OWNER, BookingStatus::CheckedIn)
        .await
        .unwrap();
    assert_eq!(checked_in.status(), Some(BookingStatus::CheckedIn));

    let checked_out = rig
        .service
        .advance_status(booking.id, OWNER, BookingStatus::CheckedOut)
        .await
        .unwrap();
    assert_eq!(checked_out.status(), Some(BookingStatus::CheckedOut));

    // Terminal: nothing moves a checked-out booking.
    let further = rig
        .service
        .advance_status(booking.id, OWNER, BookingStatus::CheckedIn)
        .await;
    assert_matches!(further, Err(ReservationError::AlreadyTerminal { .. }));
}

#[tokio::test]
async fn skipping_a_lifecycle_step_is_invalid() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = confirmed_booking(&rig, room.id).await;

    let result = rig
        .service
        .advance_status(booking.id, OWNER, BookingStatus::CheckedOut)
        .await;
    assert_matches!(
        result,
        Err(ReservationError::InvalidTransition {
            from: BookingStatus::Confirmed,
            to: BookingStatus::CheckedOut
        })
    );

    // The failed attempt left the row untouched.
    let fresh = rig
        .service
        .get_booking(booking.id, GUEST, CallerRole::Requester)
        .await
        .unwrap();
    assert_eq!(fresh.status(), Some(BookingStatus::Confirmed));
}

#[tokio::test]
async fn advance_status_refuses_non_forward_targets() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = confirmed_booking(&rig, room.id).await;

    let result = rig
        .service
        .advance_status(booking.id, OWNER, BookingStatus::Cancelled)
        .await;
    assert_matches!(result, Err(ReservationError::Validation(_)));
}

#[tokio::test]
async fn operator_cancels_a_confirmed_booking() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = confirmed_booking(&rig, room.id).await;

    let cancelled = rig
        .service
        .cancel(booking.id, OWNER, CallerRole::Operator)
        .await
        .unwrap();
    assert_eq!(cancelled.status(), Some(BookingStatus::Cancelled));
    assert!(cancelled.cancelled_at.is_some());
}

#[tokio::test]
async fn requester_cannot_cancel_a_confirmed_booking() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = confirmed_booking(&rig, room.id).await;

    let result = rig
        .service
        .cancel(booking.id, GUEST, CallerRole::Requester)
        .await;
    assert_matches!(result, Err(ReservationError::Forbidden));
}

#[tokio::test]
async fn requester_cancels_their_pending_booking() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = seeded_booking(&rig, room.id, BookingStatus::Pending);

    let cancelled = rig
        .service
        .cancel(booking.id, GUEST, CallerRole::Requester)
        .await
        .unwrap();
    assert_eq!(cancelled.status(), Some(BookingStatus::Cancelled));
    assert!(cancelled.cancelled_at.is_some());
}

#[tokio::test]
async fn cancelling_twice_reports_already_terminal() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = confirmed_booking(&rig, room.id).await;

    rig.service
        .cancel(booking.id, OWNER, CallerRole::Operator)
        .await
        .unwrap();
    let again = rig
        .service
        .cancel(booking.id, OWNER, CallerRole::Operator)
        .await;
    assert_matches!(
        again,
        Err(ReservationError::AlreadyTerminal {
            status: BookingStatus::Cancelled
        })
    );
}

#[tokio::test]
async fn checked_in_bookings_cannot_be_cancelled() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = confirmed_booking(&rig, room.id).await;
    rig.service
        .advance_status(booking.id, OWNER, BookingStatus::CheckedIn)
        .await
        .unwrap();

    let result = rig
        .service
        .cancel(booking.id, OWNER, CallerRole::Operator)
        .await;
    assert_matches!(result, Err(ReservationError::InvalidTransition { .. }));
}

#[tokio::test]
async fn cancellation_frees_the_unit_for_new_admissions() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = confirmed_booking(&rig, room.id).await;

    // Fully booked while the reservation is live.
    let blocked = rig
        .service
        .create_booking(&request(room.id, STRANGER, stay(10, 12)))
        .await;
    assert_matches!(blocked, Err(ReservationError::RoomFullyBooked { .. }));

    rig.service
        .cancel(booking.id, OWNER, CallerRole::Operator)
        .await
        .unwrap();

    let retried = rig
        .service
        .create_booking(&request(room.id, STRANGER, stay(10, 12)))
        .await;
    assert!(retried.is_ok());
}

#[tokio::test]
async fn get_booking_enforces_ownership() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = confirmed_booking(&rig, room.id).await;

    // The requester and the room's operator may look.
    assert!(rig
        .service
        .get_booking(booking.id, GUEST, CallerRole::Requester)
        .await
        .is_ok());
    assert!(rig
        .service
        .get_booking(booking.id, OWNER, CallerRole::Operator)
        .await
        .is_ok());

    // Anyone else may not.
    assert_matches!(
        rig.service
            .get_booking(booking.id, STRANGER, CallerRole::Requester)
            .await,
        Err(ReservationError::Forbidden)
    );
    assert_matches!(
        rig.service
            .get_booking(booking.id, OTHER_OPERATOR, CallerRole::Operator)
            .await,
        Err(ReservationError::Forbidden)
    );
}

#[tokio::test]
async fn missing_booking_reports_not_found() {
    let rig = rig();
    let result = rig
        .service
        .get_booking(999, GUEST, CallerRole::Requester)
        .await;
    assert_matches!(result, Err(ReservationError::BookingNotFound { booking_id: 999 }));
}

#[tokio::test]
async fn listings_are_scoped_to_the_caller() {
    let rig = rig();
    let room = make_room(&rig.ledger, 2, 8000);
    let mine = confirmed_booking(&rig, room.id).await;
    rig.service
        .create_booking(&request(room.id, STRANGER, stay(20, 22)))
        .await
        .unwrap();

    let for_requester = rig.service.list_for_requester(GUEST).await.unwrap();
    assert_eq!(for_requester.len(), 1);
    assert_eq!(for_requester[0].id, mine.id);

    let for_operator = rig.service.list_for_operator(OWNER).await.unwrap();
    assert_eq!(for_operator.len(), 2);

    let for_other_operator = rig.service.list_for_operator(OTHER_OPERATOR).await.unwrap();
    assert!(for_other_operator.is_empty());
}

#[tokio::test]
async fn room_with_live_booking_cannot_be_deleted() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = confirmed_booking(&rig, room.id).await;

    let blocked = rig.service.delete_room(room.id, OWNER).await;
    assert_matches!(blocked, Err(ReservationError::RoomHasActiveBookings { .. }));

    // Cancelling the booking releases the guard.
    rig.service
        .cancel(booking.id, OWNER, CallerRole::Operator)
        .await
        .unwrap();
    assert!(rig.service.delete_room(room.id, OWNER).await.is_ok());

    let gone = rig
        .service
        .create_booking(&request(room.id, GUEST, stay(10, 12)))
        .await;
    assert_matches!(gone, Err(ReservationError::RoomNotFound { .. }));
}

#[tokio::test]
async fn only_the_owner_may_delete_a_room() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);

    let result = rig.service.delete_room(room.id, OTHER_OPERATOR).await;
    assert_matches!(result, Err(ReservationError::Forbidden));
}

#[tokio::test]
async fn half_open_stays_allow_same_day_turnover() {
    let rig = rig();
    let room = make_room(&rig.ledger, 1, 8000);
    let booking = confirmed_booking(&rig, room.id).await;

    // The departing guest checks out the same morning the next arrives.
    let range = StayRange::new(booking.check_out, booking.check_out + chrono::Days::new(2))
        .unwrap();
    let next = rig
        .service
        .create_booking(&request(room.id, STRANGER, range))
        .await;
    assert!(next.is_ok());
}
