//! Reservation admission and lifecycle engine.
//!
//! The admission coordinator is the only path that creates bookings; it
//! delegates the check-then-insert critical section to a [`ledger::Ledger`],
//! which is where the per-room serialization boundary lives. The
//! [`service::ReservationService`] façade adds authorization dispatch on top
//! and is the surface external callers consume.

pub mod access;
pub mod admission;
pub mod config;
pub mod ledger;
pub mod service;

pub use admission::{AdmissionCoordinator, BookingRequest};
pub use config::AdmissionConfig;
pub use service::ReservationService;
