//! Pure domain model for the reservation engine.
//!
//! Everything here is synchronous and I/O-free so it can be shared by the
//! ledger, the admission coordinator, and any future worker or CLI tooling.

pub mod contact;
pub mod error;
pub mod lifecycle;
pub mod pricing;
pub mod roles;
pub mod status;
pub mod stay;
pub mod types;
