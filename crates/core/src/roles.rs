//! Caller roles as seen by the façade.
//!
//! Identity and role assignment live with the access-control collaborator;
//! the engine only needs to know which hat the caller is wearing for a given
//! call.

/// Role under which a façade method is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
    /// The guest who requested the booking.
    Requester,
    /// An operator of the property the room belongs to.
    Operator,
}
