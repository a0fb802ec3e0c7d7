//! Status enums mapping to SMALLINT lookup tables.
//!
//! Each variant's discriminant matches the seed data order (1-based) in the
//! corresponding `*_statuses` table created by the `reserva-db` migrations.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Decode a database status ID back into the enum.
            pub fn try_from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Booking lifecycle status.
    BookingStatus {
        Pending = 1,
        Confirmed = 2,
        CheckedIn = 3,
        CheckedOut = 4,
        Cancelled = 5,
    }
}

define_status_enum! {
    /// Room operational status.
    RoomStatus {
        Available = 1,
        Unavailable = 2,
        Maintenance = 3,
    }
}

define_status_enum! {
    /// Payment settlement status.
    PaymentStatus {
        Pending = 1,
        Completed = 2,
        Failed = 3,
    }
}

define_status_enum! {
    /// How the guest pays.
    PaymentMethod {
        Onsite = 1,
        Card = 2,
    }
}

impl BookingStatus {
    /// Statuses that hold a unit of inventory and count against a room's
    /// quantity.
    pub const ACTIVE: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::CheckedIn,
    ];

    /// A terminal booking admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::Cancelled)
    }

    /// Whether this status holds a unit of room inventory.
    pub fn holds_inventory(self) -> bool {
        Self::ACTIVE.contains(&self)
    }
}
