//! Guest contact details captured with a booking.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Contact block stored on every booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ContactInfo {
    #[validate(length(min = 1, message = "contact name must not be empty"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "contact phone must not be empty"))]
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactInfo {
        ContactInfo {
            name: "Ada Guest".into(),
            email: "ada@example.com".into(),
            phone: "+1-555-0100".into(),
        }
    }

    #[test]
    fn well_formed_contact_passes() {
        assert!(contact().validate().is_ok());
    }

    #[test]
    fn malformed_email_fails() {
        let mut c = contact();
        c.email = "not-an-email".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn empty_name_fails() {
        let mut c = contact();
        c.name = String::new();
        assert!(c.validate().is_err());
    }
}
