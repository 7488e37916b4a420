//! Domain error taxonomy.

use thiserror::Error;

/// Recoverable failures raised by validation and fleet operations.
///
/// Every variant carries a message fit for printing straight to the console;
/// none of them should ever terminate the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FleetError {
    /// Input does not match the expected format or range.
    #[error("{0}")]
    InvalidFormat(String),
    /// A vehicle with the same identifier already exists.
    #[error("Error: Vehicle with ID {0} already exists.")]
    DuplicateId(String),
    /// No live record carries the given identifier.
    #[error("Vehicle with ID {0} not found.")]
    NotFound(String),
    /// A rental date is not in `dd/MM/yyyy` form.
    #[error("{0}")]
    InvalidRentalDate(String),
    /// The vehicle exists but cannot be rented in its current state.
    #[error("Vehicle {0} is not available.")]
    NotAvailable(String),
    /// The vehicle is not currently out on a rental.
    #[error("Error: Vehicle {0} is not rented.")]
    NotRented(String),
    /// The vehicle is rented by someone else.
    #[error("Error: Vehicle {vehicle_id} not rented by user {user_id}.")]
    RenterMismatch {
        /// Vehicle being returned.
        vehicle_id: String,
        /// User attempting the return.
        user_id: String,
    },
    /// The vehicle is already under maintenance.
    #[error("Vehicle {0} is already under maintenance.")]
    AlreadyInMaintenance(String),
    /// The vehicle is not under maintenance.
    #[error("Vehicle {0} is not under maintenance.")]
    NotInMaintenance(String),
}

impl FleetError {
    /// Whether this error belongs to the invalid-input family (format or duplicate ID).
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidFormat(_) | Self::DuplicateId(_))
    }
}

/// Convenience alias for fleet results.
pub type FleetResult<T> = Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            FleetError::DuplicateId("V01".to_string()).to_string(),
            "Error: Vehicle with ID V01 already exists."
        );
        assert_eq!(
            FleetError::NotFound("ZZ9".to_string()).to_string(),
            "Vehicle with ID ZZ9 not found."
        );
        let mismatch = FleetError::RenterMismatch {
            vehicle_id: "V03".to_string(),
            user_id: "U2".to_string(),
        };
        assert_eq!(
            mismatch.to_string(),
            "Error: Vehicle V03 not rented by user U2."
        );
    }

    #[test]
    fn invalid_input_family() {
        assert!(FleetError::InvalidFormat("bad".into()).is_invalid_input());
        assert!(FleetError::DuplicateId("V01".into()).is_invalid_input());
        assert!(!FleetError::NotFound("V01".into()).is_invalid_input());
        assert!(!FleetError::InvalidRentalDate("bad".into()).is_invalid_input());
    }
}
