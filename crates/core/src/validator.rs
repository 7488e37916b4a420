//! Format checks for user-supplied fields.
//!
//! Everything here is stateless; failures come back as [`FleetError`] values
//! carrying a message that can be printed as-is.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{FleetError, FleetResult},
    models::{FleetRecord, RentalDate, VehicleStatus},
    storage::NOT_RETURNED,
};

static VEHICLE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{3,6}$").expect("invalid vehicle id regex"));
static MODEL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9 ]+$").expect("invalid model name regex"));
static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9]{1,2})?$").expect("invalid price regex"));
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").expect("invalid date regex")
});
static STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(available|rented)$").expect("invalid status regex"));

/// Vehicle IDs are 3-6 ASCII letters or digits.
pub fn validate_vehicle_id(vehicle_id: &str) -> FleetResult<()> {
    if VEHICLE_ID_RE.is_match(vehicle_id) {
        Ok(())
    } else {
        Err(FleetError::InvalidFormat(
            "Invalid Vehicle ID. It must be 3-6 alphanumeric characters.".to_string(),
        ))
    }
}

/// Model names allow letters, digits and spaces only.
pub fn validate_model_name(model: &str) -> FleetResult<()> {
    if MODEL_NAME_RE.is_match(model) {
        Ok(())
    } else {
        Err(FleetError::InvalidFormat(
            "Invalid model name. Only letters, numbers, and spaces are allowed.".to_string(),
        ))
    }
}

/// Prices are non-negative decimals with at most two fractional digits.
pub fn validate_price(price: &str) -> FleetResult<()> {
    if PRICE_RE.is_match(price) {
        Ok(())
    } else {
        Err(FleetError::InvalidFormat(
            "Invalid price. Must be a positive number with up to 2 decimal places.".to_string(),
        ))
    }
}

/// Check the `dd/MM/yyyy` shape and return the parsed date.
///
/// Day and month ranges are deliberately not checked.
pub fn validate_date(date: &str) -> FleetResult<RentalDate> {
    let invalid = || {
        FleetError::InvalidRentalDate(
            "Invalid date format. Must be in the format dd/MM/yyyy.".to_string(),
        )
    };
    let caps = DATE_RE.captures(date).ok_or_else(invalid)?;
    let part = |index: usize| -> FleetResult<u32> {
        caps.get(index)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or_else(invalid)
    };
    Ok(RentalDate::new(part(1)?, part(2)?, part(3)?))
}

/// Accepts `available` or `rented` in any case.
pub fn validate_status(status: &str) -> FleetResult<VehicleStatus> {
    if !STATUS_RE.is_match(status) {
        return Err(FleetError::InvalidFormat(
            "Invalid status. Must be 'available' or 'rented'.".to_string(),
        ));
    }
    status.parse()
}

/// User IDs must be non-empty and must not contain the rental file's separators.
pub fn validate_user_id(user_id: &str) -> FleetResult<()> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() || trimmed == NOT_RETURNED || user_id.contains([',', '\n', '\r']) {
        return Err(FleetError::InvalidFormat(
            "Invalid User ID. It must not be empty or contain commas.".to_string(),
        ));
    }
    Ok(())
}

/// Fails with [`FleetError::DuplicateId`] when `vehicle_id` is already in the live fleet.
pub fn validate_unique_vehicle_id(vehicle_id: &str, records: &[FleetRecord]) -> FleetResult<()> {
    if records.iter().any(|record| record.id() == vehicle_id) {
        return Err(FleetError::DuplicateId(vehicle_id.to_string()));
    }
    Ok(())
}

/// Parse a strictly positive integer, prefixing `error_message` on failure.
pub fn parse_positive_int(input: &str, error_message: &str) -> FleetResult<u32> {
    match input.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(FleetError::InvalidFormat(format!(
            "Invalid input. {error_message}"
        ))),
    }
}

/// Parse a strictly positive, finite decimal, prefixing `error_message` on failure.
pub fn parse_positive_price(input: &str, error_message: &str) -> FleetResult<f64> {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(FleetError::InvalidFormat(format!(
            "Invalid input. {error_message}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vehicle;

    #[test]
    fn vehicle_ids() {
        for good in ["V01", "abc123", "XYZ"] {
            assert!(validate_vehicle_id(good).is_ok(), "{good} should pass");
        }
        for bad in ["V1", "V123456", "V-01", "", "V 01"] {
            assert!(
                matches!(validate_vehicle_id(bad), Err(FleetError::InvalidFormat(_))),
                "{bad} should fail"
            );
        }
    }

    #[test]
    fn model_names() {
        assert!(validate_model_name("Kia Rio").is_ok());
        assert!(validate_model_name("Nissan J32").is_ok());
        assert!(validate_model_name("").is_err());
        assert!(validate_model_name("Kia,Rio").is_err());
        assert!(validate_model_name("Škoda").is_err());
    }

    #[test]
    fn prices() {
        for good in ["60", "60.0", "60.00", "0.5"] {
            assert!(validate_price(good).is_ok(), "{good} should pass");
        }
        for bad in ["-5", "60.123", "abc", "60.", ".5"] {
            assert!(validate_price(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn dates_check_shape_only() {
        assert_eq!(validate_date("01/01/2023"), Ok(RentalDate::new(1, 1, 2023)));
        assert_eq!(validate_date("31/02/2024"), Ok(RentalDate::new(31, 2, 2024)));
        for bad in ["1/1/2023", "2023-01-01", "01/01/23", "01/01/2023 "] {
            assert!(
                matches!(validate_date(bad), Err(FleetError::InvalidRentalDate(_))),
                "{bad} should fail"
            );
        }
    }

    #[test]
    fn statuses() {
        assert_eq!(validate_status("AVAILABLE"), Ok(VehicleStatus::Available));
        assert_eq!(validate_status("Rented"), Ok(VehicleStatus::Rented));
        assert!(validate_status("maintenance").is_err());
    }

    #[test]
    fn user_ids() {
        assert!(validate_user_id("U1").is_ok());
        assert!(validate_user_id("jane doe").is_ok());
        for bad in ["", "   ", "U1,X", "Not returned", "U1\nU2"] {
            assert!(
                matches!(validate_user_id(bad), Err(FleetError::InvalidFormat(_))),
                "{bad:?} should fail"
            );
        }
    }

    #[test]
    fn uniqueness_against_live_fleet() {
        let records = vec![FleetRecord::from(Vehicle::available(
            "V01", "Audi A1", 2013, 120.0,
        ))];
        assert_eq!(
            validate_unique_vehicle_id("V01", &records),
            Err(FleetError::DuplicateId("V01".to_string()))
        );
        assert!(validate_unique_vehicle_id("V02", &records).is_ok());
    }

    #[test]
    fn positive_numbers() {
        assert_eq!(parse_positive_int(" 2024 ", "Year"), Ok(2024));
        assert_eq!(
            parse_positive_int("0", "Year must be a positive number."),
            Err(FleetError::InvalidFormat(
                "Invalid input. Year must be a positive number.".to_string()
            ))
        );
        assert!(parse_positive_int("-3", "x").is_err());
        assert_eq!(parse_positive_price("60.5", "x"), Ok(60.5));
        assert!(parse_positive_price("0", "x").is_err());
        assert!(parse_positive_price("NaN", "x").is_err());
    }
}
