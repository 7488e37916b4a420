//! Shared domain models.

mod rental;
mod vehicle;

pub use rental::{ActiveRental, FleetRecord, Rental, RentalDate, RentalStatus};
pub use vehicle::{Vehicle, VehicleStatus};

/// Render a monetary amount the way the data files store it.
///
/// Whole values keep a single decimal (`120.0`), anything else uses the
/// shortest representation that round-trips (`60.5`, `99.99`).
pub fn format_amount(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
