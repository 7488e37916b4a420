//! Rental day count, cost and late fee arithmetic.

use serde::Deserialize;

use crate::models::RentalDate;

/// Late fee charged per day beyond the allowance.
pub const DEFAULT_LATE_FEE_PER_DAY: f64 = 50.0;
/// Days a vehicle can be held before late fees start.
pub const DEFAULT_ALLOWED_RENTAL_DAYS: u32 = 3;

/// Tunable pricing parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    /// Fee for every day held beyond `allowed_rental_days`.
    pub late_fee_per_day: f64,
    /// Grace period in days.
    pub allowed_rental_days: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            late_fee_per_day: DEFAULT_LATE_FEE_PER_DAY,
            allowed_rental_days: DEFAULT_ALLOWED_RENTAL_DAYS,
        }
    }
}

impl PricingPolicy {
    /// `max(0, days - allowed) * fee_per_day`.
    pub fn late_fee(&self, rental_days: u32) -> f64 {
        let late_days = rental_days.saturating_sub(self.allowed_rental_days);
        f64::from(late_days) * self.late_fee_per_day
    }
}

/// Days between two rental dates, never less than one.
///
/// Months count as 30 days and years as 365, so the result drifts from the
/// real calendar across month boundaries. Stored rentals were priced with
/// this rule, which is why it is kept.
pub fn calculate_days(start: RentalDate, end: RentalDate) -> u32 {
    let span = approximate_day_number(end) - approximate_day_number(start);
    u32::try_from(span.max(1)).unwrap_or(u32::MAX)
}

/// `rental_days * price`.
pub fn calculate_total_cost(rental_price: f64, rental_days: u32) -> f64 {
    f64::from(rental_days) * rental_price
}

fn approximate_day_number(date: RentalDate) -> i64 {
    i64::from(date.year()) * 365 + i64::from(date.month()) * 30 + i64::from(date.day())
}
