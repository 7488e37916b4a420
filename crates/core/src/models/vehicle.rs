use std::{fmt, str::FromStr};

use super::format_amount;
use crate::error::FleetError;

/// Lifecycle state of a vehicle in the live fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleStatus {
    /// Ready to be rented.
    Available,
    /// Out on loan.
    Rented,
    /// Withdrawn for servicing.
    Maintenance,
}

impl VehicleStatus {
    /// Label written to the vehicle file and shown to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Rented => "Rented",
            Self::Maintenance => "Maintenance",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "rented" => Ok(Self::Rented),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(FleetError::InvalidFormat(format!(
                "Invalid status '{other}'. Must be 'available', 'rented' or 'maintenance'."
            ))),
        }
    }
}

/// A vehicle in the fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// Unique identifier, 3-6 alphanumeric characters.
    pub id: String,
    /// Model name.
    pub model: String,
    /// Manufacturing year.
    pub year: u32,
    /// Price charged per rental day.
    pub rental_price: f64,
    /// Current lifecycle state.
    pub status: VehicleStatus,
}

impl Vehicle {
    /// Build a vehicle with an explicit status.
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        year: u32,
        rental_price: f64,
        status: VehicleStatus,
    ) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            year,
            rental_price,
            status,
        }
    }

    /// Build a vehicle ready to be rented.
    pub fn available(
        id: impl Into<String>,
        model: impl Into<String>,
        year: u32,
        rental_price: f64,
    ) -> Self {
        Self::new(id, model, year, rental_price, VehicleStatus::Available)
    }

    /// Whether the vehicle can be rented right now.
    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Model: {}, Year: {}, Price: {}, Status: {}",
            self.id,
            self.model,
            self.year,
            format_amount(self.rental_price),
            self.status
        )
    }
}
