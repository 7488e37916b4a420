#![allow(missing_docs)]

use std::{fmt, str::FromStr};

use super::{format_amount, Vehicle, VehicleStatus};
use crate::{error::FleetError, validator};

/// Calendar-agnostic `dd/MM/yyyy` date used for rental periods.
///
/// Only the shape is checked, so `31/02/2024` is accepted as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RentalDate {
    day: u32,
    month: u32,
    year: u32,
}

impl RentalDate {
    pub fn new(day: u32, month: u32, year: u32) -> Self {
        Self { day, month, year }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> u32 {
        self.year
    }
}

impl fmt::Display for RentalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{:04}", self.day, self.month, self.year)
    }
}

impl FromStr for RentalDate {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validator::validate_date(s)
    }
}

/// Whether a rental line describes a loan still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentalStatus {
    Active,
    Completed,
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentalStatus {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(Self::Active),
            "Completed" => Ok(Self::Completed),
            other => Err(FleetError::InvalidFormat(format!(
                "Invalid rental status '{other}'."
            ))),
        }
    }
}

/// Rental record: a snapshot of the vehicle plus renter, period and cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Rental {
    pub vehicle_id: String,
    pub model: String,
    pub year: u32,
    pub rental_price: f64,
    pub user_id: String,
    pub start_date: RentalDate,
    /// `None` while the vehicle is still out.
    pub end_date: Option<RentalDate>,
    /// Zero until the vehicle comes back.
    pub total_cost: f64,
}

impl Rental {
    pub fn status(&self) -> RentalStatus {
        if self.end_date.is_some() {
            RentalStatus::Completed
        } else {
            RentalStatus::Active
        }
    }
}

impl fmt::Display for Rental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self
            .end_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "Not returned".to_string());
        write!(
            f,
            "Vehicle: {} ({}), User: {}, Start: {}, End: {}, Total: {}, Status: {}",
            self.vehicle_id,
            self.model,
            self.user_id,
            self.start_date,
            end,
            format_amount(self.total_cost),
            self.status()
        )
    }
}

/// A vehicle currently on loan, occupying its slot in the live fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRental {
    /// Vehicle snapshot; status is `Rented`, or `Maintenance` if serviced mid-loan.
    pub vehicle: Vehicle,
    pub renter: String,
    pub start_date: RentalDate,
}

impl ActiveRental {
    /// Start a loan for `vehicle`, marking it rented.
    pub fn start(mut vehicle: Vehicle, renter: impl Into<String>, start_date: RentalDate) -> Self {
        vehicle.status = VehicleStatus::Rented;
        Self {
            vehicle,
            renter: renter.into(),
            start_date,
        }
    }

    /// The open rental line persisted for this loan.
    pub fn to_rental(&self) -> Rental {
        Rental {
            vehicle_id: self.vehicle.id.clone(),
            model: self.vehicle.model.clone(),
            year: self.vehicle.year,
            rental_price: self.vehicle.rental_price,
            user_id: self.renter.clone(),
            start_date: self.start_date,
            end_date: None,
            total_cost: 0.0,
        }
    }

    /// Close the loan, producing the history entry and the vehicle to put back.
    pub fn complete(self, end_date: RentalDate, total_cost: f64) -> (Rental, Vehicle) {
        let mut rental = self.to_rental();
        rental.end_date = Some(end_date);
        rental.total_cost = total_cost;
        let mut vehicle = self.vehicle;
        vehicle.status = VehicleStatus::Available;
        (rental, vehicle)
    }
}

/// One slot of the live fleet.
#[derive(Debug, Clone, PartialEq)]
pub enum FleetRecord {
    Plain(Vehicle),
    ActiveRental(ActiveRental),
}

impl FleetRecord {
    pub fn vehicle(&self) -> &Vehicle {
        match self {
            Self::Plain(vehicle) => vehicle,
            Self::ActiveRental(rental) => &rental.vehicle,
        }
    }

    pub fn vehicle_mut(&mut self) -> &mut Vehicle {
        match self {
            Self::Plain(vehicle) => vehicle,
            Self::ActiveRental(rental) => &mut rental.vehicle,
        }
    }

    pub fn id(&self) -> &str {
        &self.vehicle().id
    }

    pub fn status(&self) -> VehicleStatus {
        self.vehicle().status
    }

    pub fn as_active_rental(&self) -> Option<&ActiveRental> {
        match self {
            Self::ActiveRental(rental) => Some(rental),
            Self::Plain(_) => None,
        }
    }
}

impl From<Vehicle> for FleetRecord {
    fn from(vehicle: Vehicle) -> Self {
        Self::Plain(vehicle)
    }
}

impl fmt::Display for FleetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(vehicle) => write!(f, "{vehicle}"),
            Self::ActiveRental(rental) => write!(
                f,
                "{}, Renter: {}, Since: {}",
                rental.vehicle, rental.renter, rental.start_date
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_render_zero_padded() {
        assert_eq!(RentalDate::new(1, 2, 2023).to_string(), "01/02/2023");
        let parsed: RentalDate = "04/01/2023".parse().expect("valid date");
        assert_eq!(parsed, RentalDate::new(4, 1, 2023));
        assert!("4/1/2023".parse::<RentalDate>().is_err());
    }

    #[test]
    fn completing_a_loan_restores_an_available_vehicle() {
        let vehicle = Vehicle::available("V11", "Kia Rio", 2021, 60.0);
        let active = ActiveRental::start(vehicle, "U1", RentalDate::new(1, 1, 2023));
        assert_eq!(active.vehicle.status, VehicleStatus::Rented);
        assert_eq!(active.to_rental().status(), RentalStatus::Active);

        let (rental, vehicle) = active.complete(RentalDate::new(4, 1, 2023), 180.0);
        assert_eq!(rental.status(), RentalStatus::Completed);
        assert_eq!(rental.end_date, Some(RentalDate::new(4, 1, 2023)));
        assert_eq!(rental.total_cost, 180.0);
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert_eq!(vehicle.id, "V11");
    }

    #[test]
    fn record_exposes_the_underlying_vehicle() {
        let plain = FleetRecord::from(Vehicle::available("V02", "Mercedes GLC", 2015, 150.0));
        assert_eq!(plain.id(), "V02");
        assert!(plain.as_active_rental().is_none());

        let rented = FleetRecord::ActiveRental(ActiveRental::start(
            Vehicle::available("V03", "BMW X5", 2018, 200.0),
            "U7",
            RentalDate::new(10, 3, 2024),
        ));
        assert_eq!(rented.status(), VehicleStatus::Rented);
        assert_eq!(
            rented.as_active_rental().map(|r| r.renter.as_str()),
            Some("U7")
        );
    }
}
