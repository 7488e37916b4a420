use tracing::{error, info};

use super::Identity;
use crate::{
    error::FleetResult,
    fleet::{
        EarningsReport, FleetHandle, FleetStatistics, LateFeeEntry, TOP_NEWEST_COUNT,
    },
    models::{format_amount, FleetRecord, Rental, Vehicle, VehicleStatus},
    validator,
};

/// Currently rented vehicles, rental history and the late fees it incurred.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalReport {
    /// Live records with status `Rented`.
    pub rented: Vec<FleetRecord>,
    /// Completed rentals.
    pub history: Vec<Rental>,
    /// History entries with a non-zero late fee.
    pub late_fees: Vec<LateFeeEntry>,
}

/// Rental report plus earnings.
#[derive(Debug, Clone, PartialEq)]
pub struct FullReport {
    /// Rental section.
    pub rental: RentalReport,
    /// Earnings section.
    pub earnings: EarningsReport,
    /// Revenue accumulator at report time.
    pub total_revenue: f64,
}

/// Administrative access: fleet upkeep, maintenance and reporting.
#[derive(Debug, Clone)]
pub struct AdminSession {
    identity: Identity,
    fleet: FleetHandle,
}

impl AdminSession {
    /// Open a session for `identity` over the shared fleet.
    pub fn new(identity: Identity, fleet: FleetHandle) -> Self {
        Self { identity, fleet }
    }

    /// Validate the vehicle's fields, then add it.
    pub fn add_vehicle(&self, vehicle: Vehicle) -> FleetResult<()> {
        validator::validate_vehicle_id(&vehicle.id)?;
        validator::validate_model_name(&vehicle.model)?;
        validator::validate_price(&format_amount(vehicle.rental_price))?;

        let vehicle_id = vehicle.id.clone();
        self.fleet.write().add_vehicle(vehicle)?;
        info!("{} added Vehicle: ID = {vehicle_id}", self.identity);
        Ok(())
    }

    /// Remove a vehicle by ID.
    pub fn remove_vehicle(&self, vehicle_id: &str) -> FleetResult<FleetRecord> {
        let result = self.fleet.write().remove_vehicle(vehicle_id);
        match &result {
            Ok(_) => info!("{} removed Vehicle: ID = {vehicle_id}", self.identity),
            Err(_) => error!("{} failed to remove Vehicle: ID = {vehicle_id}", self.identity),
        }
        result
    }

    /// Change a vehicle's daily price.
    pub fn update_vehicle(&self, vehicle_id: &str, price: f64) -> FleetResult<()> {
        self.fleet.write().update_vehicle(vehicle_id, price)
    }

    /// Retire vehicles past the configured age.
    pub fn remove_old(&self, current_year: u32) -> Vec<FleetRecord> {
        let retired = self.fleet.write().remove_old(current_year);
        info!(
            "{} removed {} old vehicle(s) as of {current_year}",
            self.identity,
            retired.len()
        );
        retired
    }

    /// Fleet statistics.
    pub fn statistics(&self) -> FleetStatistics {
        self.fleet.read().statistics()
    }

    /// Vehicles ready to rent.
    pub fn available_vehicles(&self) -> Vec<Vehicle> {
        self.fleet
            .read()
            .available_vehicles()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Vehicles out on loan.
    pub fn rented_vehicles(&self) -> Vec<FleetRecord> {
        self.records_with_status(VehicleStatus::Rented)
    }

    /// Vehicles being serviced.
    pub fn vehicles_under_maintenance(&self) -> Vec<FleetRecord> {
        self.records_with_status(VehicleStatus::Maintenance)
    }

    /// The three newest vehicles.
    pub fn top_newest(&self) -> Vec<Vehicle> {
        self.fleet
            .read()
            .top_newest(TOP_NEWEST_COUNT)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Take a vehicle out of service.
    pub fn send_to_maintenance(&self, vehicle_id: &str) -> FleetResult<()> {
        self.fleet.write().send_to_maintenance(vehicle_id)
    }

    /// Return a vehicle to service.
    pub fn restore_vehicle(&self, vehicle_id: &str) -> FleetResult<()> {
        self.fleet.write().restore_vehicle(vehicle_id)
    }

    /// Rented vehicles, history and late fees.
    pub fn rental_report(&self) -> RentalReport {
        let fleet = self.fleet.read();
        RentalReport {
            rented: fleet
                .records_with_status(VehicleStatus::Rented)
                .into_iter()
                .cloned()
                .collect(),
            history: fleet.history().to_vec(),
            late_fees: fleet.late_fee_report(),
        }
    }

    /// Rental report followed by earnings.
    pub fn full_report(&self) -> FullReport {
        let rental = self.rental_report();
        let mut fleet = self.fleet.write();
        let earnings = fleet.earnings_report();
        FullReport {
            rental,
            earnings,
            total_revenue: fleet.total_revenue(),
        }
    }

    /// Total billed to one user across completed rentals.
    pub fn user_total_cost(&self, user_id: &str) -> f64 {
        self.fleet.read().user_total_cost(user_id)
    }

    fn records_with_status(&self, status: VehicleStatus) -> Vec<FleetRecord> {
        self.fleet
            .read()
            .records_with_status(status)
            .into_iter()
            .cloned()
            .collect()
    }
}
