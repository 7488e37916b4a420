use tracing::info;

use super::Identity;
use crate::{
    error::FleetResult,
    fleet::{FleetHandle, ReturnReceipt, SortKey},
    models::Vehicle,
    validator,
};

/// Customer access: renting, returning and browsing.
#[derive(Debug, Clone)]
pub struct RenterSession {
    identity: Identity,
    fleet: FleetHandle,
}

impl RenterSession {
    /// Open a session for `identity` over the shared fleet.
    pub fn new(identity: Identity, fleet: FleetHandle) -> Self {
        Self { identity, fleet }
    }

    /// Rent `vehicle_id` for `user_id`, starting on a `dd/MM/yyyy` date.
    pub fn rent_vehicle(&self, user_id: &str, vehicle_id: &str, start_date: &str) -> FleetResult<()> {
        validator::validate_user_id(user_id)?;
        let start_date = validator::validate_date(start_date)?;
        self.fleet
            .write()
            .rent_vehicle(vehicle_id, user_id, start_date)?;
        info!("{} rented Vehicle: ID = {vehicle_id} for User: {user_id}", self.identity);
        Ok(())
    }

    /// Return `vehicle_id` on a `dd/MM/yyyy` date.
    pub fn return_vehicle(
        &self,
        user_id: &str,
        vehicle_id: &str,
        return_date: &str,
    ) -> FleetResult<ReturnReceipt> {
        validator::validate_user_id(user_id)?;
        let return_date = validator::validate_date(return_date)?;
        let receipt = self
            .fleet
            .write()
            .return_vehicle(vehicle_id, user_id, return_date)?;
        info!("{} returned Vehicle: ID = {vehicle_id} for User: {user_id}", self.identity);
        Ok(receipt)
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

    /// Available vehicles ordered by `key`.
    pub fn search_and_sort(&self, key: SortKey) -> Vec<Vehicle> {
        self.fleet
            .read()
            .search_and_sort(key)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Vehicles manufactured between `start` and `end`, inclusive.
    pub fn find_by_year(&self, start: u32, end: u32) -> Vec<Vehicle> {
        self.fleet
            .read()
            .find_by_year(start, end)
            .into_iter()
            .cloned()
            .collect()
    }
}
