//! The fleet manager: live records, rental history and revenue.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    error::{FleetError, FleetResult},
    models::{format_amount, ActiveRental, FleetRecord, Rental, RentalDate, Vehicle, VehicleStatus},
    pricing::{calculate_days, calculate_total_cost, PricingPolicy},
    storage::{FleetStore, LoadedFleet, PERSISTENCE_TARGET},
    validator,
};

/// Vehicles strictly older than this are retired by [`FleetManager::remove_old`].
pub const DEFAULT_RETIREMENT_AGE_YEARS: u32 = 10;
/// Size of the "newest vehicles" listing.
pub const TOP_NEWEST_COUNT: usize = 3;

/// Fleet-wide rules that are not pricing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FleetPolicy {
    /// Maximum age in years before a vehicle is retired.
    pub retirement_age_years: u32,
}

impl Default for FleetPolicy {
    fn default() -> Self {
        Self {
            retirement_age_years: DEFAULT_RETIREMENT_AGE_YEARS,
        }
    }
}

/// Comparison key for [`FleetManager::search_and_sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Cheapest first.
    Price,
    /// Oldest first.
    Year,
}

/// Outcome of a successful return.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnReceipt {
    /// History entry that was recorded.
    pub rental: Rental,
    /// Billable days.
    pub days: u32,
    /// Amount stored on the rental and added to revenue.
    pub total_cost: f64,
    /// Informational late fee; not part of `total_cost`.
    pub late_fee: f64,
}

/// Aggregate numbers over the live fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetStatistics {
    /// Vehicles ready to rent.
    pub available: usize,
    /// Vehicles out on loan.
    pub rented: usize,
    /// Vehicles being serviced.
    pub maintenance: usize,
    /// Completed rentals in history.
    pub total_ever_rented: usize,
    /// Mean daily price over every live record.
    pub average_price: f64,
    /// First vehicle with the highest daily price.
    pub most_expensive: Option<Vehicle>,
}

/// A single line of the earnings report.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct EarningsEntry {
    pub vehicle_id: String,
    pub user_id: String,
    pub total_cost: f64,
}

/// Revenue total plus the rentals it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct EarningsReport {
    /// Revenue accumulator after any rebuild.
    pub total_revenue: f64,
    /// One entry per completed rental.
    pub entries: Vec<EarningsEntry>,
}

/// A completed rental that ran past the allowance.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct LateFeeEntry {
    pub vehicle_id: String,
    pub user_id: String,
    pub days: u32,
    pub late_fee: f64,
}

/// The ten vehicles a fresh installation starts with.
pub fn preloaded_vehicles() -> Vec<Vehicle> {
    [
        ("V01", "Audi A1", 2013, 120.0),
        ("V02", "Mercedes GLC", 2015, 150.0),
        ("V03", "BMW X5", 2018, 200.0),
        ("V04", "Toyota Corolla", 2020, 90.0),
        ("V05", "Ford Focus", 2016, 80.0),
        ("V06", "Honda Civic", 2017, 85.0),
        ("V07", "Nissan J32", 2019, 110.0),
        ("V08", "Volkswagen Golf", 2014, 95.0),
        ("V09", "Hyundai Elantra", 2012, 70.0),
        ("V10", "Chevrolet Malibu", 2011, 65.0),
    ]
    .into_iter()
    .map(|(id, model, year, price)| Vehicle::available(id, model, year, price))
    .collect()
}

/// Owns the live fleet and rental history, persisting after every change.
///
/// Save failures are logged and otherwise ignored: the in-memory state stays
/// authoritative for the rest of the session.
#[derive(Debug)]
pub struct FleetManager {
    records: Vec<FleetRecord>,
    history: Vec<Rental>,
    total_revenue: f64,
    store: FleetStore,
    pricing: PricingPolicy,
    policy: FleetPolicy,
}

impl FleetManager {
    /// Load state from `store`, falling back to the preloaded fleet when no
    /// vehicles were found.
    ///
    /// The preloaded fleet is only written back when every file was readable.
    pub fn open(store: FleetStore, pricing: PricingPolicy, policy: FleetPolicy) -> Self {
        let loaded = store.load();
        let damaged = loaded.damaged;
        let mut manager = Self::from_loaded(store, pricing, policy, loaded);
        if manager.records.is_empty() {
            info!("No vehicle data found. Starting with default vehicles.");
            manager.records = preloaded_vehicles()
                .into_iter()
                .map(FleetRecord::Plain)
                .collect();
            if !damaged {
                manager.persist();
            }
        }
        manager
    }

    fn from_loaded(
        store: FleetStore,
        pricing: PricingPolicy,
        policy: FleetPolicy,
        loaded: LoadedFleet,
    ) -> Self {
        let total_revenue = loaded.history.iter().map(|rental| rental.total_cost).sum();
        Self {
            records: loaded.records,
            history: loaded.history,
            total_revenue,
            store,
            pricing,
            policy,
        }
    }

    /// Live records in insertion order.
    pub fn records(&self) -> &[FleetRecord] {
        &self.records
    }

    /// Completed rentals, oldest first.
    pub fn history(&self) -> &[Rental] {
        &self.history
    }

    /// Running revenue accumulator.
    pub fn total_revenue(&self) -> f64 {
        self.total_revenue
    }

    /// Look up a live record.
    pub fn find(&self, vehicle_id: &str) -> Option<&FleetRecord> {
        self.records.iter().find(|record| record.id() == vehicle_id)
    }

    fn position(&self, vehicle_id: &str) -> FleetResult<usize> {
        self.records
            .iter()
            .position(|record| record.id() == vehicle_id)
            .ok_or_else(|| {
                let err = FleetError::NotFound(vehicle_id.to_string());
                error!("{err}");
                err
            })
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.records, &self.history) {
            error!(target: PERSISTENCE_TARGET, "{err:#}");
        }
    }

    /// Append a vehicle unless its ID is already taken.
    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> FleetResult<()> {
        validator::validate_unique_vehicle_id(&vehicle.id, &self.records)?;
        info!("Vehicle {} added: {}", vehicle.id, vehicle.model);
        self.records.push(FleetRecord::Plain(vehicle));
        self.persist();
        Ok(())
    }

    /// Remove a vehicle, returning its last state.
    pub fn remove_vehicle(&mut self, vehicle_id: &str) -> FleetResult<FleetRecord> {
        let index = self.position(vehicle_id)?;
        let removed = self.records.remove(index);
        info!("Vehicle {vehicle_id} removed.");
        self.persist();
        Ok(removed)
    }

    /// Change the daily price. The price is trusted as given.
    pub fn update_vehicle(&mut self, vehicle_id: &str, price: f64) -> FleetResult<()> {
        let index = self.position(vehicle_id)?;
        self.records[index].vehicle_mut().rental_price = price;
        info!(
            "Vehicle {vehicle_id} price updated to {}",
            format_amount(price)
        );
        self.persist();
        Ok(())
    }

    /// Start a loan. Only available, non-rented vehicles qualify.
    pub fn rent_vehicle(
        &mut self,
        vehicle_id: &str,
        user_id: &str,
        start_date: RentalDate,
    ) -> FleetResult<()> {
        validator::validate_user_id(user_id)?;
        let index = self.position(vehicle_id)?;
        let vehicle = match &self.records[index] {
            FleetRecord::Plain(vehicle) if vehicle.is_available() => vehicle.clone(),
            _ => return Err(FleetError::NotAvailable(vehicle_id.to_string())),
        };
        self.records[index] =
            FleetRecord::ActiveRental(ActiveRental::start(vehicle, user_id, start_date));
        info!("Vehicle rented: {vehicle_id} by User: {user_id}");
        self.persist();
        Ok(())
    }

    /// Close a loan held by `user_id`, bill it and move it into history.
    pub fn return_vehicle(
        &mut self,
        vehicle_id: &str,
        user_id: &str,
        return_date: RentalDate,
    ) -> FleetResult<ReturnReceipt> {
        let index = self.position(vehicle_id)?;
        let active = match &self.records[index] {
            FleetRecord::ActiveRental(active) => active,
            FleetRecord::Plain(_) => return Err(FleetError::NotRented(vehicle_id.to_string())),
        };
        if active.renter != user_id {
            return Err(FleetError::RenterMismatch {
                vehicle_id: vehicle_id.to_string(),
                user_id: user_id.to_string(),
            });
        }

        let active = active.clone();
        let days = calculate_days(active.start_date, return_date);
        let total_cost = calculate_total_cost(active.vehicle.rental_price, days);
        let late_fee = self.pricing.late_fee(days);

        let (rental, vehicle) = active.complete(return_date, total_cost);
        self.records[index] = FleetRecord::Plain(vehicle);
        self.total_revenue += total_cost;
        self.history.push(rental.clone());

        info!(
            "Vehicle returned: {vehicle_id}, User: {user_id}, Cost: {}",
            format_amount(total_cost)
        );
        self.persist();

        Ok(ReturnReceipt {
            rental,
            days,
            total_cost,
            late_fee,
        })
    }

    /// Drop every vehicle older than the retirement age relative to `current_year`.
    pub fn remove_old(&mut self, current_year: u32) -> Vec<FleetRecord> {
        let limit = i64::from(self.policy.retirement_age_years);
        let (retired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|record| {
                i64::from(current_year) - i64::from(record.vehicle().year) > limit
            });
        self.records = kept;
        for record in &retired {
            info!("Vehicle {} removed as older than {limit} years.", record.id());
        }
        self.persist();
        retired
    }

    /// Take a vehicle out of service. A loan in progress stays open.
    pub fn send_to_maintenance(&mut self, vehicle_id: &str) -> FleetResult<()> {
        let index = self.position(vehicle_id)?;
        let vehicle = self.records[index].vehicle_mut();
        if vehicle.status == VehicleStatus::Maintenance {
            return Err(FleetError::AlreadyInMaintenance(vehicle_id.to_string()));
        }
        vehicle.status = VehicleStatus::Maintenance;
        info!("Vehicle {vehicle_id} sent to maintenance.");
        self.persist();
        Ok(())
    }

    /// Bring a vehicle back from maintenance, as Rented if still on loan.
    pub fn restore_vehicle(&mut self, vehicle_id: &str) -> FleetResult<()> {
        let index = self.position(vehicle_id)?;
        let record = &mut self.records[index];
        if record.status() != VehicleStatus::Maintenance {
            return Err(FleetError::NotInMaintenance(vehicle_id.to_string()));
        }
        let restored = match record {
            FleetRecord::Plain(_) => VehicleStatus::Available,
            FleetRecord::ActiveRental(_) => VehicleStatus::Rented,
        };
        record.vehicle_mut().status = restored;
        info!("Vehicle {vehicle_id} restored.");
        self.persist();
        Ok(())
    }

    /// Live records in the given state, in list order.
    pub fn records_with_status(&self, status: VehicleStatus) -> Vec<&FleetRecord> {
        self.records
            .iter()
            .filter(|record| record.status() == status)
            .collect()
    }

    /// Vehicles ready to rent, in list order.
    pub fn available_vehicles(&self) -> Vec<&Vehicle> {
        self.records_with_status(VehicleStatus::Available)
            .into_iter()
            .map(FleetRecord::vehicle)
            .collect()
    }

    /// The `count` most recently manufactured vehicles; ties keep list order.
    pub fn top_newest(&self, count: usize) -> Vec<&Vehicle> {
        let mut vehicles: Vec<&Vehicle> = self.records.iter().map(FleetRecord::vehicle).collect();
        vehicles.sort_by(|a, b| b.year.cmp(&a.year));
        vehicles.truncate(count);
        vehicles
    }

    /// Vehicles manufactured within `start..=end`.
    pub fn find_by_year(&self, start: u32, end: u32) -> Vec<&Vehicle> {
        self.records
            .iter()
            .map(FleetRecord::vehicle)
            .filter(|vehicle| (start..=end).contains(&vehicle.year))
            .collect()
    }

    /// Available vehicles in ascending order of `key`; ties keep list order.
    pub fn search_and_sort(&self, key: SortKey) -> Vec<&Vehicle> {
        let mut vehicles = self.available_vehicles();
        match key {
            SortKey::Price => vehicles.sort_by(|a, b| a.rental_price.total_cmp(&b.rental_price)),
            SortKey::Year => vehicles.sort_by_key(|vehicle| vehicle.year),
        }
        vehicles
    }

    /// Sum of completed rental costs for one user.
    pub fn user_total_cost(&self, user_id: &str) -> f64 {
        self.history
            .iter()
            .filter(|rental| rental.user_id == user_id)
            .map(|rental| rental.total_cost)
            .sum()
    }

    /// Counts, average price and the priciest vehicle.
    pub fn statistics(&self) -> FleetStatistics {
        let count = |status: VehicleStatus| {
            self.records
                .iter()
                .filter(|record| record.status() == status)
                .count()
        };
        let total_price: f64 = self
            .records
            .iter()
            .map(|record| record.vehicle().rental_price)
            .sum();
        let average_price = if self.records.is_empty() {
            0.0
        } else {
            total_price / self.records.len() as f64
        };
        let most_expensive = self
            .records
            .iter()
            .map(FleetRecord::vehicle)
            .fold(None::<&Vehicle>, |best, vehicle| match best {
                Some(best) if best.rental_price >= vehicle.rental_price => Some(best),
                _ if vehicle.rental_price > 0.0 => Some(vehicle),
                _ => best,
            })
            .cloned();

        FleetStatistics {
            available: count(VehicleStatus::Available),
            rented: count(VehicleStatus::Rented),
            maintenance: count(VehicleStatus::Maintenance),
            total_ever_rented: self.history.len(),
            average_price,
            most_expensive,
        }
    }

    /// Earnings per completed rental plus the revenue total.
    ///
    /// An accumulator still at zero while history exists is rebuilt from history.
    pub fn earnings_report(&mut self) -> EarningsReport {
        if self.total_revenue == 0.0 && !self.history.is_empty() {
            self.total_revenue = self.history.iter().map(|rental| rental.total_cost).sum();
        }
        let entries = self
            .history
            .iter()
            .map(|rental| EarningsEntry {
                vehicle_id: rental.vehicle_id.clone(),
                user_id: rental.user_id.clone(),
                total_cost: rental.total_cost,
            })
            .collect();
        info!(
            "Displayed earnings report: Total Revenue = {}",
            format_amount(self.total_revenue)
        );
        EarningsReport {
            total_revenue: self.total_revenue,
            entries,
        }
    }

    /// Late fee for a rental of `rental_days`.
    pub fn calculate_late_fee(&self, rental_days: u32) -> f64 {
        self.pricing.late_fee(rental_days)
    }

    /// Completed rentals that incurred a late fee.
    pub fn late_fee_report(&self) -> Vec<LateFeeEntry> {
        self.history
            .iter()
            .filter_map(|rental| {
                let end = rental.end_date?;
                let days = calculate_days(rental.start_date, end);
                let late_fee = self.pricing.late_fee(days);
                (late_fee > 0.0).then(|| LateFeeEntry {
                    vehicle_id: rental.vehicle_id.clone(),
                    user_id: rental.user_id.clone(),
                    days,
                    late_fee,
                })
            })
            .collect()
    }
}

/// Cloneable handle letting several sessions share one manager.
#[derive(Debug, Clone)]
pub struct FleetHandle {
    inner: Arc<RwLock<FleetManager>>,
}

impl FleetHandle {
    /// Wrap a manager for sharing.
    pub fn new(manager: FleetManager) -> Self {
        Self {
            inner: Arc::new(RwLock::new(manager)),
        }
    }

    /// Shared access for queries.
    pub fn read(&self) -> RwLockReadGuard<'_, FleetManager> {
        self.inner.read()
    }

    /// Exclusive access for mutations.
    pub fn write(&self) -> RwLockWriteGuard<'_, FleetManager> {
        self.inner.write()
    }
}
