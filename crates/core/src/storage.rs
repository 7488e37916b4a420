//! Flat-file persistence for the live fleet and rental history.
//!
//! Two comma-separated files are rewritten in full on every save:
//!
//! * vehicles: `id,model,year,price,status`
//! * rentals: `userId,vehicleId,model,year,price,startDate,endDate,totalCost,status`
//!
//! Active loans are written to the rental file with `Not returned` as their
//! end date and rebuilt into the live fleet on load.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{error, info, warn};

use crate::models::{
    format_amount, ActiveRental, FleetRecord, Rental, RentalDate, RentalStatus, Vehicle,
    VehicleStatus,
};

/// Default file name for vehicle records.
pub const VEHICLE_FILE: &str = "vehicles.txt";
/// Default file name for rental records.
pub const RENTAL_FILE: &str = "rentals.txt";

/// Target for storage failures, echoed to the console as well as the log.
pub const PERSISTENCE_TARGET: &str = "fleetrent::persistence";

/// End-date marker of a loan still in progress.
pub const NOT_RETURNED: &str = "Not returned";
const VEHICLE_FIELDS: usize = 5;
const RENTAL_FIELDS: usize = 9;

/// State read back from disk.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadedFleet {
    /// Live records in file order, active loans merged in.
    pub records: Vec<FleetRecord>,
    /// Completed rentals in file order.
    pub history: Vec<Rental>,
    /// A file exists but could not be read; saving now would overwrite it.
    pub damaged: bool,
}

/// Reads and writes the vehicle and rental files.
#[derive(Debug, Clone)]
pub struct FleetStore {
    vehicle_path: PathBuf,
    rental_path: PathBuf,
}

impl FleetStore {
    /// Create a store over explicit file paths.
    pub fn new(vehicle_path: impl Into<PathBuf>, rental_path: impl Into<PathBuf>) -> Self {
        Self {
            vehicle_path: vehicle_path.into(),
            rental_path: rental_path.into(),
        }
    }

    /// Create a store using the default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(VEHICLE_FILE), dir.join(RENTAL_FILE))
    }

    /// Path of the vehicle file.
    pub fn vehicle_path(&self) -> &Path {
        &self.vehicle_path
    }

    /// Path of the rental file.
    pub fn rental_path(&self) -> &Path {
        &self.rental_path
    }

    /// Load both files independently. Missing files load as empty and bad
    /// lines are skipped one at a time; a file that exists but cannot be read
    /// marks the result as damaged.
    pub fn load(&self) -> LoadedFleet {
        let mut loaded = LoadedFleet::default();

        match read_lines(&self.vehicle_path) {
            Ok(None) => info!("No vehicle data found at {}.", self.vehicle_path.display()),
            Ok(Some(lines)) => {
                for line in &lines {
                    match decode_vehicle_line(line) {
                        Ok(vehicle) => loaded.records.push(FleetRecord::Plain(vehicle)),
                        Err(err) => warn!("Skipping invalid line in vehicle file: {line} ({err})"),
                    }
                }
                info!("Vehicle data loaded from file.");
            }
            Err(err) => {
                error!(target: PERSISTENCE_TARGET, "{err:#}");
                loaded.damaged = true;
            }
        }

        match read_lines(&self.rental_path) {
            Ok(None) => info!("No rental data found at {}.", self.rental_path.display()),
            Ok(Some(lines)) => {
                for line in &lines {
                    match decode_rental_line(line) {
                        Ok(rental) if rental.end_date.is_some() => loaded.history.push(rental),
                        Ok(rental) => attach_active_rental(&mut loaded.records, rental),
                        Err(err) => warn!("Skipping invalid line in rental file: {line} ({err})"),
                    }
                }
                info!("Rental data loaded from file.");
            }
            Err(err) => {
                error!(target: PERSISTENCE_TARGET, "{err:#}");
                loaded.damaged = true;
            }
        }

        // Loans in an unreadable rental file may still exist; leave the flags alone.
        if !loaded.damaged {
            release_orphaned_loans(&mut loaded.records);
        }
        loaded
    }

    /// Overwrite both files with the given state.
    ///
    /// The rental file is attempted even when the vehicle file fails; the
    /// first error is returned.
    pub fn save(&self, records: &[FleetRecord], history: &[Rental]) -> Result<()> {
        let vehicle_lines = records
            .iter()
            .map(|record| encode_vehicle_line(record.vehicle()))
            .collect::<Vec<_>>();
        let vehicles = write_lines(&self.vehicle_path, &vehicle_lines)
            .context("Error saving vehicles");
        if vehicles.is_ok() {
            info!("Vehicle data saved to file.");
        }

        let rental_lines = history
            .iter()
            .cloned()
            .chain(
                records
                    .iter()
                    .filter_map(FleetRecord::as_active_rental)
                    .map(ActiveRental::to_rental),
            )
            .map(|rental| encode_rental_line(&rental))
            .collect::<Vec<_>>();
        let rentals =
            write_lines(&self.rental_path, &rental_lines).context("Error saving rentals");
        if rentals.is_ok() {
            info!("Rental data saved to file.");
        }

        vehicles.and(rentals)
    }
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Non-empty lines of `path`, or `None` when it does not exist.
///
/// Lines that are not valid UTF-8 are skipped with a warning.
fn read_lines(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim_end_matches(['\r', '\n']);
                if !line.trim().is_empty() {
                    lines.push(line.to_string());
                }
            }
            Err(_) => warn!(
                "Skipping non UTF-8 line in {}: {}",
                path.display(),
                String::from_utf8_lossy(&buf).trim_end()
            ),
        }
    }
    Ok(Some(lines))
}

/// A vehicle stored as rented without an open loan line cannot be returned;
/// put it back in service.
fn release_orphaned_loans(records: &mut [FleetRecord]) {
    for record in records.iter_mut() {
        if let FleetRecord::Plain(vehicle) = record {
            if vehicle.status == VehicleStatus::Rented {
                warn!(
                    "Vehicle {} was marked rented with no open rental; restoring as available.",
                    vehicle.id
                );
                vehicle.status = VehicleStatus::Available;
            }
        }
    }
}

/// Put a reloaded loan back into its live slot, keeping any maintenance flag.
fn attach_active_rental(records: &mut Vec<FleetRecord>, rental: Rental) {
    let Rental {
        vehicle_id,
        model,
        year,
        rental_price,
        user_id,
        start_date,
        ..
    } = rental;

    match records.iter_mut().find(|record| record.id() == vehicle_id) {
        Some(slot) => {
            let mut vehicle = slot.vehicle().clone();
            if vehicle.status != VehicleStatus::Maintenance {
                vehicle.status = VehicleStatus::Rented;
            }
            *slot = FleetRecord::ActiveRental(ActiveRental {
                vehicle,
                renter: user_id,
                start_date,
            });
        }
        None => {
            let vehicle = Vehicle::new(vehicle_id, model, year, rental_price, VehicleStatus::Rented);
            records.push(FleetRecord::ActiveRental(ActiveRental::start(
                vehicle, user_id, start_date,
            )));
        }
    }
}

/// Encode a vehicle as `id,model,year,price,status`.
pub fn encode_vehicle_line(vehicle: &Vehicle) -> String {
    format!(
        "{},{},{},{},{}",
        vehicle.id,
        vehicle.model,
        vehicle.year,
        format_amount(vehicle.rental_price),
        vehicle.status
    )
}

/// Decode a vehicle line. Fields beyond the fifth are ignored.
pub fn decode_vehicle_line(line: &str) -> Result<Vehicle> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < VEHICLE_FIELDS {
        bail!(
            "expected {VEHICLE_FIELDS} fields, found {}",
            fields.len()
        );
    }
    let year = fields[2]
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid year '{}'", fields[2]))?;
    let rental_price = parse_amount(fields[3])?;
    let status = fields[4].parse::<VehicleStatus>()?;
    Ok(Vehicle::new(fields[0].trim(), fields[1], year, rental_price, status))
}

/// Encode a rental in the nine-field rental-file layout.
pub fn encode_rental_line(rental: &Rental) -> String {
    let end_date = rental
        .end_date
        .map(|date| date.to_string())
        .unwrap_or_else(|| NOT_RETURNED.to_string());
    format!(
        "{},{},{},{},{},{},{},{},{}",
        rental.user_id,
        rental.vehicle_id,
        rental.model,
        rental.year,
        format_amount(rental.rental_price),
        rental.start_date,
        end_date,
        format_amount(rental.total_cost),
        rental.status()
    )
}

/// Decode a rental line, rejecting lines whose status disagrees with the end date.
pub fn decode_rental_line(line: &str) -> Result<Rental> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < RENTAL_FIELDS {
        bail!("expected {RENTAL_FIELDS} fields, found {}", fields.len());
    }
    let year = fields[3]
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid year '{}'", fields[3]))?;
    let rental_price = parse_amount(fields[4])?;
    let start_date = fields[5].trim().parse::<RentalDate>()?;
    let end_date = match fields[6].trim() {
        NOT_RETURNED => None,
        raw => Some(raw.parse::<RentalDate>()?),
    };
    let total_cost = parse_amount(fields[7])?;
    let status = fields[8].parse::<RentalStatus>()?;

    let rental = Rental {
        vehicle_id: fields[1].trim().to_string(),
        model: fields[2].to_string(),
        year,
        rental_price,
        user_id: fields[0].trim().to_string(),
        start_date,
        end_date,
        total_cost,
    };
    if rental.status() != status {
        return Err(anyhow!(
            "status {status} does not match end date '{}'",
            fields[6]
        ));
    }
    Ok(rental)
}

fn parse_amount(raw: &str) -> Result<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid amount '{raw}'"))?;
    if !value.is_finite() {
        bail!("invalid amount '{raw}'");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn completed(vehicle_id: &str, user_id: &str, total_cost: f64) -> Rental {
        Rental {
            vehicle_id: vehicle_id.to_string(),
            model: "Kia Rio".to_string(),
            year: 2021,
            rental_price: 60.0,
            user_id: user_id.to_string(),
            start_date: RentalDate::new(1, 1, 2023),
            end_date: Some(RentalDate::new(4, 1, 2023)),
            total_cost,
        }
    }

    #[test]
    fn lines_use_the_comma_separated_layout() {
        let vehicle = Vehicle::available("V11", "Kia Rio", 2021, 60.0);
        assert_eq!(encode_vehicle_line(&vehicle), "V11,Kia Rio,2021,60.0,Available");

        let rental = completed("V11", "U1", 180.0);
        assert_eq!(
            encode_rental_line(&rental),
            "U1,V11,Kia Rio,2021,60.0,01/01/2023,04/01/2023,180.0,Completed"
        );

        let open = ActiveRental::start(vehicle, "U1", RentalDate::new(1, 1, 2023)).to_rental();
        assert_eq!(
            encode_rental_line(&open),
            "U1,V11,Kia Rio,2021,60.0,01/01/2023,Not returned,0.0,Active"
        );
    }

    #[test]
    fn save_load_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = FleetStore::in_dir(dir.path());

        let records = vec![
            FleetRecord::Plain(Vehicle::available("V01", "Audi A1", 2013, 120.0)),
            FleetRecord::Plain(Vehicle::new(
                "V02",
                "Mercedes GLC",
                2015,
                150.5,
                VehicleStatus::Maintenance,
            )),
            FleetRecord::ActiveRental(ActiveRental::start(
                Vehicle::available("V03", "BMW X5", 2018, 200.0),
                "U9",
                RentalDate::new(12, 5, 2024),
            )),
        ];
        let history = vec![completed("V11", "U1", 180.0), completed("V11", "U2", 99.99)];

        store.save(&records, &history)?;
        let loaded = store.load();

        assert_eq!(loaded.records, records);
        assert_eq!(loaded.history, history);
        Ok(())
    }

    #[test]
    fn missing_files_load_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = FleetStore::in_dir(dir.path().join("nested"));
        assert_eq!(store.load(), LoadedFleet::default());

        store.save(&[], &[])?;
        assert!(store.vehicle_path().exists());
        assert!(store.rental_path().exists());
        Ok(())
    }

    #[test]
    fn malformed_lines_are_skipped() -> Result<()> {
        let dir = tempdir()?;
        let store = FleetStore::in_dir(dir.path());
        fs::write(
            store.vehicle_path(),
            "V01,Audi A1,2013,120.0,Available\nbroken line\nV02,Golf,twenty,95.0,Available\n\nV03,BMW X5,2018,200.0,Rented\n",
        )?;
        fs::write(
            store.rental_path(),
            "U1,V11,Kia Rio,2021,60.0,01/01/2023,04/01/2023,180.0,Completed\n\
             U1,V11,Kia Rio\n\
             U2,V12,Kia Rio,2021,60.0,1/1/2023,04/01/2023,180.0,Completed\n\
             U3,V13,Kia Rio,2021,60.0,01/01/2023,Not returned,0.0,Completed\n",
        )?;

        let loaded = store.load();
        let ids: Vec<&str> = loaded.records.iter().map(FleetRecord::id).collect();
        assert_eq!(ids, vec!["V01", "V03"]);
        // Rented without an open rental line: back in service.
        assert_eq!(loaded.records[1].status(), VehicleStatus::Available);
        assert!(!loaded.damaged);
        assert_eq!(loaded.history.len(), 1);
        assert_eq!(loaded.history[0].user_id, "U1");
        Ok(())
    }

    #[test]
    fn active_lines_replace_their_vehicle_slot() -> Result<()> {
        let dir = tempdir()?;
        let store = FleetStore::in_dir(dir.path());
        fs::write(
            store.vehicle_path(),
            "V01,Audi A1,2013,120.0,Available\nV03,BMW X5,2018,210.0,Maintenance\n",
        )?;
        fs::write(
            store.rental_path(),
            "U9,V03,BMW X5,2018,200.0,12/05/2024,Not returned,0.0,Active\n\
             U4,V77,Kia Rio,2021,60.0,02/02/2024,Not returned,0.0,Active\n",
        )?;

        let loaded = store.load();
        assert_eq!(loaded.records.len(), 3);

        let serviced = loaded.records[1]
            .as_active_rental()
            .ok_or_else(|| anyhow!("V03 should be an active rental"))?;
        assert_eq!(serviced.renter, "U9");
        assert_eq!(serviced.vehicle.status, VehicleStatus::Maintenance);
        assert_eq!(serviced.vehicle.rental_price, 210.0);

        let appended = loaded.records[2]
            .as_active_rental()
            .ok_or_else(|| anyhow!("V77 should be an active rental"))?;
        assert_eq!(appended.vehicle.id, "V77");
        assert_eq!(appended.vehicle.status, VehicleStatus::Rented);
        assert!(loaded.history.is_empty());
        Ok(())
    }

    #[test]
    fn undecodable_bytes_only_cost_their_own_line() -> Result<()> {
        let dir = tempdir()?;
        let store = FleetStore::in_dir(dir.path());
        fs::write(store.vehicle_path(), "V11,Kia Rio,2021,60.0,Available\n")?;
        let mut rentals =
            b"U1,V11,Kia Rio,2021,60.0,01/01/2023,04/01/2023,180.0,Completed\n".to_vec();
        rentals.extend_from_slice(b"U2,V11,Kia \xffRio,2021,60.0,05/01/2023,06/01/2023,60.0,Completed\n");
        rentals.extend_from_slice(b"U3,V11,Kia Rio,2021,60.0,07/01/2023,Not returned,0.0,Active\r\n");
        fs::write(store.rental_path(), rentals)?;

        let loaded = store.load();
        assert!(!loaded.damaged);
        assert_eq!(loaded.records.len(), 1);
        let active = loaded.records[0]
            .as_active_rental()
            .ok_or_else(|| anyhow!("V11 should be on loan to U3"))?;
        assert_eq!(active.renter, "U3");
        assert_eq!(loaded.history.len(), 1);
        assert_eq!(loaded.history[0].user_id, "U1");
        Ok(())
    }

    #[test]
    fn unreadable_file_is_flagged_without_losing_the_other() -> Result<()> {
        let dir = tempdir()?;
        let store = FleetStore::new(dir.path().join(VEHICLE_FILE), dir.path());
        fs::write(
            store.vehicle_path(),
            "V11,Kia Rio,2021,60.0,Available\nV12,Kia Ceed,2020,75.0,Rented\n",
        )?;

        let loaded = store.load();
        assert!(loaded.damaged);
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[0].id(), "V11");
        // The loan may live in the unreadable rental file.
        assert_eq!(loaded.records[1].status(), VehicleStatus::Rented);
        Ok(())
    }
}
