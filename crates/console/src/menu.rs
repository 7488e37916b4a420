//! Numbered console menus driving the admin and renter sessions.

use std::{
    fmt::Display,
    io::{BufRead, Write},
};

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use fleetrent_core::{
    models::format_amount, validator, AdminSession, FleetError, RenterSession, SortKey, Vehicle,
};
use thiserror::Error;

const MENU_OPTION_ERROR: &str = "Please enter a valid menu option.";
const YEAR_ERROR: &str = "Year must be a positive number.";
const PRICE_ERROR: &str = "Price must be a positive number.";

/// Raised when stdin runs dry so every nested loop unwinds at once.
#[derive(Debug, Error)]
#[error("end of input")]
struct EndOfInput;

/// Interactive menu tree over any line source and sink.
pub struct Menu<R, W> {
    input: R,
    output: W,
    admin: AdminSession,
    renter: RenterSession,
    currency: String,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(
        input: R,
        output: W,
        admin: AdminSession,
        renter: RenterSession,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            input,
            output,
            admin,
            renter,
            currency: currency.into(),
        }
    }

    /// Run until the user exits or input ends.
    pub fn run(&mut self) -> Result<()> {
        match self.main_menu() {
            Err(err) if err.is::<EndOfInput>() => Ok(()),
            other => other,
        }
    }

    fn main_menu(&mut self) -> Result<()> {
        loop {
            match self.choose("Main Menu", &["Admin Menu", "User Menu", "Exit"])? {
                1 => self.admin_menu()?,
                2 => self.user_menu()?,
                _ => {
                    writeln!(self.output, "Exiting the system. Goodbye!")?;
                    return Ok(());
                }
            }
        }
    }

    fn admin_menu(&mut self) -> Result<()> {
        loop {
            let choice = self.choose(
                "Admin Menu",
                &[
                    "Manage Vehicles",
                    "View Statistics",
                    "Check Maintenance",
                    "Generate Report",
                    "View User Rental Cost",
                    "Exit",
                ],
            )?;
            match choice {
                1 => self.manage_vehicles_menu()?,
                2 => self.show_statistics()?,
                3 => self.maintenance_menu()?,
                4 => self.show_full_report()?,
                5 => {
                    let user_id = self.prompt("Enter User ID: ")?;
                    let total = self.admin.user_total_cost(&user_id);
                    writeln!(self.output, "\n=== Total Rental Cost for User ID: {user_id} ===")?;
                    writeln!(self.output, "{}", amount(&self.currency, total))?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn manage_vehicles_menu(&mut self) -> Result<()> {
        loop {
            let choice = self.choose(
                "Manage Vehicles",
                &[
                    "Add Vehicle",
                    "Remove Vehicle",
                    "Update Vehicle Price",
                    "Search Vehicles",
                    "Back to Admin Menu",
                ],
            )?;
            match choice {
                1 => {
                    let vehicle = self.read_vehicle()?;
                    match self.admin.add_vehicle(vehicle) {
                        Ok(()) => writeln!(self.output, "Vehicle added successfully.")?,
                        Err(err) => self.report(&err)?,
                    }
                }
                2 => self.remove_vehicle_menu()?,
                3 => {
                    let vehicle_id = self.prompt("Enter Vehicle ID to update: ")?;
                    let input = self.prompt("Enter new Rental Price: ")?;
                    let price = match validator::parse_positive_price(&input, PRICE_ERROR) {
                        Ok(price) => price,
                        Err(err) => {
                            writeln!(self.output, "{err}")?;
                            continue;
                        }
                    };
                    match self.admin.update_vehicle(&vehicle_id, price) {
                        Ok(()) => writeln!(self.output, "Vehicle price updated successfully.")?,
                        Err(err) => self.report(&err)?,
                    }
                }
                4 => self.search_vehicles_menu()?,
                _ => return Ok(()),
            }
        }
    }

    fn remove_vehicle_menu(&mut self) -> Result<()> {
        loop {
            match self.choose("Remove Vehicle", &["Remove by ID", "Remove Old Vehicles", "Back"])? {
                1 => {
                    let vehicle_id = self.prompt("Enter Vehicle ID to remove: ")?;
                    match self.admin.remove_vehicle(&vehicle_id) {
                        Ok(_) => writeln!(self.output, "Vehicle removed successfully.")?,
                        Err(err) => self.report(&err)?,
                    }
                }
                2 => {
                    let this_year = u32::try_from(Local::now().year()).unwrap_or_default();
                    let input =
                        self.prompt(&format!("Enter the current year (blank for {this_year}): "))?;
                    let current_year = if input.is_empty() {
                        this_year
                    } else {
                        match validator::parse_positive_int(&input, YEAR_ERROR) {
                            Ok(year) => year,
                            Err(err) => {
                                writeln!(self.output, "{err}")?;
                                continue;
                            }
                        }
                    };
                    let removed = self.admin.remove_old(current_year);
                    writeln!(
                        self.output,
                        "Old vehicles removed successfully ({} removed).",
                        removed.len()
                    )?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn search_vehicles_menu(&mut self) -> Result<()> {
        loop {
            let choice = self.choose(
                "Search Vehicles",
                &[
                    "Show Available Vehicles",
                    "Show Rented Vehicles",
                    "Show Top 3 Newest Vehicles",
                    "Back to Manage Vehicles Menu",
                ],
            )?;
            match choice {
                1 => {
                    let vehicles = self.admin.available_vehicles();
                    self.list("Available Vehicles", &vehicles, "No available vehicles found.")?;
                }
                2 => {
                    let rented = self.admin.rented_vehicles();
                    self.list("Rented Vehicles", &rented, "No rented vehicles found.")?;
                }
                3 => {
                    let newest = self.admin.top_newest();
                    self.list("Top 3 Newest Vehicles", &newest, "No vehicles found.")?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn maintenance_menu(&mut self) -> Result<()> {
        loop {
            let choice = self.choose(
                "Manage Maintenance",
                &[
                    "View Vehicles Under Maintenance",
                    "Send Vehicle to Maintenance",
                    "Restore Vehicle from Maintenance",
                    "Back to Admin Menu",
                ],
            )?;
            match choice {
                1 => {
                    let serviced = self.admin.vehicles_under_maintenance();
                    writeln!(self.output, "\n=== Vehicles Under Maintenance ===")?;
                    if serviced.is_empty() {
                        writeln!(self.output, "No vehicles are under maintenance.")?;
                    }
                    for record in &serviced {
                        let vehicle = record.vehicle();
                        writeln!(
                            self.output,
                            "Vehicle ID: {} ({}) is under maintenance.",
                            vehicle.id, vehicle.model
                        )?;
                    }
                }
                2 => {
                    let vehicle_id = self.prompt("Enter Vehicle ID to send to maintenance: ")?;
                    match self.admin.send_to_maintenance(&vehicle_id) {
                        Ok(()) => writeln!(self.output, "Vehicle sent to maintenance.")?,
                        Err(err) => self.report(&err)?,
                    }
                }
                3 => {
                    let vehicle_id =
                        self.prompt("Enter Vehicle ID to restore from maintenance: ")?;
                    match self.admin.restore_vehicle(&vehicle_id) {
                        Ok(()) => writeln!(self.output, "Vehicle restored from maintenance.")?,
                        Err(err) => self.report(&err)?,
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn show_statistics(&mut self) -> Result<()> {
        let stats = self.admin.statistics();
        writeln!(self.output, "\n=== Vehicle Statistics ===")?;
        writeln!(self.output, "Available Vehicles: {}", stats.available)?;
        writeln!(self.output, "Rented Vehicles: {}", stats.rented)?;
        writeln!(self.output, "Under Maintenance: {}", stats.maintenance)?;
        writeln!(self.output, "Total Rented Vehicles: {}", stats.total_ever_rented)?;
        writeln!(
            self.output,
            "Average Rental Price: {}{:.2}",
            self.currency, stats.average_price
        )?;
        if let Some(vehicle) = &stats.most_expensive {
            writeln!(self.output, "Most Expensive Vehicle: {vehicle}")?;
        }
        Ok(())
    }

    fn show_full_report(&mut self) -> Result<()> {
        let report = self.admin.full_report();

        writeln!(self.output, "=== Rental Report ===")?;
        self.list("Rented Vehicles", &report.rental.rented, "No rented vehicles found.")?;
        writeln!(self.output, "\n--- Rental History ---")?;
        for rental in &report.rental.history {
            writeln!(self.output, "{rental}")?;
        }
        writeln!(self.output, "\n--- Late Return Fees ---")?;
        for entry in &report.rental.late_fees {
            writeln!(
                self.output,
                "Vehicle: {}, User: {}, Days: {}, Late Fee: {}",
                entry.vehicle_id,
                entry.user_id,
                entry.days,
                amount(&self.currency, entry.late_fee)
            )?;
        }

        writeln!(self.output, "\n=== Earnings Report ===")?;
        writeln!(
            self.output,
            "Total Earnings: {}",
            amount(&self.currency, report.earnings.total_revenue)
        )?;
        for entry in &report.earnings.entries {
            writeln!(
                self.output,
                "Vehicle: {}, User: {}, Total Cost: {}",
                entry.vehicle_id,
                entry.user_id,
                amount(&self.currency, entry.total_cost)
            )?;
        }
        writeln!(
            self.output,
            "Total Rental Revenue: {}",
            amount(&self.currency, report.total_revenue)
        )?;
        Ok(())
    }

    fn user_menu(&mut self) -> Result<()> {
        loop {
            let choice = self.choose(
                "Regular User Menu",
                &["Rent Vehicle", "Return Vehicle", "Search and Sort Vehicles", "Exit"],
            )?;
            match choice {
                1 => {
                    let user_id = self.prompt("Enter your User ID: ")?;
                    let vehicle_id = self.prompt("Enter Vehicle ID to rent: ")?;
                    let start_date = self.prompt("Enter rental start date (dd/MM/yyyy): ")?;
                    match self.renter.rent_vehicle(&user_id, &vehicle_id, &start_date) {
                        Ok(()) => writeln!(self.output, "Vehicle rented successfully.")?,
                        Err(err) => self.report(&err)?,
                    }
                }
                2 => {
                    let user_id = self.prompt("Enter your User ID: ")?;
                    let vehicle_id = self.prompt("Enter Vehicle ID to return: ")?;
                    let return_date = self.prompt("Enter return date (dd/MM/yyyy): ")?;
                    match self.renter.return_vehicle(&user_id, &vehicle_id, &return_date) {
                        Ok(receipt) => {
                            writeln!(
                                self.output,
                                "Vehicle returned successfully. Total cost: {}",
                                amount(&self.currency, receipt.total_cost)
                            )?;
                            if receipt.late_fee > 0.0 {
                                writeln!(
                                    self.output,
                                    "Late return fee after {} days: {}",
                                    receipt.days,
                                    amount(&self.currency, receipt.late_fee)
                                )?;
                            }
                        }
                        Err(err) => self.report(&err)?,
                    }
                }
                3 => self.search_and_sort_menu()?,
                _ => return Ok(()),
            }
        }
    }

    fn search_and_sort_menu(&mut self) -> Result<()> {
        loop {
            let choice = self.choose(
                "Search and Sort Vehicles",
                &[
                    "Show Available Vehicles",
                    "Sort by year",
                    "Sort by price",
                    "Search by Year Range",
                    "Back to User Menu",
                ],
            )?;
            match choice {
                1 => {
                    let vehicles = self.renter.available_vehicles();
                    self.list("Available Vehicles", &vehicles, "No available vehicles found.")?;
                }
                2 | 3 => {
                    let key = if choice == 2 { SortKey::Year } else { SortKey::Price };
                    let vehicles = self.renter.search_and_sort(key);
                    self.list(
                        "Available Vehicles (Sorted)",
                        &vehicles,
                        "No available vehicles found.",
                    )?;
                }
                4 => {
                    let Some(start) = self.read_year("Enter start year: ")? else {
                        continue;
                    };
                    let Some(end) = self.read_year("Enter end year: ")? else {
                        continue;
                    };
                    let vehicles = self.renter.find_by_year(start, end);
                    self.list(
                        &format!("Vehicles from {start} to {end}"),
                        &vehicles,
                        "No vehicles found in that range.",
                    )?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Prompt for fields until year and price parse; ID and model are checked on add.
    fn read_vehicle(&mut self) -> Result<Vehicle> {
        let id = self.prompt("Enter Vehicle ID: ")?;
        let model = self.prompt("Enter Vehicle Model: ")?;
        let year = loop {
            let input = self.prompt("Enter Vehicle Year: ")?;
            match validator::parse_positive_int(&input, YEAR_ERROR) {
                Ok(year) => break year,
                Err(err) => writeln!(self.output, "{err}")?,
            }
        };
        let price = loop {
            let input = self.prompt("Enter Rental Price: ")?;
            match validator::parse_positive_price(&input, PRICE_ERROR) {
                Ok(price) => break price,
                Err(err) => writeln!(self.output, "{err}")?,
            }
        };
        Ok(Vehicle::available(id, model, year, price))
    }

    fn read_year(&mut self, label: &str) -> Result<Option<u32>> {
        let input = self.prompt(label)?;
        match validator::parse_positive_int(&input, YEAR_ERROR) {
            Ok(year) => Ok(Some(year)),
            Err(err) => {
                writeln!(self.output, "{err}")?;
                Ok(None)
            }
        }
    }

    /// Print a numbered menu and return a choice in `1..=options.len()`.
    fn choose(&mut self, title: &str, options: &[&str]) -> Result<usize> {
        loop {
            writeln!(self.output, "\n=== {title} ===")?;
            for (index, option) in options.iter().enumerate() {
                writeln!(self.output, "{}. {option}", index + 1)?;
            }
            let input = self.prompt("Enter your choice: ")?;
            match validator::parse_positive_int(&input, MENU_OPTION_ERROR) {
                Ok(choice) if (choice as usize) <= options.len() => return Ok(choice as usize),
                Ok(_) => writeln!(self.output, "Invalid choice. Please try again.")?,
                Err(err) => writeln!(self.output, "{err}")?,
            }
        }
    }

    fn prompt(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = Vec::new();
        let read = self
            .input
            .read_until(b'\n', &mut line)
            .context("failed to read input")?;
        if read == 0 {
            writeln!(self.output)?;
            return Err(EndOfInput.into());
        }
        // Undecodable bytes become U+FFFD and fail validation like any other typo.
        Ok(String::from_utf8_lossy(&line).trim().to_string())
    }

    fn list<T: Display>(&mut self, title: &str, items: &[T], empty: &str) -> Result<()> {
        writeln!(self.output, "\n=== {title} ===")?;
        if items.is_empty() {
            writeln!(self.output, "{empty}")?;
        }
        for item in items {
            writeln!(self.output, "{item}")?;
        }
        Ok(())
    }

    fn report(&mut self, err: &FleetError) -> Result<()> {
        match err {
            FleetError::InvalidFormat(message) | FleetError::InvalidRentalDate(message) => {
                writeln!(self.output, "Error: {message}")?
            }
            other => writeln!(self.output, "{other}")?,
        }
        Ok(())
    }
}

fn amount(currency: &str, value: f64) -> String {
    format!("{currency}{}", format_amount(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetrent_core::{
        fleet::FleetPolicy, FleetHandle, FleetManager, FleetStore, Identity, PricingPolicy,
    };
    use std::{fs, io::Cursor, path::Path};
    use tempfile::tempdir;

    fn run_script(dir: &Path, currency: &str, script: &str) -> Result<String> {
        run_bytes(dir, currency, script.as_bytes())
    }

    fn run_bytes(dir: &Path, currency: &str, script: &[u8]) -> Result<String> {
        let manager = FleetManager::open(
            FleetStore::in_dir(dir),
            PricingPolicy::default(),
            FleetPolicy::default(),
        );
        let fleet = FleetHandle::new(manager);
        let admin = AdminSession::new(Identity::new("1", "Admin"), fleet.clone());
        let renter = RenterSession::new(Identity::new("2", "User"), fleet);

        let mut output = Vec::new();
        Menu::new(Cursor::new(script.to_vec()), &mut output, admin, renter, currency).run()?;
        Ok(String::from_utf8(output)?)
    }

    #[test]
    fn end_of_input_exits_cleanly() -> Result<()> {
        let dir = tempdir()?;
        let output = run_script(dir.path(), "₪", "")?;
        assert!(output.contains("=== Main Menu ==="));

        // Input ending deep inside a sub-menu unwinds as well.
        let output = run_script(dir.path(), "₪", "1\n1\n1\nV11\n")?;
        assert!(output.contains("Enter Vehicle Model: "));
        Ok(())
    }

    #[test]
    fn invalid_choices_are_reported() -> Result<()> {
        let dir = tempdir()?;
        let output = run_script(dir.path(), "₪", "9\nabc\n3\n")?;
        assert!(output.contains("Invalid choice. Please try again."));
        assert!(output.contains("Invalid input. Please enter a valid menu option."));
        assert!(output.trim_end().ends_with("Exiting the system. Goodbye!"));
        Ok(())
    }

    #[test]
    fn undecodable_input_is_treated_as_a_bad_entry() -> Result<()> {
        let dir = tempdir()?;
        let script = b"2\n1\nU\xe9\nV04\n01/03/2024\n\xff\n1\nU1\nV9\xfe\n01/03/2024\n4\n3\n";
        let output = run_bytes(dir.path(), "₪", script)?;

        assert!(output.contains("Vehicle rented successfully."));
        assert!(output.contains("Invalid input. Please enter a valid menu option."));
        assert!(output.contains("Vehicle with ID V9\u{fffd} not found."));
        assert!(output.trim_end().ends_with("Exiting the system. Goodbye!"));
        Ok(())
    }

    #[test]
    fn add_rent_and_return_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let script = [
            // Admin > Manage Vehicles > Add, retrying a bad year.
            "1", "1", "1", "V11", "Kia Rio", "twenty", "2021", "60.00", "5", "6",
            // User > Rent then Return after three days.
            "2", "1", "U1", "V11", "01/01/2023", "2", "U1", "V11", "04/01/2023", "4",
            "3",
        ]
        .join("\n");
        let output = run_script(dir.path(), "₪", &script)?;

        assert!(output.contains("Invalid input. Year must be a positive number."));
        assert!(output.contains("Vehicle added successfully."));
        assert!(output.contains("Vehicle rented successfully."));
        assert!(output.contains("Vehicle returned successfully. Total cost: ₪180.0"));
        assert!(!output.contains("Late return fee"));

        let rentals = fs::read_to_string(dir.path().join("rentals.txt"))?;
        assert_eq!(
            rentals,
            "U1,V11,Kia Rio,2021,60.0,01/01/2023,04/01/2023,180.0,Completed\n"
        );
        Ok(())
    }

    #[test]
    fn validation_failures_leave_the_fleet_untouched() -> Result<()> {
        let dir = tempdir()?;
        let script = [
            "1", "1", "1", "V-1", "Kia Rio", "2021", "60", "1", "V01", "Audi", "2020", "50",
            "5", "6", "2", "1", "U1", "V01", "2023-01-01", "4", "3",
        ]
        .join("\n");
        let output = run_script(dir.path(), "₪", &script)?;

        assert!(output.contains("Error: Invalid Vehicle ID. It must be 3-6 alphanumeric characters."));
        assert!(output.contains("Error: Vehicle with ID V01 already exists."));
        assert!(output.contains("Error: Invalid date format. Must be in the format dd/MM/yyyy."));
        let vehicles = fs::read_to_string(dir.path().join("vehicles.txt"))?;
        assert_eq!(vehicles.lines().count(), 10);
        assert!(!vehicles.contains("Rented"));
        Ok(())
    }

    #[test]
    fn report_shows_late_fees_in_configured_currency() -> Result<()> {
        let dir = tempdir()?;
        let script = [
            "2", "1", "U1", "V05", "01/01/2023", "2", "U1", "V05", "11/01/2023", "4",
            "1", "4", "5", "U1", "6", "3",
        ]
        .join("\n");
        let output = run_script(dir.path(), "$", &script)?;

        assert!(output.contains("Vehicle returned successfully. Total cost: $800.0"));
        assert!(output.contains("Late return fee after 10 days: $350.0"));
        assert!(output.contains("Vehicle: V05, User: U1, Days: 10, Late Fee: $350.0"));
        assert!(output.contains("Total Earnings: $800.0"));
        assert!(output.contains("Total Rental Revenue: $800.0"));
        assert!(output.contains("=== Total Rental Cost for User ID: U1 ===\n$800.0"));
        Ok(())
    }

    #[test]
    fn maintenance_and_removal_menus() -> Result<()> {
        let dir = tempdir()?;
        let script = [
            // Maintenance: send V07, list, restore unknown, back.
            "1", "3", "2", "V07", "1", "3", "V99", "4",
            // Manage > Remove > Old (2024), by unknown ID, back, back.
            "1", "2", "2", "2024", "1", "V99", "3", "5",
            // Statistics, exit everything.
            "2", "6", "3",
        ]
        .join("\n");
        let output = run_script(dir.path(), "₪", &script)?;

        assert!(output.contains("Vehicle sent to maintenance."));
        assert!(output.contains("Vehicle ID: V07 (Nissan J32) is under maintenance."));
        assert!(output.contains("Vehicle with ID V99 not found."));
        assert!(output.contains("Old vehicles removed successfully (3 removed)."));
        assert!(output.contains("Available Vehicles: 6"));
        assert!(output.contains("Under Maintenance: 1"));
        Ok(())
    }

    #[test]
    fn search_and_sort_views() -> Result<()> {
        let dir = tempdir()?;
        let script = ["2", "3", "3", "4", "2018", "2019", "4", "abc", "5", "4", "3"].join("\n");
        let output = run_script(dir.path(), "₪", &script)?;

        let sorted = output
            .split("=== Available Vehicles (Sorted) ===\n")
            .nth(1)
            .unwrap_or_default();
        assert!(sorted.starts_with("ID: V10, Model: Chevrolet Malibu"));
        assert!(output.contains("=== Vehicles from 2018 to 2019 ===\nID: V03"));
        assert!(output.contains("Invalid input. Year must be a positive number."));
        Ok(())
    }
}
