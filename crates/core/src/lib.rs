#![warn(clippy::all, missing_docs)]

//! Core domain logic for the fleetrent vehicle rental manager.
//!
//! This crate hosts the vehicle and rental models, field validation,
//! pricing rules, flat-file persistence, configuration and the
//! role-scoped sessions used by the console frontend.

pub mod config;
pub mod error;
pub mod fleet;
pub mod models;
pub mod pricing;
pub mod roles;
pub mod storage;
pub mod validator;

pub use config::AppConfig;
pub use error::{FleetError, FleetResult};
pub use fleet::{FleetHandle, FleetManager, FleetPolicy, SortKey};
pub use models::{ActiveRental, FleetRecord, Rental, RentalDate, Vehicle, VehicleStatus};
pub use pricing::PricingPolicy;
pub use roles::{AdminSession, Identity, RenterSession};
pub use storage::FleetStore;
