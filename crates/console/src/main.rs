mod logging;
mod menu;

use std::io;

use anyhow::Result;
use fleetrent_core::{
    config::{self, AppConfig},
    AdminSession, FleetHandle, FleetManager, Identity, RenterSession,
};
use tracing::info;

fn main() -> Result<()> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    logging::init_logging(&config.storage.log_path())?;
    info!("System started.");

    let manager = FleetManager::open(
        config.storage.store(),
        config.pricing.clone(),
        config.fleet.clone(),
    );
    let fleet = FleetHandle::new(manager);
    let admin = AdminSession::new(Identity::new("1", "Admin"), fleet.clone());
    let renter = RenterSession::new(Identity::new("2", "User"), fleet);

    let stdin = io::stdin();
    let mut menu = menu::Menu::new(
        stdin.lock(),
        io::stdout(),
        admin,
        renter,
        config.display.currency,
    );
    menu.run()?;
    info!("System exited.");
    Ok(())
}
