#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, DatabaseFairing};
use crate::ledger::Ledger;
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod model;

#[cfg(test)]
pub(crate) mod testing;

/// Build the server, backed by the MongoDB instance named in the config.
pub fn build() -> Rocket<Build> {
    with_routes(rocket::build()).attach(DatabaseFairing)
}

/// Build the server over an already constructed ledger.
pub fn rocket_for_ledger(rocket: Rocket<Build>, ledger: Ledger) -> Rocket<Build> {
    with_routes(rocket).manage(ledger)
}

fn with_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .mount("/", api::routes())
}
