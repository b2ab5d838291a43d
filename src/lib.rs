#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod voting;

use rocket::{Build, Rocket};

/// Assemble the server: the API routes plus the config, database, position
/// catalog, and logging fairings. The result is ready to `ignite` and
/// `launch`.
pub async fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .attach(voting::CatalogFairing)
        .attach(logging::LoggerFairing)
}

/// The position catalog used by the API tests; must match the fixtures they
/// insert.
#[cfg(test)]
pub(crate) const TEST_POSITIONS: [&str; 4] =
    ["President", "Vice President", "Secretary", "Treasurer"];

/// Connect to the database given by the `db_uri` config value.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let db_uri: String = rocket::Config::figment()
        .extract_inner("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .expect("Could not connect to the database")
}

/// A random database name, so concurrently-running tests cannot collide.
#[cfg(test)]
pub(crate) fn database() -> String {
    format!("test{}", rand::random::<u32>())
}

/// Build a rocket for the given database connection, with a fixed position
/// catalog instead of a derived one.
#[cfg(test)]
pub(crate) async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let db = client.database(db_name);
    model::mongodb::ensure_indexes_exist(&db)
        .await
        .expect("Failed to create database indexes");

    let figment = rocket::Config::figment().merge(("positions", TEST_POSITIONS.to_vec()));
    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(config::ConfigFairing)
        .attach(voting::CatalogFairing)
        .manage(client)
        .manage(db)
}
