pub mod db;

pub mod counters;
pub mod exchange_rates;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod users;

use std::env;

pub use db::SqliteDatabase;
use log::info;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

const SQLITE_DB_URL: &str = "sqlite://data/voltio_store.db";

pub fn db_url() -> String {
    let result = env::var("VOLTIO_DATABASE_URL").unwrap_or_else(|_| {
        info!("VOLTIO_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
