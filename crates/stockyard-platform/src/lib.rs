pub mod config;
pub mod db;

pub use config::ServiceConfig;
pub use db::{PgPurchaseStore, connect_database, ensure_schema};
