pub mod cache;
pub mod config;
pub mod database;
pub mod listings;
pub mod search_log;
pub mod sessions;
pub mod store;

pub use config::DatabaseConfig;
pub use database::Database;
pub use store::PgStore;
