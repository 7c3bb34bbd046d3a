//! Database-backed storage

pub mod postgres;

pub use postgres::PostgresStore;
