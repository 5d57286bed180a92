//! Korean apartment transaction statistics service.
//!
//! Ingests MOLIT 실거래가 records, persists them in SQLite, and serves
//! monthly price/volume statistics, district rankings and apartment-level
//! groupings over HTTP.

pub mod apartments;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod regions;
pub mod stats;
pub mod tier;
pub mod types;
