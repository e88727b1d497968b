pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod ingest;
pub mod rate_limit;
pub mod report;
