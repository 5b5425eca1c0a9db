//! # gymledger
//!
//! Multi-tenant gym membership engine: member lifecycle with renewal policy, a per-gym
//! financial ledger with automatic event logging, bulk import reconciliation, and
//! period-bucketed reporting, served over an axum HTTP API.

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod gyms;
pub mod handlers;
pub mod import;
pub mod ledger;
pub mod membership;
pub mod models;
pub mod money;
pub mod reporting;
pub mod repositories;
pub mod server;
pub mod tabular;
pub mod telemetry;
pub use migration;
