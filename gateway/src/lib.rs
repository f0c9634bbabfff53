//! CoastWatch Gateway
//!
//! Hosts the threat-detection pipeline: periodic scans over monitored
//! coastal locations, rule-based scoring, conditional threat materialization,
//! impact estimation, role-based alert fan-out, and real-time push to
//! connected dashboards.

pub mod alerts;
pub mod monitor;
pub mod push;
pub mod routes;
pub mod seed;
pub mod store;
