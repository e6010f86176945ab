//! # Home Energy Simulation
//!
//! What-if simulation of household hardware (EV charger, heat pump, solar
//! array, battery) on a measured energy series, and costing of the result
//! under a time-of-use or spot tariff.
//!
//! ## Modules
//!
//! - **domain**: energy series, aggregation levels, weekly schedules, errors
//! - **simulation**: the four transforms and the pipeline that chains them
//! - **tariff**: price sources and the cost calculator
//! - **report**: baseline vs. scenario comparison for one run
//! - **config** / **telemetry**: binary configuration and logging setup

pub mod config;
pub mod domain;
pub mod report;
pub mod simulation;
pub mod tariff;
pub mod telemetry;
