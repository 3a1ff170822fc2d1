//! Core domain types and simulation logic.

pub mod price_record;
pub mod rolling_window;
pub mod investment;
pub mod simulation;
pub mod report;
pub mod sim_config;
pub mod config_validation;
pub mod error;
