//! Port traits at the boundaries of the simulation.

pub mod config_port;
pub mod data_port;
pub mod report_port;
