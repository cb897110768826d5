//! Port traits the domain consumes.

pub mod audit_port;
pub mod broker_port;
pub mod config_port;
pub mod data_port;
