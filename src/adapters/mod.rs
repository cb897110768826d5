//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod json_audit_adapter;
pub mod static_broker_adapter;
pub mod timeout_broker_adapter;
