//! Core domain types and logic.

pub mod app_config;
pub mod audit;
pub mod backtest;
pub mod broker;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod indicator_set;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod position;
pub mod regime;
pub mod risk;
pub mod scanner;
pub mod signal;
pub mod tick;
