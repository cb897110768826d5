//! Configuration validation.
//!
//! Every key has a default, so a missing key is never an error. A present
//! key with an unparseable or out-of-range value is.

use crate::domain::backtest::BrokerSource;
use crate::domain::error::IdxQuantError;
use crate::ports::config_port::ConfigPort;
use std::collections::BTreeSet;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 200_000_000.0;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_INDEX_CODE: &str = "COMPOSITE";
pub const DEFAULT_HISTORY_BARS: i64 = 500;
pub const DEFAULT_BROKER_SOURCE: &str = "historical";
pub const DEFAULT_BROKER_TIMEOUT_MS: i64 = 2_000;
pub const DEFAULT_SMART_MONEY: &str = "AK,BK,CC,ZP,RX,KZ,DX,CS,CG,YU,LG,KI";
pub const DEFAULT_RETAIL: &str = "YP,PD,XC,NI,KK,XL,SQ";
pub const DEFAULT_WATCHLIST: &str = "GTSI,BUMI,BRMS,BBCA,MDKA";
pub const DEFAULT_AUDIT_PATH: &str = "trade_logs.json";

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), IdxQuantError> {
    validate_initial_capital(config)?;
    validate_history_bars(config)?;
    validate_index_code(config)?;
    validate_broker_source(config)?;
    validate_broker_timeout(config)?;
    validate_risk_fractions(config)?;
    validate_conviction_threshold(config)?;
    validate_broker_sets(config)?;
    validate_watchlist(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> IdxQuantError {
    IdxQuantError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// A float key, or `default` when absent. Junk text is an error, never the
/// default.
pub fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, IdxQuantError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(section, key, format!("'{raw}' is not a number"))),
    }
}

pub fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, IdxQuantError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(section, key, format!("'{raw}' is not an integer"))),
    }
}

pub fn read_string(config: &dyn ConfigPort, section: &str, key: &str, default: &str) -> String {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Split a comma-separated code list into upper-case codes, rejecting empty
/// tokens and duplicates.
pub fn parse_code_list(section: &str, key: &str, raw: &str) -> Result<Vec<String>, IdxQuantError> {
    let mut seen = BTreeSet::new();
    let mut codes = Vec::new();
    for token in raw.split(',') {
        let code = token.trim().to_uppercase();
        if code.is_empty() {
            return Err(invalid(section, key, "empty code in list"));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-') {
            return Err(invalid(section, key, format!("invalid code '{code}'")));
        }
        if !seen.insert(code.clone()) {
            return Err(invalid(section, key, format!("duplicate code '{code}'")));
        }
        codes.push(code);
    }
    Ok(codes)
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), IdxQuantError> {
    let value = read_double(config, "backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("backtest", "initial_capital", "initial_capital must be positive"));
    }
    Ok(())
}

fn validate_history_bars(config: &dyn ConfigPort) -> Result<(), IdxQuantError> {
    let value = read_int(config, "backtest", "history_bars", DEFAULT_HISTORY_BARS)?;
    if value < 1 {
        return Err(invalid("backtest", "history_bars", "history_bars must be at least 1"));
    }
    Ok(())
}

fn validate_index_code(config: &dyn ConfigPort) -> Result<(), IdxQuantError> {
    let code = read_string(config, "backtest", "index_code", DEFAULT_INDEX_CODE);
    parse_code_list("backtest", "index_code", &code).map(|_| ())
}

fn validate_broker_source(config: &dyn ConfigPort) -> Result<(), IdxQuantError> {
    let raw = read_string(config, "backtest", "broker_source", DEFAULT_BROKER_SOURCE);
    raw.parse::<BrokerSource>()
        .map(|_| ())
        .map_err(|reason| invalid("backtest", "broker_source", reason))
}

fn validate_broker_timeout(config: &dyn ConfigPort) -> Result<(), IdxQuantError> {
    let value = read_int(config, "backtest", "broker_timeout_ms", DEFAULT_BROKER_TIMEOUT_MS)?;
    if value <= 0 {
        return Err(invalid("backtest", "broker_timeout_ms", "broker_timeout_ms must be positive"));
    }
    Ok(())
}

fn validate_risk_fractions(config: &dyn ConfigPort) -> Result<(), IdxQuantError> {
    let base = read_double(config, "risk", "base_risk_fraction", 0.015)?;
    let aggressive = read_double(config, "risk", "aggressive_risk_fraction", 0.03)?;
    for (key, value) in [("base_risk_fraction", base), ("aggressive_risk_fraction", aggressive)] {
        if !(value > 0.0 && value <= 1.0) {
            return Err(invalid("risk", key, format!("{key} must be in (0, 1]")));
        }
    }
    if aggressive < base {
        return Err(invalid(
            "risk",
            "aggressive_risk_fraction",
            "aggressive_risk_fraction must not be below base_risk_fraction",
        ));
    }
    Ok(())
}

fn validate_conviction_threshold(config: &dyn ConfigPort) -> Result<(), IdxQuantError> {
    let value = read_double(config, "risk", "high_conviction_ratio", 2.5)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("risk", "high_conviction_ratio", "high_conviction_ratio must be positive"));
    }
    Ok(())
}

fn validate_broker_sets(config: &dyn ConfigPort) -> Result<(), IdxQuantError> {
    let smart = parse_code_list(
        "brokers",
        "smart_money",
        &read_string(config, "brokers", "smart_money", DEFAULT_SMART_MONEY),
    )?;
    let retail = parse_code_list(
        "brokers",
        "retail",
        &read_string(config, "brokers", "retail", DEFAULT_RETAIL),
    )?;
    if let Some(both) = smart.iter().find(|code| retail.contains(code)) {
        return Err(invalid(
            "brokers",
            "retail",
            format!("broker '{both}' is listed as both smart money and retail"),
        ));
    }
    Ok(())
}

fn validate_watchlist(config: &dyn ConfigPort) -> Result<(), IdxQuantError> {
    let raw = read_string(config, "watchlist", "codes", DEFAULT_WATCHLIST);
    parse_code_list("watchlist", "codes", &raw).map(|_| ())
}
