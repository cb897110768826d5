//! Validated application configuration, assembled once and injected.

use std::path::PathBuf;

use crate::domain::backtest::{BacktestConfig, BrokerSource};
use crate::domain::broker::BrokerClassification;
use crate::domain::config_validation::{
    parse_code_list, read_double, read_int, read_string, validate_config, DEFAULT_AUDIT_PATH,
    DEFAULT_BROKER_SOURCE, DEFAULT_BROKER_TIMEOUT_MS, DEFAULT_DATA_DIR, DEFAULT_HISTORY_BARS,
    DEFAULT_INDEX_CODE, DEFAULT_INITIAL_CAPITAL, DEFAULT_RETAIL, DEFAULT_SMART_MONEY,
    DEFAULT_WATCHLIST,
};
use crate::domain::error::IdxQuantError;
use crate::domain::risk::RiskConfig;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backtest: BacktestConfig,
    pub risk: RiskConfig,
    pub brokers: BrokerClassification,
    pub watchlist: Vec<String>,
    pub data_dir: PathBuf,
    pub index_code: String,
    pub audit_path: PathBuf,
}

impl AppConfig {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, IdxQuantError> {
        validate_config(config)?;

        let broker_source = read_string(config, "backtest", "broker_source", DEFAULT_BROKER_SOURCE)
            .parse::<BrokerSource>()
            .map_err(|reason| IdxQuantError::ConfigInvalid {
                section: "backtest".into(),
                key: "broker_source".into(),
                reason,
            })?;

        let backtest = BacktestConfig {
            initial_capital: read_double(
                config,
                "backtest",
                "initial_capital",
                DEFAULT_INITIAL_CAPITAL,
            )?,
            history_bars: read_int(config, "backtest", "history_bars", DEFAULT_HISTORY_BARS)?
                as usize,
            broker_source,
            broker_timeout_ms: read_int(
                config,
                "backtest",
                "broker_timeout_ms",
                DEFAULT_BROKER_TIMEOUT_MS,
            )? as u64,
        };

        let defaults = RiskConfig::default();
        let risk = RiskConfig {
            base_risk_fraction: read_double(
                config,
                "risk",
                "base_risk_fraction",
                defaults.base_risk_fraction,
            )?,
            aggressive_risk_fraction: read_double(
                config,
                "risk",
                "aggressive_risk_fraction",
                defaults.aggressive_risk_fraction,
            )?,
            high_conviction_ratio: read_double(
                config,
                "risk",
                "high_conviction_ratio",
                defaults.high_conviction_ratio,
            )?,
        };

        let smart_money = parse_code_list(
            "brokers",
            "smart_money",
            &read_string(config, "brokers", "smart_money", DEFAULT_SMART_MONEY),
        )?;
        let retail = parse_code_list(
            "brokers",
            "retail",
            &read_string(config, "brokers", "retail", DEFAULT_RETAIL),
        )?;

        let watchlist = parse_code_list(
            "watchlist",
            "codes",
            &read_string(config, "watchlist", "codes", DEFAULT_WATCHLIST),
        )?;

        Ok(AppConfig {
            backtest,
            risk,
            brokers: BrokerClassification::new(smart_money, retail),
            watchlist,
            data_dir: PathBuf::from(read_string(config, "backtest", "data_dir", DEFAULT_DATA_DIR)),
            index_code: read_string(config, "backtest", "index_code", DEFAULT_INDEX_CODE)
                .to_uppercase(),
            audit_path: PathBuf::from(read_string(config, "audit", "path", DEFAULT_AUDIT_PATH)),
        })
    }

    /// The watchlist, or just `code` when one was given on the command line.
    pub fn tickers(&self, code: Option<&str>) -> Vec<String> {
        match code {
            Some(code) => vec![code.trim().to_uppercase()],
            None => self.watchlist.clone(),
        }
    }
}
