//! INI file configuration adapter.

use crate::domain::error::IdxQuantError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, IdxQuantError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| IdxQuantError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, IdxQuantError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| IdxQuantError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[backtest]
initial_capital = 200000000
data_dir = /var/lib/idx

[brokers]
smart_money = AK,BK,CC
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("backtest", "data_dir"),
            Some("/var/lib/idx".to_string())
        );
        assert_eq!(
            adapter.get_string("brokers", "smart_money"),
            Some("AK,BK,CC".to_string())
        );
    }

    #[test]
    fn section_and_key_names_are_case_insensitive() {
        let adapter =
            FileConfigAdapter::from_string("[Risk]\nBase_Risk_Fraction = 0.02\n").unwrap();
        assert_eq!(
            adapter.get_string("risk", "base_risk_fraction"),
            Some("0.02".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 100\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[audit]\npath = /tmp/trade_logs.json\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("audit", "path"),
            Some("/tmp/trade_logs.json".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(IdxQuantError::ConfigParse { .. })));
    }
}
