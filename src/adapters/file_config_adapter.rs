//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
source = table
path = ./data/ose.csv
exchange = OSE

[backtest]
start_date = 2023-01-01
end_date = 2023-12-31
initial_capital = 250000.0
risk_free_rate = 0.03

[universe]
symbols = EQNR, DNB
exclude = (?i)bond|fund
min_bars = 20
exclude_defaults = no

[report]
path = out/report.md
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_every_section() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("data", "source"), Some("table".into()));
        assert_eq!(adapter.get_string("data", "exchange"), Some("OSE".into()));
        assert_eq!(
            adapter.get_string("backtest", "start_date"),
            Some("2023-01-01".into())
        );
        assert_eq!(
            adapter.get_double("backtest", "initial_capital", 0.0),
            250000.0
        );
        assert_eq!(adapter.get_double("backtest", "risk_free_rate", 0.0), 0.03);
        assert_eq!(adapter.get_int("universe", "min_bars", 2), 20);
        assert!(!adapter.get_bool("universe", "exclude_defaults", true));
        assert_eq!(
            adapter.get_string("report", "path"),
            Some("out/report.md".into())
        );
    }

    #[test]
    fn regex_values_survive_parsing() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("universe", "exclude"),
            Some("(?i)bond|fund".into())
        );
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Data]
Exchange = OSE
").unwrap();
        assert_eq!(adapter.get_string("data", "exchange"), Some("OSE".into()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn numeric_getters_fall_back_to_default() {
        let adapter = FileConfigAdapter::from_string(
            "[universe]\nmin_bars = abc\n[backtest]\ninitial_capital = not_a_number\n",
        )
        .unwrap();
        assert_eq!(adapter.get_int("universe", "min_bars", 2), 2);
        assert_eq!(adapter.get_int("universe", "missing", 42), 42);
        assert_eq!(
            adapter.get_double("backtest", "initial_capital", 99.9),
            99.9
        );
        assert_eq!(adapter.get_double("backtest", "missing", 1.5), 1.5);
    }

    #[test]
    fn get_bool_parses_common_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[universe]\na = true\nb = yes\nc = 1\nd = false\ne = no\nf = 0\ng = maybe\n",
        )
        .unwrap();
        for key in ["a", "b", "c"] {
            assert!(adapter.get_bool("universe", key, false), "{key}");
        }
        for key in ["d", "e", "f"] {
            assert!(!adapter.get_bool("universe", key, true), "{key}");
        }
        assert!(adapter.get_bool("universe", "g", true));
        assert!(!adapter.get_bool("universe", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("data", "path"), Some("./data/ose.csv".into()));
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
