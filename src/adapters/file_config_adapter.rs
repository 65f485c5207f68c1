//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
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

    /// No file given: every lookup falls through to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
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

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    const SAMPLE: &str = r#"
[options]
ticker = AAPL
n_estimators = 100
test_ratio = 0.2

[equity]
ticker = TSLA
start_date = 2025-01-01

[quantconnect]
timeout_secs = 30
"#;

    #[test]
    fn from_string_parses_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("options", "ticker"), Some("AAPL".to_string()));
        assert_eq!(adapter.get_string("equity", "ticker"), Some("TSLA".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("options", "expiration"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("options", "n_estimators", 0), 100);
        assert_eq!(adapter.get_int("options", "seed", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[options]\nseed = abc\n").unwrap();
        assert_eq!(adapter.get_int("options", "seed", 42), 42);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_double("options", "test_ratio", 0.0), 0.2);
        assert_eq!(adapter.get_double("equity", "test_ratio", 0.25), 0.25);
    }

    #[test]
    fn get_bool_parses_common_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[options]\na = true\nb = no\nc = 1\nd = maybe\n")
                .unwrap();
        assert!(adapter.get_bool("options", "a", false));
        assert!(!adapter.get_bool("options", "b", true));
        assert!(adapter.get_bool("options", "c", false));
        assert!(adapter.get_bool("options", "d", true));
        assert!(!adapter.get_bool("options", "missing", false));
    }

    #[test]
    fn get_date_parses_or_rejects() {
        let adapter = FileConfigAdapter::from_string(
            "[equity]\nstart_date = 2025-01-01\nend_date = 2025/12/31\n",
        )
        .unwrap();
        assert_eq!(
            adapter.get_date("equity", "start_date").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
        );
        assert_eq!(adapter.get_date("equity", "missing").unwrap(), None);
        assert!(adapter.get_date("equity", "end_date").is_err());
    }

    #[test]
    fn empty_adapter_uses_defaults() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_string("options", "ticker"), None);
        assert_eq!(adapter.get_int("options", "n_estimators", 100), 100);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[yahoo]\nbase_url = http://localhost:8080\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("yahoo", "base_url"),
            Some("http://localhost:8080".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
