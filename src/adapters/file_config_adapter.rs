//! INI file configuration adapter.

use crate::domain::error::VaultError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VaultError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| VaultError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, VaultError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| VaultError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key).filter(|v| !v.trim().is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
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

    #[test]
    fn from_string_parses_all_sections() {
        let content = r#"
[horizon]
url = https://horizon-testnet.stellar.org
timeout_secs = 15
limit = 100

[prices]
source = csv
csv_dir = /var/lib/vaultforge/aggregates

[synthetic]
seed = 42

[compiler]
multi_asset = all
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("horizon", "url"),
            Some("https://horizon-testnet.stellar.org".to_string())
        );
        assert_eq!(adapter.get_int("horizon", "timeout_secs", 0), 15);
        assert_eq!(adapter.get_string("prices", "source"), Some("csv".to_string()));
        assert_eq!(
            adapter.get_string("prices", "csv_dir"),
            Some("/var/lib/vaultforge/aggregates".to_string())
        );
        assert_eq!(adapter.get_int("synthetic", "seed", 0), 42);
        assert_eq!(
            adapter.get_string("compiler", "multi_asset"),
            Some("all".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_or_blank() {
        let adapter = FileConfigAdapter::from_string("[horizon]\nurl =\nlimit = 5\n").unwrap();
        assert_eq!(adapter.get_string("horizon", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert_eq!(adapter.get_string("horizon", "url"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[horizon]\nlimit = abc\n").unwrap();
        assert_eq!(adapter.get_int("horizon", "limit", 200), 200);
        assert_eq!(adapter.get_int("horizon", "timeout_secs", 0), 0);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[prices]\ncsv_dir = /data/aggregates\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("prices", "csv_dir"),
            Some("/data/aggregates".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/vaultforge.ini").unwrap_err();
        assert!(matches!(err, VaultError::ConfigParse { file, .. } if file.contains("vaultforge.ini")));
    }
}
