use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_FILE, DEFAULT_CSV_FILE, DEFAULT_LOG_FILTER};
use crate::error::{CheckError, Result};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target of a run without an explicit path
    pub csv_path: PathBuf,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    /// JSON file logs are only written when this is set
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_FILE),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Reads `config_path`, falling back to defaults when it does not exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_content = match fs::read_to_string(config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(CheckError::Config(format!(
                    "Failed to read config file '{}': {}",
                    config_path.display(),
                    e
                )))
            }
        };

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}
