//! Tool configuration, stored as YAML next to the benchmarks.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_ALGORITHM_FLAG_FORMAT, DEFAULT_BENCHMARK_FOLDER, DEFAULT_TIME_TOLERANCE,
    DEFAULT_TIMEOUT_SECS,
};
use crate::error::ConfigError;

const FLAG_PLACEHOLDER: &str = "%s";

/// Settings loaded once at startup and passed to every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    /// Server jar handed to `java -jar`.
    pub server_path: PathBuf,
    pub levels_dir: PathBuf,
    pub benchmark_folder: PathBuf,
    /// Command the server runs as the client.
    pub client_command: String,
    /// Per-level time limit in seconds. Also the penalty for unsolved levels.
    pub timeout: u64,
    #[serde(default = "default_flag_format")]
    pub algorithm_flag_format: String,
    #[serde(default = "default_time_tolerance")]
    pub time_tolerance: f64,
}

fn default_flag_format() -> String {
    DEFAULT_ALGORITHM_FLAG_FORMAT.to_string()
}

const fn default_time_tolerance() -> f64 {
    DEFAULT_TIME_TOLERANCE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_path: PathBuf::from("path/to/your/server_executable"),
            levels_dir: PathBuf::from("path/to/your/levels_directory"),
            benchmark_folder: PathBuf::from(DEFAULT_BENCHMARK_FOLDER),
            client_command: "your_client_command --level {level_path}".to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            algorithm_flag_format: default_flag_format(),
            time_tolerance: DEFAULT_TIME_TOLERANCE,
        }
    }
}

impl Config {
    /// Reads and validates a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML for this
    /// shape, or fails [`Config::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the YAML error if `text` does not describe a config.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::Serialize)
    }

    /// Writes the config as YAML, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let yaml = self.to_yaml()?;
        fs::write(path, yaml).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("wrote config to {}", path.display());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::InvalidTimeout(self.timeout));
        }
        if !self.time_tolerance.is_finite() || self.time_tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(self.time_tolerance));
        }
        self.check_flag_format()
    }

    fn check_flag_format(&self) -> Result<(), ConfigError> {
        let count = self.algorithm_flag_format.matches(FLAG_PLACEHOLDER).count();
        if count == 1 {
            Ok(())
        } else {
            Err(ConfigError::InvalidFlagFormat {
                format: self.algorithm_flag_format.clone(),
                count,
            })
        }
    }

    /// Client flag selecting `algorithm`, e.g. `-bfs` for the default format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFlagFormat`] unless the format holds
    /// exactly one `%s`.
    pub fn algorithm_flag(&self, algorithm: &str) -> Result<String, ConfigError> {
        self.check_flag_format()?;
        Ok(self
            .algorithm_flag_format
            .replacen(FLAG_PLACEHOLDER, algorithm, 1))
    }

    /// Client command with the algorithm flag appended when one is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag format is invalid.
    pub fn client_command_for(&self, algorithm: Option<&str>) -> Result<String, ConfigError> {
        match algorithm {
            Some(algorithm) => Ok(format!(
                "{} {}",
                self.client_command,
                self.algorithm_flag(algorithm)?
            )),
            None => Ok(self.client_command.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("ServerPath:"));
        assert!(yaml.contains("AlgorithmFlagFormat:"));
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn older_files_get_new_defaults() {
        let yaml = "\
ServerPath: server.jar
LevelsDir: levels
BenchmarkFolder: out
ClientCommand: java -jar client.jar
Timeout: 60
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.timeout, 60);
        assert_eq!(config.algorithm_flag_format, "-%s");
        assert!((config.time_tolerance - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn algorithm_flag_substitutes_once() {
        let mut config = Config::default();
        assert_eq!(config.algorithm_flag("bfs").unwrap(), "-bfs");
        config.algorithm_flag_format = "--strategy=%s".to_string();
        assert_eq!(
            config.client_command_for(Some("astar")).unwrap(),
            "your_client_command --level {level_path} --strategy=astar"
        );
        assert_eq!(
            config.client_command_for(None).unwrap(),
            config.client_command
        );
    }

    #[test]
    fn flag_format_needs_exactly_one_placeholder() {
        let mut config = Config::default();
        config.algorithm_flag_format = "-x".to_string();
        assert!(matches!(
            config.algorithm_flag("bfs"),
            Err(ConfigError::InvalidFlagFormat { count: 0, .. })
        ));
        config.algorithm_flag_format = "-%s-%s".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFlagFormat { count: 2, .. })
        ));
    }

    #[test]
    fn rejects_bad_timeout_and_tolerance() {
        let config = Config {
            timeout: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(0))));
        let config = Config {
            time_tolerance: -1.0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTolerance(_))
        ));
    }

    #[test]
    fn load_and_save_use_the_filesystem() {
        let dir = std::env::temp_dir().join(format!(
            "masbench-config-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("masbench_config.yml");
        let config = Config {
            timeout: 42,
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
        fs::remove_dir_all(&dir).unwrap();

        assert!(matches!(
            Config::load(dir.join("missing.yml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
