use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a server/client log into a results table.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("error opening log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error reading log file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error creating CSV file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error writing CSV file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("invalid log pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors raised while loading or persisting a run table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to open CSV file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read CSV file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("CSV file {path} has no LevelName column")]
    MissingLevelColumn { path: PathBuf },
}

/// Errors raised when the configuration file is unreadable or malformed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error parsing config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("error writing config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error serializing config: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error(
        "AlgorithmFlagFormat '{format}' must contain exactly one %s placeholder (found {count})"
    )]
    InvalidFlagFormat { format: String, count: usize },
    #[error("Timeout must be at least 1 second (got {0})")]
    InvalidTimeout(u64),
    #[error("TimeTolerance must be a finite, non-negative number of seconds (got {0})")]
    InvalidTolerance(f64),
}
