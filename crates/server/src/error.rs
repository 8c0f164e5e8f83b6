//! Error types for the serving layer.

use std::path::PathBuf;

use thiserror::Error;

use data_loader::DataLoadError;
use models::ModelError;

/// Problems reading or validating the JSON configuration files
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Anything that can go wrong while building or running the service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataLoadError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Failed to write submission {path}: {source}")]
    Submission {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
