//! Configuration manager for accounts.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name.
    #[serde(default)]
    pub name: String,
    /// Interface to bind.
    #[serde(default = "default_address")]
    pub address: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Version served by `GET /api/build-info`.
    #[serde(default = "default_build_version")]
    pub build_version: String,
    /// Served by `GET /api/contact-info`.
    #[serde(default)]
    pub contact_info: ContactInfo,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to log output.
    #[serde(default)]
    pub log: Log,
    #[serde(skip)]
    path: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_CRATE_NAME").to_owned(),
            address: default_address(),
            port: default_port(),
            build_version: default_build_version(),
            contact_info: ContactInfo::default(),
            postgres: None,
            log: Log::default(),
            path: PathBuf::default(),
        }
    }
}

/// Who to reach when the service misbehaves.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ContactInfo {
    pub message: String,
    pub contact_details: BTreeMap<String, String>,
    pub on_call_support: Vec<String>,
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Log output format.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_owned()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_build_version() -> String {
    VERSION.to_owned()
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, ConfigurationError> {
        let file_path = if self.path.is_file() {
            self.path
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let file = File::open(&file_path).map_err(|source| {
            ConfigurationError::Io {
                path: file_path.clone(),
                source,
            }
        })?;
        let config: Configuration =
            serde_yaml::from_reader(file).map_err(|source| {
                ConfigurationError::Yaml {
                    path: file_path.clone(),
                    source,
                }
            })?;

        Ok(Arc::new(Configuration {
            path: file_path,
            ..config
        }))
    }
}

/// Configuration file could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}
