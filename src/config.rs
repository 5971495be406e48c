//! Server configuration
//!
//! Priority: env var > YAML file > default. The YAML path comes from
//! `SOCIALGRAPH_CONFIG` (falling back to `socialgraph.yaml` in the working
//! directory); a missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_PATH_ENV: &str = "SOCIALGRAPH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "socialgraph.yaml";

/// Bounds applied to caller-supplied query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLimits {
    /// Upper bound (and default) for path search depth
    pub max_path_depth: usize,
    /// Default cap on mutual connections
    pub mutual_limit: usize,
    /// Default page size for ranked lists
    pub default_limit: usize,
    /// Largest page size a caller may request
    pub max_limit: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_path_depth: 6,
            mutual_limit: 50,
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl QueryLimits {
    /// `requested` or the default, never above `max_limit`
    pub fn limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }

    pub fn mutual(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.mutual_limit).min(self.max_limit.max(self.mutual_limit))
    }

    pub fn path_depth(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.max_path_depth).min(self.max_path_depth)
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub address: String,
    /// Port
    pub port: u16,
    /// Data directory for the write-ahead log (None = in-memory only)
    pub data_path: Option<String>,
    /// Fsync the WAL after every write
    pub sync_wal: bool,
    pub limits: QueryLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
            data_path: Some("./socialgraph_data".to_string()),
            sync_wal: false,
            limits: QueryLimits::default(),
        }
    }
}

impl ServerConfig {
    /// Load from the YAML file named by `SOCIALGRAPH_CONFIG`, then apply env overrides
    pub fn from_env() -> Self {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_yaml_and_env(Path::new(&path))
    }

    pub fn from_yaml_and_env(path: &Path) -> Self {
        Self::load_yaml(path).with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a YAML document; absent keys keep their defaults
    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_yaml_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::debug!("No config file at {}, using env vars / defaults", path.display());
                Self::default()
            }
        }
    }

    /// Apply `SOCIALGRAPH_ADDRESS`, `SOCIALGRAPH_PORT`, `SOCIALGRAPH_DATA_PATH`
    /// and `SOCIALGRAPH_SYNC_WAL` as returned by `lookup`.
    ///
    /// An empty `SOCIALGRAPH_DATA_PATH` disables persistence. Unparseable
    /// numbers are ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(address) = lookup("SOCIALGRAPH_ADDRESS") {
            self.address = address;
        }
        if let Some(port) = lookup("SOCIALGRAPH_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid SOCIALGRAPH_PORT {:?}", port),
            }
        }
        if let Some(path) = lookup("SOCIALGRAPH_DATA_PATH") {
            self.data_path = if path.is_empty() { None } else { Some(path) };
        }
        if let Some(sync) = lookup("SOCIALGRAPH_SYNC_WAL") {
            self.sync_wal = matches!(sync.as_str(), "1" | "true" | "yes");
        }
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
