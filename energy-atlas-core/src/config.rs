//! Configuration system for Energy Atlas.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> explicit config file -> environment.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dataset::DatasetKind;
use crate::error::ConfigError;

/// Environment variable prefix (`ENERGY_ATLAS_SERVER__PORT=8000`).
pub const ENV_PREFIX: &str = "ENERGY_ATLAS_";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnergyConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// SQLite store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the SQLite database file.
    pub path: PathBuf,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("energy.db"),
            busy_timeout_ms: 5000,
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Remote CSV sources and transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub global_energy_substitution: String,
    pub share_renewables: String,
    pub per_capita_energy: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            global_energy_substitution: "https://ourworldindata.org/grapher/global-energy-substitution.csv?v=1&csvType=full&useColumnShortNames=false".to_string(),
            share_renewables: "https://ourworldindata.org/grapher/share-electricity-renewables.csv?v=1&csvType=full&useColumnShortNames=false".to_string(),
            per_capita_energy: "https://ourworldindata.org/grapher/per-capita-energy-stacked.csv?v=1&csvType=full&useColumnShortNames=false".to_string(),
            timeout_secs: 60,
            user_agent: format!("energy-atlas/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryConfig::default(),
        }
    }
}

impl SourcesConfig {
    pub fn url_for(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::GlobalEnergySubstitution => &self.global_energy_substitution,
            DatasetKind::ShareRenewables => &self.share_renewables,
            DatasetKind::PerCapitaEnergy => &self.per_capita_energy,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Bounded exponential backoff for source fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 disables retrying).
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
            backoff_multiplier: 2.0,
        }
    }
}

/// HTTP query API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl EnergyConfig {
    /// Reject settings that would only fail later, mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "database.path must not be empty".to_string(),
            });
        }
        for kind in DatasetKind::ALL {
            let raw = self.sources.url_for(kind);
            let parsed = url::Url::parse(raw).map_err(|e| ConfigError::Invalid {
                message: format!("sources.{kind}: invalid URL '{raw}': {e}"),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid {
                    message: format!("sources.{kind}: unsupported scheme '{}'", parsed.scheme()),
                });
            }
        }
        if self.sources.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "sources.timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.sources.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                message: "sources.retry.backoff_multiplier must be at least 1.0".to_string(),
            });
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid {
            message: format!("failed to serialize configuration: {e}"),
        })
    }
}

/// Workspace-level config file location (`<workspace>/.energy-atlas/config.toml`).
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".energy-atlas").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `ENERGY_ATLAS_`, `__` for nesting)
/// 2. Explicit config file (`--config`)
/// 3. Workspace-local config (`.energy-atlas/config.toml`)
/// 4. User config (`~/.config/energy-atlas/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<EnergyConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(EnergyConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("org", "energy-atlas", "energy-atlas") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: EnergyConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}
