//! Store configuration and gateway factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use shinsa_core::service::ServiceConfig;
use shinsa_core::traits::DataGateway;

use crate::json::JsonFileGateway;
use crate::memory::MemoryGateway;

/// Where the roster is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Json {
        #[serde(default = "default_data_path")]
        path: PathBuf,
    },
    /// Nothing is persisted; useful for dry runs.
    Memory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Json {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("shinsa-data.json")
}

/// Top-level shinsa configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShinsaConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Max concurrent store requests in batch operations.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

fn default_parallelism() -> usize {
    4
}

impl Default for ShinsaConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            parallelism: default_parallelism(),
        }
    }
}

impl ShinsaConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            parallelism: self.parallelism.max(1),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Json { path } => StoreConfig::Json {
            path: PathBuf::from(resolve_env_vars(&path.to_string_lossy())),
        },
        StoreConfig::Memory => StoreConfig::Memory,
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `shinsa.toml` in the current directory
/// 2. `~/.config/shinsa/config.toml`
///
/// `SHINSA_DATA` overrides the store with a JSON file at that path.
pub fn load_config_from(path: Option<&Path>) -> Result<ShinsaConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("shinsa.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ShinsaConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ShinsaConfig::default(),
    };

    if let Ok(data) = std::env::var("SHINSA_DATA") {
        if !data.trim().is_empty() {
            config.store = StoreConfig::Json {
                path: PathBuf::from(data),
            };
        }
    }

    config.store = resolve_store_config(&config.store);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("shinsa"))
}

/// Create a gateway from its configuration.
pub fn create_gateway(config: &StoreConfig) -> Arc<dyn DataGateway> {
    match config {
        StoreConfig::Json { path } => {
            tracing::debug!("using JSON store at {}", path.display());
            Arc::new(JsonFileGateway::new(path.clone()))
        }
        StoreConfig::Memory => Arc::new(MemoryGateway::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_SHINSA_TEST_VAR", "dojo");
        assert_eq!(resolve_env_vars("${_SHINSA_TEST_VAR}"), "dojo");
        assert_eq!(
            resolve_env_vars("/srv/${_SHINSA_TEST_VAR}/roster.json"),
            "/srv/dojo/roster.json"
        );
        assert_eq!(resolve_env_vars("no vars ${unclosed"), "no vars ${unclosed");
        std::env::remove_var("_SHINSA_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = ShinsaConfig::default();
        assert_eq!(config.parallelism, 4);
        assert_eq!(
            config.store,
            StoreConfig::Json {
                path: PathBuf::from("shinsa-data.json")
            }
        );
    }

    #[test]
    fn parse_store_config() {
        let config: ShinsaConfig = toml::from_str(
            r#"
parallelism = 8

[store]
type = "json"
path = "/var/lib/shinsa/roster.json"
"#,
        )
        .unwrap();
        assert_eq!(config.parallelism, 8);
        assert!(matches!(config.store, StoreConfig::Json { .. }));

        let memory: ShinsaConfig = toml::from_str("[store]\ntype = \"memory\"\n").unwrap();
        assert_eq!(memory.store, StoreConfig::Memory);
        assert_eq!(memory.parallelism, 4);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/shinsa.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn loads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shinsa.toml");
        std::fs::write(&path, "parallelism = 2\n[store]\ntype = \"memory\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.parallelism, 2);
        assert_eq!(config.service_config().parallelism, 2);
    }

    #[test]
    fn gateway_factory_picks_backend() {
        assert_eq!(create_gateway(&StoreConfig::Memory).name(), "memory");
        let json = StoreConfig::Json {
            path: PathBuf::from("roster.json"),
        };
        assert_eq!(create_gateway(&json).name(), "json");
    }
}
