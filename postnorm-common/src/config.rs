//! Service configuration loading and resolution
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The binaries parse 1 and 2 together with clap and hand the result in as
//! [`ConfigOverrides`].

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Configuration file errors
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
        source: toml::de::Error,
    },
}

/// `[server]` table
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// `[registry]` table
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry document path
    pub path: Option<PathBuf>,
    /// Directory that relative `file_path` entries are resolved against
    pub base_dir: Option<PathBuf>,
    /// Enable the read-through registry cache
    pub cache: Option<bool>,
}

/// `[logging]` table
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

impl TomlConfig {
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }
}

/// Values used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub host: String,
    pub port: u16,
    pub registry_path: PathBuf,
    pub cache_registry: bool,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            registry_path: PathBuf::from("./data/platform_mappings.json"),
            cache_registry: false,
            log_level: "info".to_string(),
        }
    }
}

/// Settings already resolved from command line and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub registry_path: Option<PathBuf>,
    pub base_dir: Option<PathBuf>,
    pub cache_registry: Option<bool>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub registry_path: PathBuf,
    pub base_dir: Option<PathBuf>,
    pub cache_registry: bool,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge overrides, file settings and compiled defaults
    pub fn resolve(overrides: &ConfigOverrides, file: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::default();

        Self {
            host: overrides
                .host
                .clone()
                .or_else(|| file.server.host.clone())
                .unwrap_or(defaults.host),
            port: overrides.port.or(file.server.port).unwrap_or(defaults.port),
            registry_path: overrides
                .registry_path
                .clone()
                .or_else(|| file.registry.path.clone())
                .unwrap_or(defaults.registry_path),
            base_dir: overrides
                .base_dir
                .clone()
                .or_else(|| file.registry.base_dir.clone()),
            cache_registry: overrides
                .cache_registry
                .or(file.registry.cache)
                .unwrap_or(defaults.cache_registry),
            log_level: overrides
                .log_level
                .clone()
                .or_else(|| file.logging.level.clone())
                .unwrap_or(defaults.log_level),
        }
    }

    /// `host:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load the TOML config file
///
/// An explicit path must exist. Without one, the platform config locations
/// are tried and a missing file yields the empty config.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match find_config_file() {
            Some(path) => path,
            None => {
                debug!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    debug!("Loaded config file: {}", path.display());
    TomlConfig::from_toml_str(&content, &path)
}

/// First existing config file for this platform
fn find_config_file() -> Option<PathBuf> {
    // ~/.config/postnorm/config.toml, then /etc/postnorm/config.toml on Unix
    let user_config = dirs::config_dir().map(|d| d.join("postnorm").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/postnorm/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_configured() {
        let config = ServiceConfig::resolve(&ConfigOverrides::default(), &TomlConfig::default());

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.registry_path, PathBuf::from("./data/platform_mappings.json"));
        assert_eq!(config.base_dir, None);
        assert!(!config.cache_registry);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = TomlConfig::from_toml_str(
            r#"
            [server]
            port = 8080

            [registry]
            path = "/srv/postnorm/mappings.json"
            cache = true
            "#,
            Path::new("config.toml"),
        )
        .unwrap();

        let config = ServiceConfig::resolve(&ConfigOverrides::default(), &file);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.registry_path, PathBuf::from("/srv/postnorm/mappings.json"));
        assert!(config.cache_registry);
    }

    #[test]
    fn test_overrides_beat_file() {
        let file = TomlConfig::from_toml_str(
            "[server]\nhost = \"10.0.0.1\"\nport = 8080\n[logging]\nlevel = \"warn\"\n",
            Path::new("config.toml"),
        )
        .unwrap();
        let overrides = ConfigOverrides {
            port: Some(9000),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        let config = ServiceConfig::resolve(&overrides, &file);
        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_unknown_table_is_tolerated() {
        let file = TomlConfig::from_toml_str("[metrics]\nenabled = true\n", Path::new("c.toml"));
        assert_eq!(file.unwrap(), TomlConfig::default());
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = TomlConfig::from_toml_str("[server\nport = ", Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_explicit_missing_file_is_read_error() {
        let err = load_toml_config(Some(Path::new("/nonexistent/postnorm.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
