//! Mapping registry
//!
//! Resolves a platform identifier to its [`PlatformConfig`]: where the raw
//! posts live and how their fields map onto the common post schema.
//!
//! Two independent checks guard every lookup:
//! - the hardcoded allow-list ([`SUPPORTED_PLATFORMS`])
//! - the registry document contents
//!
//! A platform can pass the first and fail the second, which is reported as
//! [`Error::PlatformConfigMissing`] rather than [`Error::UnsupportedPlatform`].

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

mod cache;

pub use cache::CachedRegistry;

/// Platforms the service accepts, independent of the registry document
pub const SUPPORTED_PLATFORMS: [&str; 3] = ["Telegram", "Twitter", "Tiktok"];

/// Check allow-list membership (case-sensitive)
pub fn is_supported(platform: &str) -> bool {
    SUPPORTED_PLATFORMS.contains(&platform)
}

/// Fail with [`Error::UnsupportedPlatform`] unless the platform is allow-listed
pub fn validate_platform(platform: &str) -> Result<()> {
    if is_supported(platform) {
        Ok(())
    } else {
        Err(Error::UnsupportedPlatform(platform.to_string()))
    }
}

/// Common key → source key correspondence for one platform
///
/// Declaration order is kept so normalized records list their fields the way
/// the registry document does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(IndexMap<String, String>);

impl FieldMapping {
    /// Source key for a common key
    pub fn get(&self, common_key: &str) -> Option<&str> {
        self.0.get(common_key).map(String::as_str)
    }

    /// (common key, source key) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FieldMapping
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Registry entry for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Raw data location (`file_path` in the registry document)
    #[serde(rename = "file_path", alias = "source_location")]
    pub source_location: PathBuf,

    pub mapping: FieldMapping,
}

impl PlatformConfig {
    pub fn new(source_location: impl Into<PathBuf>, mapping: FieldMapping) -> Self {
        Self {
            source_location: source_location.into(),
            mapping,
        }
    }

    fn check_well_formed(&self, platform: &str) -> std::result::Result<(), String> {
        if self.source_location.as_os_str().is_empty() {
            return Err(format!("platform {} has an empty file_path", platform));
        }
        if self.mapping.is_empty() {
            return Err(format!("platform {} has an empty mapping", platform));
        }
        Ok(())
    }
}

/// Parsed registry document: platform name → [`PlatformConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    platforms: IndexMap<String, PlatformConfig>,
}

impl Registry {
    /// Parse a registry document
    ///
    /// `origin` only labels errors. Relative source locations are joined onto
    /// `base_dir` when one is given and left as-is (working-directory
    /// relative) otherwise.
    pub fn from_json_str(content: &str, origin: &Path, base_dir: Option<&Path>) -> Result<Self> {
        let mut platforms: IndexMap<String, PlatformConfig> = serde_json::from_str(content)
            .map_err(|e| Error::ConfigMalformed {
                path: origin.to_path_buf(),
                reason: e.to_string(),
            })?;

        for (name, config) in platforms.iter_mut() {
            config
                .check_well_formed(name)
                .map_err(|reason| Error::ConfigMalformed {
                    path: origin.to_path_buf(),
                    reason,
                })?;

            if let Some(base) = base_dir {
                if config.source_location.is_relative() {
                    config.source_location = base.join(&config.source_location);
                }
            }

            if !is_supported(name) {
                warn!(
                    platform = %name,
                    "Registry lists a platform outside the allow-list; lookups will be rejected"
                );
            }
        }

        Ok(Self { platforms })
    }

    /// Build a registry from already-validated entries
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, PlatformConfig)>,
    {
        Self {
            platforms: entries.into_iter().collect(),
        }
    }

    /// Look up a platform's configuration
    ///
    /// The allow-list is checked first, so a registry entry for an
    /// unlisted platform still yields [`Error::UnsupportedPlatform`].
    pub fn resolve(&self, platform: &str) -> Result<&PlatformConfig> {
        validate_platform(platform)?;
        self.platforms
            .get(platform)
            .ok_or_else(|| Error::PlatformConfigMissing(platform.to_string()))
    }

    /// Platform names in document order
    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.platforms.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

/// Read and parse the full registry document
pub fn load_all_configs(path: &Path, base_dir: Option<&Path>) -> Result<Registry> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let registry = Registry::from_json_str(&content, path, base_dir)?;
    debug!(
        path = %path.display(),
        platforms = registry.len(),
        "Loaded platform mappings"
    );
    Ok(registry)
}

/// Where the pipeline gets its registry from
pub trait RegistrySource: Send + Sync {
    /// Current registry snapshot
    fn load(&self) -> Result<Arc<Registry>>;
}

/// Re-reads the registry document on every call
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
    base_dir: Option<PathBuf>,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base_dir: None,
        }
    }

    /// Resolve relative source locations against `base_dir`
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }
}

impl RegistrySource for FileRegistry {
    fn load(&self) -> Result<Arc<Registry>> {
        load_all_configs(&self.path, self.base_dir.as_deref()).map(Arc::new)
    }
}

/// Fixed in-memory registry
impl RegistrySource for Registry {
    fn load(&self) -> Result<Arc<Registry>> {
        Ok(Arc::new(self.clone()))
    }
}
