//! Post normalization pipeline
//!
//! Composes the registry and the normalizer: allow-list check, config
//! lookup, raw load, normalize. Failures come back with their kind intact.

use crate::normalizer::{load_raw_records, normalize, NormalizedRecord};
use crate::registry::{validate_platform, Registry, RegistrySource};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Normalization pipeline over a registry source
#[derive(Clone)]
pub struct PostService {
    registry: Arc<dyn RegistrySource>,
}

impl PostService {
    pub fn new(registry: Arc<dyn RegistrySource>) -> Self {
        Self { registry }
    }

    /// Normalized posts for one platform
    pub fn normalize_platform(&self, platform: &str) -> Result<Vec<NormalizedRecord>> {
        validate_platform(platform)?;
        let registry = self.registry.load()?;
        normalize_from(&registry, platform)
    }

    /// Normalized posts for every platform in the registry, concatenated
    ///
    /// All-or-nothing: the first failing platform aborts the call.
    pub fn normalize_all(&self) -> Result<Vec<NormalizedRecord>> {
        let registry = self.registry.load()?;
        if registry.is_empty() {
            warn!("Registry lists no platforms");
        }

        let mut posts = Vec::new();
        for platform in registry.platforms() {
            info!(platform = %platform, "Processing data for platform");
            posts.extend(normalize_from(&registry, platform)?);
        }

        info!(posts = posts.len(), "Normalized posts for all platforms");
        Ok(posts)
    }
}

fn normalize_from(registry: &Registry, platform: &str) -> Result<Vec<NormalizedRecord>> {
    let config = registry.resolve(platform).inspect_err(|e| {
        error!(platform = %platform, error = %e, "Platform lookup failed");
    })?;
    debug!(
        platform = %platform,
        source = %config.source_location.display(),
        fields = config.mapping.len(),
        "Resolved platform configuration"
    );

    let raw = load_raw_records(&config.source_location)?;
    Ok(normalize(&raw, &config.mapping))
}
