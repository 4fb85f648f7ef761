//! Engine configuration loader.

use std::path::Path;

use buff_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate an `EngineConfig` from a TOML file.
    ///
    /// Fields missing from the file keep their defaults, so a file holding
    /// only `max_depth = 12` is a complete configuration.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))
    }

    /// Parse and validate configuration text.
    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}
