//! Content factory for building translation units from a data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use buff_core::{BuffRecord, EngineConfig, ParameterTable, TranslationUnit};
use tracing::debug;

use crate::cache::ParameterCache;
use crate::loaders::params::PARAM_EXTENSIONS;
use crate::loaders::{
    ConfigLoader, LoadResult, ParameterLoader, RecordLoader, RecordWriter, SourceLoader,
};

/// Content factory that loads engine inputs from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml          (optional)
/// ├── params/
/// │   ├── amber.json
/// │   └── bennett.ron
/// ├── sources/
/// │   ├── amber.js
/// │   └── bennett.js
/// └── out/                 (written)
///     └── amber.json
/// ```
///
/// A unit id is a file stem shared by `sources/` and `params/`.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`.
    ///
    /// A missing file yields the default configuration.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(EngineConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Ids of every unit with a source file, sorted.
    pub fn unit_ids(&self) -> LoadResult<Vec<String>> {
        let dir = self.sources_dir();
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| anyhow::anyhow!("Failed to read directory {}: {}", dir.display(), e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| anyhow::anyhow!("Failed to read directory {}: {}", dir.display(), e))?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("js") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(stem.to_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Path of the parameter table for `id`, trying each supported extension.
    pub fn params_path(&self, id: &str) -> LoadResult<PathBuf> {
        let dir = self.data_dir.join("params");
        PARAM_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", id, ext)))
            .find(|path| path.exists())
            .ok_or_else(|| {
                anyhow::anyhow!("No parameter table for `{}` in {}", id, dir.display())
            })
    }

    /// Load the parameter table for `id` through `cache`.
    pub fn load_params(
        &self,
        cache: &mut ParameterCache,
        id: &str,
    ) -> LoadResult<Arc<ParameterTable>> {
        let path = self.params_path(id)?;
        cache.get_or_try_insert_with(&path, ParameterLoader::load)
    }

    /// Load the source block from `sources/{id}.js`.
    pub fn load_source(&self, id: &str) -> LoadResult<String> {
        SourceLoader::load(&self.sources_dir().join(format!("{}.js", id)))
    }

    /// Load source and parameters for `id` as one unit titled `id`.
    pub fn load_unit(&self, cache: &mut ParameterCache, id: &str) -> LoadResult<TranslationUnit> {
        let source = self.load_source(id)?;
        let params = self.load_params(cache, id)?;
        Ok(TranslationUnit::new(id, source, ParameterTable::clone(&params)))
    }

    /// Path records for `id` are written to.
    pub fn output_path(&self, id: &str) -> PathBuf {
        self.data_dir.join("out").join(format!("{}.json", id))
    }

    /// Write records for `id` to `out/{id}.json`.
    pub fn write_records(&self, id: &str, records: &[BuffRecord]) -> LoadResult<PathBuf> {
        let path = self.output_path(id);
        RecordWriter::write(&path, records)?;
        Ok(path)
    }

    /// Load records previously written for `id`.
    pub fn load_records(&self, id: &str) -> LoadResult<Vec<BuffRecord>> {
        RecordLoader::load(&self.output_path(id))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn sources_dir(&self) -> PathBuf {
        self.data_dir.join("sources")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
        assert_eq!(factory.output_path("amber"), Path::new("/tmp/data/out/amber.json"));
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_config().unwrap(), EngineConfig::default());
    }

    #[test]
    fn missing_inputs_name_the_unit() {
        let dir = tempfile::TempDir::new().unwrap();
        let factory = ContentFactory::new(dir.path());
        let err = factory.params_path("ghost").unwrap_err();
        assert!(err.to_string().contains("ghost"), "{err}");
        assert!(factory.unit_ids().is_err());
    }
}
