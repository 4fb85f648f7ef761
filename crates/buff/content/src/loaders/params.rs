//! Parameter table loader.

use std::path::Path;

use buff_core::ParameterTable;

use crate::loaders::{LoadResult, read_file};

/// File extensions a parameter table may be stored under, in lookup order.
pub const PARAM_EXTENSIONS: [&str; 2] = ["json", "ron"];

/// Loader for per-character parameter tables.
///
/// The format follows the file extension: `.json` or `.ron`. Both describe
/// the same nested shape, e.g.
///
/// ```json
/// { "skill": { "hit1": [0.8, 0.86, 0.92] }, "passive": { "em": 0.04 } }
/// ```
pub struct ParameterLoader;

impl ParameterLoader {
    pub fn load(path: &Path) -> LoadResult<ParameterTable> {
        let content = read_file(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&content)
                .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display())),
            Some("ron") => Self::parse_ron(&content)
                .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display())),
            _ => Err(anyhow::anyhow!(
                "Unsupported parameter file {}: expected one of {:?}",
                path.display(),
                PARAM_EXTENSIONS
            )),
        }
    }

    pub fn parse_json(content: &str) -> LoadResult<ParameterTable> {
        serde_json::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse parameter JSON: {}", e))
    }

    pub fn parse_ron(content: &str) -> LoadResult<ParameterTable> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse parameter RON: {}", e))
    }
}
