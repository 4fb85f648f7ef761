//! Source formula block loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};

/// Loader for source formula blocks.
///
/// The text is returned as-is; comment stripping and section discovery are
/// the engine's job.
pub struct SourceLoader;

impl SourceLoader {
    pub fn load(path: &Path) -> LoadResult<String> {
        let content = read_file(path)?;
        if content.trim().is_empty() {
            return Err(anyhow::anyhow!("Source file {} is empty", path.display()));
        }
        Ok(content)
    }
}
