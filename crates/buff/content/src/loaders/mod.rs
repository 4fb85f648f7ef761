//! Content loaders for reading engine inputs from files.
//!
//! Configuration is TOML, parameter tables are JSON or RON (chosen by file
//! extension), source blocks are plain text and produced records are JSON.

pub mod config;
pub mod factory;
pub mod params;
pub mod records;
pub mod source;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use params::ParameterLoader;
pub use records::{RecordLoader, RecordWriter};
pub use source::SourceLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
