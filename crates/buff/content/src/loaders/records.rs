//! Buff record export and re-import.

use std::path::Path;

use buff_core::BuffRecord;

use crate::loaders::{LoadResult, read_file};

/// Writes produced records as pretty JSON.
pub struct RecordWriter;

impl RecordWriter {
    pub fn to_string(records: &[BuffRecord]) -> LoadResult<String> {
        serde_json::to_string_pretty(records)
            .map_err(|e| anyhow::anyhow!("Failed to serialize buff records: {}", e))
    }

    /// Writes `records` to `path`, creating parent directories as needed.
    pub fn write(path: &Path, records: &[BuffRecord]) -> LoadResult<()> {
        let content = Self::to_string(records)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create directory {}: {}", parent.display(), e)
            })?;
        }
        std::fs::write(path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write file {}: {}", path.display(), e))
    }
}

/// Reads records written by [`RecordWriter`], e.g. to run repairs over
/// previously generated output.
pub struct RecordLoader;

impl RecordLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<BuffRecord>> {
        let content = read_file(path)?;
        serde_json::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse buff records JSON at {}: {}", path.display(), e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buff_core::{BuffValue, KeyGrammar};

    #[test]
    fn numbers_and_formulas_serialize_untagged() {
        let grammar = KeyGrammar::standard();
        let mut record = BuffRecord::new("Amber");
        record.insert("atk", BuffValue::Number(40.0), &grammar).unwrap();
        record
            .insert("critRate", BuffValue::Formula("constellation * 10".into()), &grammar)
            .unwrap();

        let json = RecordWriter::to_string(&[record]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["title"], "Amber");
        assert_eq!(parsed[0]["data"]["atk"], 40.0);
        assert_eq!(parsed[0]["data"]["critRate"], "constellation * 10");
    }
}
