//! Fixtures shared by storage and persistence tests.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DIR: AtomicU64 = AtomicU64::new(0);

/// Settings directory under the system temp dir, removed on drop.
#[derive(Debug)]
pub struct TestTempDir {
    root: PathBuf,
}

impl TestTempDir {
    pub fn new(label: &str) -> Self {
        let root = std::env::temp_dir().join(format!(
            "stylestack-{label}-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&root).expect("create fixture dir");
        Self { root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn child(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Drop a raw record file into the directory, as a file driver would name it.
    pub fn write_text(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.child(file_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture parent");
        }
        std::fs::write(&path, content).expect("write fixture file");
        path
    }

    /// File names currently in the directory, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.root)
            .expect("read fixture dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// A stored record with general `fields` and the given schema stamp.
pub fn record_fixture(schema_version: &str, fields: Value) -> String {
    let mut record = match fields {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    record.insert("schemaVersion".into(), json!(schema_version));
    record.insert("savedAtEpochMs".into(), json!(0));
    Value::Object(record).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_dir_lists_written_records() {
        let dir = TestTempDir::new("fixture");
        dir.write_text("stylestack_grid.json", "{}");
        dir.write_text("stylestack_line.json", "{}");
        assert_eq!(
            dir.file_names(),
            vec!["stylestack_grid.json", "stylestack_line.json"]
        );
    }

    #[test]
    fn fixture_dir_is_removed_on_drop() {
        let path = {
            let dir = TestTempDir::new("drop");
            dir.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn record_fixture_stamps_schema_version() {
        let raw = record_fixture("7", json!({ "spacing": 5 }));
        let value: Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["schemaVersion"], "7");
        assert_eq!(value["spacing"], 5);
    }
}
