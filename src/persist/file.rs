//! Filesystem driver: one JSON document per key inside a directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::driver::StorageDriver;
use crate::error::StorageError;

/// Canonical file extension for stored records.
const RECORD_FILE_EXT: &str = "json";

#[derive(Debug, Clone)]
pub struct FileDriver {
    dir: PathBuf,
}

impl FileDriver {
    /// Open (and create if needed) a record directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            StorageError::Unavailable(format!(
                "failed to create settings directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{RECORD_FILE_EXT}", file_stem(key)))
    }
}

/// Percent-encode every byte outside `[A-Za-z0-9-_.]`, so distinct keys
/// always map to distinct file names (`stylestack/line` -> `stylestack%2Fline`).
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    stem
}

#[async_trait]
impl StorageDriver for FileDriver {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        // Write to a sibling temporary file first so a partial write never
        // replaces the last good record.
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, value).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::TestTempDir;

    #[tokio::test]
    async fn stores_one_file_per_key() {
        let tmp = TestTempDir::new("file-driver");
        let driver = FileDriver::open(tmp.child("settings")).expect("open");

        assert_eq!(driver.get("stylestack/line").await.expect("get"), None);
        driver.set("stylestack/line", "{}").await.expect("set");
        assert!(driver.dir().join("stylestack%2Fline.json").exists());
        assert_eq!(
            driver.get("stylestack/line").await.expect("get"),
            Some("{}".to_string())
        );

        driver.remove("stylestack/line").await.expect("remove");
        driver.remove("stylestack/line").await.expect("remove missing");
        assert_eq!(driver.get("stylestack/line").await.expect("get"), None);
    }

    #[tokio::test]
    async fn gateway_reads_records_from_the_directory() {
        use crate::persist::{PersistenceGateway, SCHEMA_VERSION};
        use crate::settings::GridSettings;
        use crate::testsupport::record_fixture;

        let tmp = TestTempDir::new("file-driver-gateway");
        tmp.write_text(
            "stylestack%2Fgrid.json",
            &record_fixture(SCHEMA_VERSION, serde_json::json!({ "spacing": 25 })),
        );
        let driver = FileDriver::open(tmp.path()).expect("open");
        let gateway = PersistenceGateway::new(std::sync::Arc::new(driver));
        let (store, _) = gateway.load_all().await;
        assert_eq!(store.layers::<GridSettings>().general().spacing, 25.0);
    }

    #[test]
    fn file_names_never_collide() {
        assert_eq!(file_stem("stylestack/line"), "stylestack%2Fline");
        assert_eq!(file_stem("stylestack_line"), "stylestack_line");
        assert_eq!(file_stem("a%2Fb"), "a%252Fb");
        assert_ne!(file_stem("a/b"), file_stem("a%2Fb"));
        assert_eq!(file_stem("é"), "%C3%A9");
    }

    #[tokio::test]
    async fn similar_keys_keep_separate_records() {
        let tmp = TestTempDir::new("file-driver-keys");
        let driver = FileDriver::open(tmp.path()).expect("open");
        driver.set("stylestack/line", "slash").await.expect("set");
        driver.set("stylestack_line", "underscore").await.expect("set");
        assert_eq!(
            driver.get("stylestack/line").await.expect("get").as_deref(),
            Some("slash")
        );
        assert_eq!(
            driver.get("stylestack_line").await.expect("get").as_deref(),
            Some("underscore")
        );
    }

    #[tokio::test]
    async fn leaves_no_temp_files_behind() {
        let tmp = TestTempDir::new("file-driver-tmp");
        let driver = FileDriver::open(tmp.path()).expect("open");
        driver.set("k", "v1").await.expect("set");
        driver.set("k", "v2").await.expect("set");
        assert_eq!(tmp.file_names(), vec!["k.json".to_string()]);
    }
}
