//! Settings survive a restart, and legacy records are adopted on startup.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stylestack::mode::ViewerMode;
use stylestack::persist::{
    FileDriver, LoadStatus, MemoryDriver, MigrationOutcome, PersistenceGateway, StorageDriver,
};
use stylestack::runtime::open_runtime;
use stylestack::settings::{
    Category, CategoryPatch, Color, GridSettings, LinePartial, LineSettings,
};
use stylestack::store::SettingsCommand;

static COUNTER: AtomicU64 = AtomicU64::new(0);

struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "stylestack-it-{label}-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&path).expect("create scratch dir");
        Self(path)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn file_gateway(dir: &Path) -> PersistenceGateway {
    PersistenceGateway::new(Arc::new(FileDriver::open(dir).expect("open driver")))
}

#[tokio::test]
async fn file_backed_settings_survive_a_restart() {
    let dir = ScratchDir::new("restart");

    let (first, report) = open_runtime(file_gateway(dir.path()), Duration::from_secs(30), None).await;
    assert!(report
        .loads
        .iter()
        .all(|load| load.status == LoadStatus::Defaults));
    first
        .dispatch(SettingsCommand::SetOverrideEnabled {
            category: Category::Line,
            mode: ViewerMode::Selection,
            enabled: true,
        })
        .await
        .expect("dispatch");
    first
        .dispatch(SettingsCommand::UpdateOverride {
            mode: ViewerMode::Selection,
            patch: CategoryPatch::Line(LinePartial {
                color: Some(Color::from("#123")),
                ..Default::default()
            }),
        })
        .await
        .expect("dispatch");
    first
        .apply_template(Category::Grid, "blueprint")
        .await
        .expect("template");
    let selection = first.effective::<LineSettings>(ViewerMode::Selection);
    let grid = first.effective::<GridSettings>(ViewerMode::Normal);
    first.shutdown().await.expect("shutdown");

    let (second, report) =
        open_runtime(file_gateway(dir.path()), Duration::from_secs(30), None).await;
    let status = |category: Category| {
        report
            .loads
            .iter()
            .find(|load| load.category == category)
            .map(|load| load.status.clone())
    };
    assert_eq!(status(Category::Line), Some(LoadStatus::Loaded));
    assert_eq!(status(Category::Grid), Some(LoadStatus::Loaded));
    assert_eq!(status(Category::Cursor), Some(LoadStatus::Defaults));

    let restored = second.effective::<LineSettings>(ViewerMode::Selection);
    assert_eq!(restored, selection);
    assert_eq!(restored.color, Color::from("#112233"));
    assert_eq!(second.effective::<GridSettings>(ViewerMode::Normal), grid);
    assert_eq!(
        second.snapshot().state(Category::Grid).active_template(),
        Some("blueprint")
    );
    second.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn corrupt_records_fall_back_to_defaults() {
    let dir = ScratchDir::new("corrupt");
    std::fs::write(dir.path().join("stylestack%2Ftext.json"), "{ not json").expect("seed");

    let (handle, report) = open_runtime(file_gateway(dir.path()), Duration::from_secs(30), None).await;
    let text = report
        .loads
        .iter()
        .find(|load| load.category == Category::Text)
        .expect("text load");
    assert!(matches!(text.status, LoadStatus::Corrupt(_)));
    assert_eq!(handle.snapshot().revision(Category::Text), 0);
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn legacy_records_are_adopted_on_startup() {
    let driver = MemoryDriver::new();
    driver
        .set("dxf-viewer-line-settings", r##"{"lineWidth": 6, "color": "#0000ff"}"##)
        .await
        .expect("seed");

    let gateway = PersistenceGateway::new(Arc::new(driver.clone()));
    let (handle, report) = open_runtime(gateway, Duration::from_secs(30), None).await;

    let migrated = report
        .migrations
        .iter()
        .find(|entry| entry.legacy_key == "dxf-viewer-line-settings")
        .expect("migration entry");
    assert_eq!(migrated.outcome, MigrationOutcome::Migrated);

    let line = handle.effective::<LineSettings>(ViewerMode::Normal);
    assert_eq!(line.line_width, 6.0);
    assert_eq!(line.color, Color::from("#0000FF"));

    let stored = driver.snapshot().await;
    assert!(stored.contains_key("stylestack/line"));
    assert!(!stored.contains_key("dxf-viewer-line-settings"));
    handle.shutdown().await.expect("shutdown");
}
