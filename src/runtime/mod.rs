//! Single-writer settings runtime.
//!
//! One actor task owns the [`SettingsStore`] and applies every
//! [`SettingsCommand`] in order. After each change it publishes a fresh
//! snapshot, updates derived caches, schedules a debounced save and, when a
//! [`SyncBus`] is attached, broadcasts the changed category to other
//! instances. Reads never wait for the actor: [`RuntimeHandle::get_effective`]
//! resolves against the latest published snapshot.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{ConfigurationError, RuntimeError};
use crate::mode::ViewerMode;
use crate::persist::{
    CategoryLoad, KeyMigration, PersistenceGateway, SaveStatus, DEFAULT_DEBOUNCE,
};
use crate::settings::{Category, EffectiveSettings, SettingsRecord};
use crate::store::templates::TemplateRegistry;
use crate::store::{MutationOutcome, SettingsCommand, SettingsStore};
use crate::sync::{DerivedCache, InstanceId, Subscription, SyncBroadcaster, SyncBus, WatchCache};

mod actor;

use actor::SettingsActor;

pub(crate) enum RuntimeRequest {
    Dispatch {
        command: SettingsCommand,
        reply: oneshot::Sender<MutationOutcome>,
    },
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Bootstrap inputs for the runtime actor.
pub struct RuntimeSpawnConfig {
    /// Initial state, usually from [`PersistenceGateway::load_all`].
    pub store: SettingsStore,
    /// Storage for debounced saves. `None` keeps everything in memory.
    pub persistence: Option<PersistenceGateway>,
    pub debounce: Duration,
    /// Cross-instance channel. `None` runs standalone.
    pub bus: Option<SyncBus>,
    pub templates: TemplateRegistry,
}

impl Default for RuntimeSpawnConfig {
    fn default() -> Self {
        Self {
            store: SettingsStore::new(),
            persistence: None,
            debounce: DEFAULT_DEBOUNCE,
            bus: None,
            templates: TemplateRegistry::builtin(),
        }
    }
}

/// What [`open_runtime`] found in storage.
#[derive(Debug, Clone, Default)]
pub struct StartupReport {
    pub migrations: Vec<KeyMigration>,
    pub loads: Vec<CategoryLoad>,
}

/// Handle for sending commands to and reading from a spawned runtime.
#[derive(Clone)]
pub struct RuntimeHandle {
    requests: mpsc::Sender<RuntimeRequest>,
    snapshot: watch::Receiver<Arc<SettingsStore>>,
    broadcaster: SyncBroadcaster,
    save_status: Option<watch::Receiver<SaveStatus>>,
    templates: Arc<TemplateRegistry>,
    instance: InstanceId,
}

impl RuntimeHandle {
    /// Apply one command and wait for its outcome.
    pub async fn dispatch(&self, command: SettingsCommand) -> Result<MutationOutcome, RuntimeError> {
        let (reply, outcome) = oneshot::channel();
        self.requests
            .send(RuntimeRequest::Dispatch { command, reply })
            .await
            .map_err(|_| RuntimeError::Closed)?;
        outcome.await.map_err(|_| RuntimeError::Closed)
    }

    /// Apply the registered template `name` to `category`.
    pub async fn apply_template(
        &self,
        category: Category,
        name: &str,
    ) -> Result<MutationOutcome, RuntimeError> {
        let command = self.templates.apply_command(category, name)?;
        self.dispatch(command).await
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Latest published store.
    pub fn snapshot(&self) -> Arc<SettingsStore> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// Receiver that changes whenever a new snapshot is published.
    pub fn changes(&self) -> watch::Receiver<Arc<SettingsStore>> {
        self.snapshot.clone()
    }

    pub fn get_effective(&self, category: Category, mode: ViewerMode) -> EffectiveSettings {
        self.snapshot().get_effective(category, mode)
    }

    pub fn get_effective_named(
        &self,
        category: &str,
        mode: &str,
    ) -> Result<EffectiveSettings, ConfigurationError> {
        self.snapshot().get_effective_named(category, mode)
    }

    pub fn effective<T: SettingsRecord>(&self, mode: ViewerMode) -> Arc<T> {
        self.snapshot().effective::<T>(mode)
    }

    /// Call `callback` with the current value now and after every change.
    pub fn subscribe(
        &self,
        category: Category,
        mode: ViewerMode,
        callback: impl Fn(&EffectiveSettings) + Send + Sync + 'static,
    ) -> Subscription {
        self.register_cache(
            category,
            mode,
            Arc::new(crate::sync::CallbackCache::new(callback)),
        )
    }

    /// Keep `cache` equal to the effective value of `(category, mode)`.
    pub fn register_cache(
        &self,
        category: Category,
        mode: ViewerMode,
        cache: Arc<dyn DerivedCache>,
    ) -> Subscription {
        self.broadcaster
            .register_latest(&self.snapshot, category, mode, cache)
    }

    /// A new watch-backed cache for `(category, mode)`.
    pub fn watch_cache(&self, category: Category, mode: ViewerMode) -> (Arc<WatchCache>, Subscription) {
        let cache = Arc::new(WatchCache::new());
        let subscription = self.register_cache(category, mode, cache.clone());
        (cache, subscription)
    }

    /// Saver status, or `None` when the runtime has no persistence.
    pub fn save_status(&self) -> Option<watch::Receiver<SaveStatus>> {
        self.save_status.clone()
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance
    }

    /// Write any pending changes now.
    pub async fn flush(&self) -> Result<(), RuntimeError> {
        let (done, wait) = oneshot::channel();
        self.requests
            .send(RuntimeRequest::Flush(done))
            .await
            .map_err(|_| RuntimeError::Closed)?;
        wait.await.map_err(|_| RuntimeError::Closed)
    }

    /// Flush pending saves and stop the actor. Later commands fail with
    /// [`RuntimeError::Closed`].
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (done, wait) = oneshot::channel();
        self.requests
            .send(RuntimeRequest::Shutdown(done))
            .await
            .map_err(|_| RuntimeError::Closed)?;
        wait.await.map_err(|_| RuntimeError::Closed)
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("instance", &self.instance)
            .field("persistent", &self.save_status.is_some())
            .finish_non_exhaustive()
    }
}

/// Spawn a runtime actor over an already loaded store.
pub fn spawn_runtime(config: RuntimeSpawnConfig) -> RuntimeHandle {
    let instance = InstanceId::random();
    let (requests, request_rx) = mpsc::channel::<RuntimeRequest>(64);
    let store = Arc::new(config.store);
    let (snapshot_tx, snapshot) = watch::channel(Arc::clone(&store));
    let broadcaster = SyncBroadcaster::new();
    let saver = config
        .persistence
        .as_ref()
        .map(|gateway| gateway.spawn_saver(config.debounce));
    let save_status = saver.as_ref().map(|saver| saver.status());

    let actor = SettingsActor {
        store,
        snapshot_tx,
        broadcaster: broadcaster.clone(),
        saver,
        remote: config.bus.as_ref().map(SyncBus::subscribe),
        bus: config.bus,
        instance,
    };
    tokio::spawn(actor.run(request_rx));
    tracing::debug!(instance = %instance, "settings runtime started");

    RuntimeHandle {
        requests,
        snapshot,
        broadcaster,
        save_status,
        templates: Arc::new(config.templates),
        instance,
    }
}

/// Migrate legacy records, load every category from `gateway`, and spawn a
/// runtime that saves back to it.
pub async fn open_runtime(
    gateway: PersistenceGateway,
    debounce: Duration,
    bus: Option<SyncBus>,
) -> (RuntimeHandle, StartupReport) {
    let migrations = gateway.migrate_legacy().await;
    let (store, loads) = gateway.load_all().await;
    let handle = spawn_runtime(RuntimeSpawnConfig {
        store,
        persistence: Some(gateway),
        debounce,
        bus,
        ..Default::default()
    });
    (handle, StartupReport { migrations, loads })
}
