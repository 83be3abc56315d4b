//! Registry of derived caches and the change propagation step.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::watch;

use super::cache::{CallbackCache, DerivedCache};
use crate::mode::ViewerMode;
use crate::settings::{Category, EffectiveSettings};
use crate::store::SettingsStore;

struct Entry {
    id: u64,
    category: Category,
    mode: ViewerMode,
    cache: Arc<dyn DerivedCache>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Keeps registered caches equal to the store's effective values.
///
/// Registration and propagation are serialized by one lock and caches are
/// written while it is held. A cache's `set` must therefore not register or
/// drop subscriptions on the same broadcaster.
#[derive(Clone, Default)]
pub struct SyncBroadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl SyncBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `cache` for `(category, mode)` and prime it from `store`.
    pub fn register(
        &self,
        store: &SettingsStore,
        category: Category,
        mode: ViewerMode,
        cache: Arc<dyn DerivedCache>,
    ) -> Subscription {
        self.register_with(category, mode, cache, || store.get_effective(category, mode))
    }

    /// Register `cache` and prime it from the newest published snapshot.
    ///
    /// The snapshot is read under the registry lock. A writer that publishes
    /// before propagating therefore either propagates after the prime (and
    /// overwrites it) or has already published what the prime reads.
    pub fn register_latest(
        &self,
        latest: &watch::Receiver<Arc<SettingsStore>>,
        category: Category,
        mode: ViewerMode,
        cache: Arc<dyn DerivedCache>,
    ) -> Subscription {
        self.register_with(category, mode, cache, || {
            let store = Arc::clone(&latest.borrow());
            store.get_effective(category, mode)
        })
    }

    fn register_with(
        &self,
        category: Category,
        mode: ViewerMode,
        cache: Arc<dyn DerivedCache>,
        resolve: impl FnOnce() -> EffectiveSettings,
    ) -> Subscription {
        let mut registry = self.lock();
        write_if_changed(cache.as_ref(), resolve());
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            category,
            mode,
            cache,
        });
        tracing::debug!(category = %category, mode = %mode, id, "derived cache registered");
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Register a callback that fires with the current value and on every
    /// later change.
    pub fn subscribe(
        &self,
        store: &SettingsStore,
        category: Category,
        mode: ViewerMode,
        callback: impl Fn(&EffectiveSettings) + Send + Sync + 'static,
    ) -> Subscription {
        self.register(store, category, mode, Arc::new(CallbackCache::new(callback)))
    }

    /// Recompute every cache registered for `category` and write the ones
    /// whose value changed. Returns how many were written.
    pub fn propagate(&self, store: &SettingsStore, category: Category) -> usize {
        let registry = self.lock();
        let mut written = 0;
        for entry in registry.entries.iter().filter(|e| e.category == category) {
            if write_if_changed(entry.cache.as_ref(), store.get_effective(category, entry.mode)) {
                written += 1;
            }
        }
        if written > 0 {
            tracing::debug!(category = %category, written, "derived caches updated");
        }
        written
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        lock_registry(&self.registry)
    }
}

impl std::fmt::Debug for SyncBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBroadcaster")
            .field("registrations", &self.len())
            .finish()
    }
}

fn lock_registry(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_if_changed(cache: &dyn DerivedCache, value: EffectiveSettings) -> bool {
    if cache.current().as_ref() == Some(&value) {
        return false;
    }
    cache.set(value);
    true
}

/// RAII registration handle. Dropping it removes the cache.
#[must_use = "dropping a Subscription unregisters it immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    fn detach(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock_registry(&registry)
                .entries
                .retain(|entry| entry.id != self.id);
        }
        self.registry = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{GridPartial, GridSettings, LinePartial, LineSettings};
    use crate::sync::WatchCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_subscription(
        broadcaster: &SyncBroadcaster,
        store: &SettingsStore,
        category: Category,
        mode: ViewerMode,
    ) -> (Subscription, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = broadcaster.subscribe(store, category, mode, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (subscription, calls)
    }

    #[test]
    fn subscriptions_are_primed_with_the_current_value() {
        let broadcaster = SyncBroadcaster::new();
        let store = SettingsStore::new();
        let cache = Arc::new(WatchCache::new());
        let _subscription =
            broadcaster.register(&store, Category::Line, ViewerMode::Hover, cache.clone());
        assert_eq!(
            cache.get::<LineSettings>(),
            Some(store.effective::<LineSettings>(ViewerMode::Hover))
        );
    }

    #[test]
    fn propagate_skips_unchanged_values() {
        let broadcaster = SyncBroadcaster::new();
        let mut store = SettingsStore::new();
        let (_normal, normal_calls) =
            counting_subscription(&broadcaster, &store, Category::Line, ViewerMode::Normal);
        let (_hover, hover_calls) =
            counting_subscription(&broadcaster, &store, Category::Line, ViewerMode::Hover);

        // Only the hover override changes; the normal value stays the same.
        store.set_override_enabled::<LineSettings>(ViewerMode::Hover, true);
        store.update_override::<LineSettings>(
            ViewerMode::Hover,
            LinePartial {
                opacity: Some(0.5),
                ..Default::default()
            },
        );
        assert_eq!(broadcaster.propagate(&store, Category::Line), 1);
        assert_eq!(normal_calls.load(Ordering::SeqCst), 1);
        assert_eq!(hover_calls.load(Ordering::SeqCst), 2);

        // Nothing changed since the last propagate.
        assert_eq!(broadcaster.propagate(&store, Category::Line), 0);
    }

    #[test]
    fn propagate_only_touches_the_given_category() {
        let broadcaster = SyncBroadcaster::new();
        let mut store = SettingsStore::new();
        let (_line, line_calls) =
            counting_subscription(&broadcaster, &store, Category::Line, ViewerMode::Normal);
        store.update_general::<GridSettings>(GridPartial {
            spacing: Some(30.0),
            ..Default::default()
        });
        assert_eq!(broadcaster.propagate(&store, Category::Grid), 0);
        assert_eq!(line_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn preview_and_draft_caches_see_the_same_value() {
        let broadcaster = SyncBroadcaster::new();
        let mut store = SettingsStore::new();
        let preview = Arc::new(WatchCache::new());
        let draft = Arc::new(WatchCache::new());
        let _a = broadcaster.register(&store, Category::Grid, ViewerMode::Preview, preview.clone());
        let _b = broadcaster.register(&store, Category::Grid, ViewerMode::Draft, draft.clone());

        store.update_specific::<GridSettings>(
            ViewerMode::Preview,
            GridPartial {
                opacity: Some(0.2),
                ..Default::default()
            },
        );
        broadcaster.propagate(&store, Category::Grid);
        assert_eq!(preview.get::<GridSettings>(), draft.get::<GridSettings>());
        assert_eq!(draft.get::<GridSettings>().map(|g| g.opacity), Some(0.2));
    }

    #[test]
    fn dropping_or_unsubscribing_removes_the_registration() {
        let broadcaster = SyncBroadcaster::new();
        let store = SettingsStore::new();
        let (first, _) =
            counting_subscription(&broadcaster, &store, Category::Text, ViewerMode::Normal);
        let (second, _) =
            counting_subscription(&broadcaster, &store, Category::Text, ViewerMode::Hover);
        assert_eq!(broadcaster.len(), 2);

        drop(first);
        assert_eq!(broadcaster.len(), 1);
        second.unsubscribe();
        assert!(broadcaster.is_empty());
    }

    #[test]
    fn register_latest_reads_the_published_snapshot() {
        let broadcaster = SyncBroadcaster::new();
        let (tx, rx) = watch::channel(Arc::new(SettingsStore::new()));
        let mut store = SettingsStore::new();
        store.update_general::<GridSettings>(GridPartial {
            spacing: Some(42.0),
            ..Default::default()
        });
        tx.send_replace(Arc::new(store));

        let cache = Arc::new(WatchCache::new());
        let _subscription =
            broadcaster.register_latest(&rx, Category::Grid, ViewerMode::Normal, cache.clone());
        assert_eq!(cache.get::<GridSettings>().map(|g| g.spacing), Some(42.0));
    }

    #[test]
    fn subscriptions_outliving_the_broadcaster_drop_cleanly() {
        let store = SettingsStore::new();
        let subscription = {
            let broadcaster = SyncBroadcaster::new();
            broadcaster.subscribe(&store, Category::Ruler, ViewerMode::Normal, |_| {})
        };
        drop(subscription);
    }
}
