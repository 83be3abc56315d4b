//! Read-optimized holders of effective settings.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::settings::{EffectiveSettings, SettingsRecord};

/// A consumer-side copy of one `(category, mode)` effective value.
///
/// The broadcaster only calls `set` when the freshly resolved value differs
/// from `current`, so implementations never see redundant writes.
pub trait DerivedCache: Send + Sync {
    fn current(&self) -> Option<EffectiveSettings>;

    fn set(&self, value: EffectiveSettings);
}

/// Cache backed by a `watch` channel. Hot-path readers clone a receiver once
/// and read `borrow()` without touching the writer.
#[derive(Debug)]
pub struct WatchCache {
    tx: watch::Sender<Option<EffectiveSettings>>,
}

impl WatchCache {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn receiver(&self) -> watch::Receiver<Option<EffectiveSettings>> {
        self.tx.subscribe()
    }

    /// Typed read of the cached record.
    pub fn get<T: SettingsRecord>(&self) -> Option<Arc<T>> {
        self.tx
            .borrow()
            .as_ref()
            .and_then(|value| value.get::<T>().cloned())
    }
}

impl Default for WatchCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DerivedCache for WatchCache {
    fn current(&self) -> Option<EffectiveSettings> {
        self.tx.borrow().clone()
    }

    fn set(&self, value: EffectiveSettings) {
        self.tx.send_replace(Some(value));
    }
}

type Callback = Box<dyn Fn(&EffectiveSettings) + Send + Sync>;

/// Cache that forwards every change to a callback.
pub struct CallbackCache {
    last: Mutex<Option<EffectiveSettings>>,
    callback: Callback,
}

impl CallbackCache {
    pub fn new(callback: impl Fn(&EffectiveSettings) + Send + Sync + 'static) -> Self {
        Self {
            last: Mutex::new(None),
            callback: Box::new(callback),
        }
    }
}

impl DerivedCache for CallbackCache {
    fn current(&self) -> Option<EffectiveSettings> {
        match self.last.lock() {
            Ok(last) => last.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, value: EffectiveSettings) {
        (self.callback)(&value);
        match self.last.lock() {
            Ok(mut last) => *last = Some(value),
            Err(poisoned) => *poisoned.into_inner() = Some(value),
        }
    }
}

impl std::fmt::Debug for CallbackCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackCache")
            .field("last", &self.current())
            .finish_non_exhaustive()
    }
}
