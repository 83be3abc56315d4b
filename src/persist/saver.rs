//! Background task that coalesces save requests.
//!
//! Every schedule replaces the pending snapshot and restarts the debounce
//! timer, so a burst of edits produces one write of the latest state. Only the
//! categories marked dirty since the last write are written. A category whose
//! write fails stays dirty and is retried with the next write; the status
//! remains `Error` until it goes through.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use super::PersistenceGateway;
use crate::settings::Category;
use crate::store::SettingsStore;

/// Observable state of the background saver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved { at_millis: u64 },
    Error(String),
}

enum SaveRequest {
    Schedule {
        snapshot: Arc<SettingsStore>,
        category: Category,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle to a spawned saver task. The task exits once every handle is
/// dropped, writing whatever is still pending.
#[derive(Clone)]
pub struct SaverHandle {
    requests: mpsc::UnboundedSender<SaveRequest>,
    status: watch::Receiver<SaveStatus>,
}

impl SaverHandle {
    /// Mark `category` dirty and (re)start the debounce timer with `snapshot`
    /// as the state to write.
    pub fn schedule(&self, snapshot: Arc<SettingsStore>, category: Category) {
        if self
            .requests
            .send(SaveRequest::Schedule { snapshot, category })
            .is_err()
        {
            tracing::warn!(category = %category, "settings saver has stopped; change not persisted");
        }
    }

    /// Write anything pending now and wait for the write to finish.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.requests.send(SaveRequest::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }
}

pub(super) fn spawn(gateway: PersistenceGateway, debounce: Duration) -> SaverHandle {
    let (requests, request_rx) = mpsc::unbounded_channel();
    let (status_tx, status) = watch::channel(SaveStatus::Idle);
    tokio::spawn(run(gateway, debounce, request_rx, status_tx));
    SaverHandle { requests, status }
}

#[derive(Default)]
struct Pending {
    snapshot: Option<Arc<SettingsStore>>,
    dirty: BTreeSet<Category>,
}

async fn run(
    gateway: PersistenceGateway,
    debounce: Duration,
    mut requests: mpsc::UnboundedReceiver<SaveRequest>,
    status: watch::Sender<SaveStatus>,
) {
    let mut pending = Pending::default();
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            request = requests.recv() => match request {
                Some(SaveRequest::Schedule { snapshot, category }) => {
                    pending.snapshot = Some(snapshot);
                    pending.dirty.insert(category);
                    deadline = Some(Instant::now() + debounce);
                }
                Some(SaveRequest::Flush(done)) => {
                    deadline = None;
                    write_pending(&gateway, &mut pending, &status).await;
                    let _ = done.send(());
                }
                None => {
                    write_pending(&gateway, &mut pending, &status).await;
                    break;
                }
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                write_pending(&gateway, &mut pending, &status).await;
            }
        }
    }
}

async fn write_pending(
    gateway: &PersistenceGateway,
    pending: &mut Pending,
    status: &watch::Sender<SaveStatus>,
) {
    let Some(snapshot) = pending.snapshot.take() else {
        return;
    };
    let dirty = std::mem::take(&mut pending.dirty);
    let _ = status.send(SaveStatus::Saving);

    let mut failures = Vec::new();
    for category in dirty {
        if let Err(e) = gateway.save_category(&snapshot, category).await {
            tracing::warn!(category = %category, driver = gateway.driver_name(), error = %e, "failed to save settings");
            failures.push(format!("{category}: {e}"));
            pending.dirty.insert(category);
        }
    }
    if !pending.dirty.is_empty() {
        pending.snapshot.get_or_insert(snapshot);
    }

    let next = if failures.is_empty() {
        tracing::debug!(driver = gateway.driver_name(), "settings saved");
        SaveStatus::Saved {
            at_millis: super::now_unix_millis(),
        }
    } else {
        SaveStatus::Error(failures.join("; "))
    };
    let _ = status.send(next);
}
