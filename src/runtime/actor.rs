use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use super::RuntimeRequest;
use crate::persist::SaverHandle;
use crate::settings::Category;
use crate::store::{MutationOutcome, RemoteOutcome, SettingsCommand, SettingsStore};
use crate::sync::{InstanceId, SyncBroadcaster, SyncBus, SyncMessage};

pub(super) struct SettingsActor {
    pub(super) store: Arc<SettingsStore>,
    pub(super) snapshot_tx: watch::Sender<Arc<SettingsStore>>,
    pub(super) broadcaster: SyncBroadcaster,
    pub(super) saver: Option<SaverHandle>,
    pub(super) bus: Option<SyncBus>,
    pub(super) remote: Option<broadcast::Receiver<SyncMessage>>,
    pub(super) instance: InstanceId,
}

enum ActorEvent {
    Request(Option<RuntimeRequest>),
    Remote(Result<SyncMessage, broadcast::error::RecvError>),
}

impl SettingsActor {
    pub(super) async fn run(mut self, mut requests: mpsc::Receiver<RuntimeRequest>) {
        loop {
            let event = tokio::select! {
                request = requests.recv() => ActorEvent::Request(request),
                message = next_remote(&mut self.remote) => ActorEvent::Remote(message),
            };

            match event {
                ActorEvent::Request(Some(RuntimeRequest::Dispatch { command, reply })) => {
                    let outcome = self.dispatch(command);
                    let _ = reply.send(outcome);
                }
                ActorEvent::Request(Some(RuntimeRequest::Flush(done))) => {
                    self.flush().await;
                    let _ = done.send(());
                }
                ActorEvent::Request(Some(RuntimeRequest::Shutdown(done))) => {
                    requests.close();
                    self.flush().await;
                    let _ = done.send(());
                    break;
                }
                ActorEvent::Request(None) => {
                    self.flush().await;
                    break;
                }
                ActorEvent::Remote(Ok(message)) => self.accept_remote(message),
                ActorEvent::Remote(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::warn!(instance = %self.instance, skipped, "sync bus lagged; remote updates dropped");
                }
                ActorEvent::Remote(Err(broadcast::error::RecvError::Closed)) => {
                    self.remote = None;
                }
            }
        }
        tracing::debug!(instance = %self.instance, "settings runtime stopped");
    }

    fn dispatch(&mut self, command: SettingsCommand) -> MutationOutcome {
        let kind = command.kind();
        let mut next = SettingsStore::clone(&self.store);
        let outcome = next.apply(command);
        if !outcome.changed {
            tracing::debug!(category = %outcome.category, kind, "command left settings unchanged");
            return outcome;
        }

        self.store = Arc::new(next);
        self.publish(outcome.category);
        if let Some(saver) = &self.saver {
            saver.schedule(Arc::clone(&self.store), outcome.category);
        }
        if let Some(bus) = &self.bus {
            bus.publish(SyncMessage::new(
                self.instance,
                self.store.state(outcome.category),
            ));
        }
        tracing::debug!(category = %outcome.category, kind, revision = outcome.revision, "settings changed");
        outcome
    }

    /// Install a newer snapshot from another instance. The origin has already
    /// saved it, so nothing is scheduled here.
    fn accept_remote(&mut self, message: SyncMessage) {
        if message.origin == self.instance {
            return;
        }
        let category = message.category;
        let local = self.store.revision(category);
        if message.revision <= local {
            tracing::warn!(
                category = %category,
                origin = %message.origin,
                local,
                incoming = message.revision,
                "discarding stale remote settings"
            );
            return;
        }

        let mut next = SettingsStore::clone(&self.store);
        match next.accept_remote(message.state) {
            RemoteOutcome::Applied { revision } => {
                self.store = Arc::new(next);
                self.publish(category);
                tracing::debug!(category = %category, origin = %message.origin, revision, "applied remote settings");
            }
            RemoteOutcome::Stale { local, incoming } => {
                tracing::warn!(category = %category, local, incoming, "discarding stale remote settings");
            }
        }
    }

    /// Publish the current store, then bring derived caches up to date.
    fn publish(&self, category: Category) {
        self.snapshot_tx.send_replace(Arc::clone(&self.store));
        self.broadcaster.propagate(&self.store, category);
    }

    async fn flush(&self) {
        if let Some(saver) = &self.saver {
            saver.flush().await;
        }
    }
}

async fn next_remote(
    remote: &mut Option<broadcast::Receiver<SyncMessage>>,
) -> Result<SyncMessage, broadcast::error::RecvError> {
    match remote {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
