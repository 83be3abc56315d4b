//! Propagation of effective settings into derived caches, locally and across
//! instances.

mod broadcaster;
mod bus;
mod cache;

pub use broadcaster::{Subscription, SyncBroadcaster};
pub use bus::{InstanceId, SyncBus, SyncMessage};
pub use cache::{CallbackCache, DerivedCache, WatchCache};
