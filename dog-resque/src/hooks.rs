use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::{JobEvent, JobEventKind, ResqueResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

static LISTENER_ID: AtomicU64 = AtomicU64::new(1);

fn next_listener_id() -> ListenerId {
    ListenerId(LISTENER_ID.fetch_add(1, Ordering::Relaxed))
}

/// Listener signature.
///
/// Returning `Err(ResqueError::DontPerform)` from a `BeforePerform` listener
/// skips the job; `Err(ResqueError::DontCreate)` from a `BeforeEnqueue`
/// listener aborts the enqueue. Any other error propagates to the caller.
pub type EventListener = Arc<dyn for<'a> Fn(&JobEvent<'a>) -> ResqueResult<()> + Send + Sync>;

#[derive(Clone)]
struct ListenerEntry {
    id: ListenerId,
    listener: EventListener,
}

/// Synchronous lifecycle event hub.
///
/// Listeners run in registration order on the triggering task. The listener
/// list is snapshotted before dispatch, so no lock is held while they run and
/// a listener may register or remove others.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<JobEventKind, Vec<ListenerEntry>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event kind
    pub fn listen<F>(&self, kind: JobEventKind, listener: F) -> ListenerId
    where
        F: for<'a> Fn(&JobEvent<'a>) -> ResqueResult<()> + Send + Sync + 'static,
    {
        let id = next_listener_id();
        self.listeners.write().entry(kind).or_default().push(ListenerEntry {
            id,
            listener: Arc::new(listener),
        });
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn stop_listening(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let mut removed = false;
        for entries in listeners.values_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            removed |= entries.len() != before;
        }
        removed
    }

    /// Remove every listener
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    pub fn listener_count(&self, kind: JobEventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }

    /// Dispatch `event`; the first listener error stops dispatch and is returned
    pub fn trigger(&self, event: &JobEvent<'_>) -> ResqueResult<()> {
        let kind = event.kind();
        let snapshot: Vec<EventListener> = match self.listeners.read().get(&kind) {
            Some(entries) => entries.iter().map(|entry| entry.listener.clone()).collect(),
            None => return Ok(()),
        };

        debug!("Triggering {} for {} listener(s)", kind, snapshot.len());
        for listener in snapshot {
            listener(event)?;
        }
        Ok(())
    }
}
