use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use lw_types::Block;

use crate::error::ConnectorError;

/// Something a connector observed asynchronously.
#[derive(Clone, Debug)]
pub enum ConnectorEvent {
    /// A node announced a new block.
    Created(Arc<Block>),
    /// An asynchronous failure: lost subscription, malformed notification,
    /// or a problem while waiting for confirmation.
    Error(Arc<ConnectorError>),
}

pub type ListenerId = u64;

/// Events held for a listener that is not reading. Further events for that
/// listener are dropped until it catches up.
pub const LISTENER_BUFFER: usize = 256;

/// Fan-out registry of local listeners.
///
/// Each in-flight confirmation and each external subscriber holds one entry;
/// entries are removed independently when their [`EventStream`] is dropped.
pub(crate) struct ListenerRegistry {
    listeners: RwLock<HashMap<ListenerId, mpsc::Sender<ConnectorEvent>>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Register a listener. Events emitted afterwards are delivered to it.
    pub(crate) fn subscribe(self: &Arc<Self>) -> EventStream {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(LISTENER_BUFFER);
        self.listeners
            .write()
            .expect("listener lock poisoned")
            .insert(id, tx);
        EventStream {
            id,
            rx,
            registry: Arc::downgrade(self),
        }
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners
            .write()
            .expect("listener lock poisoned")
            .remove(&id);
    }

    /// Deliver an event to every registered listener.
    /// Listeners whose receivers are gone are pruned; full ones skip it.
    pub(crate) fn emit(&self, event: ConnectorEvent) {
        let mut listeners = self.listeners.write().expect("listener lock poisoned");
        listeners.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(listener = *id, "listener is not keeping up, event dropped");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
    }

    pub(crate) fn emit_error(&self, error: ConnectorError) {
        warn!(%error, "connector error");
        self.emit(ConnectorEvent::Error(Arc::new(error)));
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.read().expect("listener lock poisoned").len()
    }
}

/// Receiving end of a local listener. Deregisters itself on drop.
pub struct EventStream {
    id: ListenerId,
    rx: mpsc::Receiver<ConnectorEvent>,
    registry: Weak<ListenerRegistry>,
}

impl EventStream {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Next event. `None` once the connector is gone.
    pub async fn recv(&mut self) -> Option<ConnectorEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ConnectorEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(index: u64) -> ConnectorEvent {
        ConnectorEvent::Created(Arc::new(Block { index, ..Default::default() }))
    }

    #[test]
    fn every_listener_receives_event() {
        let registry = ListenerRegistry::new();
        let mut a = registry.subscribe();
        let mut b = registry.subscribe();
        assert_ne!(a.id(), b.id());

        registry.emit(block(1));

        assert!(matches!(a.try_recv(), Some(ConnectorEvent::Created(blk)) if blk.index == 1));
        assert!(matches!(b.try_recv(), Some(ConnectorEvent::Created(blk)) if blk.index == 1));
    }

    #[test]
    fn dropping_stream_deregisters_only_itself() {
        let registry = ListenerRegistry::new();
        let a = registry.subscribe();
        let mut b = registry.subscribe();
        assert_eq!(registry.listener_count(), 2);

        drop(a);
        assert_eq!(registry.listener_count(), 1);

        registry.emit(block(2));
        assert!(b.try_recv().is_some());
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let registry = ListenerRegistry::new();
        registry.emit(block(1));
        let mut late = registry.subscribe();
        assert!(late.try_recv().is_none());
    }

    #[test]
    fn errors_are_broadcast() {
        let registry = ListenerRegistry::new();
        let mut a = registry.subscribe();
        registry.emit_error(ConnectorError::Closed);
        assert!(matches!(a.try_recv(), Some(ConnectorEvent::Error(_))));
    }

    #[test]
    fn idle_listener_is_capped_and_does_not_block_others() {
        let registry = ListenerRegistry::new();
        let mut idle = registry.subscribe();
        let mut active = registry.subscribe();

        for index in 0..(LISTENER_BUFFER as u64 + 10) {
            registry.emit(block(index));
            assert!(matches!(active.try_recv(), Some(ConnectorEvent::Created(blk)) if blk.index == index));
        }
        assert_eq!(registry.listener_count(), 2);

        let mut held = 0;
        while idle.try_recv().is_some() {
            held += 1;
        }
        assert_eq!(held, LISTENER_BUFFER);

        registry.emit(block(999));
        assert!(matches!(idle.try_recv(), Some(ConnectorEvent::Created(blk)) if blk.index == 999));
    }

    #[tokio::test]
    async fn stream_ends_when_registry_dropped() {
        let registry = ListenerRegistry::new();
        let mut a = registry.subscribe();
        drop(registry);
        assert!(a.recv().await.is_none());
    }
}
