use std::sync::OnceLock;

use super::{Listener, MembershipEvent};

static REGISTRY: OnceLock<EventRegistry> = OnceLock::new();

/// Ordered set of listeners installed once per process.
pub struct EventRegistry {
    listeners: Vec<Box<dyn Listener>>,
}

impl EventRegistry {
    fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Adds a listener. Listeners run in registration order.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    async fn dispatch(&self, event: &MembershipEvent) {
        for listener in &self.listeners {
            listener.handle(event).await;
        }
    }
}

/// Installs the process-wide listeners.
///
/// Only the first call takes effect; later calls are logged and ignored.
/// Without a call every event is dropped.
///
/// # Example
///
/// ```rust,ignore
/// use orgauth::register_event_listeners;
/// use orgauth::events::listeners::LoggingListener;
///
/// register_event_listeners(|registry| {
///     registry
///         .listen(LoggingListener::new())
///         .listen(AuditLogListener::new(pool.clone()));
/// });
/// ```
pub fn register_event_listeners<F>(f: F)
where
    F: FnOnce(&mut EventRegistry),
{
    let mut registry = EventRegistry::new();
    f(&mut registry);
    let count = registry.len();
    if REGISTRY.set(registry).is_err() {
        log::warn!(
            target: "orgauth",
            "msg=\"event listeners already registered, ignoring\""
        );
    } else {
        log::debug!(target: "orgauth", "msg=\"event listeners registered\", count={count}");
    }
}

/// Sends an event to every registered listener.
///
/// No-op when nothing is registered.
pub async fn dispatch(event: MembershipEvent) {
    if let Some(registry) = REGISTRY.get() {
        registry.dispatch(&event).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Listener for Counting {
        async fn handle(&self, _event: &MembershipEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_registry_calls_every_listener() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut registry = EventRegistry::new();
        registry
            .listen(Counting(hits.clone()))
            .listen(Counting(hits.clone()));
        assert_eq!(registry.len(), 2);

        let event = MembershipEvent::MemberRemoved {
            organization_id: 1,
            member_id: 2,
            at: Utc::now(),
        };
        registry.dispatch(&event).await;

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_new_registry_is_empty() {
        assert!(EventRegistry::new().is_empty());
    }
}
