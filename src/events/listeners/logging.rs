use async_trait::async_trait;

use crate::events::{Listener, MembershipEvent};

/// Logs membership events through the `log` crate.
///
/// # Example
///
/// ```rust,ignore
/// use orgauth::register_event_listeners;
/// use orgauth::events::listeners::LoggingListener;
///
/// register_event_listeners(|registry| {
///     registry.listen(LoggingListener::with_level(log::Level::Debug));
/// });
/// ```
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Logs at INFO.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &MembershipEvent) {
        log::log!(
            target: "orgauth::events",
            self.level,
            "event={} organization_id={} {:?}",
            event.name(),
            event.organization_id(),
            event
        );
    }
}
