use async_trait::async_trait;

use crate::events::{Listener, MembershipEvent};

/// Emits membership events as tracing events.
///
/// Requires the `tracing` feature.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &MembershipEvent) {
        tracing::info!(
            target: "orgauth::events",
            event_name = event.name(),
            organization_id = event.organization_id(),
            ?event,
            "membership event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_tracing_listener_handle() {
        let event = MembershipEvent::TeamAssignmentChanged {
            organization_id: 1,
            member_id: 2,
            team_id: 3,
            is_active: true,
            at: Utc::now(),
        };

        TracingListener.handle(&event).await;
    }
}
