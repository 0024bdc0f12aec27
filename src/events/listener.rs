use async_trait::async_trait;

use super::MembershipEvent;

/// Trait for handling membership events asynchronously.
///
/// Implement this trait to forward events to an audit log, a notification
/// service or metrics.
///
/// # Example
///
/// ```rust,ignore
/// use orgauth::events::{Listener, MembershipEvent};
/// use async_trait::async_trait;
///
/// struct AuditLogListener;
///
/// #[async_trait]
/// impl Listener for AuditLogListener {
///     async fn handle(&self, event: &MembershipEvent) {
///         if let MembershipEvent::RoleChanged { member_id, to, .. } = event {
///             // write an audit entry
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Handle a membership event.
    ///
    /// Called for every event dispatched. Filter by matching on the variant.
    async fn handle(&self, event: &MembershipEvent);
}
