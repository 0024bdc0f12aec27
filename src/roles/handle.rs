use std::sync::Arc;

use arc_swap::ArcSwap;

use super::RoleRegistry;

/// Shared handle to the current role registry.
///
/// Reads are lock-free snapshots. A reload installs a whole new registry in
/// one atomic swap; snapshots taken earlier keep seeing the old table.
/// Clones share the same underlying slot.
#[derive(Debug, Clone)]
pub struct RoleRegistryHandle {
    inner: Arc<ArcSwap<RoleRegistry>>,
}

impl RoleRegistryHandle {
    pub fn new(registry: RoleRegistry) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(registry)),
        }
    }

    /// Returns the registry in effect right now.
    pub fn load(&self) -> Arc<RoleRegistry> {
        self.inner.load_full()
    }

    /// Atomically replaces the registry.
    pub fn install(&self, registry: RoleRegistry) {
        let roles = registry.choices().len();
        self.inner.store(Arc::new(registry));
        log::info!(
            target: "orgauth",
            "msg=\"role registry installed\", roles={roles}"
        );
    }
}

impl Default for RoleRegistryHandle {
    fn default() -> Self {
        Self::new(RoleRegistry::builtin())
    }
}

impl From<RoleRegistry> for RoleRegistryHandle {
    fn from(registry: RoleRegistry) -> Self {
        Self::new(registry)
    }
}
