use std::sync::Arc;

use super::queue::Inner;

/// A held concurrency slot. Dropping it frees the slot, or hands it to the
/// next queued caller for the same resource.
pub struct SlotGuard {
    inner: Arc<Inner>,
    resource: String,
}

impl SlotGuard {
    pub(super) fn new(inner: Arc<Inner>, resource: String) -> Self {
        Self { inner, resource }
    }

    /// Resource id this slot belongs to.
    pub fn resource_id(&self) -> &str {
        &self.resource
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.inner.release(&self.resource);
    }
}

impl std::fmt::Debug for SlotGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotGuard").field("resource", &self.resource).finish()
    }
}
