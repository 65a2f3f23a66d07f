use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::barrier::Barrier;
use crate::counter::Counter;
use crate::error::HookError;
use crate::registry::HookRegistry;

/// Per-session isolation scope for hook execution.
///
/// Owns the session's counters, barriers, installed hooks, and the run-slot:
/// a single permit that serialises action execution, so at most one
/// intercepted call in the session is actively running actions at a time.
/// Counter and barrier lookups never fail; a missing id is created on first
/// reference.
pub struct HooksContext {
    id: String,
    registry: HookRegistry,
    counters: DashMap<String, Arc<Counter>>,
    barriers: DashMap<String, Arc<Barrier>>,
    run_slot: Arc<Semaphore>,
}

impl HooksContext {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: String) -> Self {
        Self {
            id,
            registry: HookRegistry::new(),
            counters: DashMap::new(),
            barriers: DashMap::new(),
            run_slot: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub fn counter(&self, id: &str) -> Arc<Counter> {
        self.counters.entry(id.to_owned()).or_default().clone()
    }

    pub fn barrier(&self, id: &str) -> Arc<Barrier> {
        self.barriers.entry(id.to_owned()).or_default().clone()
    }

    /// Block until the run-slot is free or `ctx` is cancelled. The permit
    /// releases the slot when dropped.
    pub async fn acquire_run_slot(
        &self,
        ctx: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, HookError> {
        tokio::select! {
            permit = self.run_slot.clone().acquire_owned() => {
                permit.map_err(|_| HookError::Cancelled)
            }
            _ = ctx.cancelled() => Err(HookError::Cancelled),
        }
    }

    /// Tear the session down: uninstall every hook, close the run-slot so
    /// pending acquisitions fail, and cancel every queued barrier waiter.
    pub fn close(&self) {
        self.registry.clear();
        self.run_slot.close();
        for entry in self.barriers.iter() {
            entry.value().fail_all();
        }
    }
}

impl Default for HooksContext {
    fn default() -> Self {
        Self::new()
    }
}
