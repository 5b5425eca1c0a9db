//! Per-gym mutual exclusion for member mutations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per gym. Gyms never contend with each other.
#[derive(Clone, Default)]
pub struct TenantLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl TenantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `gym_id`; released when the guard drops.
    ///
    /// Entries nobody holds or waits on are pruned on the way in, so the map only
    /// tracks gyms with work in flight.
    pub async fn lock(&self, gym_id: Uuid) -> OwnedMutexGuard<()> {
        let gym_lock = {
            let mut locks = self
                .inner
                .lock()
                .unwrap_or_else(|poison| poison.into_inner());
            // The map's own reference is the only one left once a gym goes idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(gym_id).or_default())
        };
        gym_lock.lock_owned().await
    }

    /// Number of gyms currently tracked.
    pub fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }
}
