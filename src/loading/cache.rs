//! Single-flight identity cache.
//!
//! Maps a persisted identifier to the entity reconstructed from it. The
//! first caller for an identifier runs the reconstruction; every concurrent
//! or later caller awaits and shares that result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::loading::error::LoadError;
use crate::state::ConcreteId;

type Slot<V> = Arc<OnceCell<Arc<V>>>;

pub struct IdentityCache<V> {
    name: &'static str,
    slots: Mutex<HashMap<ConcreteId, Slot<V>>>,
}

impl<V> IdentityCache<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the entity for `id`, running `compute` only if no result is
    /// stored or in flight.
    ///
    /// Callers arriving while another caller computes the same identifier
    /// suspend until that computation publishes its value. If the computation
    /// fails the slot stays empty and the error goes to its caller.
    pub async fn resolve<F, Fut>(&self, id: ConcreteId, compute: F) -> Result<Arc<V>, LoadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<V>, LoadError>>,
    {
        let slot = Arc::clone(self.slots.lock().entry(id).or_default());

        if let Some(value) = slot.get() {
            return Ok(Arc::clone(value));
        }

        tracing::trace!(cache = self.name, %id, "resolving");
        slot.get_or_try_init(compute).await.cloned()
    }

    /// Publish a value that needs no reconstruction (the empty root state).
    pub fn seed(&self, id: ConcreteId, value: Arc<V>) {
        let slot = Arc::clone(self.slots.lock().entry(id).or_default());
        if slot.set(value).is_err() {
            tracing::debug!(cache = self.name, %id, "seed ignored, value already present");
        }
    }

    /// Already published value, without waiting for in-flight computations.
    pub fn get(&self, id: &ConcreteId) -> Option<Arc<V>> {
        self.slots.lock().get(id).and_then(|slot| slot.get().cloned())
    }

    /// Number of identifiers with a published value.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }
}
