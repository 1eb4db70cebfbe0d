//! Latest metric samples per resource.
//!
//! Each resource owns one slot holding an immutable, shared sample list.
//! Writers build a complete list and swap it in under the slot's lock;
//! readers clone the `Arc` under the same lock. A reader therefore sees
//! either the previous or the new list for a resource, never a mixture.
//! Slots are independent of each other.

use std::sync::{Arc, PoisonError, RwLock};

use crate::render::{self, RenderError};
use crate::types::{MetricSample, Resource};

type Slot = RwLock<Arc<[MetricSample]>>;

/// Shared handle passed to the pollers and to the HTTP layer.
#[derive(Debug)]
pub struct MetricStore {
    receiver: Slot,
    aircraft: Slot,
    stats: Slot,
}

/// Point-in-time view of every slot.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub receiver: Arc<[MetricSample]>,
    pub aircraft: Arc<[MetricSample]>,
    pub stats: Arc<[MetricSample]>,
}

impl StoreSnapshot {
    pub fn samples(&self) -> impl Iterator<Item = &MetricSample> {
        self.receiver
            .iter()
            .chain(self.aircraft.iter())
            .chain(self.stats.iter())
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricStore {
    pub fn new() -> Self {
        MetricStore {
            receiver: RwLock::new(Arc::from(Vec::new())),
            aircraft: RwLock::new(Arc::from(Vec::new())),
            stats: RwLock::new(Arc::from(Vec::new())),
        }
    }

    fn slot(&self, resource: Resource) -> &Slot {
        match resource {
            Resource::Receiver => &self.receiver,
            Resource::Aircraft => &self.aircraft,
            Resource::Stats => &self.stats,
        }
    }

    /// Replace the samples for one resource in a single swap.
    pub fn replace(&self, resource: Resource, samples: Vec<MetricSample>) {
        let fresh: Arc<[MetricSample]> = Arc::from(samples);
        // A panic while holding the lock cannot leave a half-written Arc.
        let mut guard = self
            .slot(resource)
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = fresh;
    }

    /// Current samples for one resource.
    pub fn get(&self, resource: Resource) -> Arc<[MetricSample]> {
        self.slot(resource)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            receiver: self.get(Resource::Receiver),
            aircraft: self.get(Resource::Aircraft),
            stats: self.get(Resource::Stats),
        }
    }

    /// Exposition text for everything currently stored.
    pub fn render(&self) -> Result<String, RenderError> {
        render::render(self.snapshot().samples())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
