//! In-memory fulfillment store
//!
//! The host ERP owns the durable records; this store holds the working copies
//! the service mutates. `update` funnels every mutation through an exclusive
//! map entry, which replaces the host ORM's implicit row locking: two callers
//! can never write the same picking's tracking code concurrently.

use dashmap::DashMap;
use tracing::debug;

use crate::domain::Fulfillment;

/// Concurrent fulfillment store keyed by picking reference.
#[derive(Default)]
pub struct FulfillmentStore {
    records: DashMap<String, Fulfillment>,
    /// tracking code -> picking reference
    by_tracking: DashMap<String, String>,
}

impl FulfillmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record, keeping the tracking index in sync.
    pub fn upsert(&self, picking: Fulfillment) {
        if let Some(previous) = self.records.get(&picking.name) {
            if let Some(old_tracking) = &previous.tracking_code {
                self.by_tracking.remove(old_tracking);
            }
        }
        if let Some(tracking) = &picking.tracking_code {
            self.by_tracking.insert(tracking.clone(), picking.name.clone());
        }
        debug!(picking = %picking.name, "fulfillment registered");
        self.records.insert(picking.name.clone(), picking);
    }

    pub fn get(&self, name: &str) -> Option<Fulfillment> {
        self.records.get(name).map(|r| r.clone())
    }

    pub fn get_by_tracking(&self, tracking_code: &str) -> Option<Fulfillment> {
        let name = self.by_tracking.get(tracking_code)?.clone();
        self.get(&name)
    }

    /// Mutate a record under its exclusive entry lock. Returns `None` when
    /// the picking is unknown. The tracking index follows whatever the
    /// closure did to `tracking_code`.
    pub fn update<R>(&self, name: &str, mutate: impl FnOnce(&mut Fulfillment) -> R) -> Option<R> {
        let mut entry = self.records.get_mut(name)?;
        let old_tracking = entry.tracking_code.clone();
        let result = mutate(entry.value_mut());
        let new_tracking = entry.tracking_code.clone();
        drop(entry);

        if old_tracking != new_tracking {
            if let Some(old) = old_tracking {
                self.by_tracking.remove(&old);
            }
            if let Some(new) = new_tracking {
                self.by_tracking.insert(new, name.to_string());
            }
        }
        Some(result)
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }
}
