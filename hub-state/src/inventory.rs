//! Peripheral inventory: the ordered collection of discovered devices
//!
//! Keyed by identifier, ordered by identifier sort order (which defines the
//! scheduler's round-robin cursor domain). Grows monotonically: discovery
//! appends, nothing removes. Concurrently read by the scheduler and the
//! statistics path while shard workers mutate individual device records.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::model::{Control, DeviceId, DeviceRecord, DeviceType};

/// Shared handle to one device record; shard workers lock it to update the
/// snapshot in place
pub type DeviceSlot = Arc<Mutex<DeviceRecord>>;

/// Read-only clone of one device's state, safe to hand to consumers
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub kind: DeviceType,
    pub metrics: HashMap<String, String>,
    pub controls: Vec<Control>,
}

/// Ordered mapping from identifier to device record
pub struct Inventory {
    devices: RwLock<BTreeMap<DeviceId, DeviceSlot>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.devices.read().contains_key(id)
    }

    /// Insert a newly discovered device unless its identifier is already
    /// known. Returns true when the record was inserted.
    pub fn insert_if_absent(&self, record: DeviceRecord) -> bool {
        let mut devices = self.devices.write();
        if devices.contains_key(record.id()) {
            return false;
        }
        devices.insert(record.id().clone(), Arc::new(Mutex::new(record)));
        true
    }

    pub fn get(&self, id: &DeviceId) -> Option<DeviceSlot> {
        self.devices.read().get(id).cloned()
    }

    /// All identifiers in sort order
    pub fn sorted_ids(&self) -> Vec<DeviceId> {
        self.devices.read().keys().cloned().collect()
    }

    /// Clone every device's current state
    pub fn snapshot_all(&self) -> Vec<DeviceSnapshot> {
        let devices = self.devices.read();
        devices
            .values()
            .map(|slot| {
                let record = slot.lock();
                DeviceSnapshot {
                    id: record.id().clone(),
                    kind: record.kind(),
                    metrics: record.snapshot().clone(),
                    controls: record.controls().to_vec(),
                }
            })
            .collect()
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> DeviceRecord {
        DeviceRecord::new(DeviceId::new(id), DeviceType::Amplifier)
    }

    #[test]
    fn test_insert_is_idempotent_per_identifier() {
        let inventory = Inventory::new();
        assert!(inventory.insert_if_absent(record("Amp1")));
        assert!(!inventory.insert_if_absent(record("Amp1")));
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn test_ids_come_back_sorted() {
        let inventory = Inventory::new();
        for id in ["Mic2", "Amp1", "Cam1"] {
            inventory.insert_if_absent(record(id));
        }
        let ids = inventory.sorted_ids();
        let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["Amp1", "Cam1", "Mic2"]);
    }

    #[test]
    fn test_snapshot_all_clones_state() {
        let inventory = Inventory::new();
        inventory.insert_if_absent(record("Amp1"));

        {
            let slot = inventory.get(&DeviceId::new("Amp1")).unwrap();
            slot.lock().set_metric("level", "-6");
        }

        let snapshots = inventory.snapshot_all();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(
            snapshots[0].metrics.get("level").map(String::as_str),
            Some("-6")
        );
    }
}
