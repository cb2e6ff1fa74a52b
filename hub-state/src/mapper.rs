//! Device-mapper seam
//!
//! Given the raw control-list payload for one device, a mapper updates that
//! device's snapshot and control list in place. Per-type mapping tables
//! live outside this crate; the registry ships with a generic mapper so the
//! SDK works stand-alone, and callers can register richer mappers per type.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Result, StateError};
use crate::model::{Control, DeviceRecord, DeviceType};

/// Updates one device's snapshot from a raw control-list payload
///
/// The scheduler calls this once per device per iteration and treats any
/// error as a per-device failure: logged, skipped, never aborting the shard
/// or the iteration.
pub trait DeviceMapper: Send + Sync {
    fn apply(&self, device: &mut DeviceRecord, payload: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct ControlListPayload {
    result: ControlList,
}

#[derive(Deserialize)]
struct ControlList {
    controls: Vec<WireControl>,
}

#[derive(Deserialize)]
struct WireControl {
    name: String,
    value: serde_json::Value,
    #[serde(default)]
    unit: Option<String>,
}

impl WireControl {
    fn value_text(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Parse a control-list payload into typed controls
pub(crate) fn parse_controls(payload: &str) -> Result<Vec<Control>> {
    let parsed: ControlListPayload = serde_json::from_str(payload)
        .map_err(|err| StateError::Parse(format!("control list payload: {}", err)))?;
    Ok(parsed
        .result
        .controls
        .into_iter()
        .map(|wire| {
            let value = wire.value_text();
            Control::new(wire.name, value, wire.unit)
        })
        .collect())
}

/// Default mapper: every control becomes one snapshot metric keyed by the
/// control name, unit kept on the control rather than embedded in the value
pub struct GenericControlMapper;

impl DeviceMapper for GenericControlMapper {
    fn apply(&self, device: &mut DeviceRecord, payload: &str) -> Result<()> {
        let controls = parse_controls(payload)?;
        for control in &controls {
            device.set_metric(control.name.clone(), control.value.clone());
        }
        device.replace_controls(controls);
        Ok(())
    }
}

/// Mapper lookup keyed by device type, with the generic mapper as fallback
pub struct MapperRegistry {
    mappers: HashMap<DeviceType, Arc<dyn DeviceMapper>>,
    fallback: Arc<dyn DeviceMapper>,
}

impl MapperRegistry {
    /// Registry where every type falls back to [`GenericControlMapper`]
    pub fn with_default() -> Self {
        Self {
            mappers: HashMap::new(),
            fallback: Arc::new(GenericControlMapper),
        }
    }

    /// Register a type-specific mapper
    pub fn register(&mut self, kind: DeviceType, mapper: Arc<dyn DeviceMapper>) {
        self.mappers.insert(kind, mapper);
    }

    pub fn mapper_for(&self, kind: DeviceType) -> Arc<dyn DeviceMapper> {
        self.mappers
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

impl Default for MapperRegistry {
    fn default() -> Self {
        Self::with_default()
    }
}
