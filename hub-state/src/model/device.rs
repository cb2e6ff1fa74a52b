//! Peripheral device record: the last-read snapshot of one device

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{DeviceId, DeviceType};

/// One exposed control on a peripheral device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub name: String,
    /// Last-read value, kept as the hub reported it
    pub value: String,
    #[serde(default)]
    pub unit: Option<String>,
}

impl Control {
    pub fn new(name: impl Into<String>, value: impl Into<String>, unit: Option<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit,
        }
    }

    /// Numeric view of the value. A value that does not parse is simply
    /// "no numeric value", not an error.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }
}

/// Snapshot and control list for one discovered peripheral device
///
/// Created once per discovered identifier and never removed for the
/// lifetime of the process. The snapshot is mutated in place on every
/// successful poll; a device that stops responding simply stops being
/// updated and its last snapshot remains visible. The type is immutable
/// after creation.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    id: DeviceId,
    kind: DeviceType,
    snapshot: HashMap<String, String>,
    controls: Vec<Control>,
}

impl DeviceRecord {
    pub fn new(id: DeviceId, kind: DeviceType) -> Self {
        Self {
            id,
            kind,
            snapshot: HashMap::new(),
            controls: Vec::new(),
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn kind(&self) -> DeviceType {
        self.kind
    }

    pub fn snapshot(&self) -> &HashMap<String, String> {
        &self.snapshot
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Write one metric into the snapshot
    pub fn set_metric(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.snapshot.insert(key.into(), value.into());
    }

    /// Replace the exposed control list after a successful poll
    pub fn replace_controls(&mut self, controls: Vec<Control>) {
        self.controls = controls;
    }

    /// Update the stored value of one control, if present
    pub fn update_control_value(&mut self, name: &str, value: &str) -> bool {
        match self.controls.iter_mut().find(|c| c.name == name) {
            Some(control) => {
                control.value = value.to_string();
                self.snapshot.insert(name.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_value_parses() {
        let control = Control::new("gain", "-12.5", Some("dB".to_string()));
        assert_eq!(control.numeric_value(), Some(-12.5));
    }

    #[test]
    fn test_numeric_value_absent_for_labels() {
        let control = Control::new("mute", "muted", None);
        assert_eq!(control.numeric_value(), None);
    }

    #[test]
    fn test_update_control_value() {
        let mut record = DeviceRecord::new(DeviceId::new("Amp1"), DeviceType::Amplifier);
        record.replace_controls(vec![Control::new("level", "0", Some("dB".to_string()))]);

        assert!(record.update_control_value("level", "-6"));
        assert_eq!(record.controls()[0].value, "-6");
        assert_eq!(record.snapshot().get("level").map(String::as_str), Some("-6"));

        assert!(!record.update_control_value("missing", "1"));
    }
}
