//! Component discovery
//!
//! Invoked by the control plane each time consumer-facing statistics are
//! recomputed. One listing call enumerates the hub's components; supported
//! peripheral types enter the inventory (once), the distinguished gain
//! stage is fetched and rendered inline for the current pass, and unknown
//! types are skipped with a warning. Discovery never removes records:
//! device disappearance is not modeled, a silent device just keeps its last
//! snapshot.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, StateError};
use crate::inventory::Inventory;
use crate::mapper::parse_controls;
use crate::model::{Control, DeviceId, DeviceRecord, DeviceType, GAIN_TAG};
use crate::rpc::HubRpc;

/// Inline reading of one gain stage, produced during the statistics pass
/// rather than by the background scheduler
#[derive(Debug, Clone)]
pub struct GainReading {
    pub component: String,
    pub controls: Vec<Control>,
}

#[derive(Deserialize)]
struct ComponentListing {
    result: Vec<ComponentEntry>,
}

#[derive(Deserialize)]
struct ComponentEntry {
    id: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Run one discovery pass. Idempotent for already-known identifiers.
pub fn discover(rpc: &dyn HubRpc, inventory: &Inventory) -> Result<Vec<GainReading>> {
    let payload = rpc.list_components()?;
    let listing: ComponentListing = serde_json::from_str(&payload)
        .map_err(|err| StateError::Parse(format!("component listing: {}", err)))?;

    let mut gains = Vec::new();
    for entry in listing.result {
        if entry.kind == GAIN_TAG {
            // Rendered inline with the current pass, never scheduled
            let controls_payload = rpc.component_controls(&entry.id)?;
            gains.push(GainReading {
                component: entry.id,
                controls: parse_controls(&controls_payload)?,
            });
            continue;
        }

        match DeviceType::from_tag(&entry.kind) {
            Some(kind) => {
                let id = DeviceId::new(&entry.id);
                if inventory.insert_if_absent(DeviceRecord::new(id, kind)) {
                    debug!(component = %entry.id, kind = %kind, "discovered peripheral device");
                }
            }
            None => {
                warn!(
                    component = %entry.id,
                    kind = %entry.kind,
                    "skipping component of unsupported type"
                );
            }
        }
    }

    Ok(gains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedRpc {
        listing: String,
        list_calls: AtomicUsize,
        control_calls: AtomicUsize,
    }

    impl ScriptedRpc {
        fn new(listing: &str) -> Self {
            Self {
                listing: listing.to_string(),
                list_calls: AtomicUsize::new(0),
                control_calls: AtomicUsize::new(0),
            }
        }
    }

    impl HubRpc for ScriptedRpc {
        fn list_components(&self) -> Result<String> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.listing.clone())
        }

        fn component_controls(&self, _id: &str) -> Result<String> {
            self.control_calls.fetch_add(1, Ordering::SeqCst);
            Ok(r#"{"result":{"controls":[{"name":"gain","value":-3.0,"unit":"dB"}]}}"#.to_string())
        }

        fn set_control(&self, _id: &str, _control: &str, _value: &str) -> Result<String> {
            unreachable!("discovery never sets controls")
        }
    }

    const LISTING: &str = r#"{
        "jsonrpc": "2.0",
        "result": [
            {"id": "Amp1", "type": "amp"},
            {"id": "MasterGain", "type": "gain"},
            {"id": "Cam1", "type": "camera"},
            {"id": "FogMachine", "type": "fx"}
        ],
        "id": 1234
    }"#;

    #[test]
    fn test_discovery_populates_supported_types_only() {
        let rpc = ScriptedRpc::new(LISTING);
        let inventory = Inventory::new();

        let gains = discover(&rpc, &inventory).unwrap();

        // Gain handled inline, unsupported type skipped
        assert_eq!(inventory.len(), 2);
        assert!(inventory.contains(&DeviceId::new("Amp1")));
        assert!(inventory.contains(&DeviceId::new("Cam1")));
        assert!(!inventory.contains(&DeviceId::new("MasterGain")));
        assert!(!inventory.contains(&DeviceId::new("FogMachine")));

        assert_eq!(gains.len(), 1);
        assert_eq!(gains[0].component, "MasterGain");
        assert_eq!(gains[0].controls[0].numeric_value(), Some(-3.0));
    }

    #[test]
    fn test_discovery_is_idempotent() {
        let rpc = ScriptedRpc::new(LISTING);
        let inventory = Inventory::new();

        discover(&rpc, &inventory).unwrap();
        discover(&rpc, &inventory).unwrap();

        assert_eq!(inventory.len(), 2);
        assert_eq!(rpc.list_calls.load(Ordering::SeqCst), 2);
        // The gain stage is fetched on every pass
        assert_eq!(rpc.control_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_discovery_propagates_listing_failures() {
        struct FailingRpc;
        impl HubRpc for FailingRpc {
            fn list_components(&self) -> Result<String> {
                Err(StateError::Protocol("aborted exchange".to_string()))
            }
            fn component_controls(&self, _id: &str) -> Result<String> {
                unreachable!()
            }
            fn set_control(&self, _id: &str, _control: &str, _value: &str) -> Result<String> {
                unreachable!()
            }
        }

        let inventory = Inventory::new();
        assert!(discover(&FailingRpc, &inventory).is_err());
        assert!(inventory.is_empty());
    }
}
