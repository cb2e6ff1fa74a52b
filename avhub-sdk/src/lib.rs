//! # AV Hub SDK - Peripheral Monitoring and Control
//!
//! Connects to an AV hub's JSON-RPC service, discovers the peripherals it
//! manages, polls their health in the background, and exposes a snapshot
//! and control surface to the caller:
//!
//! ```rust,no_run
//! use avhub_sdk::{HubConfig, HubMonitor};
//!
//! fn main() -> Result<(), avhub_sdk::SdkError> {
//!     let config = HubConfig::new("hub.local", 1710, "https://hub.local", "admin", "secret");
//!     let monitor = HubMonitor::connect(config)?;
//!
//!     // Each call returns a fresh consolidated report and keeps the
//!     // background poller awake for the next grace window
//!     let report = monitor.statistics()?;
//!     for device in &report.devices {
//!         println!("{}: {:?}", device.id, device.metrics);
//!     }
//!
//!     // Control writes go straight through to the hub
//!     monitor.apply_control("Amp1", "level", "-12")?;
//!
//!     monitor.shutdown()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! avhub-sdk (HubMonitor facade)
//!     ↓
//! hub-state (Inventory, Scheduler, Liveness)
//!     ↓
//! rpc-channel (NUL-framed JSON-RPC session)
//! ```
//!
//! REST metadata calls authenticate through `token-guard`, which caches the
//! hub's bearer token and re-authenticates transparently when it expires.

// Main exports
pub use error::SdkError;
pub use monitor::{HubConfig, HubMonitor, StatsReport};

// Re-export commonly used types from the lower layers
pub use hub_state::{
    Control, DeviceId, DeviceSnapshot, DeviceType, GainReading, SchedulerConfig,
};
pub use rpc_channel::{ChannelStatus, ConnectionState};
pub use token_guard::TokenGuard;

// Internal modules
mod error;
mod monitor;
