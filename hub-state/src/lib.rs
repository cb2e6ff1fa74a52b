//! Peripheral inventory and polling scheduler for the hub SDK
//!
//! This crate tracks the peripheral devices attached to the central
//! audio/video processing hub and keeps their snapshots fresh:
//!
//! - [`Inventory`]: ordered, append-only collection of discovered devices
//! - [`discover`]: one listing pass per statistics retrieval; gain stages
//!   are rendered inline, supported types enter the inventory once
//! - [`PollScheduler`]: background loop that shards the inventory across a
//!   bounded worker pool, round-robining when the inventory outgrows one
//!   iteration's capacity
//! - [`LivenessGate`]: pauses the whole loop when no consumer has asked for
//!   statistics within the grace period
//! - [`DeviceMapper`]: seam for the per-type field-mapping tables that live
//!   outside this crate
//!
//! Device disappearance is deliberately not modeled: a device that stops
//! responding keeps its last snapshot and simply stops being updated.

pub mod discovery;
pub mod error;
pub mod inventory;
pub mod liveness;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod rpc;
pub mod scheduler;

pub use discovery::{discover, GainReading};
pub use error::{Result, StateError};
pub use inventory::{DeviceSlot, DeviceSnapshot, Inventory};
pub use liveness::{LivenessGate, DEFAULT_GRACE};
pub use mapper::{DeviceMapper, GenericControlMapper, MapperRegistry};
pub use model::{Control, DeviceId, DeviceRecord, DeviceType, GAIN_TAG};
pub use rpc::HubRpc;
pub use scheduler::{PollScheduler, SchedulerConfig};
