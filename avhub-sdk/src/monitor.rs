//! HubMonitor - main entry point for the SDK
//!
//! Wires the RPC channel, inventory, poll scheduler, liveness gate, and
//! token guard together and exposes the three host-facing operations:
//! statistics retrieval, control application, and shutdown.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use hub_state::{
    discover, DeviceId, DeviceSnapshot, GainReading, HubRpc, Inventory, LivenessGate,
    MapperRegistry, PollScheduler, SchedulerConfig, StateError,
};
use rpc_channel::{ChannelConfig, ChannelStatus, RpcClient};
use token_guard::TokenGuard;

use crate::SdkError;

/// Connection settings for one hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Hub hostname or IP
    pub host: String,
    /// Port of the NUL-framed RPC service
    pub rpc_port: u16,
    /// Base URL of the hub's REST surface (token + metadata). Empty string
    /// disables the metadata fetch.
    pub api_base: String,
    pub username: String,
    pub password: String,
    /// Background scheduler knobs (protocol defaults)
    pub scheduler: SchedulerConfig,
    /// Consumer grace period before background polling pauses
    pub grace: Duration,
}

impl HubConfig {
    pub fn new(
        host: impl Into<String>,
        rpc_port: u16,
        api_base: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            rpc_port,
            api_base: api_base.into(),
            username: username.into(),
            password: password.into(),
            scheduler: SchedulerConfig::default(),
            grace: hub_state::DEFAULT_GRACE,
        }
    }
}

/// One statistics pass: hub metadata, inline gain readings, and the
/// last-read snapshot of every inventoried device
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub hub: HashMap<String, String>,
    #[serde(skip)]
    pub gains: Vec<GainReading>,
    pub devices: Vec<DeviceSnapshot>,
}

/// Monitors one hub and the peripheral devices attached to it
///
/// Construction spawns the background poll scheduler; `statistics()` and
/// `apply_control()` run on caller threads and are serialized against each
/// other by a re-entrant lock, so a consumer never observes a half-applied
/// control in a snapshot.
pub struct HubMonitor {
    rpc: Arc<dyn HubRpc>,
    channel: Option<Arc<RpcClient>>,
    inventory: Arc<Inventory>,
    liveness: Arc<LivenessGate>,
    tokens: TokenGuard,
    agent: ureq::Agent,
    api_base: String,
    stats_lock: ReentrantMutex<()>,
    scheduler: Mutex<Option<PollScheduler>>,
}

impl HubMonitor {
    /// Connect to a hub with the default mapper registry
    pub fn connect(config: HubConfig) -> Result<Self, SdkError> {
        Self::connect_with_mappers(config, MapperRegistry::with_default())
    }

    /// Connect with host-supplied per-type device mappers
    pub fn connect_with_mappers(
        config: HubConfig,
        mappers: MapperRegistry,
    ) -> Result<Self, SdkError> {
        let channel_config = ChannelConfig::new(&config.host, config.rpc_port)
            .map_err(|err| SdkError::Config(err.to_string()))?;
        let client = Arc::new(RpcClient::new(channel_config));
        Self::assemble(
            Arc::clone(&client) as Arc<dyn HubRpc>,
            Some(client),
            mappers,
            config,
        )
    }

    fn assemble(
        rpc: Arc<dyn HubRpc>,
        channel: Option<Arc<RpcClient>>,
        mappers: MapperRegistry,
        config: HubConfig,
    ) -> Result<Self, SdkError> {
        let inventory = Arc::new(Inventory::new());
        let mappers = Arc::new(mappers);
        let liveness = Arc::new(LivenessGate::with_grace(config.grace));

        let scheduler = PollScheduler::spawn(
            config.scheduler.clone(),
            Arc::clone(&rpc),
            Arc::clone(&inventory),
            Arc::clone(&mappers),
            Arc::clone(&liveness),
        )?;

        Ok(Self {
            rpc,
            channel,
            inventory,
            liveness,
            tokens: TokenGuard::new(&config.api_base, &config.username, &config.password),
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(5))
                .timeout_read(Duration::from_secs(10))
                .build(),
            api_base: config.api_base,
            stats_lock: ReentrantMutex::new(()),
            scheduler: Mutex::new(Some(scheduler)),
        })
    }

    /// Recompute the consumer-facing statistics.
    ///
    /// Records the consumer poll (resetting the liveness deadline), runs a
    /// discovery pass (gain stages rendered inline), fetches hub metadata
    /// over HTTP, and clones every device snapshot. An unreachable hub
    /// surfaces as a single [`SdkError::HubUnreachable`] rather than
    /// partial data; the next call after the hub recovers succeeds without
    /// any manual reset.
    pub fn statistics(&self) -> Result<StatsReport, SdkError> {
        let _guard = self.stats_lock.lock();
        self.liveness.record_consumer_poll();

        let gains = discover(self.rpc.as_ref(), &self.inventory).map_err(map_reachability)?;
        let hub = self.hub_metadata()?;
        let devices = self.inventory.snapshot_all();

        debug!(devices = devices.len(), gains = gains.len(), "statistics pass complete");
        Ok(StatsReport { hub, gains, devices })
    }

    /// Apply a control value to one device.
    ///
    /// Serialized against statistics retrieval by the same re-entrant
    /// lock; on success the device's snapshot is updated in place.
    pub fn apply_control(&self, device: &str, control: &str, value: &str) -> Result<(), SdkError> {
        let _guard = self.stats_lock.lock();

        let id = DeviceId::new(device);
        let slot = self
            .inventory
            .get(&id)
            .ok_or_else(|| SdkError::DeviceNotFound(device.to_string()))?;

        match self.rpc.set_control(id.as_str(), control, value) {
            Ok(_) => {
                slot.lock().update_control_value(control, value);
                Ok(())
            }
            Err(err) if err.is_command_failure() => {
                warn!(device, control, error = %err, "hub rejected control");
                Err(SdkError::ControlRejected(err.to_string()))
            }
            Err(err) => Err(map_reachability(err)),
        }
    }

    /// Connection state of the RPC channel, when this monitor owns one
    pub fn channel_status(&self) -> Option<ChannelStatus> {
        self.channel.as_ref().map(|c| c.status())
    }

    /// Stop the background loop and worker pool, release the channel
    pub fn shutdown(&self) -> Result<(), SdkError> {
        if let Some(scheduler) = self.scheduler.lock().take() {
            scheduler.shutdown()?;
        }
        if let Some(channel) = &self.channel {
            channel.disconnect();
        }
        Ok(())
    }

    fn hub_metadata(&self) -> Result<HashMap<String, String>, SdkError> {
        if self.api_base.is_empty() {
            return Ok(HashMap::new());
        }

        let token = self
            .tokens
            .bearer()
            .map_err(|err| SdkError::HubUnreachable(err.to_string()))?;

        let url = format!("{}/api/v1/device", self.api_base);
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &format!("Bearer {}", token))
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(code, _) if code == 401 || code == 403 => {
                    // Stale token: clear it so the next attempt re-authenticates
                    self.tokens.invalidate();
                    SdkError::HubUnreachable(format!("hub rejected token (HTTP {})", code))
                }
                other => SdkError::HubUnreachable(other.to_string()),
            })?;

        let raw: HashMap<String, serde_json::Value> = response
            .into_json()
            .map_err(|err| SdkError::HubUnreachable(format!("malformed metadata: {}", err)))?;

        Ok(raw
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect())
    }
}

/// Collapse transport-level failures into one reachability error; command
/// failures keep their own meaning
fn map_reachability(err: StateError) -> SdkError {
    if err.is_command_failure() {
        SdkError::State(err)
    } else {
        SdkError::HubUnreachable(err.to_string())
    }
}
