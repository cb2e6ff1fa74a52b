//! Polling scheduler
//!
//! A long-lived background thread partitions the inventory into shards,
//! submits them to a bounded worker pool, drains them through a completion
//! channel, and paces iterations with a fixed inter-iteration floor. A
//! liveness gate skips whole iterations while no consumer is asking for
//! data. The loop only stops on the cooperative shutdown flag, checked
//! every tick; device errors never terminate it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::error::{Result, StateError};
use crate::inventory::Inventory;
use crate::liveness::LivenessGate;
use crate::mapper::MapperRegistry;
use crate::model::DeviceId;
use crate::rpc::HubRpc;

/// Scheduler timing and sharding knobs. The defaults are the protocol's
/// fixed values; tests shrink the durations.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Loop tick: shutdown/pause are re-evaluated at this interval
    pub tick: Duration,
    /// Maximum devices per shard
    pub shard_size: usize,
    /// Worker pool size: shards in flight at once
    pub max_inflight_shards: usize,
    /// Pacing floor between iterations
    pub iteration_delay: Duration,
    /// How often the pacing wait re-checks the shutdown flag
    pub pacing_poll: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(500),
            shard_size: 2,
            max_inflight_shards: 3,
            iteration_delay: Duration::from_secs(30),
            pacing_poll: Duration::from_secs(1),
        }
    }
}

/// Shared collaborators every shard worker needs
pub(crate) struct PollContext {
    pub rpc: Arc<dyn HubRpc>,
    pub inventory: Arc<Inventory>,
    pub mappers: Arc<MapperRegistry>,
}

/// Partition the sorted identifier list into shards for one iteration.
///
/// The walk starts at the cursor (first identifier when unset), wraps past
/// the end, and stops once `max_shards` shards are filled. Returns the
/// shards and the next cursor: the first identifier not covered, or the
/// first identifier overall when the sweep finished in one iteration.
pub(crate) fn plan_shards(
    ids: &[DeviceId],
    cursor: Option<&DeviceId>,
    shard_size: usize,
    max_shards: usize,
) -> (Vec<Vec<DeviceId>>, Option<DeviceId>) {
    if ids.is_empty() || shard_size == 0 || max_shards == 0 {
        return (Vec::new(), cursor.cloned());
    }

    // First identifier at or past the cursor; the inventory is append-only
    // so the cursor normally still exists
    let start = cursor
        .and_then(|c| ids.iter().position(|id| id >= c))
        .unwrap_or(0);

    let order: Vec<&DeviceId> = ids[start..].iter().chain(ids[..start].iter()).collect();
    let capacity = shard_size * max_shards;
    let covered = order.len().min(capacity);

    let shards = order[..covered]
        .chunks(shard_size)
        .map(|chunk| chunk.iter().map(|id| (*id).clone()).collect())
        .collect();

    let next_cursor = if covered < order.len() {
        Some(order[covered].clone())
    } else {
        Some(ids[0].clone())
    };

    (shards, next_cursor)
}

/// One unit of scheduled work plus its completion signal
struct ShardJob {
    ids: Vec<DeviceId>,
    done: mpsc::Sender<()>,
}

/// Fixed-size pool of shard worker threads over a shared job channel
struct WorkerPool {
    job_tx: Option<mpsc::Sender<ShardJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    fn spawn(size: usize, ctx: Arc<PollContext>) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<ShardJob>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let workers = (0..size)
            .filter_map(|n| {
                let rx = Arc::clone(&job_rx);
                let ctx = Arc::clone(&ctx);
                thread::Builder::new()
                    .name(format!("avhub-shard-{}", n))
                    .spawn(move || worker_loop(rx, ctx))
                    .ok()
            })
            .collect();

        Self {
            job_tx: Some(job_tx),
            workers,
        }
    }

    fn submit(&self, job: ShardJob) -> bool {
        match &self.job_tx {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        }
    }

    /// Close the job channel and join every worker
    fn shutdown(&mut self) {
        self.job_tx = None;
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(rx: Arc<Mutex<mpsc::Receiver<ShardJob>>>, ctx: Arc<PollContext>) {
    loop {
        // The guard is held across the blocking recv: idle workers queue on
        // the lock and each job is handed to exactly one worker
        let job = { rx.lock().recv() };
        match job {
            Ok(job) => {
                run_shard(&ctx, &job.ids);
                let _ = job.done.send(());
            }
            Err(_) => break,
        }
    }
}

/// Poll every device in the shard, best-effort: one device's failure never
/// affects the rest of the shard or the iteration
fn run_shard(ctx: &PollContext, ids: &[DeviceId]) {
    for id in ids {
        if let Err(err) = poll_device(ctx, id) {
            warn!(device = %id, error = %err, "device poll failed, keeping last snapshot");
        }
    }
}

fn poll_device(ctx: &PollContext, id: &DeviceId) -> Result<()> {
    let slot = ctx
        .inventory
        .get(id)
        .ok_or_else(|| StateError::DeviceNotFound(id.clone()))?;
    let kind = slot.lock().kind();

    let payload = ctx.rpc.component_controls(id.as_str())?;

    let mapper = ctx.mappers.mapper_for(kind);
    let mut record = slot.lock();
    mapper.apply(&mut record, &payload)
}

/// Handle to the background polling loop
pub struct PollScheduler {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PollScheduler {
    /// Spawn the scheduler thread and its worker pool
    pub fn spawn(
        config: SchedulerConfig,
        rpc: Arc<dyn HubRpc>,
        inventory: Arc<Inventory>,
        mappers: Arc<MapperRegistry>,
        liveness: Arc<LivenessGate>,
    ) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let ctx = Arc::new(PollContext {
            rpc,
            inventory,
            mappers,
        });

        let thread = thread::Builder::new()
            .name("avhub-poll-scheduler".to_string())
            .spawn(move || run_loop(config, ctx, liveness, flag))
            .map_err(|err| StateError::Init(format!("failed to spawn scheduler: {}", err)))?;

        Ok(Self {
            shutdown,
            thread: Some(thread),
        })
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Signal the loop and wait for it (and the worker pool) to stop
    pub fn shutdown(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::Relaxed);
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| StateError::ShutdownFailed),
            None => Ok(()),
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        // Cooperative: the loop notices the flag on its next tick
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

fn run_loop(
    config: SchedulerConfig,
    ctx: Arc<PollContext>,
    liveness: Arc<LivenessGate>,
    shutdown: Arc<AtomicBool>,
) {
    info!("poll scheduler started");
    let mut pool = WorkerPool::spawn(config.max_inflight_shards, Arc::clone(&ctx));
    let mut cursor: Option<DeviceId> = None;

    'outer: loop {
        thread::sleep(config.tick);
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        if liveness.is_paused() {
            trace!("no consumer demand, skipping iteration");
            continue;
        }

        let ids = ctx.inventory.sorted_ids();
        if ids.is_empty() {
            continue;
        }

        let (shards, next_cursor) = plan_shards(
            &ids,
            cursor.as_ref(),
            config.shard_size,
            config.max_inflight_shards,
        );
        cursor = next_cursor;

        debug!(
            devices = ids.len(),
            shards = shards.len(),
            cursor = cursor.as_ref().map(|c| c.as_str()).unwrap_or("-"),
            "scheduling iteration"
        );

        let (done_tx, done_rx) = mpsc::channel();
        let mut submitted = 0usize;
        for shard in shards {
            if pool.submit(ShardJob {
                ids: shard,
                done: done_tx.clone(),
            }) {
                submitted += 1;
            }
        }
        drop(done_tx);

        // Drain without an overall timeout: a slow hub stretches the
        // iteration instead of corrupting results. The shutdown flag is
        // still honored between completion signals.
        let mut completed = 0usize;
        while completed < submitted {
            match done_rx.recv_timeout(config.tick) {
                Ok(()) => completed += 1,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if shutdown.load(Ordering::Relaxed) {
                        break 'outer;
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        // Pacing floor before the next iteration
        let resume_at = Instant::now() + config.iteration_delay;
        loop {
            let remaining = resume_at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            if shutdown.load(Ordering::Relaxed) {
                break 'outer;
            }
            thread::sleep(config.pacing_poll.min(remaining));
        }
    }

    pool.shutdown();
    info!("poll scheduler stopped");
}
