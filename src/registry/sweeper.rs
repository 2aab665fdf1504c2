//! # TimeoutSweeper: periodic overdue/eviction scan.
//!
//! The sweeper is the registry's only background activity. On a fixed period
//! it walks the store and:
//! - marks non-terminal tasks past their deadline as `TimedOut`;
//! - evicts terminal tasks whose last update is older than the retention
//!   window, bounding memory growth.
//!
//! ## Loop shape
//! ```text
//! spawn(token) ──► loop {
//!   select! {
//!     _ = token.cancelled() => break,      // stop signal, no timer leak
//!     _ = ticker.tick()     => sweep_once()
//!   }
//! }
//! ```
//!
//! ## Rules
//! - Each sweep snapshots the id set **before** mutating, then re-checks every
//!   task under the write guard; tasks created or updated mid-sweep are never
//!   lost or double-processed.
//! - Sweeps are idempotent: with no overdue tasks a sweep is a no-op, and two
//!   back-to-back sweeps end in the same state as one.
//! - Only the sweeper assigns `TimedOut`; the public update path rejects it.
//! - Cancellation stops scheduling; it does not interrupt a sweep already in
//!   progress (sweeps are short — one scan over the id set).

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::registry::store::TaskStore;

/// Terminal entries survive this many sweep periods before eviction.
const RETENTION_SWEEPS: u32 = 2;

/// Periodic scan that expires overdue tasks and evicts stale terminal ones.
pub struct TimeoutSweeper {
    store: Arc<TaskStore>,
    period: Duration,
    retention: Duration,
}

impl TimeoutSweeper {
    /// Creates a sweeper over `store` with the given sweep period.
    ///
    /// The retention window for terminal entries is `period * 2`, so a
    /// finished task stays queryable for at least one full extra sweep before
    /// disappearing.
    pub fn new(store: Arc<TaskStore>, period: Duration) -> Self {
        Self {
            store,
            retention: period * RETENTION_SWEEPS,
            period,
        }
    }

    /// Spawns the sweep loop on the current runtime.
    ///
    /// The first sweep runs one full period after spawning, not immediately.
    /// Cancelling `token` stops the loop at the next scheduling point; the
    /// returned handle joins shortly after.
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        self.sweep_once().await;
                    }
                }
            }
            debug!("sweeper stopped");
        })
    }

    /// Runs one sweep cycle: expire overdue tasks, then evict stale terminal
    /// entries.
    ///
    /// Public so tests and embedders can drive sweeps manually instead of
    /// waiting out the period.
    pub async fn sweep_once(&self) {
        let now = SystemTime::now();
        let ids = self.store.ids().await;

        let mut expired = 0usize;
        let mut evicted = 0usize;
        for id in &ids {
            if self.store.expire(id, now).await {
                expired += 1;
                debug!(task = id.as_str(), "task deadline exceeded");
            }
            if self.store.evict_if_stale(id, now, self.retention).await {
                evicted += 1;
            }
        }

        if expired > 0 || evicted > 0 {
            info!(scanned = ids.len(), expired, evicted, "sweep finished");
        }
    }
}
