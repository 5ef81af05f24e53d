// src/pipeline/sweep.rs

//! Background removal of expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::storage::CacheStore;

/// Handle to a running sweeper. The task stops when the handle is dropped.
#[derive(Debug)]
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run one sweep and log the outcome. Errors are logged, never returned.
pub async fn run_sweep(store: &dyn CacheStore) -> usize {
    match store.sweep().await {
        Ok(0) => {
            log::debug!("Sweep ({}): nothing expired", store.backend_name());
            0
        }
        Ok(removed) => {
            log::info!(
                "Sweep ({}): removed {} expired entries",
                store.backend_name(),
                removed
            );
            removed
        }
        Err(e) => {
            log::warn!("Sweep ({}) failed: {}", store.backend_name(), e);
            0
        }
    }
}

/// Sweep `store` every `interval`, starting one interval from now.
pub fn spawn_sweeper(store: Arc<dyn CacheStore>, interval: Duration) -> SweeperHandle {
    log::info!(
        "Starting {} cache sweeper every {:?}",
        store.backend_name(),
        interval
    );

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_sweep(store.as_ref()).await;
        }
    });

    SweeperHandle { task }
}
