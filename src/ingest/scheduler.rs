// src/ingest/scheduler.rs
use crate::config::RelayConfig;
use crate::ingest::types::FeedSource;
use crate::relay::Relay;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub startup_delay_secs: u64,
    pub interval_secs: u64,
}

impl From<&RelayConfig> for SchedulerCfg {
    fn from(cfg: &RelayConfig) -> Self {
        Self {
            startup_delay_secs: cfg.startup_delay_secs,
            interval_secs: cfg.poll_interval_secs,
        }
    }
}

/// Spawn the polling loop: wait `startup_delay_secs`, then run a cycle every
/// `interval_secs`. Cycles never overlap; a slow cycle delays the next tick.
pub fn spawn_scheduler(
    cfg: SchedulerCfg,
    relay: Arc<Relay>,
    sources: Arc<Vec<Box<dyn FeedSource>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(cfg.startup_delay_secs)).await;
        tracing::info!(target: "ingest", feeds = sources.len(), "starting feed monitoring");

        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = relay.run_cycle(&sources).await;
            counter!("relay_cycles_total").increment(1);
            tracing::info!(
                target: "ingest",
                events = report.events,
                next_check_mins = cfg.interval_secs / 60,
                "cycle tick"
            );
        }
    })
}
