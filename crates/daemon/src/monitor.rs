use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::service::PulseOpsService;

/// Spawns the background corridor monitor.
pub fn spawn_monitor(svc: Arc<PulseOpsService>, every: Duration) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), "monitor starting");
    tokio::spawn(async move {
        let mut tick = interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            match svc.monitor_tick().await {
                Some(incident) => info!(incident_id = %incident.id, "monitor opened incident"),
                None => debug!("monitor tick: no new incident"),
            }
        }
    })
}
