#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Drives the daemon's control loop by posting `/agent/tick` on an interval.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pulseops_core::api::{TickResponse, TriggerResponse};
use reqwest::Client;
use tokio::{signal, time::interval};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pulseops-driver", version, about = "Tick driver for the PulseOps daemon")]
struct Args {
    /// Daemon base URL, e.g. http://127.0.0.1:3000
    #[arg(long, env = "PULSEOPS_URL", default_value = "http://127.0.0.1:3000")]
    daemon_url: String,

    /// Seconds between ticks.
    #[arg(long, default_value_t = 15)]
    interval_seconds: u64,

    /// Trigger a simulated disruption before the first tick.
    #[arg(long, default_value_t = false)]
    trigger_disruption: bool,

    /// Stop after this many ticks (runs until Ctrl-C when omitted).
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Log level (env-filter syntax).
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base = args.daemon_url.trim_end_matches('/').to_string();
    let client = Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .context("http client")?;

    info!(daemon = %base, interval_secs = args.interval_seconds, "driver starting");

    if args.trigger_disruption {
        match trigger(&client, &base).await {
            Ok(resp) => info!(
                avg_delay_minutes = resp.world_status.avg_delay_minutes,
                "disruption triggered"
            ),
            Err(e) => warn!(error = %format!("{e:#}"), "trigger failed"),
        }
    }

    let mut ticker = interval(Duration::from_secs(args.interval_seconds.max(1)));
    let mut ticks: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }

        match tick(&client, &base).await {
            Ok(resp) => log_tick(&resp),
            Err(e) => warn!(error = %format!("{e:#}"), "tick failed; retrying next interval"),
        }

        ticks += 1;
        if args.max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
    }
    Ok(())
}

async fn trigger(client: &Client, base: &str) -> Result<TriggerResponse> {
    client
        .post(format!("{base}/debug/trigger-disruption"))
        .send()
        .await
        .context("trigger request")?
        .error_for_status()
        .context("trigger status")?
        .json::<TriggerResponse>()
        .await
        .context("trigger decode")
}

async fn tick(client: &Client, base: &str) -> Result<TickResponse> {
    client
        .post(format!("{base}/agent/tick"))
        .send()
        .await
        .context("tick request")?
        .error_for_status()
        .context("tick status")?
        .json::<TickResponse>()
        .await
        .context("tick decode")
}

fn log_tick(resp: &TickResponse) {
    let ws = &resp.world_status;
    match (&resp.incident_created, &resp.warning) {
        (Some(id), _) => info!(
            incident_id = %id,
            actions_planned = resp.actions_planned.unwrap_or(0),
            avg_delay_minutes = ws.avg_delay_minutes,
            "incident created"
        ),
        (None, Some(warning)) => warn!(%warning, avg_delay_minutes = ws.avg_delay_minutes, "tick warning"),
        (None, None) => info!(
            avg_delay_minutes = ws.avg_delay_minutes,
            source = ?ws.source,
            "tick ok"
        ),
    }
}
