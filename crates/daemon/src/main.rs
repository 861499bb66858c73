#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! PulseOps daemon: monitors a transit corridor and serves the control-center API.

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use pulseops_daemon::{
    config::{
        DaemonConfig, ExternalConfig, GtfsConfig, PlannerConfig, DEFAULT_ANTHROPIC_URL,
        DEFAULT_MODEL,
    },
    http, monitor,
    service::PulseOpsService,
};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pulseops-daemon", version, about = "Transit incident copilot backend")]
struct Args {
    /// Listen address, e.g. 127.0.0.1:3000
    #[arg(long, env = "PULSEOPS_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Directory holding catalogues and the learning log.
    #[arg(long, env = "PULSEOPS_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Background monitor interval in seconds.
    #[arg(long, default_value_t = 30)]
    monitor_interval_seconds: u64,

    /// Timeout for feed and external API requests, in seconds.
    #[arg(long, default_value_t = 10)]
    http_timeout_seconds: u64,

    /// Log level (env-filter syntax).
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log: String,

    /// GTFS-Realtime TripUpdates feed URL (JSON encoding).
    #[arg(long, env = "GTFS_RT_URL")]
    gtfs_rt_url: Option<String>,

    /// Only count trips on this route.
    #[arg(long, env = "GTFS_RT_ROUTE_FILTER")]
    gtfs_rt_route_filter: Option<String>,

    #[arg(long, env = "GTFS_RT_SEGMENT_START_STOP_ID", default_value = "stop-100")]
    gtfs_rt_segment_start_stop_id: String,

    #[arg(long, env = "GTFS_RT_SEGMENT_END_STOP_ID", default_value = "stop-120")]
    gtfs_rt_segment_end_stop_id: String,

    /// Anthropic API key; planning is disabled without it.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_URL", default_value = DEFAULT_ANTHROPIC_URL)]
    anthropic_api_url: String,

    #[arg(long, env = "ANTHROPIC_MODEL", default_value = DEFAULT_MODEL)]
    anthropic_model: String,

    /// Incident-context flow URL. Defaults to this daemon's /fake-flow.
    #[arg(long, env = "POSTMAN_FLOW_URL")]
    flow_url: Option<String>,

    #[arg(long, env = "WEATHER_API_URL")]
    weather_api_url: Option<String>,

    #[arg(long, env = "WEATHER_API_KEY", hide_env_values = true)]
    weather_api_key: Option<String>,

    #[arg(long, env = "EVENTS_API_URL")]
    events_api_url: Option<String>,

    #[arg(long, env = "EVENTS_API_KEY", hide_env_values = true)]
    events_api_key: Option<String>,
}

impl Args {
    fn into_config(self) -> DaemonConfig {
        let flow_url = self
            .flow_url
            .unwrap_or_else(|| format!("http://{}/fake-flow", self.listen));
        DaemonConfig {
            listen: self.listen,
            data_dir: self.data_dir,
            monitor_interval_seconds: self.monitor_interval_seconds.max(1),
            http_timeout: Duration::from_secs(self.http_timeout_seconds.max(1)),
            gtfs: GtfsConfig {
                url: self.gtfs_rt_url,
                route_filter: self.gtfs_rt_route_filter,
                segment_start_stop_id: self.gtfs_rt_segment_start_stop_id,
                segment_end_stop_id: self.gtfs_rt_segment_end_stop_id,
            },
            planner: PlannerConfig {
                api_key: self.anthropic_api_key,
                api_url: self.anthropic_api_url,
                model: self.anthropic_model,
                flow_url,
            },
            external: ExternalConfig {
                weather_url: self.weather_api_url,
                weather_key: self.weather_api_key,
                events_url: self.events_api_url,
                events_key: self.events_api_key,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = args.into_config();
    tracing::info!(?config, "starting daemon");

    let svc = Arc::new(PulseOpsService::new(&config).await?);

    monitor::spawn_monitor(
        Arc::clone(&svc),
        Duration::from_secs(config.monitor_interval_seconds),
    );

    let app = http::router(svc);

    tracing::info!(listen = %config.listen, "daemon listening");
    axum::serve(tokio::net::TcpListener::bind(config.listen).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown requested");
}
