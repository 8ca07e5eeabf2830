//! rackpulsed — the server-status → Cloud Monitoring agent.
//!
//! Polls a local server-status endpoint on a fixed interval and
//! forwards the busy/idle worker counters to Cloud Monitoring as custom
//! gauges, labeled with the identity of the pod the agent runs beside.
//! Resource identity is resolved once at startup; every cycle after
//! that is fetch → decode → two independent writes → sleep.
//!
//! # Usage
//!
//! ```text
//! rackpulsed --namespace prod --pod-name web-0
//! ```

mod cycle;

use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tracing::info;

use rackpulse_export::{MetricEmitter, PodIdentity, ResourceLabels, ResourceModel};
use rackpulse_gcp::{
    DEFAULT_METADATA_BASE, DEFAULT_MONITORING_BASE, MetadataClient, MonitoringClient,
};

use crate::cycle::AgentContext;

#[derive(Parser)]
#[command(name = "rackpulsed", about = "server-status to Cloud Monitoring exporter")]
struct Cli {
    /// Namespace of the pod being reported on.
    #[arg(long)]
    namespace: String,

    /// Name of the pod being reported on.
    #[arg(long)]
    pod_name: String,

    /// Pod UID. Required by the legacy container resource model.
    #[arg(long)]
    pod_id: Option<String>,

    /// Monitored-resource label profile for the writes.
    #[arg(long, value_enum, default_value_t = ResourceModelArg::Pod)]
    resource_model: ResourceModelArg,

    /// Poll interval in seconds. The flag keeps its historical name;
    /// existing deployments pass values calibrated in seconds.
    #[arg(long = "interval-milli-second", default_value_t = 60)]
    interval_milli_second: u64,

    /// URL of the server-status endpoint to poll.
    #[arg(long, default_value = "http://localhost:3000/server-status?json")]
    status_url: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResourceModelArg {
    Pod,
    Container,
}

impl From<ResourceModelArg> for ResourceModel {
    fn from(arg: ResourceModelArg) -> Self {
        match arg {
            ResourceModelArg::Pod => ResourceModel::Pod,
            ResourceModelArg::Container => ResourceModel::Container,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rackpulsed=debug,rackpulse=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    // ── Startup: anything failing here exits non-zero ──────────────

    let metadata = MetadataClient::new(DEFAULT_METADATA_BASE)?;
    let monitoring = MonitoringClient::new(DEFAULT_METADATA_BASE, DEFAULT_MONITORING_BASE)?;
    info!("monitoring client initialized");

    let identity = PodIdentity {
        namespace: cli.namespace,
        pod_name: cli.pod_name,
        pod_id: cli.pod_id,
    };
    let labels =
        ResourceLabels::resolve(cli.resource_model.into(), &identity, &metadata).await?;
    info!(resource_type = labels.resource_type(), "resource labels resolved");

    let ctx = AgentContext {
        status_url: cli.status_url,
        emitter: MetricEmitter::new(monitoring),
        labels,
    };

    // ── Shutdown signal ────────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    cycle::run(
        ctx,
        Duration::from_secs(cli.interval_milli_second),
        shutdown_rx,
    )
    .await;

    info!("agent stopped");
    Ok(())
}
