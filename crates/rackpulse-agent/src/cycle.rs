//! The polling loop: fetch → decode → emit ×2 → sleep.
//!
//! One cycle never fails the process. Fetch and decode errors skip the
//! rest of the cycle; the two writes are independent, so a rejected
//! busy-worker write never suppresses the idle-worker write. The loop
//! itself runs until the shutdown channel flips.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use rackpulse_export::{BUSY_WORKER_METRIC, IDLE_WORKER_METRIC, MetricEmitter, ResourceLabels};
use rackpulse_status::fetch_status;

/// Everything one cycle needs, built once at startup and shared
/// read-only after that.
pub struct AgentContext {
    pub status_url: String,
    pub emitter: MetricEmitter,
    pub labels: ResourceLabels,
}

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle stopped before emitting (fetch or decode failure).
    Skipped,
    /// Both emits were attempted; the flags record per-metric success.
    Emitted { busy_ok: bool, idle_ok: bool },
}

/// Run one poll cycle. Every error is logged and folded into the
/// outcome; the caller only ever sleeps and goes again.
pub async fn run_cycle(ctx: &AgentContext) -> CycleOutcome {
    let response = match fetch_status(&ctx.status_url).await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, url = %ctx.status_url, "status fetch failed");
            return CycleOutcome::Skipped;
        }
    };

    let snapshot = match response.into_snapshot() {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "status body rejected");
            return CycleOutcome::Skipped;
        }
    };

    let busy_ok = emit_logged(ctx, BUSY_WORKER_METRIC, snapshot.busy_workers).await;
    let idle_ok = emit_logged(ctx, IDLE_WORKER_METRIC, snapshot.idle_workers).await;
    CycleOutcome::Emitted { busy_ok, idle_ok }
}

async fn emit_logged(ctx: &AgentContext, metric: &str, value: i64) -> bool {
    match ctx.emitter.emit(metric, value, &ctx.labels).await {
        Ok(()) => {
            info!(metric, value, "time series written");
            true
        }
        Err(e) => {
            warn!(metric, error = %e, "time series write failed");
            false
        }
    }
}

/// Drive cycles until `shutdown` flips.
///
/// The cycle runs first and the interval sleep second, so a fresh
/// process reports immediately instead of one interval late.
pub async fn run(ctx: AgentContext, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    info!(interval_secs = interval.as_secs(), url = %ctx.status_url, "poll loop started");

    loop {
        let outcome = run_cycle(&ctx).await;
        debug!(?outcome, "cycle finished");

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                info!("poll loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use axum::Router;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use tokio::sync::Mutex;

    use rackpulse_export::{PodIdentity, ResourceModel};
    use rackpulse_gcp::{MetadataClient, MonitoringClient};

    /// Local stand-in for the metadata server and monitoring backend.
    struct Backend {
        writes: Mutex<Vec<serde_json::Value>>,
        /// Requests whose body contains this substring are rejected.
        reject_containing: Option<&'static str>,
    }

    async fn spawn_backend(reject_containing: Option<&'static str>) -> (String, Arc<Backend>) {
        let backend = Arc::new(Backend {
            writes: Mutex::new(Vec::new()),
            reject_containing,
        });

        let router = Router::new()
            .route(
                "/computeMetadata/v1/project/project-id",
                get(|| async { "my-project" }),
            )
            .route(
                "/computeMetadata/v1/instance/attributes/cluster-location",
                get(|| async { "us-central1" }),
            )
            .route(
                "/computeMetadata/v1/instance/attributes/cluster-name",
                get(|| async { "prod-cluster" }),
            )
            .route(
                "/computeMetadata/v1/instance/service-accounts/default/token",
                get(|| async {
                    r#"{"access_token":"test-token","expires_in":3600,"token_type":"Bearer"}"#
                }),
            )
            .route(
                "/v3/projects/my-project/timeSeries",
                post(
                    |State(backend): State<Arc<Backend>>, body: String| async move {
                        if let Some(needle) = backend.reject_containing {
                            if body.contains(needle) {
                                return (StatusCode::FORBIDDEN, "permission denied".to_string());
                            }
                        }
                        backend
                            .writes
                            .lock()
                            .await
                            .push(serde_json::from_str(&body).unwrap());
                        (StatusCode::OK, "{}".to_string())
                    },
                ),
            )
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}"), backend)
    }

    /// Status endpoint returning a fixed response, counting hits.
    async fn spawn_status(code: u16, body: &'static str) -> (String, Arc<AtomicU64>) {
        let hits = Arc::new(AtomicU64::new(0));
        let hits_handle = hits.clone();

        let router = Router::new()
            .route(
                "/server-status",
                get(move |State(hits): State<Arc<AtomicU64>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::from_u16(code).unwrap(), body)
                }),
            )
            .with_state(hits_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}/server-status?json"), hits)
    }

    async fn build_context(backend_base: &str, status_url: String) -> AgentContext {
        let metadata =
            MetadataClient::new(format!("{backend_base}/computeMetadata/v1")).unwrap();
        let monitoring = MonitoringClient::new(
            format!("{backend_base}/computeMetadata/v1"),
            backend_base.to_string(),
        )
        .unwrap();

        let identity = PodIdentity {
            namespace: "prod".to_string(),
            pod_name: "web-0".to_string(),
            pod_id: None,
        };
        let labels = ResourceLabels::resolve(ResourceModel::Pod, &identity, &metadata)
            .await
            .unwrap();

        AgentContext {
            status_url,
            emitter: MetricEmitter::new(monitoring),
            labels,
        }
    }

    #[tokio::test]
    async fn successful_cycle_writes_both_gauges() {
        let (base, backend) = spawn_backend(None).await;
        let (status_url, _hits) =
            spawn_status(200, r#"{"BusyWorkers":3,"IdleWorkers":7,"Uptime":50}"#).await;
        let ctx = build_context(&base, status_url).await;

        let outcome = run_cycle(&ctx).await;
        assert_eq!(
            outcome,
            CycleOutcome::Emitted {
                busy_ok: true,
                idle_ok: true
            }
        );

        let writes = backend.writes.lock().await;
        assert_eq!(writes.len(), 2);

        let busy = &writes[0]["timeSeries"][0];
        assert_eq!(busy["metric"]["type"], "custom.googleapis.com/busy-worker-num");
        assert_eq!(busy["points"][0]["value"]["int64Value"], "3");
        assert_eq!(busy["resource"]["type"], "k8s_pod");
        assert_eq!(busy["resource"]["labels"]["project_id"], "my-project");
        assert_eq!(busy["resource"]["labels"]["location"], "us-central1");
        assert_eq!(busy["resource"]["labels"]["cluster_name"], "prod-cluster");
        assert_eq!(busy["resource"]["labels"]["namespace_name"], "prod");
        assert_eq!(busy["resource"]["labels"]["pod_name"], "web-0");

        let idle = &writes[1]["timeSeries"][0];
        assert_eq!(idle["metric"]["type"], "custom.googleapis.com/idle-worker-num");
        assert_eq!(idle["points"][0]["value"]["int64Value"], "7");
    }

    #[tokio::test]
    async fn http_500_skips_the_cycle() {
        let (base, backend) = spawn_backend(None).await;
        let (status_url, hits) = spawn_status(500, "worker pool down").await;
        let ctx = build_context(&base, status_url).await;

        assert_eq!(run_cycle(&ctx).await, CycleOutcome::Skipped);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(backend.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_skips_the_cycle() {
        let (base, backend) = spawn_backend(None).await;
        let (status_url, _hits) =
            spawn_status(200, r#"{"BusyWorkers":"not-a-number","IdleWorkers":7}"#).await;
        let ctx = build_context(&base, status_url).await;

        assert_eq!(run_cycle(&ctx).await, CycleOutcome::Skipped);
        assert!(backend.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_skips_the_cycle() {
        let (base, backend) = spawn_backend(None).await;
        let ctx = build_context(
            &base,
            "http://127.0.0.1:1/server-status?json".to_string(),
        )
        .await;

        assert_eq!(run_cycle(&ctx).await, CycleOutcome::Skipped);
        assert!(backend.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn rejected_busy_write_still_attempts_idle() {
        let (base, backend) = spawn_backend(Some("busy-worker-num")).await;
        let (status_url, _hits) =
            spawn_status(200, r#"{"BusyWorkers":3,"IdleWorkers":7}"#).await;
        let ctx = build_context(&base, status_url).await;

        let outcome = run_cycle(&ctx).await;
        assert_eq!(
            outcome,
            CycleOutcome::Emitted {
                busy_ok: false,
                idle_ok: true
            }
        );

        let writes = backend.writes.lock().await;
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0]["timeSeries"][0]["metric"]["type"],
            "custom.googleapis.com/idle-worker-num"
        );
    }

    #[tokio::test]
    async fn loop_repolls_until_shutdown() {
        let (base, backend) = spawn_backend(None).await;
        let (status_url, hits) =
            spawn_status(200, r#"{"BusyWorkers":1,"IdleWorkers":2}"#).await;
        let ctx = build_context(&base, status_url).await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(ctx, Duration::from_millis(20), shutdown_rx));

        tokio::time::sleep(Duration::from_millis(90)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let polled = hits.load(Ordering::SeqCst);
        assert!(polled >= 2, "expected repeated polls, got {polled}");
        assert_eq!(backend.writes.lock().await.len() as u64, polled * 2);
    }

    #[tokio::test]
    async fn loop_keeps_retrying_after_failed_cycles() {
        let (base, backend) = spawn_backend(None).await;
        let (status_url, hits) = spawn_status(500, "worker pool down").await;
        let ctx = build_context(&base, status_url).await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(ctx, Duration::from_millis(20), shutdown_rx));

        tokio::time::sleep(Duration::from_millis(90)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(hits.load(Ordering::SeqCst) >= 2);
        assert!(backend.writes.lock().await.is_empty());
    }
}
