use lazy_static::lazy_static;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

#[cfg(test)]
mod metrics_test;

lazy_static! {
    pub static ref POOL_WORKERS: IntGauge =
        IntGauge::new("pool_workers", "Live worker threads").expect("metric can not be created");

    pub static ref POOL_IDLE_WORKERS: IntGauge =
        IntGauge::new("pool_idle_workers", "Workers waiting for a task")
            .expect("metric can not be created");

    pub static ref PENDING_TASKS: IntGauge =
        IntGauge::new("pending_tasks", "Tasks queued but not yet assigned")
            .expect("metric can not be created");

    pub static ref LIVE_CONNECTIONS: IntGauge =
        IntGauge::new("live_connections", "Connections tracked by the liveness registry")
            .expect("metric can not be created");

    pub static ref LIVENESS_EVICTIONS: IntCounter = IntCounter::new(
        "liveness_evictions_total",
        "Connections force-closed by the heartbeat sweep"
    )
    .expect("metric can not be created");

    pub static ref REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("requests_total", "Requests handled, by opcode"),
        &["opcode"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new_custom(Some("ddb".to_string()), None)
            .expect("registry can be created");
        register_custom_metrics(&registry);
        registry
    };
}

fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(POOL_WORKERS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(POOL_IDLE_WORKERS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(PENDING_TASKS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(LIVE_CONNECTIONS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(LIVENESS_EVICTIONS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(REQUESTS_TOTAL.clone()))
        .expect("collector can be registered");
}

/// Text exposition of every registered metric
pub fn gather_text() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}

/// Serves `GET /metrics` until `shutdown_signal` fires.
pub async fn start_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    let (addr, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        });
    info!("metrics exporter listening on {}", addr);
    server.await;
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    Ok(gather_text())
}
