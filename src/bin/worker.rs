use query_dispatch::api::types::JobResult;
use query_dispatch::settings::HEARTBEAT_INTERVAL;
use query_dispatch::worker::client::ProxyClient;
use query_dispatch::worker::engine::{QueryEngine, ScalarEngine};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let proxy_url =
        std::env::var("PROXY_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    tracing::info!("worker starting, proxy at {}", proxy_url);

    let client = Arc::new(ProxyClient::new(&proxy_url)?);

    // 1. Register with the proxy to get a worker id.
    let worker_id = match client.register().await {
        Ok(worker_id) => worker_id,
        Err(e) => {
            tracing::error!("failed to register with proxy: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(worker_id = %worker_id.0, "worker registered");

    // 2. Deregister on shutdown signal.
    {
        let client = client.clone();
        let worker_id = worker_id.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!(worker_id = %worker_id.0, "shutdown signal received, deregistering worker");
                if let Err(e) = client.goodbye(&worker_id).await {
                    tracing::error!("failed to send deregister request: {}", e);
                }
                std::process::exit(0);
            }
        });
    }

    // 3. Heartbeat ticker.
    {
        let client = client.clone();
        let worker_id = worker_id.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = client.heartbeat(&worker_id).await {
                    tracing::warn!(worker_id = %worker_id.0, "failed to send heartbeat: {}", e);
                }
            }
        });
    }

    // Artificial post-execution delay in milliseconds, for testing.
    let worker_delay = std::env::var("WORKER_DELAY")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis);

    let engine = ScalarEngine;

    // 4. Main job-fetching loop.
    loop {
        let job = match client.next_job(&worker_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                // Long poll drained empty; poll again.
                continue;
            }
            Err(e) => {
                tracing::error!("failed to fetch job from proxy: {}", e);
                tokio::time::sleep(Duration::from_secs(2)).await;
                continue;
            }
        };

        tracing::info!(job_id = %job.id.0, worker_id = %worker_id.0, "executing job");
        let started = Instant::now();

        let mut result = match engine.execute(&job) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(job_id = %job.id.0, "job execution failed: {}", e);
                JobResult {
                    error: e.to_string(),
                    ..JobResult::default()
                }
            }
        };
        result.timings.execute_ms = started.elapsed().as_millis() as u64;

        if result.error.is_empty() {
            tracing::info!(
                job_id = %job.id.0,
                duration_ms = result.timings.execute_ms,
                "job execution completed"
            );
        }

        if let Some(delay) = worker_delay {
            tracing::info!(job_id = %job.id.0, "delaying result submission by {:?}", delay);
            tokio::time::sleep(delay).await;
        }

        if let Err(e) = client.post_result(job.id.clone(), result).await {
            tracing::error!(job_id = %job.id.0, "failed to submit result to proxy: {}", e);
        }
    }
}
