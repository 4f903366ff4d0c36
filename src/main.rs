use query_dispatch::proxy::queue::JobQueue;
use query_dispatch::proxy::registry::WorkerRegistry;
use query_dispatch::proxy::rendezvous::ResultRendezvous;
use query_dispatch::proxy::{router, ProxyConfig};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut bind_addr: SocketAddr = "0.0.0.0:8080".parse()?;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = args[i + 1].parse()?;
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    // The dispatch core: explicit collaborators, wired together here and
    // injected into the HTTP surface.
    let registry = WorkerRegistry::new();
    let queue = Arc::new(JobQueue::new());
    let rendezvous = Arc::new(ResultRendezvous::new());

    // Background reaper for stale workers.
    registry.clone().start();

    let app = router(
        registry.clone(),
        queue.clone(),
        rendezvous.clone(),
        ProxyConfig::default(),
    );

    tracing::info!("proxy server listening on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
