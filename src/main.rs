use std::net::SocketAddr;

use dotenvy::dotenv;
use karnameh::logging::{init_tracing, shutdown_tracer};
use karnameh::metrics::{init_metrics, metrics_app};
use karnameh::router::init_router;
use karnameh::state::init_app_state;
use karnameh_db::{init_db_pool, run_migrations};
use tracing::{error, info};

fn port_from_env(name: &str, default: u16) -> u16 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    if let Some(handle) = init_metrics() {
        let addr = SocketAddr::from(([0, 0, 0, 0], port_from_env("METRICS_PORT", 9000)));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "Metrics available at /metrics");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let db = init_db_pool().await?;
    run_migrations(&db).await?;
    info!("Migrations applied");

    let state = init_app_state(db).await;
    let app = init_router(state);

    let port = port_from_env("PORT", 3000);
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    println!("🚀 Server running on http://localhost:{}", port);
    println!("📚 Swagger UI available at http://localhost:{}/swagger-ui", port);
    println!("📖 Scalar UI available at http://localhost:{}/scalar", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tracer().await;
    Ok(())
}
