use std::{net::SocketAddr, sync::Arc};

use sensorhub::{build_router, config::load_settings, store::SensorStore, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    let store = if settings.seed_demo_data {
        SensorStore::with_demo_data()
    } else {
        SensorStore::new()
    };
    let app = build_router(Arc::new(AppState::new(store)));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "sensorhub listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
