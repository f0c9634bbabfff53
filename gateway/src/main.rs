use anyhow::Result;
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coastwatch_gateway::{
    monitor::{MonitorConfig, ThreatMonitor},
    push::{ws_handler, PushHub},
    routes::{api_routes, AppState},
    seed::seed_demo_data,
    store::Store,
};
use env_data::{EnvDataService, MockEnvProvider, OpenMeteoProvider};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "coastwatch_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = Arc::new(Store::new());
    seed_demo_data(&store).await;

    let push = Arc::new(PushHub::new());

    // Mock data by default; COASTWATCH_LIVE_DATA=1 puts the live feed in
    // front with the mock as fallback so a feed outage never blanks a sweep.
    let env = if std::env::var("COASTWATCH_LIVE_DATA").as_deref() == Ok("1") {
        tracing::info!("   Environmental data: Open-Meteo (mock fallback)");
        EnvDataService::new(Arc::new(OpenMeteoProvider::new()))
            .with_fallback(Arc::new(MockEnvProvider::demo()))
    } else {
        tracing::info!("   Environmental data: mock generator");
        EnvDataService::new(Arc::new(MockEnvProvider::demo()))
    };

    let monitor = ThreatMonitor::new(store.clone(), push.clone(), env, MonitorConfig::default());
    monitor.start();

    let state = AppState {
        store: store.clone(),
        push: push.clone(),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port = std::env::var("COASTWATCH_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "18710".to_string());
    let addr = format!("0.0.0.0:{}", port);

    tracing::info!("CoastWatch gateway starting on {}", addr);
    tracing::info!("   Monitored coasts: {}", store.active_locations().await.len());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "coastwatch-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
