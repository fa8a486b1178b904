// rest/mod.rs — HTTP status server.
//
// Axum server exposing the liveness endpoint:
//   GET /status   — human-readable "Up and running ..." string
//
// CORS is permissive: the endpoint carries no state and is read-only.

use anyhow::Result;
use axum::{extract::State, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_status_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("status endpoint listening on http://{}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/status", get(status))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn status(State(ctx): State<Arc<AppContext>>) -> String {
    format!(
        "Up and running on {}:{} with deckd {} (uptime {}s)",
        ctx.config.bind_address,
        ctx.config.port,
        env!("CARGO_PKG_VERSION"),
        ctx.started_at.elapsed().as_secs(),
    )
}
