//! incidentflow -- incident detection and response pipeline.
//!
//! This crate walks a service's metrics document to decide whether an
//! incident exists, then runs a fixed sequence of analysis stages (metrics,
//! logs, root cause, recommendations, report) and records the result in an
//! append-only incident index.

pub mod analysis;
pub mod api;
pub mod config;
pub mod detect;
pub mod pipeline;
pub mod reasoning;
pub mod recommend;
pub mod storage;
pub mod workflow;

use anyhow::Result;

use crate::config::AppConfig;

/// Serve the read-only incident API.
pub async fn serve(bind: &str, config: &AppConfig) -> Result<()> {
    let state = api::state::AppState::from_config(config);
    let app = api::router(state);

    let addr: std::net::SocketAddr = bind.parse()?;
    tracing::info!(%addr, reports_dir = %config.paths.reports_dir.display(), "incidentflow API listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
