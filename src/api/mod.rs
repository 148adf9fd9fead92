//! HTTP layer exposing the distractor, keyword and summary pipelines.

pub mod routes;
pub mod types;

use std::net::SocketAddr;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{config::Settings, nlp::Pipelines};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub pipelines: Pipelines,
}

/// Routes over already-loaded pipelines.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/distractors", post(routes::distractors))
        .route("/keywords", post(routes::keywords))
        .route("/summarize", post(routes::summarize))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn serve(settings: Settings, host: String, port: u16) -> Result<()> {
    let pipelines = tokio::task::block_in_place(|| Pipelines::load(&settings))?;
    let state = AppState {
        settings,
        pipelines,
    };

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, "serving quizgen API");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
