mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::places::PlaceResolver;

pub fn build_router(resolver: PlaceResolver) -> Router {
    let state = Arc::new(AppState { resolver });

    Router::new()
        .route("/api/places", get(handlers::places))
        .route("/api/flag", get(handlers::flag))
        .route("/api/variants", get(handlers::variants))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, resolver: PlaceResolver) -> std::io::Result<()> {
    let app = build_router(resolver);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Place Atlas listening on http://{}", addr);
    axum::serve(listener, app).await
}
