//! HTTP server exposing the follow-graph engine

use super::handler::{
    follow_handler, followers_handler, following_handler, friends_handler, mutual_handler, path_handler,
    recommendations_handler, register_user_handler, relationship_handler, remove_user_handler,
    status_handler, trending_handler, unfollow_handler, user_stats_handler, users_handler,
};
use crate::engine::SocialGraphEngine;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// All API routes over a shared engine
pub fn router(engine: Arc<SocialGraphEngine>) -> Router {
    Router::new()
        .route("/follow", post(follow_handler).delete(unfollow_handler))
        .route("/status", get(relationship_handler))
        .route("/path", get(path_handler))
        .route("/mutual", get(mutual_handler))
        .route("/recommendations", get(recommendations_handler))
        .route("/trending", get(trending_handler))
        .route("/users", get(users_handler))
        .route("/users/:id", put(register_user_handler).delete(remove_user_handler))
        .route("/users/:id/stats", get(user_stats_handler))
        .route("/users/:id/followers", get(followers_handler))
        .route("/users/:id/following", get(following_handler))
        .route("/users/:id/friends", get(friends_handler))
        .route("/api/status", get(status_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

/// HTTP server bound to one address
pub struct HttpServer {
    engine: Arc<SocialGraphEngine>,
    addr: String,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(engine: Arc<SocialGraphEngine>, addr: impl Into<String>) -> Self {
        Self { engine, addr: addr.into() }
    }

    /// Serve until `shutdown` resolves
    pub async fn start<F>(&self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = router(Arc::clone(&self.engine));
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;

        info!("Social graph API listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
