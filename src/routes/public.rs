use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read endpoints plus the unauthenticated update route.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /api/posts
        // Every post, newest first. The trailing-slash form is served too.
        .route("/api/posts", get(handlers::list_posts))
        .route("/api/posts/", get(handlers::list_posts))
        // GET/PUT /api/posts/{id}
        // Post detail, and text update.
        // TODO: move the PUT under the session gate once clients send credentials on edit.
        .route(
            "/api/posts/{id}",
            get(handlers::get_post).put(handlers::update_post),
        )
}
