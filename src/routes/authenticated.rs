use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Authenticated Router Module
///
/// Endpoints that act on behalf of a user. The whole router is wrapped by the
/// session gate, and each handler also receives the resolved `Session`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/posts
        // Creates a post owned by the session user.
        .route("/api/posts", post(handlers::create_post))
        .route("/api/posts/", post(handlers::create_post))
        // PUT /api/posts/upvote
        // Static segment, matched ahead of /api/posts/{id}.
        .route("/api/posts/upvote", put(handlers::upvote_post))
        // DELETE /api/posts/{id}
        .route("/api/posts/{id}", delete(handlers::delete_post))
}
