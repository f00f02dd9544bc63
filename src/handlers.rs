use crate::{
    AppState,
    auth::Session,
    error::{ApiError, ApiResult},
    models::{CreatePostRequest, ErrorBody, Post, PostView, UpdatePostRequest, UpvoteRequest, Vote},
};
use axum::{
    Json,
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
};

/// PostId
///
/// The `{id}` path segment of a post route. A segment that is not a valid `i64`
/// cannot name any post, so it is rejected as not found rather than as a bad request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostId(pub i64);

impl<S> FromRequestParts<S> for PostId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;
        raw.trim().parse().map(PostId).map_err(|_| ApiError::NotFound)
    }
}

fn require_text(text: &str) -> ApiResult<()> {
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest("post_text must not be empty".to_string()));
    }
    Ok(())
}

/// list_posts
///
/// [Public Route] All posts, newest first, each with owner username, comments and
/// live vote count.
#[utoipa::path(
    get,
    path = "/api/posts",
    responses(
        (status = 200, description = "All posts", body = [PostView]),
        (status = 500, description = "Database error", body = ErrorBody)
    )
)]
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<Vec<PostView>>> {
    let posts = state.repo.list_posts().await?;
    Ok(Json(posts))
}

/// get_post
///
/// [Public Route] A single post with the same associations as the listing.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = PostView),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    PostId(id): PostId,
) -> ApiResult<Json<PostView>> {
    state
        .repo
        .find_post(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// create_post
///
/// [Authenticated Route] Creates a post owned by the session user.
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Created", body = Post),
        (status = 400, description = "Empty post text", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody)
    )
)]
pub async fn create_post(
    session: Session,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<Json<Post>> {
    require_text(&payload.post_text)?;
    let post = state.repo.create_post(payload, session.user_id).await?;
    tracing::info!(post_id = post.id, user_id = session.user_id, "post created");
    Ok(Json(post))
}

/// upvote_post
///
/// [Authenticated Route] Casts the session user's vote on `post_id` and returns the
/// post with its recomputed vote count. Voting twice is a no-op.
#[utoipa::path(
    put,
    path = "/api/posts/upvote",
    request_body = UpvoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = PostView),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody)
    )
)]
pub async fn upvote_post(
    session: Session,
    State(state): State<AppState>,
    Json(payload): Json<UpvoteRequest>,
) -> ApiResult<Json<PostView>> {
    let vote = Vote {
        user_id: session.user_id,
        post_id: payload.post_id,
    };
    state
        .repo
        .upvote(vote)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// update_post
///
/// [Public Route] Replaces the text of a post. Responds with the affected row count
/// as a one-element array.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = [u64]),
        (status = 400, description = "Empty post text", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody)
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    PostId(id): PostId,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<Json<Vec<u64>>> {
    require_text(&payload.post_text)?;
    match state.repo.update_post(id, payload).await? {
        0 => Err(ApiError::NotFound),
        affected => Ok(Json(vec![affected])),
    }
}

/// delete_post
///
/// [Authenticated Route] Deletes a post. Responds with the deleted row count.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Deleted", body = u64),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody)
    )
)]
pub async fn delete_post(
    session: Session,
    State(state): State<AppState>,
    PostId(id): PostId,
) -> ApiResult<Json<u64>> {
    match state.repo.delete_post(id).await? {
        0 => Err(ApiError::NotFound),
        affected => {
            tracing::info!(post_id = id, user_id = session.user_id, "post deleted");
            Ok(Json(affected))
        }
    }
}
