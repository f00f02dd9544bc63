use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A row from the `users` table. Users are created by the external sign-up flow;
/// this service only reads them to resolve sessions and post owners.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Post
///
/// A raw row from the `posts` table, as returned by the create endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: i64,
    pub post_text: String,
    // FK to users.id (Owner).
    pub user_id: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Comment
///
/// A row from the `comments` table. Comments are attached to post reads only.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub comment_text: String,
    pub post_id: i64,
    pub user_id: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Vote
///
/// Relates one user to one post. The `(user_id, post_id)` pair is unique in the `votes` table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct Vote {
    pub user_id: i64,
    pub post_id: i64,
}

// --- Read Models (Output) ---

/// PostAuthor
///
/// The owner projection nested under `user` in a post read.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostAuthor {
    pub username: String,
}

/// PostView
///
/// A post joined with its owner's username, its comments and the live vote count.
/// `vote_count` is computed by the read query every time and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostView {
    pub id: i64,
    pub post_text: String,
    pub user_id: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub vote_count: i64,
    pub user: PostAuthor,
    pub comments: Vec<Comment>,
}

/// PostRow
///
/// Flat row produced by the post read query, before comments are attached.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub post_text: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub vote_count: i64,
}

impl PostRow {
    pub fn into_view(self, comments: Vec<Comment>) -> PostView {
        PostView {
            id: self.id,
            post_text: self.post_text,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            vote_count: self.vote_count,
            user: PostAuthor {
                username: self.username,
            },
            comments,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreatePostRequest
///
/// Input payload for `POST /api/posts`. The owner comes from the session, never the body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    #[schema(example = "hello")]
    pub post_text: String,
}

/// UpdatePostRequest
///
/// Input payload for `PUT /api/posts/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    pub post_text: String,
}

/// UpvoteRequest
///
/// Input payload for `PUT /api/posts/upvote`. Unknown fields are ignored; the voter
/// is always the session user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpvoteRequest {
    #[schema(example = 3)]
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub post_id: i64,
}

/// Accepts an id sent either as a JSON number or as a numeric string (`3` or `"3"`).
fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// ErrorBody
///
/// JSON body of every error response. `error` carries the underlying database
/// error text on 500 responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
