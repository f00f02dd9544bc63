use crate::models::{Comment, CreatePostRequest, Post, PostRow, PostView, UpdatePostRequest, User, Vote};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::{collections::HashMap, sync::Arc};

/// Repository Trait
///
/// The persistence contract consumed by the post handlers and the session gate.
/// Handlers only see `Arc<dyn Repository>`, so tests can swap in an in-memory store.
///
/// Every method surfaces database failures as `sqlx::Error`; "no such row" is
/// expressed through `Option` or an affected-row count, never as an error.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Post Retrieval ---
    // All posts, newest first, with owner username, comments and live vote count.
    async fn list_posts(&self) -> Result<Vec<PostView>, sqlx::Error>;
    async fn find_post(&self, id: i64) -> Result<Option<PostView>, sqlx::Error>;

    // --- Post Actions ---
    async fn create_post(&self, req: CreatePostRequest, user_id: i64) -> Result<Post, sqlx::Error>;
    // Returns the number of rows updated (0 or 1).
    async fn update_post(&self, id: i64, req: UpdatePostRequest) -> Result<u64, sqlx::Error>;
    // Returns the number of rows deleted (0 or 1).
    async fn delete_post(&self, id: i64) -> Result<u64, sqlx::Error>;
    // Records the vote (idempotent per user/post) and re-reads the post.
    // `None` when the post does not exist.
    async fn upvote(&self, vote: Vote) -> Result<Option<PostView>, sqlx::Error>;

    // --- User/Auth ---
    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer held in the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL through a sqlx connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Base SELECT for post reads. The vote count is a correlated subquery so it is
    /// always the live count at read time.
    fn post_query() -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(
            r#"
            SELECT
                p.id, p.post_text, p.user_id, p.created_at, p.updated_at,
                u.username,
                (SELECT COUNT(*) FROM votes v WHERE v.post_id = p.id) AS vote_count
            FROM posts p
            JOIN users u ON u.id = p.user_id
            "#,
        )
    }

    /// Loads the comments of every given post in one query and attaches them.
    async fn attach_comments(&self, rows: Vec<PostRow>) -> Result<Vec<PostView>, sqlx::Error> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, comment_text, post_id, user_id, created_at
            FROM comments
            WHERE post_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_post: HashMap<i64, Vec<Comment>> = HashMap::new();
        for comment in comments {
            by_post.entry(comment.post_id).or_default().push(comment);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let comments = by_post.remove(&row.id).unwrap_or_default();
                row.into_view(comments)
            })
            .collect())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_posts(&self) -> Result<Vec<PostView>, sqlx::Error> {
        let mut builder = Self::post_query();
        builder.push(" ORDER BY p.created_at DESC, p.id DESC");

        let rows = builder
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_comments(rows).await
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostView>, sqlx::Error> {
        let mut builder = Self::post_query();
        builder.push(" WHERE p.id = ");
        builder.push_bind(id);

        let row = builder
            .build_query_as::<PostRow>()
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_comments(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_post(&self, req: CreatePostRequest, user_id: i64) -> Result<Post, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (post_text, user_id, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            RETURNING id, post_text, user_id, created_at, updated_at
            "#,
        )
        .bind(req.post_text)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_post(&self, id: i64, req: UpdatePostRequest) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE posts SET post_text = $1, updated_at = NOW() WHERE id = $2")
            .bind(req.post_text)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_post(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// upvote
    ///
    /// Locks the post row, inserts the vote with `ON CONFLICT DO NOTHING` so a repeated
    /// vote leaves the count unchanged, then re-reads the post after commit.
    async fn upvote(&self, vote: Vote) -> Result<Option<PostView>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM posts WHERE id = $1 FOR SHARE")
            .bind(vote.post_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();

        if !exists {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = sqlx::query(
            "INSERT INTO votes (user_id, post_id) VALUES ($1, $2) ON CONFLICT (user_id, post_id) DO NOTHING",
        )
        .bind(vote.user_id)
        .bind(vote.post_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        if inserted == 0 {
            tracing::debug!(user_id = vote.user_id, post_id = vote.post_id, "vote already recorded");
        }

        self.find_post(vote.post_id).await
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
