#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use social_posts::{
    AppConfig, AppState,
    models::{Comment, CreatePostRequest, Post, PostAuthor, PostView, UpdatePostRequest, User, Vote},
    repository::Repository,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

// --- In-Memory Repository ---

#[derive(Default)]
struct Store {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    votes: Vec<Vote>,
    next_post_id: i64,
}

/// Repository double backed by vectors. Mirrors the Postgres semantics the handlers
/// rely on: newest-first listing, live vote counts, idempotent votes and cascading deletes.
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
    /// When set, every call fails with a database error.
    pub fail: bool,
    /// Number of post writes attempted (create/update/delete/upvote).
    pub post_writes: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_user(self, id: i64, username: &str) -> Self {
        self.store.lock().unwrap().users.push(User {
            id,
            username: username.to_string(),
        });
        self
    }

    /// Inserts a post created `age_minutes` ago and returns its id.
    pub fn seed_post(&self, user_id: i64, text: &str, age_minutes: i64) -> i64 {
        let mut store = self.store.lock().unwrap();
        store.next_post_id += 1;
        let id = store.next_post_id;
        let created_at = Utc::now() - Duration::minutes(age_minutes);
        store.posts.push(Post {
            id,
            post_text: text.to_string(),
            user_id,
            created_at,
            updated_at: created_at,
        });
        id
    }

    pub fn seed_vote(&self, user_id: i64, post_id: i64) {
        self.store.lock().unwrap().votes.push(Vote { user_id, post_id });
    }

    pub fn seed_comment(&self, id: i64, post_id: i64, user_id: i64, text: &str) {
        self.store.lock().unwrap().comments.push(Comment {
            id,
            comment_text: text.to_string(),
            post_id,
            user_id,
            created_at: Utc::now(),
        });
    }

    pub fn vote_rows(&self, post_id: i64) -> usize {
        let store = self.store.lock().unwrap();
        store.votes.iter().filter(|v| v.post_id == post_id).count()
    }

    /// User ids that voted on the post, in insertion order.
    pub fn voters(&self, post_id: i64) -> Vec<i64> {
        let store = self.store.lock().unwrap();
        store
            .votes
            .iter()
            .filter(|v| v.post_id == post_id)
            .map(|v| v.user_id)
            .collect()
    }

    pub fn writes(&self) -> usize {
        self.post_writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }

    fn view(store: &Store, post: &Post) -> PostView {
        let username = store
            .users
            .iter()
            .find(|u| u.id == post.user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        PostView {
            id: post.id,
            post_text: post.post_text.clone(),
            user_id: post.user_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
            vote_count: store.votes.iter().filter(|v| v.post_id == post.id).count() as i64,
            user: PostAuthor { username },
            comments: store
                .comments
                .iter()
                .filter(|c| c.post_id == post.id)
                .cloned()
                .collect(),
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_posts(&self) -> Result<Vec<PostView>, sqlx::Error> {
        self.check()?;
        let store = self.store.lock().unwrap();
        let mut posts: Vec<&Post> = store.posts.iter().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts.into_iter().map(|p| Self::view(&store, p)).collect())
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostView>, sqlx::Error> {
        self.check()?;
        let store = self.store.lock().unwrap();
        Ok(store
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| Self::view(&store, p)))
    }

    async fn create_post(&self, req: CreatePostRequest, user_id: i64) -> Result<Post, sqlx::Error> {
        self.post_writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut store = self.store.lock().unwrap();
        store.next_post_id += 1;
        let now = Utc::now();
        let post = Post {
            id: store.next_post_id,
            post_text: req.post_text,
            user_id,
            created_at: now,
            updated_at: now,
        };
        store.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: i64, req: UpdatePostRequest) -> Result<u64, sqlx::Error> {
        self.post_writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut store = self.store.lock().unwrap();
        match store.posts.iter_mut().find(|p| p.id == id) {
            Some(post) => {
                post.post_text = req.post_text;
                post.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_post(&self, id: i64) -> Result<u64, sqlx::Error> {
        self.post_writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let before = store.posts.len();
        store.posts.retain(|p| p.id != id);
        let deleted = (before - store.posts.len()) as u64;
        store.votes.retain(|v| v.post_id != id);
        store.comments.retain(|c| c.post_id != id);
        Ok(deleted)
    }

    async fn upvote(&self, vote: Vote) -> Result<Option<PostView>, sqlx::Error> {
        self.post_writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut store = self.store.lock().unwrap();
        if !store.posts.iter().any(|p| p.id == vote.post_id) {
            return Ok(None);
        }
        if !store.votes.contains(&vote) {
            store.votes.push(vote);
        }
        let post = store
            .posts
            .iter()
            .find(|p| p.id == vote.post_id)
            .cloned()
            .expect("post checked above");
        Ok(Some(Self::view(&store, &post)))
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        self.check()?;
        let store = self.store.lock().unwrap();
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }
}

// --- State Helpers ---

pub const TEST_SECRET: &str = "super-secure-test-secret-value-local";

pub fn test_state(repo: Arc<InMemoryRepository>) -> AppState {
    AppState {
        repo,
        config: AppConfig::default(),
    }
}
