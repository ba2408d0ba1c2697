//! Post source: where the explore feed gets its posts from.
//!
//! The hosted store is an external collaborator; this module only speaks its REST
//! query interface (`RestPostSource`). `StaticPostSource` serves a fixed list and
//! backs tests and offline runs.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::models::Post;

const POSTS_PATH: &str = "/rest/v1/posts";
const POSTS_SELECT: &str = "id,image_url,posted_by,hashtags,created_at";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("post store error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("could not decode posts: {0}")]
    Decode(#[from] serde_json::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Hashtag handling
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes a user-typed hashtag: trims, drops a leading `#`, lowercases.
/// Returns `None` for input that is blank after trimming.
pub fn normalize_hashtag(raw: &str) -> Option<String> {
    let tag = raw.trim().trim_start_matches('#').trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_lowercase())
    }
}

/// True when any of the post's tags equals `tag` after normalization.
pub fn has_hashtag(post: &Post, tag: &str) -> bool {
    post.hashtags
        .iter()
        .filter_map(|t| normalize_hashtag(t))
        .any(|t| t == tag)
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Supplies posts for the explore feed, newest first.
///
/// `hashtag` is already normalized; `None` means no filter.
/// Carried in `AppState` as `Arc<dyn PostSource>`.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_posts(&self, hashtag: Option<&str>) -> Result<Vec<Post>, FeedError>;
}

// ────────────────────────────────────────────────────────────────────────────
// RestPostSource
// ────────────────────────────────────────────────────────────────────────────

/// Reads the `posts` table through a PostgREST-style endpoint.
#[derive(Clone)]
pub struct RestPostSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    limit: usize,
}

impl RestPostSource {
    pub fn new(base_url: &str, api_key: Option<String>, limit: usize) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            limit,
        }
    }

    fn query_params(&self, hashtag: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("select", POSTS_SELECT.to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(tag) = hashtag {
            params.push(("hashtags", format!("cs.{{\"{tag}\"}}")));
        }
        params
    }
}

#[async_trait]
impl PostSource for RestPostSource {
    async fn fetch_posts(&self, hashtag: Option<&str>) -> Result<Vec<Post>, FeedError> {
        let mut request = self
            .client
            .get(format!("{}{POSTS_PATH}", self.base_url))
            .query(&self.query_params(hashtag));

        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let posts: Vec<Post> = serde_json::from_str(&body)?;
        debug!(count = posts.len(), hashtag = ?hashtag, "Fetched posts from store");
        Ok(posts)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// StaticPostSource
// ────────────────────────────────────────────────────────────────────────────

/// Fixed in-memory post list.
pub struct StaticPostSource {
    posts: Vec<Post>,
    limit: Option<usize>,
}

impl StaticPostSource {
    pub fn new(mut posts: Vec<Post>) -> Self {
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { posts, limit: None }
    }

    /// Caps every fetch at `limit` posts, applied after the hashtag filter.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Parses a JSON array shaped like the store's rows.
    pub fn from_json(raw: &str) -> Result<Self, FeedError> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }
}

#[async_trait]
impl PostSource for StaticPostSource {
    async fn fetch_posts(&self, hashtag: Option<&str>) -> Result<Vec<Post>, FeedError> {
        let limit = self.limit.unwrap_or(usize::MAX);
        let posts = self
            .posts
            .iter()
            .filter(|p| hashtag.map_or(true, |tag| has_hashtag(p, tag)))
            .take(limit)
            .cloned()
            .collect();
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};

    fn tagged(id: &str, tags: &[&str], minute: u32) -> Post {
        let mut post = Post::sample(id);
        post.hashtags = tags.iter().map(|t| t.to_string()).collect();
        post.created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap();
        post
    }

    // ── normalize_hashtag / has_hashtag ─────────────────────────────────────

    #[test]
    fn test_normalize_hashtag_strips_hash_and_case() {
        assert_eq!(normalize_hashtag("  #DanceNight "), Some("dancenight".to_string()));
        assert_eq!(normalize_hashtag("music"), Some("music".to_string()));
    }

    #[test]
    fn test_normalize_hashtag_blank_is_none() {
        assert_eq!(normalize_hashtag(""), None);
        assert_eq!(normalize_hashtag("   "), None);
        assert_eq!(normalize_hashtag("#"), None);
    }

    #[test]
    fn test_has_hashtag_ignores_stored_hash_and_case() {
        let post = tagged("a", &["#Fest2024", "art"], 0);
        assert!(has_hashtag(&post, "fest2024"));
        assert!(has_hashtag(&post, "art"));
        assert!(!has_hashtag(&post, "music"));
    }

    // ── StaticPostSource ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_static_source_orders_newest_first() {
        let source = StaticPostSource::new(vec![
            tagged("old", &[], 1),
            tagged("new", &[], 30),
            tagged("mid", &[], 10),
        ]);
        let posts = source.fetch_posts(None).await.unwrap();
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_static_source_filters_by_hashtag() {
        let source = StaticPostSource::new(vec![
            tagged("a", &["#Dance"], 1),
            tagged("b", &["music"], 2),
            tagged("c", &["dance", "music"], 3),
        ]);
        let posts = source.fetch_posts(Some("dance")).await.unwrap();
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn test_static_source_limit_keeps_newest_matches() {
        let source = StaticPostSource::new(vec![
            tagged("a", &["dance"], 1),
            tagged("b", &["music"], 2),
            tagged("c", &["dance"], 3),
            tagged("d", &["dance"], 4),
            tagged("e", &["music"], 5),
        ])
        .with_limit(2);

        let all = source.fetch_posts(None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["e", "d"]);

        let dance = source.fetch_posts(Some("dance")).await.unwrap();
        let ids: Vec<&str> = dance.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c"]);
    }

    #[tokio::test]
    async fn test_static_source_from_json() {
        let raw = r#"[
            {"id": "x", "image_url": "u1", "posted_by": "a", "hashtags": ["art"], "created_at": "2024-03-01T10:00:00Z"},
            {"id": "y", "image_url": "u2", "posted_by": "b", "created_at": "2024-03-01T11:00:00Z"}
        ]"#;
        let source = StaticPostSource::from_json(raw).unwrap();
        assert_eq!(source.len(), 2);
        let posts = source.fetch_posts(Some("art")).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "x");
    }

    #[test]
    fn test_static_source_from_bad_json_is_decode_error() {
        let err = StaticPostSource::from_json("{\"not\": \"a list\"}").err().unwrap();
        assert!(matches!(err, FeedError::Decode(_)));
    }

    // ── RestPostSource against a local server ───────────────────────────────

    async fn serve_store() -> String {
        async fn list_posts(
            headers: HeaderMap,
            Query(params): Query<HashMap<String, String>>,
        ) -> Result<Json<Value>, StatusCode> {
            if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some("anon-key") {
                return Err(StatusCode::UNAUTHORIZED);
            }
            if params.get("order").map(String::as_str) != Some("created_at.desc") {
                return Err(StatusCode::BAD_REQUEST);
            }
            let mut rows = vec![json!({
                "id": "p1",
                "image_url": "https://cdn.example.test/p1.jpg",
                "posted_by": "ravi",
                "hashtags": ["dance"],
                "created_at": "2024-03-01T12:00:00Z"
            })];
            if params.get("hashtags").map(String::as_str) != Some("cs.{\"dance\"}") {
                rows.push(json!({
                    "id": "p2",
                    "image_url": "https://cdn.example.test/p2.jpg",
                    "posted_by": "mei",
                    "hashtags": [],
                    "created_at": "2024-03-01T11:00:00Z"
                }));
            }
            Ok(Json(Value::Array(rows)))
        }

        let app = Router::new().route("/rest/v1/posts", get(list_posts));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_rest_source_fetches_all_posts() {
        let base = serve_store().await;
        let source = RestPostSource::new(&base, Some("anon-key".to_string()), 50);
        let posts = source.fetch_posts(None).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "p1");
        assert_eq!(posts[1].posted_by, "mei");
    }

    #[tokio::test]
    async fn test_rest_source_sends_hashtag_filter() {
        let base = serve_store().await;
        let source = RestPostSource::new(&base, Some("anon-key".to_string()), 50);
        let posts = source.fetch_posts(Some("dance")).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "p1");
    }

    #[tokio::test]
    async fn test_rest_source_surfaces_status_errors() {
        let base = serve_store().await;
        let source = RestPostSource::new(&base, None, 50);
        let err = source.fetch_posts(None).await.unwrap_err();
        assert!(matches!(err, FeedError::Status { status: 401, .. }));
    }

    #[test]
    fn test_query_params_include_limit() {
        let source = RestPostSource::new("http://store.test", None, 120);
        let params = source.query_params(None);
        assert!(params.contains(&("limit", "120".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "hashtags"));
    }
}
