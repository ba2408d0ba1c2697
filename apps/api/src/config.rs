use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Where explore posts are read from.
#[derive(Debug, Clone, PartialEq)]
pub enum PostBackend {
    /// Hosted post store (PostgREST-style, `/rest/v1/posts`).
    Rest { url: String, api_key: Option<String> },
    /// JSON array of posts on disk, for offline runs.
    Fixture(PathBuf),
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub posts: PostBackend,
    /// Upper bound on posts requested per explore view.
    pub feed_limit: usize,
    /// Per-image HTTP timeout for dimension probes.
    pub probe_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            posts: post_backend(
                optional_env("POSTS_API_URL"),
                optional_env("POSTS_API_KEY"),
                optional_env("POSTS_FIXTURE"),
            )?,
            feed_limit: parse_env("FEED_LIMIT", 200)?,
            probe_timeout_secs: parse_env("PROBE_TIMEOUT_SECS", 10)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// POSTS_API_URL wins over POSTS_FIXTURE; one of them is required.
fn post_backend(
    url: Option<String>,
    api_key: Option<String>,
    fixture: Option<String>,
) -> Result<PostBackend> {
    match (url, fixture) {
        (Some(url), _) => Ok(PostBackend::Rest { url, api_key }),
        (None, Some(path)) => Ok(PostBackend::Fixture(PathBuf::from(path))),
        (None, None) => bail!("Either POSTS_API_URL or POSTS_FIXTURE must be set"),
    }
}

/// Unset and blank variables both read as `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_accepts_padded_number() {
        let port: u16 = parse_value("PORT", " 9090 ").unwrap();
        assert_eq!(port, 9090);
    }

    #[test]
    fn test_parse_value_rejects_garbage_with_key_in_message() {
        let err = parse_value::<u64>("PROBE_TIMEOUT_SECS", "ten").unwrap_err();
        assert!(err.to_string().contains("PROBE_TIMEOUT_SECS"));
    }

    #[test]
    fn test_post_backend_prefers_rest_url() {
        let backend = post_backend(
            Some("https://store.test".into()),
            Some("anon".into()),
            Some("posts.json".into()),
        )
        .unwrap();
        assert_eq!(
            backend,
            PostBackend::Rest {
                url: "https://store.test".into(),
                api_key: Some("anon".into())
            }
        );
    }

    #[test]
    fn test_post_backend_falls_back_to_fixture() {
        let backend = post_backend(None, None, Some("posts.json".into())).unwrap();
        assert_eq!(backend, PostBackend::Fixture(PathBuf::from("posts.json")));
    }

    #[test]
    fn test_post_backend_requires_a_source() {
        assert!(post_backend(None, Some("anon".into()), None).is_err());
    }

    #[test]
    fn test_parse_env_missing_uses_default() {
        let limit: usize = parse_env("EXPLORE_API_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(limit, 42);
    }
}
