use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A festival feed post as stored in the hosted `posts` table.
/// Read-only here; the explore layout never mutates posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub image_url: String,
    pub posted_by: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(deserialize_with = "store_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Accepts RFC 3339 timestamps and the offset-less form a `timestamp` column
/// returns (`2024-03-01T12:00:00.123456` or `2024-03-01 12:00:00`), read as UTC.
fn store_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_store_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("unrecognized timestamp: {raw}"))
    })
}

fn parse_store_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
impl Post {
    /// Minimal post for tests; only `id` and `image_url` matter to the layout.
    pub fn sample(id: &str) -> Self {
        Post {
            id: id.to_string(),
            image_url: format!("https://cdn.example.test/{id}.jpg"),
            posted_by: "tester".to_string(),
            hashtags: vec![],
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}
