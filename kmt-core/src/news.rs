use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type NewsId = u64;

/// An announcement shown in the news feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: NewsId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The feed a fresh installation starts with.
pub fn default_news(now: DateTime<Utc>) -> Vec<NewsItem> {
    vec![NewsItem {
        id: 1,
        title: "Welcome to KMT Trade Platform".to_string(),
        description: "We are excited to announce the launch of our new trading platform. \
            Start learning and trading with confidence!"
            .to_string(),
        image: None,
        video: None,
        created_at: now,
        updated_at: now,
    }]
}
