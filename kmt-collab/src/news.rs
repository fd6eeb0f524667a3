use std::sync::Arc;

use chrono::Utc;
use kmt_core::{NewsId, NewsItem};
use log::info;

use crate::{util::next_id, CollabContext, Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct NewNews {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub video: Option<String>,
}

/// Changes to a news item. Fields left as [None] are kept.
#[derive(Debug, Clone, Default)]
pub struct NewsPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<Option<String>>,
    pub video: Option<Option<String>>,
}

/// The announcements feed, newest first
pub struct NewsFeed<Db> {
    db: Arc<Db>,
}

impl<Db> NewsFeed<Db>
where
    Db: Database,
{
    pub fn new(context: &CollabContext<Db>) -> Self {
        Self {
            db: context.database.clone(),
        }
    }

    pub async fn list(&self) -> Result<Vec<NewsItem>, DatabaseError> {
        let mut items = self.db.news().all().await?;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(items)
    }

    pub async fn get(&self, id: NewsId) -> Result<NewsItem, DatabaseError> {
        self.db.news().get(&id).await
    }

    pub async fn add(&self, new_item: NewNews) -> Result<NewsItem, DatabaseError> {
        let existing = self.db.news().all().await?;
        let now = Utc::now();

        let item = NewsItem {
            id: next_id(existing.iter().map(|n| n.id))?,
            title: new_item.title,
            description: new_item.description,
            image: new_item.image,
            video: new_item.video,
            created_at: now,
            updated_at: now,
        };

        let item = self.db.news().save(item).await?;
        info!("Published news {} ({})", item.id, item.title);

        Ok(item)
    }

    pub async fn update(&self, id: NewsId, patch: NewsPatch) -> Result<NewsItem, DatabaseError> {
        let mut item = self.get(id).await?;

        if let Some(title) = patch.title {
            item.title = title;
        }

        if let Some(description) = patch.description {
            item.description = description;
        }

        if let Some(image) = patch.image {
            item.image = image;
        }

        if let Some(video) = patch.video {
            item.video = video;
        }

        item.updated_at = Utc::now();
        self.db.news().save(item).await
    }

    pub async fn delete(&self, id: NewsId) -> Result<(), DatabaseError> {
        self.db.news().delete(&id).await
    }
}

#[cfg(test)]
mod test {
    use kmt_core::Config;

    use super::*;
    use crate::{Collab, MemoryDatabase};

    fn collab() -> Collab<MemoryDatabase> {
        let config = Config::instant();
        let db = MemoryDatabase::in_memory(&config).unwrap();

        Collab::new(db, config)
    }

    fn new_news(title: &str) -> NewNews {
        NewNews {
            title: title.to_string(),
            description: "Markets are open".to_string(),
            image: None,
            video: Some("https://youtu.be/JwRWf3ho4B8".to_string()),
        }
    }

    #[tokio::test]
    async fn test_newest_first() {
        let collab = collab();

        let added = collab.news.add(new_news("Second")).await.unwrap();
        let items = collab.news.list().await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, added.id);
        assert_eq!(added.created_at, added.updated_at);
        assert_eq!(added.id, 2);
    }

    #[tokio::test]
    async fn test_update_refreshes_timestamp() {
        let collab = collab();
        let before = collab.news.get(1).await.unwrap();

        let patch = NewsPatch {
            title: Some("Welcome!".to_string()),
            image: Some(Some("banner.png".to_string())),
            ..Default::default()
        };
        let updated = collab.news.update(1, patch).await.unwrap();

        assert_eq!(updated.title, "Welcome!");
        assert_eq!(updated.description, before.description);
        assert_eq!(updated.image.as_deref(), Some("banner.png"));
        assert_eq!(updated.created_at, before.created_at);
        assert!(updated.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn test_delete() {
        let collab = collab();

        collab.news.delete(1).await.unwrap();

        assert!(collab.news.list().await.unwrap().is_empty());
        assert!(collab.news.get(1).await.unwrap_err().is_not_found());
    }
}
