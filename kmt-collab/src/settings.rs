use std::sync::Arc;

use kmt_core::settings::{normalize_hero_video_url, DEFAULT_HERO_VIDEO_URL};

use crate::{
    video::{youtube_embed_url, youtube_video_id, EmbedOptions},
    CollabContext, Database, DatabaseError,
};

/// Site wide settings editable by admins
pub struct SiteSettings<Db> {
    db: Arc<Db>,
}

impl<Db> SiteSettings<Db>
where
    Db: Database,
{
    pub fn new(context: &CollabContext<Db>) -> Self {
        Self {
            db: context.database.clone(),
        }
    }

    /// The video shown on the landing page
    pub async fn hero_video_url(&self) -> Result<String, DatabaseError> {
        Ok(self
            .db
            .hero_video_url()
            .await?
            .unwrap_or_else(|| DEFAULT_HERO_VIDEO_URL.to_string()))
    }

    /// Stores the trimmed url, or the default if it's blank
    pub async fn set_hero_video_url(&self, url: &str) -> Result<String, DatabaseError> {
        let url = normalize_hero_video_url(url);
        self.db.save_hero_video_url(&url).await?;

        Ok(url)
    }

    /// Embed url of the hero video, or [None] if the stored url isn't a YouTube video
    pub async fn hero_embed_url(&self) -> Result<Option<String>, DatabaseError> {
        let url = self.hero_video_url().await?;

        Ok(youtube_video_id(&url)
            .and_then(|id| youtube_embed_url(&id, EmbedOptions::default())))
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

    #[tokio::test]
    async fn test_hero_video_defaults() {
        let collab = collab();

        assert_eq!(
            collab.settings.hero_video_url().await.unwrap(),
            DEFAULT_HERO_VIDEO_URL
        );

        let embed = collab.settings.hero_embed_url().await.unwrap().unwrap();
        assert!(embed.starts_with("https://www.youtube.com/embed/YPPMM-i5ebU?"));
    }

    #[tokio::test]
    async fn test_set_hero_video_url() {
        let collab = collab();

        let stored = collab
            .settings
            .set_hero_video_url("  https://youtu.be/JwRWf3ho4B8 ")
            .await
            .unwrap();
        assert_eq!(stored, "https://youtu.be/JwRWf3ho4B8");
        assert_eq!(collab.settings.hero_video_url().await.unwrap(), stored);

        collab.settings.set_hero_video_url("   ").await.unwrap();
        assert_eq!(
            collab.settings.hero_video_url().await.unwrap(),
            DEFAULT_HERO_VIDEO_URL
        );

        collab
            .settings
            .set_hero_video_url("https://vimeo.com/12")
            .await
            .unwrap();
        assert_eq!(collab.settings.hero_embed_url().await.unwrap(), None);
    }
}
