use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use kmt_core::{
    default_courses, default_news, default_users, settings::CategorySetting, Config, Course,
    NewsItem, User,
};
use log::{info, warn};
use serde::de::DeserializeOwned;

use super::{
    keys, Collection, Database, FileStorage, IntoDatabaseError, MemoryStorage, Repository, Result,
    Storage,
};

/// A database kept on a [Storage], seeded with the default academy content on first use.
pub struct LocalDatabase<S> {
    storage: Arc<S>,
    users: Collection<User, S>,
    courses: Collection<Course, S>,
    news: Collection<NewsItem, S>,
}

pub type MemoryDatabase = LocalDatabase<MemoryStorage>;
pub type FileDatabase = LocalDatabase<FileStorage>;

impl<S> LocalDatabase<S>
where
    S: Storage,
{
    pub fn open(storage: S, config: &Config) -> Result<Self> {
        let storage = Arc::new(storage);
        let now = Utc::now();

        let users = Collection::load(keys::USERS, storage.clone(), || default_users(config))?;
        let courses = Collection::load(keys::COURSES, storage.clone(), || default_courses(now))?;
        let news = Collection::load(keys::NEWS, storage.clone(), || default_news(now))?;

        info!(
            "Loaded {} users, {} courses and {} news items",
            users.snapshot().len(),
            courses.snapshot().len(),
            news.snapshot().len()
        );

        Ok(Self {
            storage,
            users,
            courses,
            news,
        })
    }

    /// Reads a JSON value, treating malformed data as absent.
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.storage.get(key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring malformed {}: {}", key, e);
                Ok(None)
            }
        }
    }
}

impl MemoryDatabase {
    pub fn in_memory(config: &Config) -> Result<Self> {
        Self::open(MemoryStorage::new(), config)
    }
}

#[async_trait]
impl<S> Database for LocalDatabase<S>
where
    S: Storage,
{
    fn users(&self) -> &dyn Repository<User> {
        &self.users
    }

    fn courses(&self) -> &dyn Repository<Course> {
        &self.courses
    }

    fn news(&self) -> &dyn Repository<NewsItem> {
        &self.news
    }

    async fn session(&self) -> Result<Option<User>> {
        self.read_json(keys::SESSION)
    }

    async fn save_session(&self, user: &User) -> Result<()> {
        let raw = serde_json::to_string(user).map_err(|e| e.any())?;
        self.storage.set(keys::SESSION, raw)
    }

    async fn clear_session(&self) -> Result<()> {
        self.storage.remove(keys::SESSION)
    }

    async fn category_settings(&self) -> Result<Option<Vec<CategorySetting>>> {
        let settings: Option<Vec<CategorySetting>> = self.read_json(keys::CATEGORY_SETTINGS)?;
        Ok(settings.filter(|s| !s.is_empty()))
    }

    async fn save_category_settings(&self, settings: &[CategorySetting]) -> Result<()> {
        let raw = serde_json::to_string(settings).map_err(|e| e.any())?;
        self.storage.set(keys::CATEGORY_SETTINGS, raw)
    }

    async fn hero_video_url(&self) -> Result<Option<String>> {
        let url = self.storage.get(keys::HERO_VIDEO_URL)?;

        Ok(url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty()))
    }

    async fn save_hero_video_url(&self, url: &str) -> Result<()> {
        self.storage.set(keys::HERO_VIDEO_URL, url.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_fresh_database_is_seeded() {
        let db = MemoryDatabase::in_memory(&Config::instant()).unwrap();

        assert_eq!(db.users().all().await.unwrap().len(), 2);
        assert_eq!(db.courses().all().await.unwrap().len(), 3);
        assert_eq!(db.news().all().await.unwrap().len(), 1);
        assert_eq!(db.session().await.unwrap(), None);
        assert_eq!(db.category_settings().await.unwrap(), None);
        assert_eq!(db.hero_video_url().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_session_is_absent() {
        let storage = MemoryStorage::new()
            .with(keys::SESSION, "{\"id\":")
            .with(keys::CATEGORY_SETTINGS, "[]")
            .with(keys::HERO_VIDEO_URL, "   ");
        let db = LocalDatabase::open(storage, &Config::instant()).unwrap();

        assert_eq!(db.session().await.unwrap(), None);
        assert_eq!(db.category_settings().await.unwrap(), None);
        assert_eq!(db.hero_video_url().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let db = MemoryDatabase::in_memory(&Config::instant()).unwrap();
        let user = db.users().get(&"u2".to_string()).await.unwrap();

        db.save_session(&user).await.unwrap();
        assert_eq!(db.session().await.unwrap(), Some(user));

        db.clear_session().await.unwrap();
        assert_eq!(db.session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_database_keeps_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kmt.json");
        let config = Config::instant();

        {
            let db = FileDatabase::open(FileStorage::open(&path).unwrap(), &config).unwrap();
            let mut user = db.users().get(&"u2".to_string()).await.unwrap();
            user.is_premium = true;
            db.users().save(user).await.unwrap();
        }

        let db = FileDatabase::open(FileStorage::open(&path).unwrap(), &config).unwrap();
        let user = db.users().get(&"u2".to_string()).await.unwrap();
        assert!(user.is_premium);
    }
}
