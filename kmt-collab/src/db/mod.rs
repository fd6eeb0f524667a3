use std::fmt::Display;

use async_trait::async_trait;
use kmt_core::{settings::CategorySetting, Course, CourseId, NewsId, NewsItem, User, UserId};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

mod collection;
pub use collection::*;

mod local;
pub use local::*;

mod storage;
pub use storage::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Storage keys, shared with earlier versions of the academy.
pub mod keys {
    pub const USERS: &str = "trading_platform_users";
    pub const SESSION: &str = "trading_platform_session";
    pub const COURSES: &str = "kmt_courses";
    pub const NEWS: &str = "kmt_news";
    pub const CATEGORY_SETTINGS: &str = "kmt_category_settings";
    pub const HERO_VIDEO_URL: &str = "kmt_hero_video_url";
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the storage
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },
}

impl DatabaseError {
    pub fn not_found(resource: &'static str, identifier: impl Display) -> Self {
        Self::NotFound {
            resource,
            identifier: identifier.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn any(self) -> DatabaseError;
}

impl IntoDatabaseError for std::io::Error {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }
}

impl IntoDatabaseError for serde_json::Error {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// A value that is stored as one element of a collection
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: PartialEq + Display + Clone + Send + Sync;

    /// Used in error messages
    const RESOURCE: &'static str;

    fn id(&self) -> &Self::Id;
}

impl Record for User {
    type Id = UserId;
    const RESOURCE: &'static str = "user";

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl Record for Course {
    type Id = CourseId;
    const RESOURCE: &'static str = "course";

    fn id(&self) -> &CourseId {
        &self.id
    }
}

impl Record for NewsItem {
    type Id = NewsId;
    const RESOURCE: &'static str = "news";

    fn id(&self) -> &NewsId {
        &self.id
    }
}

pub type Predicate<'a, T> = &'a (dyn Fn(&T) -> bool + Send + Sync);

/// Reads and writes records of one kind.
/// Records are values, callers get copies and hand back new versions through [Repository::save].
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    async fn get(&self, id: &T::Id) -> Result<T>;
    async fn list(&self, predicate: Predicate<'_, T>) -> Result<Vec<T>>;
    /// Inserts the record, or replaces the one with the same id
    async fn save(&self, record: T) -> Result<T>;
    async fn delete(&self, id: &T::Id) -> Result<()>;

    async fn all(&self) -> Result<Vec<T>> {
        self.list(&|_: &T| true).await
    }

    /// Returns the first record matching `predicate`, or [DatabaseError::NotFound].
    async fn find(&self, predicate: Predicate<'_, T>) -> Result<T> {
        self.list(predicate)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::not_found(T::RESOURCE, "<query>"))
    }
}

/// Represents a type that can store academy data
#[async_trait]
pub trait Database: Send + Sync {
    fn users(&self) -> &dyn Repository<User>;
    fn courses(&self) -> &dyn Repository<Course>;
    fn news(&self) -> &dyn Repository<NewsItem>;

    /// The user of the persisted session, if any
    async fn session(&self) -> Result<Option<User>>;
    async fn save_session(&self, user: &User) -> Result<()>;
    async fn clear_session(&self) -> Result<()>;

    /// Overwrites the session copy of `user` if they are the session user.
    async fn mirror_session(&self, user: &User) -> Result<()> {
        match self.session().await? {
            Some(current) if current.id == user.id => self.save_session(user).await,
            _ => Ok(()),
        }
    }

    /// Ends the session if it belongs to `user_id`.
    async fn clear_session_of(&self, user_id: &UserId) -> Result<()> {
        match self.session().await? {
            Some(current) if &current.id == user_id => self.clear_session().await,
            _ => Ok(()),
        }
    }

    /// Returns [None] if nothing usable is stored
    async fn category_settings(&self) -> Result<Option<Vec<CategorySetting>>>;
    async fn save_category_settings(&self, settings: &[CategorySetting]) -> Result<()>;

    async fn hero_video_url(&self) -> Result<Option<String>>;
    async fn save_hero_video_url(&self, url: &str) -> Result<()>;
}
