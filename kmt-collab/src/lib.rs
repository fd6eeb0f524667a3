//! Persistence, sessions and the services built on top of `kmt-core`.

mod auth;
mod catalog;
mod categories;
mod db;
mod news;
mod progression;
mod settings;
mod users;
mod util;

pub mod video;

use std::sync::Arc;

pub use auth::*;
pub use catalog::*;
pub use categories::*;
pub use db::*;
pub use news::*;
pub use progression::*;
pub use settings::*;
pub use users::*;

use kmt_core::Config;

/// The academy back end, tying authentication, the catalog and administration to one database.
pub struct Collab<Db> {
    database: Arc<Db>,

    pub auth: Auth<Db>,
    pub progress: ProgressTracker<Db>,
    pub catalog: CatalogManager<Db>,
    pub categories: Categories<Db>,
    pub news: NewsFeed<Db>,
    pub users: UserAdmin<Db>,
    pub settings: SiteSettings<Db>,
}

/// A type passed to the services of the collab system, to access shared state.
pub struct CollabContext<Db> {
    pub database: Arc<Db>,
    pub config: Arc<Config>,
}

impl<Db> Collab<Db>
where
    Db: Database,
{
    pub fn new(database: Db, config: Config) -> Self {
        let database = Arc::new(database);
        let config = Arc::new(config);

        let context = CollabContext {
            database: database.clone(),
            config,
        };

        Self {
            auth: Auth::new(&context),
            progress: ProgressTracker::new(&context),
            catalog: CatalogManager::new(&context),
            categories: Categories::new(&context),
            news: NewsFeed::new(&context),
            users: UserAdmin::new(&context),
            settings: SiteSettings::new(&context),
            database,
        }
    }

    pub fn database(&self) -> &Arc<Db> {
        &self.database
    }
}
