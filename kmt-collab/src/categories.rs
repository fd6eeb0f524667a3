use std::sync::Arc;

use kmt_core::settings::{self, default_category_settings, CategorySetting, Direction};

use crate::{CollabContext, Database, DatabaseError};

/// Which course categories are shown, and in what order
pub struct Categories<Db> {
    db: Arc<Db>,
}

impl<Db> Categories<Db>
where
    Db: Database,
{
    pub fn new(context: &CollabContext<Db>) -> Self {
        Self {
            db: context.database.clone(),
        }
    }

    /// Enabled categories, sorted
    pub async fn categories(&self) -> Result<Vec<CategorySetting>, DatabaseError> {
        Ok(settings::enabled(&self.load().await?))
    }

    /// Every category, sorted
    pub async fn all_for_admin(&self) -> Result<Vec<CategorySetting>, DatabaseError> {
        Ok(settings::sorted(&self.load().await?))
    }

    pub async fn set_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<Vec<CategorySetting>, DatabaseError> {
        let current = self.load().await?;

        if !current.iter().any(|s| s.id == id) {
            return Err(DatabaseError::not_found("category", id));
        }

        self.store(settings::set_enabled(&current, id, enabled)).await
    }

    /// Puts `ids` first, in order, followed by the remaining categories
    pub async fn set_order(&self, ids: &[&str]) -> Result<Vec<CategorySetting>, DatabaseError> {
        let current = self.load().await?;
        self.store(settings::set_order(&current, ids)).await
    }

    pub async fn move_category(
        &self,
        id: &str,
        direction: Direction,
    ) -> Result<Vec<CategorySetting>, DatabaseError> {
        let current = self.load().await?;
        self.store(settings::move_category(&current, id, direction))
            .await
    }

    async fn load(&self) -> Result<Vec<CategorySetting>, DatabaseError> {
        Ok(self
            .db
            .category_settings()
            .await?
            .unwrap_or_else(default_category_settings))
    }

    async fn store(
        &self,
        next: Vec<CategorySetting>,
    ) -> Result<Vec<CategorySetting>, DatabaseError> {
        self.db.save_category_settings(&next).await?;
        Ok(settings::sorted(&next))
    }
}
