use std::sync::Arc;

use kmt_core::{User, UserId};
use log::info;

use crate::{CollabContext, Database, DatabaseError, DatabaseResult};

/// Changes to a user's profile. Fields left as [None] are kept.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// User management for admins. Changes to the session user are mirrored into the session.
pub struct UserAdmin<Db> {
    db: Arc<Db>,
}

impl<Db> UserAdmin<Db>
where
    Db: Database,
{
    pub fn new(context: &CollabContext<Db>) -> Self {
        Self {
            db: context.database.clone(),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        self.db.users().all().await
    }

    pub async fn user(&self, user_id: &UserId) -> Result<User, DatabaseError> {
        self.db.users().get(user_id).await
    }

    pub async fn set_premium(&self, user_id: &UserId, premium: bool) -> Result<User, DatabaseError> {
        let mut user = self.user(user_id).await?;
        user.is_premium = premium;

        info!("Premium for {} is now {}", user.email, premium);
        self.save(user).await
    }

    pub async fn update_profile(
        &self,
        user_id: &UserId,
        patch: ProfilePatch,
    ) -> Result<User, DatabaseError> {
        let mut user = self.user(user_id).await?;

        if let Some(name) = patch.name {
            user.name = name.trim().to_string();
        }

        if let Some(email) = patch.email {
            let email = email.trim().to_string();

            self.db
                .users()
                .find(&|u: &User| u.id != user.id && u.has_email(&email))
                .await
                .conflict_or_ok("user", "email", &email)?;

            user.email = email;
        }

        self.save(user).await
    }

    /// Removes a user, ending their session if they are logged in
    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), DatabaseError> {
        self.db.users().delete(user_id).await?;
        self.db.clear_session_of(user_id).await?;

        info!("Deleted user {}", user_id);
        Ok(())
    }

    async fn save(&self, user: User) -> Result<User, DatabaseError> {
        let user = self.db.users().save(user).await?;
        self.db.mirror_session(&user).await?;

        Ok(user)
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

    fn student() -> UserId {
        "u2".to_string()
    }

    async fn log_in_student(collab: &Collab<MemoryDatabase>) {
        let user = collab.users.user(&student()).await.unwrap();
        collab.database().save_session(&user).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_premium_mirrors_session() {
        let collab = collab();
        log_in_student(&collab).await;

        let user = collab.users.set_premium(&student(), true).await.unwrap();

        assert!(user.is_premium);
        let session = collab.database().session().await.unwrap().unwrap();
        assert!(session.is_premium);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let collab = collab();

        let patch = ProfilePatch {
            name: Some(" Grace ".to_string()),
            email: None,
        };
        let user = collab.users.update_profile(&student(), patch).await.unwrap();
        assert_eq!(user.name, "Grace");
        assert_eq!(user.email, "student@kmt.local");

        let taken = ProfilePatch {
            name: None,
            email: Some("admin@kmt.local".to_string()),
        };
        let result = collab.users.update_profile(&student(), taken).await;
        assert!(matches!(result, Err(DatabaseError::Conflict { .. })));

        let own = ProfilePatch {
            name: None,
            email: Some("STUDENT@kmt.local".to_string()),
        };
        assert!(collab.users.update_profile(&student(), own).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user_ends_their_session() {
        let collab = collab();
        log_in_student(&collab).await;

        collab.users.delete_user(&student()).await.unwrap();

        assert_eq!(collab.users.list_users().await.unwrap().len(), 1);
        assert_eq!(collab.database().session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_other_user_keeps_session() {
        let collab = collab();
        log_in_student(&collab).await;

        collab.users.delete_user(&"u1".to_string()).await.unwrap();

        assert!(collab.database().session().await.unwrap().is_some());
    }
}
