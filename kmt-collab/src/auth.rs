use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use kmt_core::{default_users, Config, User, UserId};
use log::{info, warn};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use std::sync::Arc;
use thiserror::Error;

use crate::{util::random_string, CollabContext, Database, DatabaseError, DatabaseResult};

/// Where the login flow currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// Waiting for the simulated server
    Authenticating,
    Authenticated(UserId),
}

pub struct Auth<Db> {
    db: Arc<Db>,
    config: Arc<Config>,
    argon: Argon2<'static>,
    state: Mutex<SessionState>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("An account with email {0} already exists")]
    EmailTaken(String),
    #[error("Already logged in")]
    AlreadyAuthenticated,
    #[error("Another login is in progress")]
    InProgress,
    /// The signup form is incomplete or wrong
    #[error("{0}")]
    Invalid(String),
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

impl<Db> Auth<Db>
where
    Db: Database,
{
    pub fn new(context: &CollabContext<Db>) -> Self {
        Self {
            db: context.database.clone(),
            config: context.config.clone(),
            argon: Argon2::default(),
            state: Mutex::new(SessionState::Unauthenticated),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    /// Picks up the session left in storage by a previous run
    pub async fn restore(&self) -> Result<Option<User>, DatabaseError> {
        let session = self.db.session().await?;

        *self.state.lock() = match &session {
            Some(user) => {
                info!("Restored session of {}", user.email);
                SessionState::Authenticated(user.id.clone())
            }
            None => SessionState::Unauthenticated,
        };

        Ok(session)
    }

    /// Returns the logged in user, as stored in the session
    pub async fn current_user(&self) -> Result<Option<User>, DatabaseError> {
        if !matches!(self.state(), SessionState::Authenticated(_)) {
            return Ok(None);
        }

        self.db.session().await
    }

    /// Logs in with an email and password, persisting the session
    pub async fn login(&self, credentials: Credentials) -> Result<User, AuthError> {
        self.begin()?;
        tokio::time::sleep(self.config.auth_delay).await;

        let result = self.authenticate(&credentials).await;
        self.finish(result).await
    }

    /// Creates a student account and logs it in
    pub async fn signup(&self, new_user: NewSignup) -> Result<User, AuthError> {
        let new_user = self.validate(new_user)?;

        self.begin()?;
        tokio::time::sleep(self.config.auth_delay).await;

        let result = self.create_user(new_user).await;
        self.finish(result).await
    }

    /// Ends the session, if there is one
    pub async fn logout(&self) -> Result<(), DatabaseError> {
        self.db.clear_session().await?;
        *self.state.lock() = SessionState::Unauthenticated;

        Ok(())
    }

    /// Moves to [SessionState::Authenticating], unless a session exists or is being made
    fn begin(&self) -> Result<(), AuthError> {
        let mut state = self.state.lock();

        match *state {
            SessionState::Authenticated(_) => Err(AuthError::AlreadyAuthenticated),
            SessionState::Authenticating => Err(AuthError::InProgress),
            SessionState::Unauthenticated => {
                *state = SessionState::Authenticating;
                Ok(())
            }
        }
    }

    async fn finish(&self, result: Result<User, AuthError>) -> Result<User, AuthError> {
        let result = match result {
            Ok(user) => self
                .db
                .save_session(&user)
                .await
                .map(|_| user)
                .map_err(AuthError::Db),
            Err(e) => Err(e),
        };

        *self.state.lock() = match &result {
            Ok(user) => {
                info!("{} logged in", user.email);
                SessionState::Authenticated(user.id.clone())
            }
            Err(e) => {
                warn!("Authentication failed: {}", e);
                SessionState::Unauthenticated
            }
        };

        result
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let email = credentials.email.trim();
        let admin = &self.config.admin;
        let student = &self.config.demo_student;

        if email.eq_ignore_ascii_case(&admin.email) && credentials.password == admin.password {
            let stored = self
                .db
                .users()
                .find(&|u: &User| u.is_admin() && u.has_email(&admin.email))
                .await;

            return match stored {
                Ok(user) => Ok(user),
                Err(e) if e.is_not_found() => default_users(&self.config)
                    .into_iter()
                    .find(User::is_admin)
                    .ok_or(AuthError::InvalidCredentials),
                Err(e) => Err(AuthError::Db(e)),
            };
        }

        let user = self
            .db
            .users()
            .find(&|u: &User| u.has_email(email))
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        if email.eq_ignore_ascii_case(&student.email) && credentials.password == student.password {
            return Ok(user);
        }

        let Some(password_hash) = &user.password_hash else {
            return Err(AuthError::InvalidCredentials);
        };

        let stored_password = PasswordHash::parse(password_hash, Encoding::default())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(credentials.password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        Ok(user)
    }

    fn validate(&self, new_user: NewSignup) -> Result<NewSignup, AuthError> {
        let name = new_user.name.trim().to_string();
        let email = new_user.email.trim().to_string();

        if name.is_empty() {
            return Err(AuthError::Invalid("Name is required".to_string()));
        }

        if email.is_empty() {
            return Err(AuthError::Invalid("Email is required".to_string()));
        }

        if new_user.password.chars().count() < self.config.min_password_length {
            return Err(AuthError::Invalid(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            )));
        }

        Ok(NewSignup {
            name,
            email,
            password: new_user.password,
        })
    }

    async fn create_user(&self, new_user: NewSignup) -> Result<User, AuthError> {
        self.db
            .users()
            .find(&|u: &User| u.has_email(&new_user.email))
            .await
            .conflict_or_ok("user", "email", &new_user.email)
            .map_err(|e| match e {
                DatabaseError::Conflict { value, .. } => AuthError::EmailTaken(value),
                err => AuthError::Db(err),
            })?;

        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(new_user.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let mut user = User::new(
            format!("u{}", random_string(12)),
            new_user.name,
            new_user.email,
        );
        user.password_hash = Some(hashed_password);

        self.db.users().save(user).await.map_err(AuthError::Db)
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct NewSignup {
    pub name: String,
    pub email: String,
    pub password: String,
}
