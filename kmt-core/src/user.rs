use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Config, Level, LessonId};

/// The type used for user ids.
pub type UserId = String;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A student or administrator of the academy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_premium: bool,
    /// Never lowered once set
    #[serde(default)]
    pub current_level: Level,
    /// Ids of lessons the user has watched. Only membership matters.
    #[serde(default)]
    pub completed_videos: BTreeSet<LessonId>,
    /// Argon2 hash for accounts created through signup.
    /// Built-in accounts authenticate against configured credentials instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

impl User {
    /// Creates a fresh student account.
    pub fn new(id: UserId, name: String, email: String) -> Self {
        Self {
            id,
            name,
            email,
            role: Role::User,
            is_premium: false,
            current_level: Level::Beginner,
            completed_videos: BTreeSet::new(),
            password_hash: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_completed(&self, lesson_id: LessonId) -> bool {
        self.completed_videos.contains(&lesson_id)
    }

    /// Returns true if `email` belongs to this user, ignoring case and surrounding whitespace.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

/// The accounts a fresh installation starts with, matching the built-in credentials.
pub fn default_users(config: &Config) -> Vec<User> {
    let mut admin = User::new(
        "u1".to_string(),
        "Administrator".to_string(),
        config.admin.email.clone(),
    );
    admin.role = Role::Admin;
    admin.is_premium = true;

    let student = User::new(
        "u2".to_string(),
        "Student User".to_string(),
        config.demo_student.email.clone(),
    );

    vec![admin, student]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_legacy_record_gets_defaults() {
        let json = r#"{
            "id": "u2",
            "name": "Student User",
            "email": "student@kmt.local",
            "role": "user",
            "isPremium": false
        }"#;

        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.current_level, Level::Beginner);
        assert!(user.completed_videos.is_empty());
        assert_eq!(user.password_hash, None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut user = User::new("u9".into(), "Ada".into(), "ada@kmt.local".into());
        user.completed_videos.insert(101);

        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(value["currentLevel"], "Beginner");
        assert_eq!(value["isPremium"], false);
        assert_eq!(value["completedVideos"], serde_json::json!([101]));
        assert!(value.get("passwordHash").is_none());
    }

    #[test]
    fn test_email_matching() {
        let user = User::new("u1".into(), "Ada".into(), "Ada@Kmt.local".into());

        assert!(user.has_email(" ada@kmt.local"));
        assert!(!user.has_email("bob@kmt.local"));
    }
}
