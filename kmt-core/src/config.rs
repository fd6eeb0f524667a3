use std::time::Duration;

/// An email and password pair accepted by the mock login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinAccount {
    pub email: String,
    pub password: String,
}

/// The configuration of the academy
#[derive(Debug, Clone)]
pub struct Config {
    /// How long login and signup pretend to wait for a server
    pub auth_delay: Duration,
    /// Logs in as the stored admin
    pub admin: BuiltinAccount,
    /// Logs in as the stored user with this email
    pub demo_student: BuiltinAccount,
    /// Shortest password signup accepts
    pub min_password_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Long enough for a spinner to show up
            auth_delay: Duration::from_millis(1000),
            admin: BuiltinAccount {
                email: "admin@kmt.local".to_string(),
                password: "admin123".to_string(),
            },
            demo_student: BuiltinAccount {
                email: "student@kmt.local".to_string(),
                password: "student".to_string(),
            },
            min_password_length: 6,
        }
    }
}

impl Config {
    /// A config without the artificial delay.
    pub fn instant() -> Self {
        Self {
            auth_delay: Duration::ZERO,
            ..Default::default()
        }
    }
}
