use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use kmt_core::Config;

/// Where data is kept when `KMT_DATA_PATH` isn't set
pub const DEFAULT_DATA_PATH: &str = "kmt-data.json";

/// Everything the binary reads from its environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The storage file
    pub data_path: PathBuf,
    pub academy: Config,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut academy = Config::default();

        if let Some(delay) = lookup("KMT_AUTH_DELAY_MS") {
            let millis = delay
                .trim()
                .parse::<u64>()
                .with_context(|| format!("KMT_AUTH_DELAY_MS must be a number, got {delay:?}"))?;

            academy.auth_delay = Duration::from_millis(millis);
        }

        let overrides = [
            ("KMT_ADMIN_EMAIL", &mut academy.admin.email),
            ("KMT_ADMIN_PASSWORD", &mut academy.admin.password),
            ("KMT_DEMO_EMAIL", &mut academy.demo_student.email),
            ("KMT_DEMO_PASSWORD", &mut academy.demo_student.password),
        ];

        for (key, field) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *field = value.trim().to_string();
            }
        }

        let data_path = lookup("KMT_DATA_PATH")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string())
            .into();

        Ok(Self { data_path, academy })
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn from_map(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]).unwrap();

        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(config.academy.auth_delay, Duration::from_millis(1000));
        assert_eq!(config.academy.admin.email, "admin@kmt.local");
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("KMT_DATA_PATH", "/tmp/academy.json"),
            ("KMT_AUTH_DELAY_MS", "0"),
            ("KMT_ADMIN_EMAIL", "boss@example.com"),
            ("KMT_DEMO_PASSWORD", " demo-pass "),
            ("KMT_DEMO_EMAIL", "  "),
        ])
        .unwrap();

        assert_eq!(config.data_path, PathBuf::from("/tmp/academy.json"));
        assert_eq!(config.academy.auth_delay, Duration::ZERO);
        assert_eq!(config.academy.admin.email, "boss@example.com");
        assert_eq!(config.academy.demo_student.password, "demo-pass");
        assert_eq!(config.academy.demo_student.email, "student@kmt.local");
    }

    #[test]
    fn test_bad_delay() {
        assert!(from_map(&[("KMT_AUTH_DELAY_MS", "soon")]).is_err());
    }
}
