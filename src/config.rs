//! Process configuration read once at startup.

use std::time::Duration;

use crate::db::DbConfig;
use crate::media::MediaConfig;

/// Credentials for the first admin, created only while the users table is empty.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub name: String,
    pub password: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub database: Option<DbConfig>,
    pub session_ttl_hours: i64,
    pub login_max_attempts: u32,
    pub login_window: Duration,
    pub allowed_origins: Vec<String>,
    pub admin: Option<AdminSeed>,
    pub media: Option<MediaConfig>,
    pub contact_webhook: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3001,
            database: None,
            session_ttl_hours: 24,
            login_max_attempts: 5,
            login_window: Duration::from_secs(15 * 60),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            admin: None,
            media: None,
            contact_webhook: None,
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        // ALLOWED_ORIGINS (comma-separated) wins over FRONTEND_ORIGIN.
        let allowed_origins = non_empty("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .or_else(|| non_empty("FRONTEND_ORIGIN").map(|o| vec![o.trim().to_string()]))
            .unwrap_or(defaults.allowed_origins);

        let admin = non_empty("ADMIN_USERNAME").and_then(|username| {
            let password = non_empty("ADMIN_PASSWORD");
            let password_hash = non_empty("ADMIN_PASSWORD_HASH");
            if password.is_none() && password_hash.is_none() {
                return None;
            }
            Some(AdminSeed {
                name: non_empty("ADMIN_NAME").unwrap_or_else(|| username.clone()),
                username,
                password,
                password_hash,
            })
        });

        Self {
            environment: non_empty("ENVIRONMENT").unwrap_or(defaults.environment),
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: parse_or(get("PORT"), defaults.port),
            database: DbConfig::from_vars(&get),
            session_ttl_hours: parse_or(get("SESSION_TTL_HOURS"), defaults.session_ttl_hours)
                .max(1),
            login_max_attempts: parse_or(get("LOGIN_MAX_ATTEMPTS"), defaults.login_max_attempts)
                .max(1),
            login_window: get("LOGIN_WINDOW_SECS")
                .and_then(|s| s.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.login_window),
            allowed_origins,
            admin,
            media: MediaConfig::from_vars(&get),
            contact_webhook: non_empty("CONTACT_WEBHOOK_URL"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = AppConfig::from_vars(|_| None);
        assert_eq!(config.port, 3001);
        assert!(config.database.is_none());
        assert!(config.admin.is_none());
        assert!(config.media.is_none());
        assert!(!config.is_production());
        assert_eq!(config.allowed_origins.len(), 2);
    }

    #[test]
    fn test_allowed_origins_take_precedence() {
        let config = AppConfig::from_vars(vars(&[
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("FRONTEND_ORIGIN", "https://ignored.example"),
        ]));
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );

        let config = AppConfig::from_vars(vars(&[("FRONTEND_ORIGIN", "https://site.example")]));
        assert_eq!(config.allowed_origins, vec!["https://site.example"]);
    }

    #[test]
    fn test_admin_seed_needs_a_password() {
        let config = AppConfig::from_vars(vars(&[("ADMIN_USERNAME", "owner")]));
        assert!(config.admin.is_none());

        let config = AppConfig::from_vars(vars(&[
            ("ADMIN_USERNAME", "owner"),
            ("ADMIN_PASSWORD_HASH", "$2b$12$abc"),
        ]));
        let admin = config.admin.unwrap();
        assert_eq!(admin.name, "owner");
        assert!(admin.password.is_none());
    }

    #[test]
    fn test_numeric_settings_fall_back_on_garbage() {
        let config = AppConfig::from_vars(vars(&[
            ("PORT", "eighty"),
            ("SESSION_TTL_HOURS", "0"),
            ("LOGIN_WINDOW_SECS", "30"),
            ("ENVIRONMENT", "production"),
        ]));
        assert_eq!(config.port, 3001);
        assert_eq!(config.session_ttl_hours, 1);
        assert_eq!(config.login_window, Duration::from_secs(30));
        assert!(config.is_production());
    }
}
