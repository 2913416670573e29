use std::env;
use tracing::warn;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://mrms.db";
pub const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 24;
/// One year.
pub const MAX_JWT_EXPIRATION_HOURS: i64 = 8760;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub cors_allowed_origin: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_URL not set, using {}", DEFAULT_DATABASE_URL);
                    DEFAULT_DATABASE_URL.to_string()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|value| expiration_hours(&value))
                .unwrap_or(DEFAULT_JWT_EXPIRATION_HOURS),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(3000),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok(),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty() && !self.database_url.is_empty()
    }

    /// Both bootstrap credentials must be present for the initial administrator
    /// account to be created.
    pub fn admin_bootstrap(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email.as_str(), password.as_str()))
            }
            _ => None,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn expiration_hours(value: &str) -> Option<i64> {
    match value.trim().parse::<i64>() {
        Ok(hours) if hours > MAX_JWT_EXPIRATION_HOURS => {
            warn!(
                "JWT_EXPIRATION_HOURS {} exceeds the maximum, using {}",
                hours, MAX_JWT_EXPIRATION_HOURS
            );
            Some(MAX_JWT_EXPIRATION_HOURS)
        }
        Ok(hours) if hours > 0 => Some(hours),
        _ => {
            warn!("JWT_EXPIRATION_HOURS is not a positive integer: {}", value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "secret".to_string(),
            jwt_expiration_hours: 24,
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            cors_allowed_origin: None,
            admin_email: None,
            admin_password: None,
        }
    }

    #[test]
    fn test_is_configured_requires_secret() {
        let mut config = config();
        assert!(config.is_configured());

        config.jwt_secret.clear();
        assert!(!config.is_configured());
    }

    #[test]
    fn test_admin_bootstrap_needs_both_values() {
        let mut config = config();
        assert!(config.admin_bootstrap().is_none());

        config.admin_email = Some("admin@clinic.test".to_string());
        assert!(config.admin_bootstrap().is_none());

        config.admin_password = Some("Admin1234".to_string());
        assert_eq!(config.admin_bootstrap(), Some(("admin@clinic.test", "Admin1234")));
    }

    #[test]
    fn test_expiration_hours_is_bounded() {
        assert_eq!(expiration_hours("8"), Some(8));
        assert_eq!(expiration_hours("8760"), Some(MAX_JWT_EXPIRATION_HOURS));
        assert_eq!(expiration_hours("99999999999"), Some(MAX_JWT_EXPIRATION_HOURS));
        assert_eq!(expiration_hours("0"), None);
        assert_eq!(expiration_hours("-5"), None);
        assert_eq!(expiration_hours("soon"), None);
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:8080");
    }
}
