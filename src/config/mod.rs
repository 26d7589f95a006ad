use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
    /// Upper bound for each collaborator call (session lookup, insert). None disables it.
    pub collaborator_timeout_ms: Option<u64>,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    /// Column of the pages table that receives the caller's user id
    pub owner_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub session_cookie: String,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub reject_empty_fields: bool,
    pub max_title_length: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("PAGES_API_HOST") {
            self.server.host = v;
        }
        if let Some(port) = lookup("PAGES_API_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }

        // API overrides
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Some(v) = lookup("API_COLLABORATOR_TIMEOUT_MS") {
            // 0 or garbage switches the timeout off
            self.api.collaborator_timeout_ms = v.parse().ok().filter(|ms| *ms > 0);
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = lookup("DATABASE_OWNER_COLUMN") {
            if !v.trim().is_empty() {
                self.database.owner_column = v.trim().to_string();
            }
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = lookup("SECURITY_SESSION_COOKIE") {
            if !v.trim().is_empty() {
                self.security.session_cookie = v.trim().to_string();
            }
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Validation overrides
        if let Some(v) = lookup("PAGES_REJECT_EMPTY_FIELDS") {
            self.validation.reject_empty_fields = v.parse().unwrap_or(self.validation.reject_empty_fields);
        }
        if let Some(v) = lookup("PAGES_MAX_TITLE_LENGTH") {
            self.validation.max_title_length = v.parse().unwrap_or(self.validation.max_title_length);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            api: ApiConfig {
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                collaborator_timeout_ms: None,
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                owner_column: "owner_id".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
                session_cookie: "access_token".to_string(),
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            validation: ValidationConfig {
                reject_empty_fields: false,
                max_title_length: 1024,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            api: ApiConfig {
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                collaborator_timeout_ms: Some(10_000),
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                owner_column: "owner_id".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                session_cookie: "access_token".to_string(),
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            validation: ValidationConfig {
                reject_empty_fields: false,
                max_title_length: 1024,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            api: ApiConfig {
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                collaborator_timeout_ms: Some(5_000),
                enable_request_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                owner_column: "owner_id".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                session_cookie: "access_token".to_string(),
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            validation: ValidationConfig {
                reject_empty_fields: false,
                max_title_length: 1024,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.owner_column, "owner_id");
        assert!(config.api.collaborator_timeout_ms.is_none());
        assert!(!config.validation.reject_empty_fields);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.api.collaborator_timeout_ms, Some(5_000));
        assert_eq!(config.security.jwt_expiry_hours, 4);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn overrides_replace_preset_values() {
        let config = AppConfig::development().with_overrides(overrides(&[
            ("PAGES_API_PORT", "8080"),
            ("DATABASE_OWNER_COLUMN", "user_id"),
            ("JWT_SECRET", "s3cret"),
            ("SECURITY_CORS_ORIGINS", "https://a.test, https://b.test,"),
            ("PAGES_REJECT_EMPTY_FIELDS", "true"),
            ("API_COLLABORATOR_TIMEOUT_MS", "250"),
        ]));

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.owner_column, "user_id");
        assert_eq!(config.security.jwt_secret, "s3cret");
        assert_eq!(config.security.cors_origins, vec!["https://a.test", "https://b.test"]);
        assert!(config.validation.reject_empty_fields);
        assert_eq!(config.api.collaborator_timeout_ms, Some(250));
    }

    #[test]
    fn port_falls_back_to_generic_port_variable() {
        let config = AppConfig::development().with_overrides(overrides(&[("PORT", "4100")]));
        assert_eq!(config.server.port, 4100);
    }

    #[test]
    fn unparseable_overrides_keep_defaults() {
        let config = AppConfig::staging().with_overrides(overrides(&[
            ("DATABASE_MAX_CONNECTIONS", "many"),
            ("PAGES_API_PORT", "not-a-port"),
            ("API_COLLABORATOR_TIMEOUT_MS", "0"),
        ]));

        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.server.port, 3000);
        assert!(config.api.collaborator_timeout_ms.is_none());
    }

    #[test]
    fn secret_is_not_serialized() {
        let mut config = AppConfig::development();
        config.security.jwt_secret = "do-not-print".to_string();
        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("do-not-print"));
    }
}
