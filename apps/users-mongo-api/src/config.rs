use axum::http::HeaderValue;
use core_config::{
    AppInfo, ConfigError, FromEnv, app_info, env_list_or_default, env_or_default,
    env_parse_or_default, server::ServerConfig,
};
use std::fmt;

// Import MongoDB config from the database library
use database::mongodb::MongoConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

const DEFAULT_SECRET_KEY: &str = "your-secret-key-here";
const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:8000", "http://localhost:3000"];

/// Service-level settings read from the environment
#[derive(Clone)]
pub struct Settings {
    /// Mount point of the OpenAPI document
    pub api_prefix: String,
    pub project_name: String,
    pub secret_key: String,
    pub access_token_expire_minutes: u64,
    /// Origins allowed by CORS in production
    pub cors_origins: Vec<String>,
}

impl Settings {
    /// URL of the generated OpenAPI JSON document
    pub fn openapi_url(&self) -> String {
        format!("{}/openapi.json", self.api_prefix.trim_end_matches('/'))
    }

    /// True while `SECRET_KEY` still holds the shipped placeholder
    pub fn uses_default_secret_key(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_prefix", &self.api_prefix)
            .field("project_name", &self.project_name)
            .field("secret_key", &"[REDACTED]")
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl FromEnv for Settings {
    fn from_env() -> Result<Self, ConfigError> {
        let cors_origins = env_list_or_default("BACKEND_CORS_ORIGINS", DEFAULT_CORS_ORIGINS);
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::ParseError {
                key: "BACKEND_CORS_ORIGINS".to_string(),
                details: format!("{origin}: {e}"),
            })?;
        }

        Ok(Self {
            api_prefix: env_or_default("API_V1_STR", "/api/v1"),
            project_name: env_or_default("PROJECT_NAME", "Users MongoDB API"),
            secret_key: env_or_default("SECRET_KEY", DEFAULT_SECRET_KEY),
            access_token_expire_minutes: env_parse_or_default(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                "11520",
            )?,
            cors_origins,
        })
    }
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub settings: Settings,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app: app_info!(),
            settings: Settings::from_env()?,
            mongodb: MongoConfig::from_env()?,
            server: ServerConfig::from_env()?,
            environment: Environment::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[&str] = &[
        "API_V1_STR",
        "PROJECT_NAME",
        "SECRET_KEY",
        "ACCESS_TOKEN_EXPIRE_MINUTES",
        "BACKEND_CORS_ORIGINS",
    ];

    #[test]
    fn test_settings_defaults() {
        temp_env::with_vars_unset(KEYS, || {
            let settings = Settings::from_env().unwrap();
            assert_eq!(settings.api_prefix, "/api/v1");
            assert_eq!(settings.project_name, "Users MongoDB API");
            assert_eq!(settings.access_token_expire_minutes, 11520);
            assert_eq!(
                settings.cors_origins,
                vec!["http://localhost:8000", "http://localhost:3000"]
            );
            assert_eq!(settings.openapi_url(), "/api/v1/openapi.json");
        });
    }

    #[test]
    fn test_settings_from_env() {
        temp_env::with_vars(
            [
                ("API_V1_STR", Some("/api/v2/")),
                ("PROJECT_NAME", Some("Directory")),
                ("ACCESS_TOKEN_EXPIRE_MINUTES", Some("60")),
                (
                    "BACKEND_CORS_ORIGINS",
                    Some("https://a.example.com, https://b.example.com"),
                ),
            ],
            || {
                let settings = Settings::from_env().unwrap();
                assert_eq!(settings.project_name, "Directory");
                assert_eq!(settings.access_token_expire_minutes, 60);
                assert_eq!(settings.cors_origins.len(), 2);
                assert_eq!(settings.openapi_url(), "/api/v2/openapi.json");
            },
        );
    }

    #[test]
    fn test_invalid_expiry_is_parse_error() {
        temp_env::with_var("ACCESS_TOKEN_EXPIRE_MINUTES", Some("soon"), || {
            let err = Settings::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "ACCESS_TOKEN_EXPIRE_MINUTES"));
        });
    }

    #[test]
    fn test_invalid_origin_is_parse_error() {
        temp_env::with_var("BACKEND_CORS_ORIGINS", Some("http://ok.io,bad\norigin"), || {
            let err = Settings::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "BACKEND_CORS_ORIGINS"));
        });
    }

    #[test]
    fn test_secret_key_is_redacted() {
        temp_env::with_var("SECRET_KEY", Some("hunter2"), || {
            let settings = Settings::from_env().unwrap();
            let debug = format!("{settings:?}");
            assert!(!debug.contains("hunter2"));
            assert!(debug.contains("[REDACTED]"));
            assert!(!settings.uses_default_secret_key());
        });
    }

    #[test]
    fn test_placeholder_secret_key_is_detected() {
        temp_env::with_var_unset("SECRET_KEY", || {
            assert!(Settings::from_env().unwrap().uses_default_secret_key());
        });
    }
}
