pub mod models;

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub use models::{DefaultSort, FieldConfig, ModelConfig, ModelConfigs};

/// Process configuration, built once in `main` and passed down explicitly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub query: QueryConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub auth: AuthConfig,
    pub sources: SourceConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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
pub struct QueryConfig {
    pub max_limit: i64,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    /// Postgres namespace to introspect and query
    pub schema: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    /// Upper bound for a single data-client call, in seconds
    pub data_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub secure_cookies: bool,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub login: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    pub disabled: bool,
    pub config_dir: PathBuf,
}

impl AuthConfig {
    /// Plain credentials supplied through config or environment
    pub fn has_plain_credentials(&self) -> bool {
        matches!((&self.login, &self.password), (Some(l), Some(p)) if !l.is_empty() && !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub schema_path: Option<PathBuf>,
    pub models_path: Option<PathBuf>,
    pub ui_dir: Option<PathBuf>,
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
        .with_env_overrides()
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PRADA_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("PRADA_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Query overrides
        if let Ok(v) = env::var("QUERY_MAX_LIMIT") {
            self.query.max_limit = v.parse().unwrap_or(self.query.max_limit);
        }
        if let Ok(v) = env::var("QUERY_DEBUG_LOGGING") {
            self.query.debug_logging = v.parse().unwrap_or(self.query.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("DATABASE_SCHEMA") {
            self.database.schema = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATA_TIMEOUT_SECS") {
            self.database.data_timeout_secs = v.parse().unwrap_or(self.database.data_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_TTL_SECS") {
            self.security.access_token_ttl_secs = v.parse().unwrap_or(self.security.access_token_ttl_secs);
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_TTL_SECS") {
            self.security.refresh_token_ttl_secs = v.parse().unwrap_or(self.security.refresh_token_ttl_secs);
        }

        // Auth overrides
        if let Ok(v) = env::var("PRADA_LOGIN") {
            self.auth.login = Some(v);
        }
        if let Ok(v) = env::var("PRADA_PASSWORD") {
            self.auth.password = Some(v);
        }
        if let Ok(v) = env::var("PRADA_SECRET") {
            self.auth.jwt_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("PRADA_AUTH_DISABLED") {
            self.auth.disabled = v.parse().unwrap_or(self.auth.disabled);
        }
        if let Ok(v) = env::var("PRADA_CONFIG_DIR") {
            self.auth.config_dir = PathBuf::from(v);
        }

        // Source overrides
        if let Ok(v) = env::var("PRADA_SCHEMA") {
            self.sources.schema_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("PRADA_MODELS") {
            self.sources.models_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("PRADA_UI_DIR") {
            self.sources.ui_dir = Some(PathBuf::from(v));
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            query: QueryConfig {
                max_limit: 100,
                debug_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                schema: "public".to_string(),
                max_connections: 10,
                connection_timeout: 30,
                data_timeout_secs: 30,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                secure_cookies: false,
                access_token_ttl_secs: 60 * 60,
                refresh_token_ttl_secs: 7 * 24 * 60 * 60,
            },
            auth: AuthConfig::default(),
            sources: SourceConfig::default(),
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.query.debug_logging = false;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config.security.secure_cookies = true;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.query.debug_logging = false;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.database.data_timeout_secs = 15;
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config.security.secure_cookies = true;
        config
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login: None,
            password: None,
            jwt_secret: None,
            disabled: false,
            config_dir: PathBuf::from(".prada"),
        }
    }
}
