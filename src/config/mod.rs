use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub uri: String,
    pub db_name: String,
    /// Per-operation deadline for store calls.
    pub op_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Gate write methods behind a bearer session token.
    pub require_auth: bool,
    pub session_secret: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment profile first, then specific env var overrides
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("MONGODB_URI") {
            self.store.uri = v;
        }
        if let Ok(v) = env::var("DB_NAME") {
            self.store.db_name = v;
        }
        if let Ok(v) = env::var("STORE_OP_TIMEOUT_MS") {
            self.store.op_timeout_ms = v.parse().unwrap_or(self.store.op_timeout_ms);
        }
        if let Ok(v) = env::var("REQUIRE_AUTH") {
            self.security.require_auth = v.parse().unwrap_or(self.security.require_auth);
        }
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.security.session_secret = v;
        }
        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            store: StoreConfig {
                uri: "mongodb://localhost:27017".to_string(),
                db_name: "recipe_meal_planning".to_string(),
                op_timeout_ms: 5000,
            },
            security: SecurityConfig {
                require_auth: false,
                session_secret: "dev-secret-change-me".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            store: StoreConfig {
                uri: "mongodb://localhost:27017".to_string(),
                db_name: "recipe_meal_planning_staging".to_string(),
                op_timeout_ms: 3000,
            },
            security: SecurityConfig {
                require_auth: true,
                session_secret: String::new(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            store: StoreConfig {
                uri: "mongodb://localhost:27017".to_string(),
                db_name: "recipe_meal_planning".to_string(),
                op_timeout_ms: 2000,
            },
            security: SecurityConfig {
                require_auth: true,
                session_secret: String::new(),
            },
        }
    }
}

// Global singleton config, initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
