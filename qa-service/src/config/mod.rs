use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct QaConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

/// Environment-variable reader. In production every variable must be set
/// explicitly; in dev the baked-in defaults apply.
struct EnvReader {
    strict: bool,
}

impl EnvReader {
    /// A variable with a dev default.
    fn var(&self, key: &str, default: &str) -> Result<String, AppError> {
        match env::var(key) {
            Ok(val) => Ok(val),
            Err(_) if self.strict => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required in production but not set",
                key
            ))),
            Err(_) => Ok(default.to_string()),
        }
    }

    /// A variable with no safe default in any environment.
    fn required(&self, key: &str) -> Result<String, AppError> {
        env::var(key).map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("{} is required but not set", key))
        })
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T, AppError>
    where
        T: ToString,
    {
        let raw = self.var(key, &default.to_string())?;
        raw.parse().map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, raw))
        })
    }
}

impl QaConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let reader = EnvReader {
            strict: environment == Environment::Prod,
        };

        Ok(QaConfig {
            common,
            environment,
            service_name: reader.var("SERVICE_NAME", "qa-service")?,
            service_version: reader.var("SERVICE_VERSION", env!("CARGO_PKG_VERSION"))?,
            log_level: reader.var("LOG_LEVEL", "info")?,
            database: DatabaseConfig {
                url: reader.required("DATABASE_URL")?,
                max_connections: reader.parsed("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: reader.parsed("DATABASE_MIN_CONNECTIONS", 1)?,
            },
            jwt: JwtConfig {
                secret: reader.required("JWT_SECRET")?,
                access_token_expiry_minutes: reader
                    .parsed("JWT_ACCESS_TOKEN_EXPIRY_MINUTES", 60)?,
            },
            security: SecurityConfig {
                allowed_origins: reader
                    .var("ALLOWED_ORIGINS", "http://localhost:3000")?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            rate_limit: RateLimitConfig {
                login_attempts: reader.parsed("RATE_LIMIT_LOGIN_ATTEMPTS", 5)?,
                login_window_seconds: reader.parsed("RATE_LIMIT_LOGIN_WINDOW_SECONDS", 900)?,
                global_ip_limit: reader.parsed("RATE_LIMIT_GLOBAL_IP_LIMIT", 300)?,
                global_ip_window_seconds: reader
                    .parsed("RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS", 60)?,
            },
        })
    }
}
