//! Layered configuration: defaults, then `config/{environment}.toml`,
//! then `FERTIPATH__SECTION__KEY` environment variables.

use config::{ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub otp: OtpConfig,
    pub ai: AiConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Postgres URL. Without one the service keeps everything in memory.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// No default: must come from a config file or `FERTIPATH__AUTH__JWT_SECRET`.
    pub jwt_secret: String,
    pub token_expiry_minutes: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OtpConfig {
    pub expire_minutes: i64,
    pub length: u32,
    pub max_attempts: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// Generative text is disabled when no key is set.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("FERTIPATH_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::defaults(config::Config::builder(), &environment)?
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(
                Environment::with_prefix("FERTIPATH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Defaults only, no files or environment, with a fixed signing secret.
    /// Used by tests.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::defaults(config::Config::builder(), "test")?
            .set_default("auth.jwt_secret", "test-only-secret")?
            .build()?
            .try_deserialize()
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3050)?
            .set_default("database.max_connections", 5)?
            .set_default("auth.token_expiry_minutes", 20)?
            .set_default("auth.bcrypt_cost", i64::from(bcrypt::DEFAULT_COST))?
            .set_default("otp.expire_minutes", 5)?
            .set_default("otp.length", 4)?
            .set_default("otp.max_attempts", 5)?
            .set_default("ai.endpoint", "https://api.cohere.ai/v1/chat")?
            .set_default("ai.model", "command-xlarge-nightly")?
            .set_default("ai.max_tokens", 180)?
            .set_default("ai.temperature", 0.7_f64)?
            .set_default("cors.allowed_origins", Vec::<String>::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let result = Config::defaults(config::Config::builder(), "production")
            .and_then(|builder| builder.build())
            .and_then(|raw| raw.try_deserialize::<Config>());
        assert!(result.is_err());
    }

    #[test]
    fn secret_from_source_is_used() {
        let config: Config = Config::defaults(config::Config::builder(), "production")
            .and_then(|builder| builder.set_override("auth.jwt_secret", "from-env"))
            .and_then(|builder| builder.build())
            .and_then(|raw| raw.try_deserialize())
            .unwrap();
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.otp.max_attempts, 5);
    }
}
