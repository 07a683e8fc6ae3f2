use secrecy::SecretString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Absent keys are allowed; tutoring requests then get the fallback reply.
    pub openai_api_key: Option<SecretString>,
    pub openai_api_base: String,
    pub chat_model: String,
    pub completion_timeout: Duration,
    pub log_level: Level,
    pub prompts_path: PathBuf,
    pub static_dir: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let port = match std::env::var("PORT") {
            Ok(port_str) => port_str
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?,
            Err(_) => DEFAULT_PORT,
        };

        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(bind_address_str) => bind_address_str.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], port)),
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);

        let openai_api_base =
            std::env::var("OPENAI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());

        let completion_timeout = match std::env::var("COMPLETION_TIMEOUT_SECS") {
            Ok(secs_str) => match secs_str.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "COMPLETION_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a positive number of seconds", secs_str),
                    ));
                }
            },
            Err(_) => parabola_core::tutor::DEFAULT_COMPLETION_TIMEOUT,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts"));

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./frontend"));

        Ok(Self {
            bind_address,
            openai_api_key,
            openai_api_base,
            chat_model,
            completion_timeout,
            log_level,
            prompts_path,
            static_dir,
        })
    }
}
