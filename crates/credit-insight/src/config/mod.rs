use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::commentary::CommentaryConfig;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub portfolio: PortfolioConfig,
    pub commentary: CommentaryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let seed = match non_empty_var("PORTFOLIO_SEED") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| ConfigError::InvalidSeed)?),
            None => None,
        };
        let default_count = match non_empty_var("PORTFOLIO_DEFAULT_COUNT") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(count) if count > 0 => count,
                _ => return Err(ConfigError::InvalidCount),
            },
            None => PortfolioConfig::DEFAULT_COUNT,
        };

        let temperature = match non_empty_var("COMMENTARY_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .ok()
                .filter(|value| (0.0..=2.0).contains(value))
                .ok_or(ConfigError::InvalidTemperature)?,
            None => CommentaryConfig::DEFAULT_TEMPERATURE,
        };
        let max_tokens = match non_empty_var("COMMENTARY_MAX_TOKENS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidMaxTokens)?,
            None => CommentaryConfig::DEFAULT_MAX_TOKENS,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            portfolio: PortfolioConfig {
                seed,
                default_count,
            },
            commentary: CommentaryConfig {
                endpoint: non_empty_var("COMMENTARY_ENDPOINT"),
                api_key: non_empty_var("COMMENTARY_API_KEY"),
                temperature,
                max_tokens,
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Synthetic portfolio generation defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioConfig {
    pub seed: Option<u64>,
    pub default_count: usize,
}

impl PortfolioConfig {
    pub const DEFAULT_COUNT: usize = 50;
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            seed: None,
            default_count: Self::DEFAULT_COUNT,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSeed,
    InvalidCount,
    InvalidTemperature,
    InvalidMaxTokens,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSeed => write!(f, "PORTFOLIO_SEED must be a valid u64"),
            ConfigError::InvalidCount => {
                write!(f, "PORTFOLIO_DEFAULT_COUNT must be a positive integer")
            }
            ConfigError::InvalidTemperature => {
                write!(f, "COMMENTARY_TEMPERATURE must be a number between 0 and 2")
            }
            ConfigError::InvalidMaxTokens => {
                write!(f, "COMMENTARY_MAX_TOKENS must be a valid u32")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
