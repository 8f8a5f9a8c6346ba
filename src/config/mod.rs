use crate::triage::forest::ForestParams;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_CASES_CSV: &str = "data/casos_clinicos.csv";
const DEFAULT_GRAVE_DISEASES_CSV: &str = "data/doencas_graves.csv";
const DEFAULT_COMMON_DISEASES_CSV: &str = "data/doencas_comuns.csv";

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
    pub triage: TriageConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            triage: TriageConfig::from_env()?,
        })
    }
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Training data locations and forest hyper-parameters used at startup.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub cases_csv: PathBuf,
    pub grave_diseases_csv: PathBuf,
    /// `None` when the common disease table is disabled.
    pub common_diseases_csv: Option<PathBuf>,
    pub forest: ForestParams,
}

impl TriageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let cases_csv =
            env::var("TRIAGE_CASES_CSV").unwrap_or_else(|_| DEFAULT_CASES_CSV.to_string());
        let grave_diseases_csv = env::var("TRIAGE_GRAVE_DISEASES_CSV")
            .unwrap_or_else(|_| DEFAULT_GRAVE_DISEASES_CSV.to_string());
        let common_diseases_csv = match env::var("TRIAGE_COMMON_DISEASES_CSV") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(PathBuf::from(value)),
            Err(_) => Some(PathBuf::from(DEFAULT_COMMON_DISEASES_CSV)),
        };

        let defaults = ForestParams::default();
        let n_trees = match env::var("TRIAGE_FOREST_TREES") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|trees| *trees > 0)
                .ok_or(ConfigError::InvalidForestTrees)?,
            Err(_) => defaults.n_trees,
        };
        let seed = match env::var("TRIAGE_SEED") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidSeed)?,
            Err(_) => defaults.seed,
        };

        Ok(Self {
            cases_csv: PathBuf::from(cases_csv),
            grave_diseases_csv: PathBuf::from(grave_diseases_csv),
            common_diseases_csv,
            forest: ForestParams {
                n_trees,
                seed,
                ..defaults
            },
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidForestTrees,
    InvalidSeed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidForestTrees => {
                write!(f, "TRIAGE_FOREST_TREES must be a positive integer")
            }
            ConfigError::InvalidSeed => write!(f, "TRIAGE_SEED must be a valid u64"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidForestTrees
            | ConfigError::InvalidSeed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "TRIAGE_CASES_CSV",
            "TRIAGE_GRAVE_DISEASES_CSV",
            "TRIAGE_COMMON_DISEASES_CSV",
            "TRIAGE_FOREST_TREES",
            "TRIAGE_SEED",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.triage.cases_csv, PathBuf::from(DEFAULT_CASES_CSV));
        assert_eq!(
            config.triage.common_diseases_csv,
            Some(PathBuf::from(DEFAULT_COMMON_DISEASES_CSV))
        );
        assert_eq!(config.triage.forest, ForestParams::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn blank_common_table_disables_it() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TRIAGE_COMMON_DISEASES_CSV", "  ");
        env::set_var("TRIAGE_FOREST_TREES", "12");
        env::set_var("TRIAGE_SEED", "7");
        let config = AppConfig::load().expect("config loads");
        assert!(config.triage.common_diseases_csv.is_none());
        assert_eq!(config.triage.forest.n_trees, 12);
        assert_eq!(config.triage.forest.seed, 7);
        reset_env();
    }

    #[test]
    fn rejects_zero_trees() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TRIAGE_FOREST_TREES", "0");
        let error = AppConfig::load().expect_err("zero trees rejected");
        assert!(matches!(error, ConfigError::InvalidForestTrees));
        reset_env();
    }
}
