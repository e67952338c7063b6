use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub data: DataConfig,
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

        let data = match env::var("APP_DATA_DIR") {
            Ok(raw) => {
                let data_dir = PathBuf::from(raw.trim());
                if !data_dir.is_dir() {
                    return Err(ConfigError::InvalidDataDir { path: data_dir });
                }
                DataConfig::new(data_dir)
            }
            Err(_) => DataConfig::default(),
        };
        let data = match env::var("APP_ALIAS_FILE") {
            Ok(raw) if !raw.trim().is_empty() => data.with_alias_file(raw.trim()),
            _ => data,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data,
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

/// Locations of the static input tables, relative to `data_dir` unless absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub master: PathBuf,
    pub time_series: PathBuf,
    pub predictions: PathBuf,
    pub risk: PathBuf,
    pub rental: PathBuf,
    pub demographics: PathBuf,
    pub communities: PathBuf,
    pub crime: PathBuf,
    pub coordinates: PathBuf,
    pub boundaries: PathBuf,
    pub aliases: PathBuf,
}

impl DataConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            master: PathBuf::from("clean/master_dataset_by_suburb.csv"),
            time_series: PathBuf::from("clean/property_timeseries.csv"),
            predictions: PathBuf::from("predictions/price_predictions.csv"),
            risk: PathBuf::from("risk_analysis/risk_scores.csv"),
            rental: PathBuf::from("rental/rental_analysis.csv"),
            demographics: PathBuf::from("demographics/census_profile.csv"),
            communities: PathBuf::from("demographics/cultural_communities.csv"),
            crime: PathBuf::from("crime/offences_by_suburb.csv"),
            coordinates: PathBuf::from("suburb_coordinates.json"),
            boundaries: PathBuf::from("adelaide_suburbs.geojson"),
            aliases: PathBuf::from("region_aliases.csv"),
        }
    }

    pub fn with_alias_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.aliases = path.into();
        self
    }

    /// Joins a table path onto the data directory.
    pub fn resolve(&self, relative: &std::path::Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.data_dir.join(relative)
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self::new("data")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDataDir { path: PathBuf },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDataDir { path } => {
                write!(f, "APP_DATA_DIR '{}' is not a directory", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidDataDir { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::Path;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_DATA_DIR");
        env::remove_var("APP_ALIAS_FILE");
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
        assert_eq!(config.data, DataConfig::default());
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
    fn rejects_data_dir_that_does_not_exist() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DATA_DIR", "./definitely-not-a-data-dir");
        let error = AppConfig::load().expect_err("missing data dir rejected");
        assert!(matches!(error, ConfigError::InvalidDataDir { .. }));
        reset_env();
    }

    #[test]
    fn alias_override_and_absolute_paths_resolve() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ALIAS_FILE", "custom_aliases.csv");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.data.resolve(&config.data.aliases),
            Path::new("data").join("custom_aliases.csv")
        );
        let absolute = Path::new("/srv/explorer/master.csv");
        assert_eq!(config.data.resolve(absolute), absolute.to_path_buf());
        reset_env();
    }
}
