//! # Configuration Management

//! This module handles the configuration loading and management for the piletas-sync service.
//! It leverages the `config` crate to provide a flexible and structured way to define and access configuration settings from various sources, including:

//! * YAML configuration files (default.yaml, development.yaml, production.yaml)
//! * Environment variables

//! The core of this module is the `Settings` struct, which encapsulates all the configuration settings required by the application.

use serde::{Deserialize, Serialize};
use config::{Config, Environment, File};
use std::{env, fmt};
use std::path::PathBuf;
use secrecy::{Secret, ExposeSecret};
use log::debug;
use crate::errors::PiletasError;

/// Represents the complete set of configuration settings for the piletas-sync service.
/// It's populated by reading from various configuration sources and provides convenient access to the settings throughout the application.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Settings for connecting to the local database
    pub database: DatabaseSettings,
    /// Settings for reaching the external Shipping API
    pub shipping_api: ShippingApiSettings,
    /// Settings for the HTTP surface exposed to the weighbridge stations
    pub server: ServerSettings,
    /// Settings for application logging
    pub logging: LoggingSettings,
    /// Settings for the cooling-bay pool and the temperature gate
    pub piletas: PiletasSettings,
}

/// # Database Settings

/// This struct holds the configuration settings required to establish a connection to the local database
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    /// The hostname or IP address of the database server
    pub host: String,
    /// The port number on which the database server is listening
    pub port: u16,
    /// The username for database authentication (optional if using Windows authentication)
    pub username: Option<String>,
    /// The password for database authentication (optional if using Windows authentication)
    #[serde(deserialize_with = "deserialize_optional_secret")]
    pub password: Option<Secret<String>>,
    /// The name of the database to connect to
    pub database_name: String,
    /// The application name to be used in the connection string
    pub app_name: String,
    /// Whether to use Windows authentication (true) or SQL Server authentication (false)
    pub win_auth: bool,
    /// Whether to trust the server certificate (relevant for encrypted connections)
    pub trusted: bool,
}

impl DatabaseSettings {
    /// Constructs a connection string for the local database based on the settings
    ///
    /// This method dynamically builds the connection string, handling both Windows authentication and SQL Server authentication scenarios
    ///
    /// # Returns
    ///
    /// A `Secret<String>` containing the constructed connection string. The connection string is kept secret for security reasons
    pub fn connection_string(&self) -> Secret<String> {
        if self.username.is_none() | self.password.is_none() && self.win_auth {
            let connection_string = format!(
                "mssql://{}:{}/{}",
                self.host,
                self.port,
                self.database_name
            );
            Secret::new(connection_string)
        } else {
            let connection_string = format!(
                "mssql://{}:{}@{}:{}/{}",
                self.username.clone().unwrap_or_default(),
                self.password.clone().map(|p| p.expose_secret().clone()).unwrap_or_default(),
                self.host,
                self.port,
                self.database_name
            );
            Secret::new(connection_string)
        }
    }
}

/// Holds the configuration settings required to reach the external Shipping API
#[derive(Debug, Deserialize, Clone)]
pub struct ShippingApiSettings {
    /// The base URL of the Shipping API (e.g. `https://api.ingenio.example/api/`)
    pub base_url: String,
    /// The bearer token presented on every request
    #[serde(deserialize_with = "deserialize_secret")]
    pub bearer_token: Secret<String>,
    /// The page size requested from paginated listing endpoints
    pub page_size: u32,
    /// The timeout (in seconds) for Shipping API requests
    pub timeout_secs: u64,
}

/// Holds the configuration settings for the HTTP surface
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    /// The address the server binds to
    pub host: String,
    /// The port the server listens on
    pub port: u16,
}

/// Holds the configuration settings for application logging
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// The logging level (e.g., "info", "debug", "error")
    pub level: String,
    /// The name of the log file (optional)
    pub file: Option<String>,
    /// The directory path where log files will be stored (optional)
    pub path: Option<PathBuf>,
}

/// Holds the configuration for the cooling-bay pool and the temperature gate
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PiletasSettings {
    /// The number of physical cooling bays (bay numbers are 1..=bay_count)
    pub bay_count: i32,
    /// The plant's UTC offset in minutes, captured on every timer start
    pub utc_offset_minutes: i32,
    /// Readings at or below this temperature route the shipment to processing
    pub temperature_threshold: f64,
    /// The lowest temperature accepted as a plausible reading
    pub temperature_min: f64,
    /// The highest temperature accepted as a plausible reading
    pub temperature_max: f64,
    /// The timer category used when reorganizing from the Shipping API
    pub default_timer_category: String,
}

/// # Settings Initialization
///
/// The `Settings` implementation provides a `new` function to load and construct the configuration settings.
impl Settings {
    /// Loads and constructs the application settings from various configuration sources.
    ///
    /// This function reads configuration settings from the following sources, in order of precedence:
    ///
    /// 1. `default.yaml`: Contains default settings for the application
    /// 2. Environment-specific YAML file (e.g., `development.yaml` or `production.yaml`) based on the `RUN_MODE` environment variable
    /// 3. Environment variables prefixed with `APP` (e.g., `APP__DATABASE__HOST`)
    ///
    /// The `CONFIG_DIR` environment variable can be used to specify the directory where the YAML configuration files are located (defaults to "src/config").
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)`: If the settings were loaded and constructed successfully
    /// * `Err(PiletasError)`: If there was an error during the loading or construction process
    pub fn new() -> Result<Self, PiletasError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "src/config".into());
        debug!("Run Mode: {:?}, Config Dir: {:?}", run_mode, config_dir);

        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/default", config_dir)))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        let mut s: Self = s.try_deserialize::<Settings>()
            .map_err(PiletasError::from)?;

        if let Some(ref mut path) = s.logging.path {
            *path = env::current_dir()?.join(path.clone());
        }

        if s.piletas.bay_count <= 0 {
            return Err(PiletasError::ConfigError(
                "piletas.bay_count must be at least 1".to_string(),
            ));
        }

        Ok(s)
    }

    /// The fixed bay-number domain configured for this plant.
    pub fn bay_numbers(&self) -> Vec<i32> {
        (1..=self.piletas.bay_count).collect()
    }
}

/// Deserializes a secret string from configuration into a `Secret<String>`
fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<Secret<String>>, D::Error>
    where
        D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.map(Secret::new))
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Secret<String>, D::Error>
    where
        D: serde::Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(Secret::new(value))
}

impl fmt::Display for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DatabaseSettings {{ host: {}, port: {}, username: {:?}, database_name: {}, app_name: {}, win_auth: {}, trusted: {} }}",
            self.host, self.port, self.username, self.database_name, self.app_name, self.win_auth, self.trusted
        )
    }
}

impl fmt::Display for ShippingApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ShippingApiSettings {{ base_url: {}, page_size: {}, timeout_secs: {} }}",
            self.base_url, self.page_size, self.timeout_secs
        )
    }
}
