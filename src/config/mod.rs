//! Configuration module for gyro-telemetry
//!
//! Configuration is a TOML file with one table per concern:
//!
//! ```toml
//! [serial]
//! port = "/dev/rfcomm0"
//! baud_rate = 9600
//!
//! [persistence]
//! file_path = "data.csv"
//! format = "csv"
//!
//! [window]
//! capacity = 120
//! sensor = "gyro"
//! ```
//!
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! # Config Location
//!
//! Without an explicit `--config` path, the file is looked up in the
//! platform config directory under [`APP_ID`]:
//! - **Linux**: `~/.config/gyro-telemetry/config.toml`
//! - **macOS**: `~/Library/Application Support/gyro-telemetry/config.toml`
//! - **Windows**: `%APPDATA%\gyro-telemetry\config.toml`

use crate::error::{Result, TelemetryError};
use crate::pipeline::window::CAPACITY;
use crate::types::SensorKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "gyro-telemetry";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default serial baud rate (HC-05/HC-06 factory setting)
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default serial read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default persistence file
pub const DEFAULT_DATA_FILE: &str = "data.csv";

// ==================== Config Directory ====================

/// Get the application config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== App Config ====================

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    /// Transport configuration
    #[serde(default)]
    pub serial: SerialConfig,

    /// Where and how accepted samples are stored
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Live window configuration
    #[serde(default)]
    pub window: WindowConfig,

    /// Pipeline thread configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// UI configuration
    #[serde(default)]
    pub ui: UiConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| TelemetryError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TelemetryError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` if given, else from the default location if a file
    /// exists there, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match default_config_path() {
            Some(default) if default.exists() => {
                tracing::info!("Loading config from {:?}", default);
                Self::load(default)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Save configuration as TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TelemetryError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| TelemetryError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TelemetryError::Config(format!("Failed to write config: {}", e)))
    }
}

// ==================== Serial Config ====================

/// Serial transport configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialConfig {
    /// Device name (`/dev/ttyUSB0`, `/dev/rfcomm0`, `COM5`), or `-` for stdin
    #[serde(default)]
    pub port: String,

    /// Baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Read timeout in milliseconds; bounds how long a stop request waits
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SerialConfig {
    /// Whether the port refers to standard input
    pub fn is_stdin(&self) -> bool {
        self.port == "-"
    }
}

// ==================== Persistence Config ====================

/// Configuration for the persistence sink
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistenceConfig {
    /// Whether accepted samples are persisted at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to the persistence file (appended to, created if absent)
    #[serde(default = "default_data_file")]
    pub file_path: PathBuf,

    /// Output format
    #[serde(default)]
    pub format: PersistenceFormat,

    /// Flush after every record so each one is durable
    #[serde(default = "default_true")]
    pub flush_each_record: bool,

    /// Write from a dedicated thread instead of the pipeline thread
    #[serde(default)]
    pub background: bool,

    /// Queue length between the pipeline and the background writer
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long an append may wait for queue space before it counts as failed
    #[serde(default = "default_enqueue_timeout_ms")]
    pub enqueue_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_enqueue_timeout_ms() -> u64 {
    50
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file_path: default_data_file(),
            format: PersistenceFormat::Csv,
            flush_each_record: true,
            background: false,
            queue_capacity: default_queue_capacity(),
            enqueue_timeout_ms: default_enqueue_timeout_ms(),
        }
    }
}

/// Format for persisted data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceFormat {
    /// CSV rows: `timestamp,gyro_x,gyro_y,gyro_z`
    #[default]
    Csv,
    /// JSON Lines format - one JSON object per line
    Jsonl,
}

impl std::fmt::Display for PersistenceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceFormat::Csv => write!(f, "CSV"),
            PersistenceFormat::Jsonl => write!(f, "JSON Lines"),
        }
    }
}

impl std::str::FromStr for PersistenceFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(PersistenceFormat::Csv),
            "jsonl" | "json" => Ok(PersistenceFormat::Jsonl),
            other => Err(format!("unknown format '{}', expected csv or jsonl", other)),
        }
    }
}

// ==================== Window Config ====================

/// Live window configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowConfig {
    /// Number of most recent samples kept for display
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Which sensor triple is windowed and plotted
    #[serde(default)]
    pub sensor: SensorKind,
}

fn default_capacity() -> usize {
    CAPACITY
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            capacity: CAPACITY,
            sensor: SensorKind::Gyro,
        }
    }
}

// ==================== Pipeline Config ====================

/// Pipeline thread configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Buffer size for the pipeline → UI channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// How often statistics are sent to the UI, in milliseconds
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_stats_interval_ms() -> u64 {
    500
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            stats_interval_ms: default_stats_interval_ms(),
        }
    }
}

// ==================== UI Config ====================

/// UI configuration for the live graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    /// Window title
    #[serde(default = "default_title")]
    pub title: String,

    /// Start maximized
    #[serde(default = "default_true")]
    pub maximized: bool,

    /// Enable dark mode
    #[serde(default = "default_true")]
    pub dark_mode: bool,

    /// Show grid on the plot
    #[serde(default = "default_true")]
    pub show_grid: bool,

    /// Show legend on the plot
    #[serde(default = "default_true")]
    pub show_legend: bool,

    /// Plot line width in pixels
    #[serde(default = "default_line_width")]
    pub line_width: f32,
}

fn default_title() -> String {
    "Gyro Data Visualization".to_string()
}

fn default_line_width() -> f32 {
    1.5
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            maximized: true,
            dark_mode: true,
            show_grid: true,
            show_legend: true,
            line_width: default_line_width(),
        }
    }
}

// ==================== Logging Config ====================

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default)]
    pub filter: Option<String>,

    /// Also write logs to this file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.timeout_ms, 1000);
        assert_eq!(config.window.capacity, 120);
        assert_eq!(config.window.sensor, SensorKind::Gyro);
        assert_eq!(config.persistence.file_path, PathBuf::from("data.csv"));
        assert!(config.persistence.enabled);
        assert!(config.persistence.flush_each_record);
        assert_eq!(config.persistence.format, PersistenceFormat::Csv);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [serial]
            port = "/dev/rfcomm0"
            baud_rate = 115200

            [persistence]
            format = "jsonl"
            background = true

            [window]
            sensor = "accel"
            "#,
        )
        .unwrap();

        assert_eq!(config.serial.port, "/dev/rfcomm0");
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.serial.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.persistence.format, PersistenceFormat::Jsonl);
        assert!(config.persistence.background);
        assert_eq!(config.persistence.queue_capacity, 1024);
        assert_eq!(config.window.sensor, SensorKind::Accel);
        assert_eq!(config.window.capacity, CAPACITY);
    }

    #[test]
    fn test_invalid_toml() {
        let err = AppConfig::from_toml_str("[serial]\nbaud_rate = \"fast\"").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.serial.port = "COM5".to_string();
        config.window.capacity = 240;
        config.logging.file = Some(PathBuf::from("telemetry.log"));
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("CSV".parse::<PersistenceFormat>(), Ok(PersistenceFormat::Csv));
        assert_eq!("json".parse::<PersistenceFormat>(), Ok(PersistenceFormat::Jsonl));
        assert!("parquet".parse::<PersistenceFormat>().is_err());
    }

    #[test]
    fn test_stdin_port() {
        let serial = SerialConfig {
            port: "-".to_string(),
            ..Default::default()
        };
        assert!(serial.is_stdin());
        assert!(!SerialConfig::default().is_stdin());
    }
}
