//! Error handling for gyro-telemetry
//!
//! This module defines the crate-wide error type and a Result alias.
//! Line-level parse failures have their own type in
//! [`crate::pipeline::parser::ParseError`]; they are recovered locally and
//! never surface through this enum.

use thiserror::Error;

/// Main error type for gyro-telemetry operations
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Errors opening or configuring the serial port
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding errors from the persistence sink
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding errors from the persistence sink
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// The line source is exhausted or the transport failed
    #[error("Transport closed: {0}")]
    TransportClosed(String),

    /// A persistence append could not be completed
    #[error("Sink write failure: {0}")]
    SinkWrite(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TelemetryError>,
    },
}

impl TelemetryError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TelemetryError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for gyro-telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<TelemetryError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
