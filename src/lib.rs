//! # gyro-telemetry: live IMU telemetry viewer
//!
//! Reads a line-oriented telemetry stream from a serial link (USB-serial or
//! Bluetooth SPP), decodes gyroscope, accelerometer and magnetometer triples,
//! persists the gyro readings and plots the most recent window live.
//!
//! ## Architecture
//!
//! - **Pipeline**: line source → frame parser → persistence sink, driven on a
//!   dedicated thread
//! - **Frontend**: renders the live window using eframe/egui with egui_plot
//! - **Communication**: crossbeam channels between the pipeline and UI threads
//!
//! ## Wire format
//!
//! ```text
//! $:g1,g2,g3,a1,a2,a3,m1,m2,m3
//! ```
//!
//! Lines without the `$:` marker are ignored; malformed telemetry lines are
//! logged and skipped.
//!
//! ## Configuration
//!
//! Settings are read from `config.toml` in the platform config directory under
//! `gyro-telemetry` (or an explicit `--config` path):
//!
//! - **Linux**: `~/.config/gyro-telemetry/`
//! - **macOS**: `~/Library/Application Support/gyro-telemetry/`
//! - **Windows**: `%APPDATA%\gyro-telemetry\`
//!
//! ## Example
//!
//! ```no_run
//! use gyro_telemetry::pipeline::{LiveView, LogRenderer, NullSink, PipelineDriver, ReaderLineSource, WindowBuffer};
//! use gyro_telemetry::types::SensorKind;
//!
//! let driver = PipelineDriver::new(ReaderLineSource::stdin(), NullSink);
//! let mut view = LiveView::new(
//!     driver,
//!     LogRenderer::new(SensorKind::Gyro),
//!     WindowBuffer::new(),
//!     SensorKind::Gyro,
//! );
//! view.run_to_end();
//! ```

pub mod config;
pub mod error;
pub mod frontend;
pub mod pipeline;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Result, TelemetryError};
pub use frontend::TelemetryApp;
pub use types::{PipelineStats, Sample, SensorKind};
