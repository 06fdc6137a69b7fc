//! gyro-telemetry - Main Entry Point
//!
//! Opens the telemetry link named on the command line, persists every decoded
//! gyro reading and shows the most recent window in a live plot (or in the log
//! with `--headless`).
//!
//! # Usage
//!
//! ```bash
//! gyro-telemetry /dev/rfcomm0
//! gyro-telemetry COM5 --baud 115200 --output flight.csv
//! some-tool | gyro-telemetry - --headless --no-persist
//! ```

use anyhow::{anyhow, Result};
use clap::Parser;
use gyro_telemetry::config::{AppConfig, LoggingConfig, PersistenceFormat};
use gyro_telemetry::frontend::TelemetryApp;
use gyro_telemetry::pipeline::{
    open_sink, spawn_pipeline, BackgroundLineSource, LineSource, LiveView, LogRenderer,
    PersistenceSink, PipelineBridge, PipelineDriver, ReaderLineSource, SerialLineSource,
    WindowBuffer,
};
use gyro_telemetry::types::SensorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,gyro_telemetry=debug";

#[derive(Parser, Debug)]
#[command(name = "gyro-telemetry", version)]
#[command(about = "Live gyroscope telemetry viewer for serial and Bluetooth links", long_about = None)]
struct Cli {
    /// Serial port (e.g. /dev/ttyUSB0, /dev/rfcomm0, COM5), or `-` for stdin
    #[arg(value_name = "PORT")]
    port: String,

    /// Baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Serial read timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// File that accepted gyro readings are appended to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Persistence format: csv or jsonl
    #[arg(long)]
    format: Option<PersistenceFormat>,

    /// Do not persist readings
    #[arg(long, default_value_t = false)]
    no_persist: bool,

    /// Number of recent samples kept in the live window
    #[arg(long)]
    capacity: Option<usize>,

    /// Sensor to window and plot: gyro, accel or mag
    #[arg(long)]
    sensor: Option<SensorKind>,

    /// Log samples instead of opening a window
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags take precedence over the configuration file.
    fn apply(&self, config: &mut AppConfig) {
        config.serial.port = self.port.clone();
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.serial.timeout_ms = timeout_ms;
        }
        if let Some(output) = &self.output {
            config.persistence.file_path = output.clone();
        }
        if let Some(format) = self.format {
            config.persistence.format = format;
        }
        if self.no_persist {
            config.persistence.enabled = false;
        }
        if let Some(capacity) = self.capacity {
            config.window.capacity = capacity;
        }
        if let Some(sensor) = self.sensor {
            config.window.sensor = sensor;
        }
        if let Some(log_file) = &self.log_file {
            config.logging.file = Some(log_file.clone());
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    cli.apply(&mut config);

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config.logging)?;

    tracing::info!("Starting gyro-telemetry on {}", config.serial.port);

    let source = open_source(&config)?;
    let sink = open_sink(&config.persistence)?;

    // Ctrl-C stops the pipeline at its next read boundary so the sink is flushed
    let running = Arc::new(AtomicBool::new(true));
    install_ctrl_c_handler(running.clone())?;

    if cli.headless {
        run_headless(source, sink, &config, running);
        Ok(())
    } else {
        run_gui(source, sink, config, running)
    }
}

/// Clear `running` on the first Ctrl-C; a second one exits immediately.
///
/// The signal is awaited on a helper thread with its own single-threaded
/// runtime, so the rest of the program stays synchronous.
fn install_ctrl_c_handler(running: Arc<AtomicBool>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                tracing::info!("Ctrl-C received, stopping pipeline");
                running.store(false, Ordering::Relaxed);

                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Second Ctrl-C, exiting without cleanup");
                    std::process::exit(130);
                }
            })
        })?;

    Ok(())
}

/// Initialize logging: stdout always, plus a file when configured.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let default_filter = config
        .filter
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(log_file_appender(path)?);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

fn log_file_appender(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    Ok(tracing_appender::rolling::never(dir, file_name))
}

fn open_source(config: &AppConfig) -> Result<Box<dyn LineSource>> {
    if config.serial.is_stdin() {
        tracing::info!("Reading telemetry from stdin");
        // Stdin has no read timeout; poll it from a reader thread instead
        let poll_interval = Duration::from_millis(config.serial.timeout_ms);
        Ok(Box::new(BackgroundLineSource::spawn(
            ReaderLineSource::stdin(),
            poll_interval,
        )?))
    } else {
        Ok(Box::new(SerialLineSource::open(&config.serial)?))
    }
}

/// Drive the pipeline on this thread and log each new window head.
fn run_headless(
    source: Box<dyn LineSource>,
    sink: Box<dyn PersistenceSink>,
    config: &AppConfig,
    running: Arc<AtomicBool>,
) {
    let sensor = config.window.sensor;
    let mut view = LiveView::new(
        PipelineDriver::with_running(source, sink, running),
        LogRenderer::new(sensor),
        WindowBuffer::with_capacity(config.window.capacity),
        sensor,
    );
    view.run_to_end();
    tracing::info!("Stream ended after {} samples", view.samples_seen());
}

/// Run the pipeline on its own thread and the plot on the main thread.
fn run_gui(
    source: Box<dyn LineSource>,
    sink: Box<dyn PersistenceSink>,
    config: AppConfig,
    running: Arc<AtomicBool>,
) -> Result<()> {
    let source_name = source.describe().to_string();

    // Create the pipeline bridge and spawn the pipeline thread
    let driver = PipelineDriver::with_running(source, sink, running.clone());
    let (bridge, msg_tx) = PipelineBridge::new(config.pipeline.channel_capacity, running.clone());
    let pipeline_handle = spawn_pipeline(
        driver,
        msg_tx,
        Duration::from_millis(config.pipeline.stats_interval_ms),
    )?;

    // Configure eframe options
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([640.0, 400.0])
            .with_maximized(config.ui.maximized)
            .with_title(&config.ui.title),
        ..Default::default()
    };

    let title = config.ui.title.clone();
    let result = eframe::run_native(
        &title,
        native_options,
        Box::new(move |cc| {
            if config.ui.dark_mode {
                cc.egui_ctx.set_visuals(egui::Visuals::dark());
            } else {
                cc.egui_ctx.set_visuals(egui::Visuals::light());
            }
            Ok(Box::new(TelemetryApp::new(bridge, &config, source_name)))
        }),
    );

    // Signal the pipeline to stop and wait for it
    tracing::info!("Shutting down...");
    running.store(false, Ordering::Relaxed);
    match pipeline_handle.join() {
        Ok(stats) => tracing::info!("Final statistics: {}", stats),
        Err(_) => tracing::error!("Pipeline thread panicked"),
    }

    result.map_err(|e| anyhow!("Failed to run the UI: {e}"))
}
