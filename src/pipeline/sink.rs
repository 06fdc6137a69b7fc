//! Persistence sinks — append-only durable storage for accepted samples.
//!
//! Every sink stores one record per sample: `timestamp, gyro_x, gyro_y, gyro_z`.
//! Files are opened once in append mode (created if absent) and released when
//! the sink is dropped. Existing records are never rewritten.

use crate::config::{PersistenceConfig, PersistenceFormat};
use crate::error::{Result, ResultExt, TelemetryError};
use crate::types::{Sample, Timestamp, Triple};
use crossbeam_channel::{bounded, SendTimeoutError, Sender};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Timestamp layout of persisted records (second resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only store for accepted samples.
pub trait PersistenceSink: Send {
    /// Append one record.
    fn append(&mut self, timestamp: Timestamp, gyro: Triple) -> Result<()>;

    /// Push buffered records to durable storage.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Writes that failed after `append` or `flush` had already returned,
    /// for sinks that write asynchronously.
    fn deferred_failures(&self) -> u64 {
        0
    }

    /// Append the record for a sample.
    fn append_sample(&mut self, sample: &Sample) -> Result<()> {
        self.append(sample.captured_at(), sample.gyro())
    }
}

impl PersistenceSink for Box<dyn PersistenceSink> {
    fn append(&mut self, timestamp: Timestamp, gyro: Triple) -> Result<()> {
        (**self).append(timestamp, gyro)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn deferred_failures(&self) -> u64 {
        (**self).deferred_failures()
    }
}

/// One persisted row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedRecord {
    pub timestamp: String,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

impl PersistedRecord {
    pub fn new(timestamp: Timestamp, gyro: Triple) -> Self {
        Self {
            timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
            gyro_x: gyro.0,
            gyro_y: gyro.1,
            gyro_z: gyro.2,
        }
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {:?} for appending", path))
}

// ==================== CSV ====================

/// CSV sink: rows `timestamp,gyro_x,gyro_y,gyro_z`, no header row.
///
/// The file is shared across runs, so a header would be repeated on every
/// start.
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    flush_each_record: bool,
    rows_written: u64,
}

impl CsvSink {
    pub fn open(path: impl Into<PathBuf>, flush_each_record: bool) -> Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        tracing::info!("CsvSink opened file: {:?}", path);
        Ok(Self {
            writer,
            path,
            flush_each_record,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl PersistenceSink for CsvSink {
    fn append(&mut self, timestamp: Timestamp, gyro: Triple) -> Result<()> {
        self.writer.serialize(PersistedRecord::new(timestamp, gyro))?;
        if self.flush_each_record {
            self.writer.flush()?;
        }
        self.rows_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for CsvSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::error!("CsvSink failed to flush {:?}: {}", self.path, e);
        }
        tracing::info!(
            "CsvSink closed {:?} after {} rows",
            self.path,
            self.rows_written
        );
    }
}

// ==================== JSON Lines ====================

/// JSON Lines sink: one `{"timestamp":..,"gyro_x":..,..}` object per line.
pub struct JsonLinesSink {
    writer: BufWriter<File>,
    path: PathBuf,
    flush_each_record: bool,
    rows_written: u64,
}

impl JsonLinesSink {
    pub fn open(path: impl Into<PathBuf>, flush_each_record: bool) -> Result<Self> {
        let path = path.into();
        let writer = BufWriter::new(open_append(&path)?);
        tracing::info!("JsonLinesSink opened file: {:?}", path);
        Ok(Self {
            writer,
            path,
            flush_each_record,
            rows_written: 0,
        })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl PersistenceSink for JsonLinesSink {
    fn append(&mut self, timestamp: Timestamp, gyro: Triple) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &PersistedRecord::new(timestamp, gyro))?;
        self.writer.write_all(b"\n")?;
        if self.flush_each_record {
            self.writer.flush()?;
        }
        self.rows_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonLinesSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::error!("JsonLinesSink failed to flush {:?}: {}", self.path, e);
        }
        tracing::info!(
            "JsonLinesSink closed {:?} after {} rows",
            self.path,
            self.rows_written
        );
    }
}

// ==================== Null ====================

/// Sink used when persistence is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PersistenceSink for NullSink {
    fn append(&mut self, _timestamp: Timestamp, _gyro: Triple) -> Result<()> {
        Ok(())
    }
}

// ==================== Memory ====================

/// In-memory sink. Clones share the same record store, so a handle kept by
/// the caller sees everything appended through the driver.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(Timestamp, Triple)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all records appended so far, in arrival order.
    pub fn records(&self) -> Vec<(Timestamp, Triple)> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Timestamp, Triple)>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PersistenceSink for MemorySink {
    fn append(&mut self, timestamp: Timestamp, gyro: Triple) -> Result<()> {
        self.lock().push((timestamp, gyro));
        Ok(())
    }
}

// ==================== Background ====================

enum WriterCommand {
    Append(Timestamp, Triple),
    Flush,
}

/// Runs another sink on a dedicated writer thread.
///
/// Records are queued on a bounded channel and written in arrival order.
/// An append waits at most `enqueue_timeout` for queue space; past that it
/// fails instead of stalling the caller. Write errors on the writer thread
/// are logged and counted in [`BackgroundSink::write_failures`].
pub struct BackgroundSink {
    tx: Option<Sender<WriterCommand>>,
    handle: Option<JoinHandle<()>>,
    enqueue_timeout: Duration,
    write_failures: Arc<AtomicU64>,
}

impl BackgroundSink {
    pub fn spawn<S>(sink: S, queue_capacity: usize, enqueue_timeout: Duration) -> Result<Self>
    where
        S: PersistenceSink + 'static,
    {
        let (tx, rx) = bounded::<WriterCommand>(queue_capacity.max(1));
        let write_failures = Arc::new(AtomicU64::new(0));
        let failures = write_failures.clone();

        let handle = std::thread::Builder::new()
            .name("persistence-writer".to_string())
            .spawn(move || {
                let mut sink = sink;
                for cmd in rx.iter() {
                    let result = match cmd {
                        WriterCommand::Append(ts, gyro) => sink.append(ts, gyro),
                        WriterCommand::Flush => sink.flush(),
                    };
                    if let Err(e) = result {
                        failures.fetch_add(1, Ordering::Relaxed);
                        tracing::error!("Background persistence write failed: {}", e);
                    }
                }
                if let Err(e) = sink.flush() {
                    failures.fetch_add(1, Ordering::Relaxed);
                    tracing::error!("Background persistence final flush failed: {}", e);
                }
                tracing::debug!("Persistence writer thread exiting");
            })
            .context("Failed to spawn persistence writer thread")?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            enqueue_timeout,
            write_failures,
        })
    }

    /// Number of writes that failed on the writer thread so far.
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    fn send(&self, cmd: WriterCommand) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| TelemetryError::SinkWrite("writer already stopped".to_string()))?;
        tx.send_timeout(cmd, self.enqueue_timeout)
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => {
                    TelemetryError::SinkWrite("persistence queue full".to_string())
                }
                SendTimeoutError::Disconnected(_) => {
                    TelemetryError::SinkWrite("persistence writer stopped".to_string())
                }
            })
    }
}

impl PersistenceSink for BackgroundSink {
    fn append(&mut self, timestamp: Timestamp, gyro: Triple) -> Result<()> {
        self.send(WriterCommand::Append(timestamp, gyro))
    }

    fn flush(&mut self) -> Result<()> {
        self.send(WriterCommand::Flush)
    }

    fn deferred_failures(&self) -> u64 {
        self.write_failures()
    }
}

impl Drop for BackgroundSink {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain the queue and exit.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Persistence writer thread panicked");
            }
        }
    }
}

// ==================== Factory ====================

/// Build the sink described by `config`.
pub fn open_sink(config: &PersistenceConfig) -> Result<Box<dyn PersistenceSink>> {
    if !config.enabled {
        tracing::info!("Persistence disabled");
        return Ok(Box::new(NullSink));
    }

    let sink: Box<dyn PersistenceSink> = match config.format {
        PersistenceFormat::Csv => Box::new(CsvSink::open(
            config.file_path.clone(),
            config.flush_each_record,
        )?),
        PersistenceFormat::Jsonl => Box::new(JsonLinesSink::open(
            config.file_path.clone(),
            config.flush_each_record,
        )?),
    };

    if config.background {
        Ok(Box::new(BackgroundSink::spawn(
            sink,
            config.queue_capacity,
            Duration::from_millis(config.enqueue_timeout_ms),
        )?))
    } else {
        Ok(sink)
    }
}
