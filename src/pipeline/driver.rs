//! Pipeline driver — pull a line, parse it, route the result.
//!
//! The driver owns the line source and the persistence sink. Each call to
//! [`PipelineDriver::advance`] blocks until one sample has been decoded,
//! skipping any number of unparseable lines, or until the stream ends.
//! [`PipelineDriver::step`] reads at most one line and returns on read
//! timeouts too, for callers with periodic work of their own.
//!
//! Routing:
//! - non-telemetry lines are counted and ignored
//! - malformed telemetry lines are counted, logged with the raw line, and dropped;
//!   so are oversized lines the source discarded
//! - samples are appended to the sink, then returned; a sink failure is logged
//!   and counted but never withholds the sample from the caller
//!
//! The source is released (dropped) as soon as the stream ends, the transport
//! fails, or the shared `running` flag is cleared, and in any case when the
//! driver itself is dropped. After that, `advance` keeps returning `None`.

use crate::error::TelemetryError;
use crate::pipeline::parser::{self, ParseError};
use crate::pipeline::sink::PersistenceSink;
use crate::pipeline::source::{is_line_too_long, LineSource};
use crate::types::{PipelineStats, Sample};
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of [`PipelineDriver::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// A line decoded into a sample.
    Sample(Sample),
    /// A read timed out, or the line did not decode.
    Pending,
    /// The stream is over; the source has been released.
    Closed,
}

/// Pull-driven parser loop over a line source.
pub struct PipelineDriver<L: LineSource, P: PersistenceSink> {
    source: Option<L>,
    sink: P,
    running: Arc<AtomicBool>,
    stats: PipelineStats,
    source_name: String,
}

impl<L: LineSource, P: PersistenceSink> PipelineDriver<L, P> {
    /// Create a driver with its own stop flag.
    pub fn new(source: L, sink: P) -> Self {
        Self::with_running(source, sink, Arc::new(AtomicBool::new(true)))
    }

    /// Create a driver that stops once `running` is cleared.
    ///
    /// The flag is checked before every read, so a stop request is observed
    /// within one read timeout of the source.
    pub fn with_running(source: L, sink: P, running: Arc<AtomicBool>) -> Self {
        let source_name = source.describe().to_string();
        Self {
            source: Some(source),
            sink,
            running,
            stats: PipelineStats::default(),
            source_name,
        }
    }

    /// Shared stop flag; store `false` to stop the driver.
    pub fn running(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Counters so far, including failures reported late by the sink.
    pub fn stats(&self) -> PipelineStats {
        let mut stats = self.stats;
        stats.sink_failures += self.sink.deferred_failures();
        stats
    }

    /// Whether the source has been released.
    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    /// Block until the next sample, or `None` once the stream is over.
    pub fn advance(&mut self) -> Option<Sample> {
        loop {
            match self.step() {
                Step::Sample(sample) => return Some(sample),
                Step::Pending => continue,
                Step::Closed => return None,
            }
        }
    }

    /// Check the stop signal, then read and route at most one line.
    pub fn step(&mut self) -> Step {
        if !self.running.load(Ordering::Relaxed) {
            if self.source.is_some() {
                tracing::info!("Stop requested, closing {}", self.source_name);
            }
            self.shutdown();
            return Step::Closed;
        }

        let Some(source) = self.source.as_mut() else {
            return Step::Closed;
        };
        let line = match source.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("Line source {} reached end of stream", self.source_name);
                self.shutdown();
                return Step::Closed;
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => return Step::Pending,
            Err(e) if is_line_too_long(&e) => {
                self.stats.lines_read += 1;
                self.stats.malformed += 1;
                tracing::warn!("Dropping oversized line from {}: {}", self.source_name, e);
                return Step::Pending;
            }
            Err(e) => {
                let err = TelemetryError::TransportClosed(e.to_string());
                tracing::error!("{} ({})", err, self.source_name);
                self.shutdown();
                return Step::Closed;
            }
        };

        self.stats.lines_read += 1;
        match self.route(&line) {
            Some(sample) => Step::Sample(sample),
            None => Step::Pending,
        }
    }

    /// Classify one raw line. Returns the sample when the line decoded.
    fn route(&mut self, line: &str) -> Option<Sample> {
        match parser::parse(line) {
            Ok(sample) => {
                self.stats.samples += 1;
                if let Err(e) = self.sink.append_sample(&sample) {
                    self.stats.sink_failures += 1;
                    tracing::error!("Failed to persist sample: {}", e);
                }
                tracing::trace!(
                    gyro = ?sample.gyro(),
                    accel = ?sample.accel(),
                    mag = ?sample.mag(),
                    "sample"
                );
                Some(sample)
            }
            Err(ParseError::NotTelemetry) => {
                self.stats.not_telemetry += 1;
                tracing::trace!("Ignoring non-telemetry line: {:?}", line);
                None
            }
            Err(e) => {
                self.stats.malformed += 1;
                tracing::warn!("Dropping malformed telemetry line ({}): {:?}", e, line);
                None
            }
        }
    }

    /// Release the source and flush the sink. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(source) = self.source.take() {
            drop(source);
            if let Err(e) = self.sink.flush() {
                self.stats.sink_failures += 1;
                tracing::error!("Failed to flush persistence sink: {}", e);
            }
            tracing::info!("Pipeline closed: {}", self.stats());
        }
    }
}

impl<L: LineSource, P: PersistenceSink> Iterator for PipelineDriver<L, P> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        self.advance()
    }
}

impl<L: LineSource, P: PersistenceSink> Drop for PipelineDriver<L, P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
