//! Mock line sources and sinks

use gyro_telemetry::error::{Result, TelemetryError};
use gyro_telemetry::pipeline::{LineSource, PersistenceSink};
use gyro_telemetry::types::{Timestamp, Triple};
use std::collections::VecDeque;
use std::io::{self, ErrorKind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// One scripted read result
pub enum Read {
    Line(String),
    Timeout,
    Fail(ErrorKind),
}

/// Line source that replays a script, then reports end of stream.
///
/// Tracks how many reads were made and whether it has been dropped.
pub struct ScriptedSource {
    script: VecDeque<Read>,
    pub reads: Arc<AtomicUsize>,
    pub released: Arc<AtomicBool>,
    /// Keep timing out instead of ending once the script is exhausted
    pub idle_forever: bool,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Read>) -> Self {
        Self {
            script: script.into_iter().collect(),
            reads: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicBool::new(false)),
            idle_forever: false,
        }
    }

    pub fn lines<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self::new(lines.into_iter().map(|l| Read::Line(l.into())))
    }

    pub fn idle_forever(mut self) -> Self {
        self.idle_forever = true;
        self
    }
}

impl LineSource for ScriptedSource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(Read::Line(line)) => Ok(Some(line)),
            Some(Read::Timeout) => Err(io::Error::new(ErrorKind::TimedOut, "timed out")),
            Some(Read::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
            None if self.idle_forever => {
                std::thread::sleep(std::time::Duration::from_millis(2));
                Err(io::Error::new(ErrorKind::TimedOut, "timed out"))
            }
            None => Ok(None),
        }
    }

    fn describe(&self) -> &str {
        "scripted"
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Sink whose appends always fail
#[derive(Default)]
pub struct FailingSink {
    pub attempts: usize,
}

impl PersistenceSink for FailingSink {
    fn append(&mut self, _timestamp: Timestamp, _gyro: Triple) -> Result<()> {
        self.attempts += 1;
        Err(TelemetryError::SinkWrite("disk full".to_string()))
    }
}
