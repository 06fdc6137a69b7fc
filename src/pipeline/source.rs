//! Line sources: where raw telemetry lines come from.
//!
//! A [`LineSource`] yields one newline-delimited line per call. The contract:
//!
//! - `Ok(Some(line))` — a complete line, terminator stripped
//! - `Ok(None)` — end of stream, the transport is closed
//! - `Err(e)` with `e.kind() == TimedOut` — no complete line yet; call again
//! - `Err(e)` where [`is_line_too_long`] holds — an overlong fragment was
//!   dropped; the stream continues
//! - any other `Err` — the transport failed (including non-UTF-8 bytes);
//!   callers treat it as end of stream
//!
//! Dropping a source releases the underlying handle.

use crate::config::SerialConfig;
use crate::error::{Result, ResultExt};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use serialport::SerialPort;
use std::io::{self, BufRead, BufReader, ErrorKind, Read};
use std::time::Duration;

/// Producer of raw text lines from a transport.
pub trait LineSource: Send {
    /// Read the next line. See the module docs for the meaning of each result.
    fn next_line(&mut self) -> io::Result<Option<String>>;

    /// Short description for logs (port name, "stdin", ...).
    fn describe(&self) -> &str;
}

/// Longest line accepted from a transport, terminator included.
pub const MAX_LINE_LEN: usize = 4096;

/// A line grew past [`MAX_LINE_LEN`] without a terminator and was discarded.
///
/// Carried inside an `io::Error` of kind `InvalidData`; the stream itself
/// stays usable. Check with [`is_line_too_long`].
#[derive(Debug, thiserror::Error)]
#[error("line exceeds {} bytes without a terminator", MAX_LINE_LEN)]
pub struct LineTooLong;

/// Whether `err` reports a discarded oversized line rather than a dead transport.
pub fn is_line_too_long(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<LineTooLong>())
}

/// Shared line assembly over any `BufRead`.
///
/// Bytes read before a timeout are kept in `pending` and completed on the
/// next call, so a slow link never splits a line in two. `pending` never
/// holds more than [`MAX_LINE_LEN`] bytes: an overlong fragment is dropped,
/// reported once, and the rest of it is skipped up to the next terminator.
#[derive(Debug)]
struct LineAssembler<R> {
    reader: R,
    pending: Vec<u8>,
    discarding: bool,
    exhausted: bool,
}

impl<R: BufRead> LineAssembler<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::with_capacity(128),
            discarding: false,
            exhausted: false,
        }
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            // Always > 0: pending is cleared whenever it reaches the cap
            let room = (MAX_LINE_LEN - self.pending.len()) as u64;
            match (&mut self.reader).take(room).read_until(b'\n', &mut self.pending) {
                Ok(0) => {
                    self.exhausted = true;
                    if self.pending.is_empty() || self.discarding {
                        self.pending.clear();
                        return Ok(None);
                    }
                    // Unterminated last line
                    return self.take_line().map(Some);
                }
                Ok(_) => {
                    let terminated = self.pending.last() == Some(&b'\n');
                    if self.discarding {
                        self.pending.clear();
                        self.discarding = !terminated;
                        continue;
                    }
                    if !terminated && self.pending.len() >= MAX_LINE_LEN {
                        self.pending.clear();
                        self.discarding = true;
                        return Err(io::Error::new(ErrorKind::InvalidData, LineTooLong));
                    }
                    // Either a full line or the tail of the stream
                    return self.take_line().map(Some);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    return Err(io::Error::new(ErrorKind::TimedOut, e));
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn take_line(&mut self) -> io::Result<String> {
        let mut bytes = std::mem::take(&mut self.pending);
        while matches!(bytes.last(), Some(b'\n') | Some(b'\r')) {
            bytes.pop();
        }
        String::from_utf8(bytes).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
    }
}

/// Line source over any buffered reader: files, stdin, in-memory buffers.
pub struct ReaderLineSource<R> {
    lines: LineAssembler<R>,
    name: String,
}

impl<R: BufRead + Send> ReaderLineSource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            lines: LineAssembler::new(reader),
            name: name.into(),
        }
    }
}

impl ReaderLineSource<BufReader<io::Stdin>> {
    /// Read lines from standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()), "stdin")
    }
}

impl ReaderLineSource<io::Cursor<Vec<u8>>> {
    /// In-memory source over the given text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(io::Cursor::new(text.into().into_bytes()), "memory")
    }
}

impl<R: BufRead + Send> LineSource for ReaderLineSource<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line()
    }

    fn describe(&self) -> &str {
        &self.name
    }
}

/// Line source over a serial port (USB-serial or Bluetooth SPP).
///
/// The port's read timeout bounds how long [`LineSource::next_line`] blocks,
/// which is how often the driver gets to check its stop signal.
pub struct SerialLineSource {
    lines: LineAssembler<BufReader<Box<dyn SerialPort>>>,
    port_name: String,
}

impl SerialLineSource {
    /// Open the port described by `config`.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(Duration::from_millis(config.timeout_ms))
            .open()
            .with_context(|| format!("Failed to open serial port '{}'", config.port))?;

        tracing::info!(
            "Opened serial port {} at {} baud (timeout {} ms)",
            config.port,
            config.baud_rate,
            config.timeout_ms
        );

        Ok(Self {
            lines: LineAssembler::new(BufReader::new(port)),
            port_name: config.port.clone(),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl LineSource for SerialLineSource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line()
    }

    fn describe(&self) -> &str {
        &self.port_name
    }
}

impl Drop for SerialLineSource {
    fn drop(&mut self) {
        tracing::info!("Closing serial port {}", self.port_name);
    }
}

/// Queue depth between a [`BackgroundLineSource`] reader thread and its consumer.
const LINE_QUEUE_CAPACITY: usize = 256;

/// Runs another source on a reader thread so `next_line` never blocks for
/// longer than `poll_interval`.
///
/// Meant for transports without a read timeout, such as stdin or a pipe:
/// the driver still gets to check its stop signal while the link is idle.
/// The reader thread ends after end of stream or a transport error. If it is
/// parked in a read when the source is dropped, it ends with the process.
pub struct BackgroundLineSource {
    rx: Receiver<io::Result<Option<String>>>,
    poll_interval: Duration,
    name: String,
    finished: bool,
}

impl BackgroundLineSource {
    pub fn spawn<L>(mut inner: L, poll_interval: Duration) -> Result<Self>
    where
        L: LineSource + 'static,
    {
        let name = inner.describe().to_string();
        let (tx, rx) = bounded(LINE_QUEUE_CAPACITY);

        std::thread::Builder::new()
            .name(format!("{name}-reader"))
            .spawn(move || loop {
                let item = inner.next_line();
                let last = match &item {
                    Ok(Some(_)) => false,
                    Ok(None) => true,
                    Err(e) => e.kind() != ErrorKind::TimedOut && !is_line_too_long(e),
                };
                // A failed send means the consumer is gone
                if tx.send(item).is_err() || last {
                    break;
                }
            })
            .context("Failed to spawn line reader thread")?;

        Ok(Self {
            rx,
            poll_interval,
            name,
            finished: false,
        })
    }
}

impl LineSource for BackgroundLineSource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        if self.finished {
            return Ok(None);
        }
        match self.rx.recv_timeout(self.poll_interval) {
            Ok(Ok(None)) => {
                self.finished = true;
                Ok(None)
            }
            Ok(item) => item,
            Err(RecvTimeoutError::Timeout) => Err(io::Error::new(
                ErrorKind::TimedOut,
                format!("no line from {} within {:?}", self.name, self.poll_interval),
            )),
            Err(RecvTimeoutError::Disconnected) => {
                self.finished = true;
                Ok(None)
            }
        }
    }

    fn describe(&self) -> &str {
        &self.name
    }
}

/// Boxed sources are sources too, so the driver can hold either kind.
impl LineSource for Box<dyn LineSource> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        (**self).next_line()
    }

    fn describe(&self) -> &str {
        (**self).describe()
    }
}
