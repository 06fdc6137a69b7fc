//! Tick-driven live view: pull samples, window them, redraw.
//!
//! [`LiveView`] connects a [`SampleFeed`] to a [`Renderer`]. On each tick it
//! takes what the feed has, pushes the selected sensor triple into its
//! [`WindowBuffer`] and hands the renderer a snapshot of the window.

use crate::pipeline::bridge::{PipelineBridge, PipelineMessage};
use crate::pipeline::driver::PipelineDriver;
use crate::pipeline::sink::PersistenceSink;
use crate::pipeline::source::LineSource;
use crate::pipeline::window::WindowBuffer;
use crate::types::{PipelineStats, Sample, SensorKind, Triple};

/// Result of polling a feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedPoll {
    /// Samples that arrived since the last poll, oldest first (may be empty).
    Ready(Vec<Sample>),
    /// The stream is over; no more samples will arrive.
    Closed,
}

/// Where a live view gets its samples from.
pub trait SampleFeed {
    fn poll_samples(&mut self) -> FeedPoll;

    /// Latest pipeline statistics known to the feed.
    fn stats(&self) -> PipelineStats;
}

/// Blocking pull: one sample per poll, straight from the driver.
impl<L: LineSource, P: PersistenceSink> SampleFeed for PipelineDriver<L, P> {
    fn poll_samples(&mut self) -> FeedPoll {
        match self.advance() {
            Some(sample) => FeedPoll::Ready(vec![sample]),
            None => FeedPoll::Closed,
        }
    }

    fn stats(&self) -> PipelineStats {
        PipelineDriver::stats(self)
    }
}

/// Non-blocking: everything queued on the channel since the last poll.
impl SampleFeed for PipelineBridge {
    fn poll_samples(&mut self) -> FeedPoll {
        if self.closed {
            return FeedPoll::Closed;
        }

        let (msgs, disconnected) = self.poll();
        let mut samples = Vec::with_capacity(msgs.len());
        let mut saw_close = disconnected;
        for msg in msgs {
            match msg {
                PipelineMessage::Sample(sample) => samples.push(sample),
                PipelineMessage::Stats(stats) => self.stats = stats,
                PipelineMessage::Closed(stats) => {
                    self.stats = stats;
                    saw_close = true;
                }
            }
        }

        if saw_close {
            self.closed = true;
            if samples.is_empty() {
                return FeedPoll::Closed;
            }
        }
        // Samples that arrived together with the close are still shown; the
        // next poll reports Closed.
        FeedPoll::Ready(samples)
    }

    fn stats(&self) -> PipelineStats {
        PipelineBridge::stats(self)
    }
}

/// Draws the current window contents.
pub trait Renderer {
    /// `window` is the windowed triples, oldest first.
    fn render(&mut self, tick: u64, window: &[Triple]);
}

/// Logs the newest triple of every redraw at `info`.
#[derive(Debug, Clone, Default)]
pub struct LogRenderer {
    sensor: SensorKind,
}

impl LogRenderer {
    pub fn new(sensor: SensorKind) -> Self {
        Self { sensor }
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, tick: u64, window: &[Triple]) {
        if let Some(&(x, y, z)) = window.last() {
            tracing::info!(
                tick,
                len = window.len(),
                "{}: x={} y={} z={}",
                self.sensor.label(),
                x,
                y,
                z
            );
        }
    }
}

/// Consumer side of the pipeline: feed → window → renderer.
pub struct LiveView<S: SampleFeed, R: Renderer> {
    feed: S,
    renderer: R,
    window: WindowBuffer,
    sensor: SensorKind,
    samples_seen: u64,
    closed: bool,
}

impl<S: SampleFeed, R: Renderer> LiveView<S, R> {
    pub fn new(feed: S, renderer: R, window: WindowBuffer, sensor: SensorKind) -> Self {
        Self {
            feed,
            renderer,
            window,
            sensor,
            samples_seen: 0,
            closed: false,
        }
    }

    /// Advance the view by one tick.
    ///
    /// Returns `false` once the feed is closed. The renderer is only called
    /// when new samples arrived during this tick.
    pub fn on_tick(&mut self, tick: u64) -> bool {
        if self.closed {
            return false;
        }

        match self.feed.poll_samples() {
            FeedPoll::Closed => {
                self.closed = true;
                false
            }
            FeedPoll::Ready(samples) => {
                if !samples.is_empty() {
                    self.samples_seen += samples.len() as u64;
                    self.window
                        .extend(samples.iter().map(|s| s.triple(self.sensor)));
                    let snapshot = self.window.snapshot();
                    self.renderer.render(tick, &snapshot);
                }
                true
            }
        }
    }

    /// Run ticks until the feed closes. Returns the number of ticks taken.
    pub fn run_to_end(&mut self) -> u64 {
        let mut tick = 0;
        while self.on_tick(tick) {
            tick += 1;
        }
        tick
    }

    pub fn window(&self) -> &WindowBuffer {
        &self.window
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn feed(&self) -> &S {
        &self.feed
    }

    pub fn sensor(&self) -> SensorKind {
        self.sensor
    }

    /// Switch the windowed sensor; the window restarts empty.
    pub fn set_sensor(&mut self, sensor: SensorKind) {
        if sensor != self.sensor {
            self.sensor = sensor;
            self.window.clear();
        }
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
