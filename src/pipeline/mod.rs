//! Line-oriented telemetry pipeline.
//!
//! Raw lines flow from a line source through the frame parser; decoded samples
//! go to the persistence sink and on to the live view, which keeps the most
//! recent triples in a fixed-size window for display.
//!
//! # Architecture
//!
//! ```text
//! [LineSource] ──► [PipelineDriver] ──► [PersistenceSink]
//!                        │
//!                        └──► [PipelineBridge] ──► [LiveView] ──► [WindowBuffer] ──► [Renderer]
//! ```
//!
//! # Design
//!
//! - **Pull-driven** — `PipelineDriver::advance` blocks until one sample is
//!   decoded or the stream ends; bad lines are counted and skipped.
//! - **Dedicated thread** — in GUI mode the driver runs on its own thread and
//!   hands samples to the UI through a bounded crossbeam channel.
//! - **Single writer** — the window buffer lives on the UI side and is only
//!   mutated there.
//! - **RAII release** — the line source is dropped as soon as the stream ends,
//!   the transport fails, or a stop is requested.

pub mod bridge;
pub mod driver;
pub mod live;
pub mod parser;
pub mod runner;
pub mod sink;
pub mod source;
pub mod window;

pub use bridge::{PipelineBridge, PipelineMessage};
pub use driver::{PipelineDriver, Step};
pub use live::{FeedPoll, LiveView, LogRenderer, Renderer, SampleFeed};
pub use parser::{parse, parse_at, ParseError, FIELD_COUNT, TELEMETRY_PREFIX};
pub use runner::{run_pipeline, spawn_pipeline};
pub use sink::{
    open_sink, BackgroundSink, CsvSink, JsonLinesSink, MemorySink, NullSink, PersistedRecord,
    PersistenceSink,
};
pub use source::{
    is_line_too_long, BackgroundLineSource, LineSource, LineTooLong, ReaderLineSource,
    SerialLineSource, MAX_LINE_LEN,
};
pub use window::{WindowBuffer, CAPACITY};
