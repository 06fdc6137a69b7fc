//! Thread boundary between the pipeline thread and the UI thread.
//!
//! The pipeline thread owns the sender half and pushes [`PipelineMessage`]s;
//! the UI keeps the [`PipelineBridge`] and drains it once per frame.

use crate::types::{PipelineStats, Sample};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Messages sent from the pipeline thread to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineMessage {
    /// A decoded sample (already handed to the persistence sink).
    Sample(Sample),

    /// Periodic pipeline statistics.
    Stats(PipelineStats),

    /// The line source is gone; final statistics.
    Closed(PipelineStats),
}

/// Default buffer size for the pipeline → UI channel.
pub const MSG_CHANNEL_CAPACITY: usize = 1024;

/// UI-side handle for communicating with the pipeline thread.
pub struct PipelineBridge {
    msg_rx: Receiver<PipelineMessage>,
    running: Arc<AtomicBool>,
    /// Latest statistics seen on the channel
    pub(crate) stats: PipelineStats,
    /// Set once `Closed` was received or the sender is gone
    pub(crate) closed: bool,
}

impl PipelineBridge {
    /// Create a new bridge pair: `(bridge_for_ui, msg_tx)`.
    ///
    /// `running` is the flag the pipeline thread's driver checks; the pipeline
    /// thread owns `msg_tx`.
    pub fn new(capacity: usize, running: Arc<AtomicBool>) -> (Self, Sender<PipelineMessage>) {
        let (msg_tx, msg_rx) = bounded(capacity.max(1));
        let bridge = Self {
            msg_rx,
            running,
            stats: PipelineStats::default(),
            closed: false,
        };
        (bridge, msg_tx)
    }

    /// Drain all pending messages.
    pub fn drain(&self) -> Vec<PipelineMessage> {
        let mut msgs = Vec::new();
        while let Ok(msg) = self.msg_rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }

    /// Try to receive a single message without blocking.
    pub fn try_recv(&self) -> Option<PipelineMessage> {
        self.msg_rx.try_recv().ok()
    }

    /// Ask the pipeline thread to stop at its next read boundary.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Whether the pipeline thread has finished.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Latest statistics received from the pipeline thread.
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Drain all pending messages, also reporting whether the pipeline thread
    /// has dropped its sender.
    pub fn poll(&self) -> (Vec<PipelineMessage>, bool) {
        let mut msgs = Vec::new();
        loop {
            match self.msg_rx.try_recv() {
                Ok(msg) => msgs.push(msg),
                Err(TryRecvError::Empty) => return (msgs, false),
                Err(TryRecvError::Disconnected) => return (msgs, true),
            }
        }
    }
}
