//! Pipeline thread: drives the line source and feeds the UI through the bridge.

use crate::error::{Result, ResultExt};
use crate::pipeline::bridge::PipelineMessage;
use crate::pipeline::driver::{PipelineDriver, Step};
use crate::pipeline::sink::PersistenceSink;
use crate::pipeline::source::LineSource;
use crate::types::PipelineStats;
use crossbeam_channel::{Sender, TrySendError};
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Run `driver` until the stream ends or its running flag is cleared.
///
/// Every sample has already been persisted by the driver when it is offered
/// to the UI. A full channel drops the sample for display only, so a slow UI
/// never stalls persistence. Returns the final statistics.
pub fn run_pipeline<L, P>(
    mut driver: PipelineDriver<L, P>,
    msg_tx: Sender<PipelineMessage>,
    stats_interval: Duration,
) -> PipelineStats
where
    L: LineSource,
    P: PersistenceSink,
{
    tracing::info!("Pipeline thread started ({})", driver.source_name());

    let mut dropped_for_display = 0u64;
    let mut dropping = false;
    let mut last_stats_time = Instant::now();

    loop {
        match driver.step() {
            Step::Sample(sample) => match msg_tx.try_send(PipelineMessage::Sample(sample)) {
                Ok(()) => dropping = false,
                Err(TrySendError::Full(_)) => {
                    dropped_for_display += 1;
                    // One warning per burst
                    if !dropping {
                        tracing::warn!("UI is not keeping up, dropping samples for display");
                        dropping = true;
                    }
                }
                Err(TrySendError::Disconnected(_)) => {
                    tracing::info!("UI went away, stopping pipeline");
                    driver.running().store(false, Ordering::Relaxed);
                    break;
                }
            },
            Step::Pending => {}
            Step::Closed => break,
        }

        // Stats go out on schedule even while only noise or timeouts arrive
        if last_stats_time.elapsed() >= stats_interval {
            let mut stats = driver.stats();
            stats.dropped_for_display = dropped_for_display;
            let _ = msg_tx.try_send(PipelineMessage::Stats(stats));
            last_stats_time = Instant::now();
        }
    }

    driver.shutdown();
    let mut stats = driver.stats();
    stats.dropped_for_display = dropped_for_display;

    // Blocking send so the final message is not lost to a full queue; fails
    // only if the UI is already gone.
    let _ = msg_tx.send(PipelineMessage::Closed(stats));
    tracing::info!("Pipeline thread exiting");
    stats
}

/// Spawn [`run_pipeline`] on a dedicated, named thread.
pub fn spawn_pipeline<L, P>(
    driver: PipelineDriver<L, P>,
    msg_tx: Sender<PipelineMessage>,
    stats_interval: Duration,
) -> Result<JoinHandle<PipelineStats>>
where
    L: LineSource + 'static,
    P: PersistenceSink + 'static,
{
    std::thread::Builder::new()
        .name("pipeline".to_string())
        .spawn(move || run_pipeline(driver, msg_tx, stats_interval))
        .context("Failed to spawn pipeline thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::bridge::PipelineBridge;
    use crate::pipeline::sink::MemorySink;
    use crate::pipeline::source::ReaderLineSource;
    use std::io::{self, ErrorKind};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn lines(n: usize) -> String {
        (0..n)
            .map(|i| format!("$:{i},0,0,0,0,0,0,0,0\n"))
            .collect()
    }

    #[test]
    fn test_forwards_samples_then_closes() {
        let running = Arc::new(AtomicBool::new(true));
        let (bridge, msg_tx) = PipelineBridge::new(16, running.clone());
        let driver = PipelineDriver::with_running(
            ReaderLineSource::from_text(lines(3)),
            MemorySink::new(),
            running,
        );

        let stats = run_pipeline(driver, msg_tx, Duration::from_secs(60));
        assert_eq!(stats.samples, 3);

        let msgs = bridge.drain();
        assert_eq!(msgs.len(), 4);
        assert!(matches!(msgs[0], PipelineMessage::Sample(s) if s.gyro().0 == 0.0));
        assert!(matches!(msgs[2], PipelineMessage::Sample(s) if s.gyro().0 == 2.0));
        assert_eq!(msgs[3], PipelineMessage::Closed(stats));
    }

    #[test]
    fn test_full_channel_drops_for_display_but_persists() {
        let running = Arc::new(AtomicBool::new(true));
        let sink = MemorySink::new();
        let (bridge, msg_tx) = PipelineBridge::new(2, running.clone());
        let driver =
            PipelineDriver::with_running(ReaderLineSource::from_text(lines(10)), sink.clone(), running);

        // The UI drains only after the run; the final Closed send blocks until
        // there is room, so run on a thread.
        let handle = std::thread::spawn(move || run_pipeline(driver, msg_tx, Duration::from_secs(60)));

        let mut received = Vec::new();
        loop {
            let (msgs, disconnected) = bridge.poll();
            received.extend(msgs);
            if disconnected {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        let stats = handle.join().unwrap();

        assert_eq!(sink.len(), 10);
        assert_eq!(stats.samples, 10);
        let shown = received
            .iter()
            .filter(|m| matches!(m, PipelineMessage::Sample(_)))
            .count() as u64;
        assert_eq!(shown + stats.dropped_for_display, 10);
        assert_eq!(received.last(), Some(&PipelineMessage::Closed(stats)));
    }

    #[test]
    fn test_stops_when_ui_disconnects() {
        let running = Arc::new(AtomicBool::new(true));
        let (bridge, msg_tx) = PipelineBridge::new(4, running.clone());
        drop(bridge);
        let driver = PipelineDriver::with_running(
            ReaderLineSource::from_text(lines(5)),
            MemorySink::new(),
            running.clone(),
        );

        let stats = run_pipeline(driver, msg_tx, Duration::from_secs(60));
        assert_eq!(stats.samples, 1);
        assert!(!running.load(Ordering::Relaxed));
    }

    #[test]
    fn test_periodic_stats() {
        let running = Arc::new(AtomicBool::new(true));
        let (bridge, msg_tx) = PipelineBridge::new(64, running.clone());
        let driver =
            PipelineDriver::with_running(ReaderLineSource::from_text(lines(3)), MemorySink::new(), running);

        run_pipeline(driver, msg_tx, Duration::ZERO);
        let stats_count = bridge
            .drain()
            .iter()
            .filter(|m| matches!(m, PipelineMessage::Stats(_)))
            .count();
        assert_eq!(stats_count, 3);
    }

    #[test]
    fn test_spawn_pipeline_joins_with_stats() {
        let running = Arc::new(AtomicBool::new(true));
        let (_bridge, msg_tx) = PipelineBridge::new(16, running.clone());
        let driver =
            PipelineDriver::with_running(ReaderLineSource::from_text(lines(2)), MemorySink::new(), running);

        let handle = spawn_pipeline(driver, msg_tx, Duration::from_millis(500)).unwrap();
        assert_eq!(handle.join().unwrap().samples, 2);
    }

    /// Emits a fixed set of lines, then only read timeouts.
    struct QuietLink {
        lines: Vec<String>,
    }

    impl LineSource for QuietLink {
        fn next_line(&mut self) -> io::Result<Option<String>> {
            if self.lines.is_empty() {
                std::thread::sleep(Duration::from_millis(2));
                return Err(io::Error::new(ErrorKind::TimedOut, "no data"));
            }
            Ok(Some(self.lines.remove(0)))
        }

        fn describe(&self) -> &str {
            "quiet"
        }
    }

    #[test]
    fn test_stats_sent_while_no_samples_arrive() {
        let running = Arc::new(AtomicBool::new(true));
        let (bridge, msg_tx) = PipelineBridge::new(1024, running.clone());
        let driver = PipelineDriver::with_running(
            QuietLink {
                lines: vec!["$:1,2".to_string(); 20],
            },
            MemorySink::new(),
            running,
        );
        let handle = spawn_pipeline(driver, msg_tx, Duration::from_millis(10)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut latest = None;
        let done = |latest: Option<PipelineStats>| latest.is_some_and(|s| s.malformed == 20);
        while Instant::now() < deadline && !done(latest) {
            for msg in bridge.drain() {
                if let PipelineMessage::Stats(stats) = msg {
                    latest = Some(stats);
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        bridge.stop();
        let final_stats = handle.join().unwrap();

        let latest = latest.expect("no stats while the link carried no samples");
        assert_eq!(latest.malformed, 20);
        assert_eq!(latest.samples, 0);
        assert_eq!(final_stats.malformed, 20);
    }
}
