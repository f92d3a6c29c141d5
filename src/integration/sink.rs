//! Bounded handoff of frame reports to an external writer.
//!
//! The core must never wait on I/O, so publishing is `try_send`: when
//! the writer falls behind and the queue is full, the report is dropped
//! and counted instead of blocking the frame loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use log::warn;

use crate::monitor::FrameReport;

/// Default queue length, matching the usual video writer buffer.
pub const DEFAULT_QUEUE_SIZE: usize = 128;

/// Outcome of a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    Queued,
    /// The queue was full; the report was dropped.
    Dropped,
    /// The receiving side is gone.
    Disconnected,
}

/// Producer half of the report queue.
#[derive(Debug, Clone)]
pub struct ReportSender {
    tx: Sender<FrameReport>,
    dropped: Arc<AtomicU64>,
}

impl ReportSender {
    /// Hand a report to the writer without blocking.
    pub fn publish(&self, report: FrameReport) -> Publish {
        match self.tx.try_send(report) {
            Ok(()) => Publish::Queued,
            Err(TrySendError::Full(report)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    "report queue full, dropping frame {} ({total} dropped so far)",
                    report.frame_index
                );
                Publish::Dropped
            }
            Err(TrySendError::Disconnected(_)) => Publish::Disconnected,
        }
    }

    /// Reports dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a bounded report queue. A capacity of zero is bumped to one so
/// that `publish` can ever succeed.
pub fn report_channel(capacity: usize) -> (ReportSender, Receiver<FrameReport>) {
    let (tx, rx) = channel::bounded(capacity.max(1));
    (
        ReportSender {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}
