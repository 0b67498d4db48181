//! Per-connection outbound queue
//!
//! The transport drains an unbounded channel into the socket from a writer
//! task, so the relay never waits on network I/O. The `Outbox` counts frames
//! that were queued but not yet written; when that count reaches the
//! configured threshold the `BackpressureHook` is told about it. What to do
//! about a slow client is left to the hook.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;
use tungstenite::protocol::Message as WsMessage;

use crate::utils::RelayError;

pub const DEFAULT_BACKPRESSURE_THRESHOLD: usize = 1024;

/// Notified when a connection's outbound queue reaches the threshold.
pub trait BackpressureHook: Send + Sync {
    fn congested(&self, connection_id: &str, queued: usize);
}

/// Only logs. Connections are never dropped and frames are never shed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBackpressure;

impl BackpressureHook for LogBackpressure {
    fn congested(&self, connection_id: &str, queued: usize) {
        warn!(connection_id, queued, "outbound backpressure");
    }
}

#[derive(Clone)]
pub struct Outbox {
    sender: UnboundedSender<WsMessage>,
    queued: Arc<AtomicUsize>,
    threshold: usize,
    hook: Arc<dyn BackpressureHook>,
}

impl Outbox {
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self::with_backpressure(
            sender,
            DEFAULT_BACKPRESSURE_THRESHOLD,
            Arc::new(LogBackpressure),
        )
    }

    pub fn with_backpressure(
        sender: UnboundedSender<WsMessage>,
        threshold: usize,
        hook: Arc<dyn BackpressureHook>,
    ) -> Self {
        Self {
            sender,
            queued: Arc::new(AtomicUsize::new(0)),
            threshold: threshold.max(1),
            hook,
        }
    }

    /// Queue a frame for `connection_id`. Never blocks.
    pub fn send(&self, connection_id: &str, msg: WsMessage) -> Result<(), RelayError> {
        // count first so the writer can never decrement below zero
        let queued = self.queued.fetch_add(1, Ordering::SeqCst) + 1;

        if self.sender.send(msg).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(RelayError::ChannelClosed(connection_id.to_string()));
        }

        if queued == self.threshold {
            self.hook.congested(connection_id, queued);
        }
        Ok(())
    }

    /// Frames queued and not yet written.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Handle for the writer task to report written frames.
    pub fn gauge(&self) -> QueueGauge {
        QueueGauge(self.queued.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl fmt::Debug for Outbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outbox")
            .field("queued", &self.queued())
            .field("threshold", &self.threshold)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct QueueGauge(Arc<AtomicUsize>);

impl QueueGauge {
    /// One frame left the queue.
    pub fn written(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}
