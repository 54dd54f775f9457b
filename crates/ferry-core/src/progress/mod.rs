//! Progress and status reporting boundary.
//!
//! The transfer loops never talk to a presentation layer directly. They hold
//! a [`Reporter`], which forwards to injected [`ProgressSink`] and
//! [`StatusSink`] implementations. Sinks are called synchronously from the
//! loop and must return promptly; [`ChannelObserver`] satisfies this by
//! posting every event onto a bounded channel and returning immediately.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::transfer::TransferRole;

/// A single progress notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Fraction of the declared size moved so far, in `[0, 1]`
    pub fraction: f64,
    /// Human-readable label, e.g. `"Transfer: 40.96%"`
    pub label: String,
}

impl ProgressEvent {
    /// Build an event with the standard percentage label.
    #[must_use]
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction,
            label: format!("Transfer: {:.2}%", fraction * 100.0),
        }
    }
}

/// Discrete lifecycle of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    /// Nothing started yet
    Idle,
    /// Listener bound, waiting for the peer
    Waiting {
        /// Advertised address
        address: String,
        /// Bound port
        port: u16,
    },
    /// Connection established
    Connected {
        /// Remote end of the connection
        peer: SocketAddr,
    },
    /// Payload is flowing
    Transferring,
    /// Loop ended normally
    Complete {
        /// Which side finished
        role: TransferRole,
    },
    /// Loop aborted
    Failed {
        /// Short description of the failure
        message: String,
    },
}

impl TransferStatus {
    /// Returns whether no further status follows this one.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failed { .. })
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Ready"),
            Self::Waiting { address, port } => {
                write!(f, "IP: {address}\nWaiting on Port: {port}")
            }
            Self::Connected { peer } => write!(f, "Connected to {peer}"),
            Self::Transferring => write!(f, "Transferring..."),
            Self::Complete {
                role: TransferRole::Receive,
            } => write!(f, "Transfer complete"),
            Self::Complete {
                role: TransferRole::Send,
            } => write!(f, "Transfer Complete"),
            Self::Failed { message } => write!(f, "{message}"),
        }
    }
}

/// Receives progress fractions.
pub trait ProgressSink: Send + Sync {
    /// Called once per moved chunk. Must not block.
    fn on_progress(&self, event: &ProgressEvent);
}

/// Receives status transitions.
pub trait StatusSink: Send + Sync {
    /// Called on every status change. Must not block.
    fn on_status(&self, status: &TransferStatus);
}

/// Bookkeeping shared by every clone of a [`Reporter`].
#[derive(Debug, Default)]
struct ReporterState {
    /// Bit pattern of the highest fraction forwarded in the current payload phase
    last_fraction: AtomicU64,
    /// Events forwarded since the reporter was created
    emitted: AtomicU64,
}

/// Handle the transfer loops report through.
///
/// Fractions forwarded within one payload phase never decrease: an event
/// below the last forwarded value is raised to it. A
/// [`TransferStatus::Transferring`] status starts a new phase.
#[derive(Clone, Default)]
pub struct Reporter {
    progress: Option<Arc<dyn ProgressSink>>,
    status: Option<Arc<dyn StatusSink>>,
    state: Arc<ReporterState>,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("progress", &self.progress.is_some())
            .field("status", &self.status.is_some())
            .field("emitted", &self.emitted())
            .finish()
    }
}

impl Reporter {
    /// Create a reporter from separate sinks.
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressSink>, status: Arc<dyn StatusSink>) -> Self {
        Self {
            progress: Some(progress),
            status: Some(status),
            state: Arc::default(),
        }
    }

    /// Create a reporter from one value implementing both sinks.
    #[must_use]
    pub fn from_observer<T>(observer: Arc<T>) -> Self
    where
        T: ProgressSink + StatusSink + 'static,
    {
        Self {
            progress: Some(observer.clone()),
            status: Some(observer),
            state: Arc::default(),
        }
    }

    /// A reporter that drops everything.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Number of progress and status events forwarded so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.state.emitted.load(Ordering::Relaxed)
    }

    /// Forward a progress event, clamped to `[last forwarded, 1.0]`.
    pub fn progress(&self, event: &ProgressEvent) {
        // Non-negative f64 values order the same as their bit patterns.
        let fraction = event.fraction.clamp(0.0, 1.0);
        let previous = self
            .state
            .last_fraction
            .fetch_max(fraction.to_bits(), Ordering::AcqRel);
        let previous = f64::from_bits(previous);

        self.state.emitted.fetch_add(1, Ordering::Relaxed);
        let Some(sink) = &self.progress else {
            return;
        };
        let forwarded = previous.max(fraction);
        if forwarded.to_bits() == event.fraction.to_bits() {
            sink.on_progress(event);
        } else {
            sink.on_progress(&ProgressEvent::new(forwarded));
        }
    }

    /// Forward a status transition.
    pub fn status(&self, status: &TransferStatus) {
        tracing::debug!("status: {}", status.to_string().replace('\n', " "));
        if matches!(status, TransferStatus::Transferring) {
            self.state.last_fraction.store(0, Ordering::Release);
        }

        self.state.emitted.fetch_add(1, Ordering::Relaxed);
        if let Some(sink) = &self.status {
            sink.on_status(status);
        }
    }
}

/// Receiving end of a [`ChannelObserver`].
pub type EventReceiver = mpsc::Receiver<TransferEvent>;

/// Everything a [`ChannelObserver`] forwards.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// A progress notification
    Progress(ProgressEvent),
    /// A status transition
    Status(TransferStatus),
}

/// Slots a [`ChannelObserver`] keeps free for status transitions.
pub const STATUS_RESERVE: usize = 8;

/// Default queue depth of [`ChannelObserver::new`].
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Sink that hands events to whoever owns the receiving end of a channel.
///
/// Sending never waits. The queue is bounded: once fewer than
/// [`STATUS_RESERVE`] slots are free, progress events are dropped so status
/// transitions still fit. If the receiver has been dropped, events are
/// discarded and the transfer continues.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::Sender<TransferEvent>,
}

impl ChannelObserver {
    /// Create an observer with [`DEFAULT_EVENT_CAPACITY`] queued events.
    #[must_use]
    pub fn new() -> (Self, EventReceiver) {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create an observer whose queue holds `capacity` events plus the status reserve.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1) + STATUS_RESERVE);
        (Self { tx }, rx)
    }

    /// Wrap this observer in a [`Reporter`].
    #[must_use]
    pub fn reporter(&self) -> Reporter {
        Reporter::from_observer(Arc::new(self.clone()))
    }
}

impl ProgressSink for ChannelObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        if self.tx.capacity() <= STATUS_RESERVE {
            tracing::trace!("event queue full, dropping progress event");
            return;
        }
        let _ = self.tx.try_send(TransferEvent::Progress(event.clone()));
    }
}

impl StatusSink for ChannelObserver {
    fn on_status(&self, status: &TransferStatus) {
        let _ = self.tx.try_send(TransferEvent::Status(status.clone()));
    }
}
