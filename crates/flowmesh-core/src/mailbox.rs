//! Mailbox-backed agent wrapper
//!
//! [`ParallelAgent`] decorates any agent so that `receive` only enqueues into a
//! bounded FIFO mailbox, while a dedicated worker task drains the mailbox and
//! runs the wrapped agent. Publishers are decoupled from computation, and the
//! wrapped agent sees messages one at a time in enqueue order.
//!
//! A full mailbox makes `receive` wait for space (backpressure); messages are
//! never dropped. After `close`, or after the worker stopped because the
//! wrapped agent failed, `receive` fails with `MeshError::MailboxClosed`.
//!
//! `close` lets the worker drain for at most the drain deadline. Past it the
//! worker is cancelled, even while blocked publishing into a full downstream
//! mailbox, which is how saturated feedback loops are torn down. Dropping the
//! wrapper without closing it cancels the worker as well.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::{
    agent::{Agent, SharedAgent},
    error::{MeshError, MeshResult},
    message::Message,
};

/// Mailbox capacity used when none is configured
pub const DEFAULT_MAILBOX_CAPACITY: usize = 10;

/// Drain deadline used when none is configured
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// A queued delivery
#[derive(Debug)]
struct Envelope {
    topic: String,
    message: Message,
}

/// Counters shared between the wrapper and its worker
#[derive(Debug, Default)]
struct WorkerState {
    processed: AtomicU64,
    stopped: AtomicBool,
}

/// Point-in-time mailbox statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxStats {
    /// Mailbox capacity
    pub capacity: usize,
    /// Messages enqueued but not yet taken by the worker
    pub pending: usize,
    /// Messages the wrapped agent has finished processing
    pub processed: u64,
    /// Whether the worker has exited
    pub stopped: bool,
}

/// Agent wrapper with a bounded mailbox and one dedicated worker
pub struct ParallelAgent {
    inner: SharedAgent,
    capacity: usize,
    drain_timeout: Duration,
    sender: RwLock<Option<mpsc::Sender<Envelope>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    cancel: watch::Sender<bool>,
    state: Arc<WorkerState>,
}

impl ParallelAgent {
    /// Wrap `inner` with a mailbox of `capacity` slots (at least one) and
    /// start its worker on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `MeshError::Runtime` when called outside a Tokio runtime.
    pub fn new(inner: SharedAgent, capacity: usize) -> MeshResult<Self> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| MeshError::Runtime(format!("cannot start agent worker: {e}")))?;

        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let state = Arc::new(WorkerState::default());
        let (cancel, cancelled) = watch::channel(false);
        let worker = handle.spawn(run_worker(
            Arc::clone(&inner),
            rx,
            Arc::clone(&state),
            cancelled,
        ));

        debug!(agent = %inner.name(), capacity, "Started agent worker");

        Ok(Self {
            inner,
            capacity,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            sender: RwLock::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            cancel,
            state,
        })
    }

    /// Set how long `close` waits for the mailbox to drain
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Stop the worker at its next suspension point, discarding queued
    /// messages and any computation in flight
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// The wrapped agent
    pub fn inner(&self) -> &SharedAgent {
        &self.inner
    }

    /// Whether the worker has exited (closed or failed)
    pub fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::Acquire)
    }

    /// Current mailbox statistics
    pub async fn stats(&self) -> MailboxStats {
        let pending = match self.sender.read().await.as_ref() {
            Some(tx) => tx.max_capacity() - tx.capacity(),
            None => 0,
        };
        MailboxStats {
            capacity: self.capacity,
            pending,
            processed: self.state.processed.load(Ordering::Acquire),
            stopped: self.is_stopped(),
        }
    }

    fn closed_error(&self) -> MeshError {
        MeshError::MailboxClosed {
            agent: self.inner.name().to_string(),
        }
    }
}

/// Resolves once cancellation is requested or the wrapper is gone
async fn cancelled(signal: &mut watch::Receiver<bool>) {
    let _ = signal.wait_for(|cancelled| *cancelled).await;
}

async fn run_worker(
    agent: SharedAgent,
    mut rx: mpsc::Receiver<Envelope>,
    state: Arc<WorkerState>,
    mut signal: watch::Receiver<bool>,
) {
    loop {
        let envelope = tokio::select! {
            biased;
            _ = cancelled(&mut signal) => break,
            next = rx.recv() => match next {
                Some(envelope) => envelope,
                None => break,
            },
        };

        let result = tokio::select! {
            biased;
            _ = cancelled(&mut signal) => {
                warn!(agent = %agent.name(), topic = %envelope.topic, "Worker cancelled mid-delivery");
                break;
            }
            result = agent.receive(&envelope.topic, &envelope.message) => result,
        };

        if let Err(e) = result {
            // Retrying the same input would fail the same way
            error!(
                agent = %agent.name(),
                topic = %envelope.topic,
                error = %e,
                "Agent failed, stopping worker"
            );
            break;
        }
        state.processed.fetch_add(1, Ordering::AcqRel);
    }

    // Dropping the receiver makes further sends fail
    rx.close();
    state.stopped.store(true, Ordering::Release);
    debug!(agent = %agent.name(), "Agent worker stopped");
}

#[async_trait]
impl Agent for ParallelAgent {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn subscriptions(&self) -> &[String] {
        self.inner.subscriptions()
    }

    fn publications(&self) -> &[String] {
        self.inner.publications()
    }

    /// Enqueue the delivery, waiting while the mailbox is full
    async fn receive(&self, topic: &str, message: &Message) -> MeshResult<()> {
        let sender = self
            .sender
            .read()
            .await
            .clone()
            .ok_or_else(|| self.closed_error())?;

        sender
            .send(Envelope {
                topic: topic.to_string(),
                message: message.clone(),
            })
            .await
            .map_err(|_| self.closed_error())
    }

    async fn reset(&self) {
        self.inner.reset().await;
    }

    /// Stop accepting messages and let the worker drain what is already
    /// queued. A worker still busy after the drain deadline is cancelled.
    async fn close(&self) -> MeshResult<()> {
        self.sender.write().await.take();

        let worker = self.worker.lock().await.take();
        if let Some(mut worker) = worker {
            let joined = match tokio::time::timeout(self.drain_timeout, &mut worker).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        agent = %self.inner.name(),
                        timeout_ms = self.drain_timeout.as_millis() as u64,
                        "Mailbox did not drain in time, cancelling worker"
                    );
                    self.cancel();
                    worker.await
                }
            };
            joined.map_err(|e| MeshError::Runtime(format!("agent worker panicked: {e}")))?;
            debug!(agent = %self.inner.name(), "Closed agent mailbox");
        }

        self.inner.close().await
    }
}
