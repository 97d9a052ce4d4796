//! EmitDispatcher - Background delivery of emit effects.
//!
//! The write path returns an [`EmitEffect`]; this service performs it:
//! 1. `dispatch` enqueues the effect's events and returns immediately
//! 2. **A single worker drains the queue in FIFO order into the broadcaster**
//!
//! One queue and one worker means events leave in the order they were
//! dispatched, so a room sees one writer's events in commit order.
//!
//! ## Availability
//!
//! A dispatcher that was never started, or has been shut down, is
//! unavailable: dispatching to it is a silent no-op. Writes never fail
//! because the gateway is missing.
//!
//! ## Graceful Shutdown
//!
//! `shutdown` closes the queue and waits for the worker to deliver
//! everything already queued.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::realtime::{EmitEffect, RealtimeEvent};
use crate::ports::Broadcaster;

#[derive(Default)]
struct DispatcherState {
    queue: Option<mpsc::UnboundedSender<RealtimeEvent>>,
    worker: Option<JoinHandle<()>>,
}

/// Hands emit effects to the broadcaster off the write path.
pub struct EmitDispatcher {
    state: Mutex<DispatcherState>,
}

impl EmitDispatcher {
    /// Start a dispatcher whose worker delivers to `broadcaster`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(broadcaster: Arc<dyn Broadcaster>) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(broadcaster, rx));

        tracing::debug!("Emit dispatcher started");
        Self {
            state: Mutex::new(DispatcherState {
                queue: Some(queue),
                worker: Some(worker),
            }),
        }
    }

    /// A dispatcher with no gateway behind it. Every dispatch is a no-op.
    pub fn unavailable() -> Self {
        Self {
            state: Mutex::new(DispatcherState::default()),
        }
    }

    /// True while a worker is running and accepting events.
    pub fn is_available(&self) -> bool {
        self.lock()
            .queue
            .as_ref()
            .map(|q| !q.is_closed())
            .unwrap_or(false)
    }

    /// Enqueue every event of `effect`. Never blocks and never fails.
    ///
    /// Returns the number of events queued (0 when unavailable).
    pub fn dispatch(&self, effect: EmitEffect) -> usize {
        if effect.is_empty() {
            return 0;
        }

        let state = self.lock();
        let Some(queue) = state.queue.as_ref() else {
            tracing::debug!(events = effect.len(), "Gateway unavailable, skipping emit");
            return 0;
        };

        let mut queued = 0;
        for event in effect.into_events() {
            if queue.send(event).is_err() {
                tracing::debug!("Emit dispatcher worker stopped, skipping emit");
                break;
            }
            queued += 1;
        }
        queued
    }

    /// Close the queue and wait until every queued event was delivered.
    ///
    /// Idempotent. After shutdown the dispatcher is unavailable.
    pub async fn shutdown(&self) {
        let worker = {
            let mut state = self.lock();
            state.queue = None;
            state.worker.take()
        };

        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Emit dispatcher worker failed");
            }
            tracing::info!("Emit dispatcher drained");
        }
    }

    fn lock(&self) -> MutexGuard<'_, DispatcherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_worker(
    broadcaster: Arc<dyn Broadcaster>,
    mut queue: mpsc::UnboundedReceiver<RealtimeEvent>,
) {
    while let Some(event) = queue.recv().await {
        let delivered = broadcaster.broadcast(&event).await;
        tracing::trace!(
            event = %event.name,
            room = %event.room,
            delivered,
            "Event dispatched"
        );
    }
}
