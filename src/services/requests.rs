//! Background execution of gateway calls.
//!
//! The UI loop must never block on the network, so each call runs on its own
//! thread and reports back over a channel that the loop polls every tick.

use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::debug;

use crate::services::TrelloError;

/// Abandonment flag shared by a [`PendingRequest`] and its worker.
///
/// Work run through [`Cancellation::unless_cancelled`] either completes
/// before the handle is dropped or does not run at all.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<Mutex<bool>>);

impl Cancellation {
    /// A flag that has not fired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the request as abandoned.
    pub fn cancel(&self) {
        *self.lock() = true;
    }

    /// Whether the request was abandoned.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Runs `effect` unless the request was abandoned. Returns whether it ran.
    pub fn unless_cancelled(&self, effect: impl FnOnce()) -> bool {
        let cancelled = self.lock();
        if *cancelled {
            return false;
        }
        effect();
        true
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one in-flight request.
///
/// Dropping the handle abandons the request: the worker finishes, its result
/// is discarded, and its [`Cancellation`] fires.
#[derive(Debug)]
pub struct PendingRequest<T> {
    receiver: Receiver<Result<T, TrelloError>>,
    cancellation: Cancellation,
}

impl<T: Send + 'static> PendingRequest<T> {
    /// Runs `job` on a worker thread.
    pub fn spawn<F>(job: F) -> Self
    where
        F: FnOnce() -> Result<T, TrelloError> + Send + 'static,
    {
        Self::spawn_cancellable(move |_| job())
    }

    /// Runs `job` on a worker thread, handing it the request's cancellation
    /// flag so it can skip side effects once the request is abandoned.
    pub fn spawn_cancellable<F>(job: F) -> Self
    where
        F: FnOnce(&Cancellation) -> Result<T, TrelloError> + Send + 'static,
    {
        let (sender, receiver) = channel();
        let cancellation = Cancellation::new();

        let flag = cancellation.clone();
        thread::spawn(move || {
            let result = job(&flag);
            if sender.send(result).is_err() {
                debug!("Discarding result of an abandoned request");
            }
        });

        Self {
            receiver,
            cancellation,
        }
    }

    /// Checks for a result without blocking.
    ///
    /// Returns `None` while the worker is still running. A worker that exits
    /// without reporting (e.g. it panicked) yields `TrelloError::Interrupted`.
    pub fn poll(&self) -> Option<Result<T, TrelloError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(TrelloError::Interrupted)),
        }
    }
}

impl<T> Drop for PendingRequest<T> {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
