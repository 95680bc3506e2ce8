//! Single-resolution futures.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::domain::errors::TaskError;

type Settled<T> = Result<T, TaskError>;

/// Creates a connected resolver/promise pair.
#[must_use]
pub fn promise<T>() -> (Resolver<T>, Promise<T>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx }, Promise::pending(rx))
}

/// Write side of a promise. Consumed by the first resolution.
///
/// Dropping a resolver without settling it cancels the promise.
#[derive(Debug)]
pub struct Resolver<T> {
    tx: oneshot::Sender<Settled<T>>,
}

impl<T> Resolver<T> {
    /// Fulfils the promise with `value`.
    pub fn resolve(self, value: T) {
        // Nobody listening is fine, e.g. fire-and-forget preloads.
        let _ = self.tx.send(Ok(value));
    }

    /// Settles the promise with `error`.
    pub fn reject(self, error: TaskError) {
        let _ = self.tx.send(Err(error));
    }
}

/// Read side of a single-resolution handle.
///
/// Resolves to the value, or to a `TaskError` when the work panicked or was
/// cancelled.
#[derive(Debug)]
#[must_use = "promises do nothing unless awaited"]
pub struct Promise<T> {
    state: State<T>,
}

#[derive(Debug)]
enum State<T> {
    Settled(Option<Settled<T>>),
    Pending(oneshot::Receiver<Settled<T>>),
}

// No field is ever pinned structurally.
impl<T> Unpin for Promise<T> {}

impl<T> Promise<T> {
    fn pending(rx: oneshot::Receiver<Settled<T>>) -> Self {
        Self {
            state: State::Pending(rx),
        }
    }

    /// Returns an already fulfilled promise.
    pub fn ready(value: T) -> Self {
        Self {
            state: State::Settled(Some(Ok(value))),
        }
    }

    /// Returns an already rejected promise.
    pub fn rejected(error: TaskError) -> Self {
        Self {
            state: State::Settled(Some(Err(error))),
        }
    }

    /// Returns the outcome if the promise has already settled.
    ///
    /// Once this returns `Some`, the promise is spent and resolves to
    /// `Cancelled` if awaited afterwards.
    pub fn try_take(&mut self) -> Option<Settled<T>> {
        let settled = match &mut self.state {
            State::Settled(settled) => return settled.take(),
            State::Pending(rx) => match rx.try_recv() {
                Ok(settled) => settled,
                Err(oneshot::error::TryRecvError::Empty) => return None,
                Err(oneshot::error::TryRecvError::Closed) => Err(TaskError::Cancelled),
            },
        };
        self.state = State::Settled(None);
        Some(settled)
    }
}

impl<T> Future for Promise<T> {
    type Output = Settled<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let settled = match &mut this.state {
            State::Settled(settled) => settled.take().unwrap_or(Err(TaskError::Cancelled)),
            State::Pending(rx) => match Pin::new(rx).poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(received) => received.unwrap_or(Err(TaskError::Cancelled)),
            },
        };
        this.state = State::Settled(None);
        Poll::Ready(settled)
    }
}
