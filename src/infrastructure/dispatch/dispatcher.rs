//! Single-flight dispatcher.
//!
//! A `Dispatcher` owns no work. It drains a `WorkSource` on tokio's blocking
//! pool and guarantees that at most one thread runs that source's items at
//! any instant.
//!
//! Dispatch rights are claimed with an atomic counter instead of a lock:
//! whoever moves the counter from 0 to 1 starts the drain loop, everybody
//! else just bumps and releases it. The bump is the "more work" signal; the
//! loop owner re-checks the source when it releases its own claim, so work
//! queued between the loop's last empty check and its exit is never lost.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::runtime::Handle;

use super::promise::{Promise, Resolver, promise};
use crate::domain::errors::TaskError;
use crate::domain::ports::WorkSource;

/// Drives a `WorkSource` with at most one concurrent worker.
pub struct Dispatcher<S: WorkSource> {
    inner: Arc<Inner<S>>,
}

struct Inner<S: WorkSource> {
    source: Arc<S>,
    runtime: Handle,
    control: AtomicUsize,
    paused: AtomicBool,
    barriers: Mutex<VecDeque<Resolver<()>>>,
}

impl<S: WorkSource> Dispatcher<S> {
    /// Creates a dispatcher bound to the current tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn new(source: Arc<S>) -> Self {
        Self::with_handle(source, Handle::current())
    }

    /// Creates a dispatcher whose drain loop runs on `runtime`.
    #[must_use]
    pub fn with_handle(source: Arc<S>, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                runtime,
                control: AtomicUsize::new(0),
                paused: AtomicBool::new(false),
                barriers: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Makes sure currently visible work gets run. Never blocks.
    ///
    /// Does nothing while paused; `resume` picks the work up.
    pub fn schedule(&self) {
        if !self.inner.paused.load(Ordering::Acquire) {
            Inner::claim(&self.inner);
        }
    }

    /// Requests a pause.
    ///
    /// The returned promise resolves once the drain loop, or an idle
    /// dispatcher, has observed the request. From then on no item runs until
    /// `resume`. Concurrent pause requests are settled by one observation.
    pub fn pause(&self) -> Promise<()> {
        let (resolver, barrier) = promise();
        self.inner.barriers.lock().push_back(resolver);
        Inner::claim(&self.inner);
        barrier
    }

    /// Lifts a pause and restarts draining.
    pub fn resume(&self) {
        self.inner.settle_barriers();
        self.inner.paused.store(false, Ordering::Release);
        Inner::claim(&self.inner);
    }

    /// Pauses, runs `action` while no item is executing, then resumes.
    ///
    /// The pause is requested before this returns and the rest runs on the
    /// dispatcher's runtime whether or not the promise is awaited. The
    /// dispatcher resumes even if `action` panics; the promise then carries
    /// `TaskError::Panicked`.
    pub fn clear<F>(&self, action: F) -> Promise<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let barrier = self.pause();
        let dispatcher = self.clone();
        let (resolver, done) = promise();
        drop(self.inner.runtime.spawn(async move {
            // Barriers are always settled while the dispatcher is alive.
            let _ = barrier.await;
            let outcome = panic::catch_unwind(AssertUnwindSafe(action));
            dispatcher.resume();
            match outcome {
                Ok(()) => resolver.resolve(()),
                Err(payload) => resolver.reject(TaskError::from_panic(payload.as_ref())),
            }
        }));
        done
    }

    /// Returns true while a pause is in effect.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::Acquire)
    }
}

impl<S: WorkSource> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: WorkSource> std::fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("control", &self.inner.control.load(Ordering::Relaxed))
            .field("paused", &self.is_paused())
            .finish_non_exhaustive()
    }
}

impl<S: WorkSource> Inner<S> {
    fn claim(this: &Arc<Self>) {
        if this.control.fetch_add(1, Ordering::AcqRel) == 0 {
            let inner = Arc::clone(this);
            // Detached; the loop reports through the items it runs.
            drop(this.runtime.spawn_blocking(move || {
                let owner = ControlRelease(inner);
                owner.0.drain();
            }));
        } else {
            Self::release(this);
        }
    }

    fn release(this: &Arc<Self>) {
        if this.control.fetch_sub(1, Ordering::AcqRel) == 1 && this.needs_another_pass() {
            Self::claim(this);
        }
    }

    fn drain(&self) {
        while !self.observe_pause() {
            let Some(action) = self.source.try_take_work() else {
                break;
            };
            action();
        }
    }

    fn observe_pause(&self) -> bool {
        let mut barriers = self.barriers.lock();
        if barriers.is_empty() {
            return self.paused.load(Ordering::Acquire);
        }
        self.paused.store(true, Ordering::Release);
        for barrier in barriers.drain(..) {
            barrier.resolve(());
        }
        true
    }

    fn settle_barriers(&self) {
        let pending: Vec<_> = self.barriers.lock().drain(..).collect();
        for barrier in pending {
            barrier.resolve(());
        }
    }

    fn needs_another_pass(&self) -> bool {
        !self.barriers.lock().is_empty()
            || (!self.paused.load(Ordering::Acquire) && self.source.has_work())
    }
}

/// Gives dispatch rights back when the drain loop ends, panics included.
struct ControlRelease<S: WorkSource>(Arc<Inner<S>>);

impl<S: WorkSource> Drop for ControlRelease<S> {
    fn drop(&mut self) {
        Inner::release(&self.0);
    }
}
