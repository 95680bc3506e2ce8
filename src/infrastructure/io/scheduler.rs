//! Priority-ordered disk I/O serializer.
//!
//! Every piece of work scheduled here runs on one worker at a time, highest
//! priority lane first. Concurrent random reads on one disk are slower than
//! serialized ones, so callers accept that a slow item delays the rest.
//!
//! There is no aging between lanes: a steady stream of `Asap` work can hold
//! `Background` work back indefinitely.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{trace, warn};

use crate::domain::errors::{LoadError, LoadResult, TaskError};
use crate::domain::ports::{Action, WorkSource};
use crate::domain::priority::IoPriority;
use crate::infrastructure::dispatch::{Dispatcher, Promise, promise};

/// Queued unit of I/O work.
struct WorkItem {
    enqueued_at: Instant,
    action: Action,
}

/// FIFO queue for one priority class.
#[derive(Default)]
struct Lane(Mutex<VecDeque<WorkItem>>);

impl Lane {
    fn push(&self, action: Action) {
        self.0.lock().push_back(WorkItem {
            enqueued_at: Instant::now(),
            action,
        });
    }

    fn pop(&self) -> Option<WorkItem> {
        self.0.lock().pop_front()
    }

    fn len(&self) -> usize {
        self.0.lock().len()
    }

    fn take_all(&self) -> Vec<WorkItem> {
        self.0.lock().drain(..).collect()
    }
}

/// The three priority lanes, drained by the scheduler's dispatcher.
#[derive(Default)]
pub struct IoLanes {
    asap: Lane,
    general: Lane,
    background: Lane,
}

impl IoLanes {
    const fn lane(&self, priority: IoPriority) -> &Lane {
        match priority {
            IoPriority::Asap => &self.asap,
            IoPriority::General => &self.general,
            IoPriority::Background => &self.background,
        }
    }
}

impl WorkSource for IoLanes {
    fn has_work(&self) -> bool {
        IoPriority::DESCENDING
            .iter()
            .any(|priority| self.lane(*priority).len() > 0)
    }

    fn try_take_work(&self) -> Option<Action> {
        IoPriority::DESCENDING.iter().find_map(|priority| {
            self.lane(*priority).pop().map(|item| {
                trace!(
                    priority = %priority,
                    waited = ?item.enqueued_at.elapsed(),
                    "Dequeued I/O work"
                );
                item.action
            })
        })
    }
}

/// Queue depth of each lane at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneDepths {
    /// Items waiting in the `Asap` lane.
    pub asap: usize,
    /// Items waiting in the `General` lane.
    pub general: usize,
    /// Items waiting in the `Background` lane.
    pub background: usize,
}

impl LaneDepths {
    /// Total number of queued items.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.asap + self.general + self.background
    }
}

/// Serializes disk work onto a single worker, highest priority first.
///
/// Cloning is cheap and every clone feeds the same queues.
#[derive(Clone)]
pub struct IoScheduler {
    lanes: Arc<IoLanes>,
    dispatcher: Dispatcher<IoLanes>,
}

impl IoScheduler {
    /// Creates a scheduler on the current tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    /// Creates a scheduler whose worker runs on `runtime`.
    #[must_use]
    pub fn with_handle(runtime: Handle) -> Self {
        let lanes = Arc::new(IoLanes::default());
        let dispatcher = Dispatcher::with_handle(Arc::clone(&lanes), runtime);
        Self { lanes, dispatcher }
    }

    /// Schedules `work`, which is presumed to touch `path`.
    ///
    /// The promise resolves with the work's return value. If `work` panics,
    /// the promise is rejected with `TaskError::Panicked`.
    pub fn schedule_io<T, F>(&self, path: &Path, priority: IoPriority, work: F) -> Promise<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        // TODO: route by volume once there is one worker per device; `path` is unused until then.
        let target = path.to_path_buf();
        let (resolver, result) = promise();
        self.enqueue(
            priority,
            Box::new(move || match panic::catch_unwind(AssertUnwindSafe(work)) {
                Ok(value) => resolver.resolve(value),
                Err(payload) => {
                    let error = TaskError::from_panic(payload.as_ref());
                    warn!(path = %target.display(), error = %error, "I/O work panicked");
                    resolver.reject(error);
                }
            }),
        );
        result
    }

    /// Reads a whole file.
    ///
    /// Read failures land in the inner `LoadResult`; the promise itself only
    /// fails with `Cancelled` if the queued read is discarded.
    pub fn load_file(&self, path: &Path, priority: IoPriority) -> Promise<LoadResult<Bytes>> {
        let target = path.to_path_buf();
        self.schedule_io(path, priority, move || {
            std::fs::read(&target)
                .map(Bytes::from)
                .map_err(|e| LoadError::from_io(&target, e))
        })
    }

    /// Returns how many items wait in each lane.
    #[must_use]
    pub fn pending(&self) -> LaneDepths {
        LaneDepths {
            asap: self.lanes.asap.len(),
            general: self.lanes.general.len(),
            background: self.lanes.background.len(),
        }
    }

    /// Stops the worker after its current item. See [`Dispatcher::pause`].
    pub fn pause(&self) -> Promise<()> {
        self.dispatcher.pause()
    }

    /// Restarts the worker after `pause`.
    pub fn resume(&self) {
        self.dispatcher.resume();
    }

    /// Discards every queued item. Their promises resolve `Cancelled`.
    ///
    /// Takes effect whether or not the returned promise is awaited.
    pub fn clear(&self) -> Promise<()> {
        let lanes = Arc::clone(&self.lanes);
        self.dispatcher.clear(move || {
            let dropped: usize = IoPriority::DESCENDING
                .iter()
                .map(|priority| lanes.lane(*priority).take_all().len())
                .sum();
            trace!(dropped = dropped, "Cleared I/O queues");
        })
    }

    fn enqueue(&self, priority: IoPriority, action: Action) {
        self.lanes.lane(priority).push(action);
        trace!(priority = %priority, "Queued I/O work");
        self.dispatcher.schedule();
    }
}

impl Default for IoScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IoScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoScheduler")
            .field("pending", &self.pending())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
