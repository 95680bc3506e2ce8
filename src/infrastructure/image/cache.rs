//! Bounded asynchronous image cache.
//!
//! Lookups read an immutable snapshot of the entry list and never block.
//! Misses are queued and handed, one at a time and without waiting, by the
//! cache's own dispatcher to the shared `IoScheduler`. The decode runs as
//! I/O work at the request's priority, so an `Asap` lookup overtakes
//! preloads that are still queued.
//!
//! Snapshot writes happen under the writer lock, which `dispose` takes as
//! well. A failed decode is cached like a successful one and is not retried
//! until the entry is purged.

use std::cmp::Reverse;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::config::{CacheConfig, EvictionPolicy};
use crate::domain::entities::{CacheEntry, ImageKey, ImageResult};
use crate::domain::errors::{ConfigError, DecodeError, TaskError};
use crate::domain::ports::{Action, Decoder, WorkSource};
use crate::domain::priority::IoPriority;
use crate::infrastructure::dispatch::{Dispatcher, Promise, Resolver, promise};
use crate::infrastructure::io::IoScheduler;

type Snapshot<I> = Vec<Arc<CacheEntry<I>>>;

/// A queued cache miss. Consumed exactly once.
struct PendingRequest<I> {
    key: ImageKey,
    path: PathBuf,
    priority: IoPriority,
    resolver: Resolver<ImageResult<I>>,
}

struct Shared<D: Decoder> {
    config: CacheConfig,
    decoder: Arc<D>,
    io: IoScheduler,
    requests: Mutex<VecDeque<PendingRequest<D::Image>>>,
    entries: ArcSwap<Snapshot<D::Image>>,
    writer: Mutex<()>,
    clock: AtomicU64,
    disposed: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
    decodes: AtomicU64,
}

/// Request lane drained by the cache's dispatcher.
struct CacheWorker<D: Decoder> {
    shared: Arc<Shared<D>>,
}

/// Serves decoded images by path with a bounded number of entries.
pub struct ImageCache<D: Decoder> {
    shared: Arc<Shared<D>>,
    dispatcher: Dispatcher<CacheWorker<D>>,
}

impl<D: Decoder> ImageCache<D> {
    /// Creates a cache that decodes with `decoder` on `io`.
    ///
    /// # Errors
    /// Returns error if `config` fails validation.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn new(io: IoScheduler, decoder: Arc<D>, config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let shared = Arc::new(Shared {
            config,
            decoder,
            io,
            requests: Mutex::new(VecDeque::new()),
            entries: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
            clock: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            decodes: AtomicU64::new(0),
        });
        let worker = Arc::new(CacheWorker {
            shared: Arc::clone(&shared),
        });

        Ok(Self {
            shared,
            dispatcher: Dispatcher::new(worker),
        })
    }

    /// Returns the decode result for `path`.
    ///
    /// A cached result, success or failure, comes back as an already settled
    /// promise. Otherwise the load is queued at `Asap` priority. After
    /// `dispose` the promise is rejected with `TaskError::Cancelled`.
    pub fn get_image(&self, path: impl AsRef<Path>) -> Promise<ImageResult<D::Image>> {
        if self.is_disposed() {
            return Promise::rejected(TaskError::Cancelled);
        }

        let path = path.as_ref();
        let key = self.shared.key_for(path);
        if let Some(hit) = self.shared.find(&key) {
            self.shared.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Image cache hit");
            return Promise::ready(hit);
        }

        self.shared.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "Image cache miss, queueing load");
        let result = self
            .shared
            .enqueue(key, path.to_path_buf(), IoPriority::Asap);
        self.dispatcher.schedule();
        result
    }

    /// Queues background loads for every path not already cached.
    ///
    /// Fire and forget. Paths that are queued but not yet loaded are queued
    /// again; the duplicate is answered from the cache when it is reached.
    pub fn preload<I, P>(&self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        if self.is_disposed() {
            return;
        }

        let snapshot = self.shared.entries.load_full();
        let mut queued = 0usize;
        for path in paths {
            let path = path.as_ref();
            let key = self.shared.key_for(path);
            if snapshot.iter().any(|entry| entry.key() == &key) {
                continue;
            }
            drop(
                self.shared
                    .enqueue(key, path.to_path_buf(), IoPriority::General),
            );
            queued += 1;
        }

        if queued > 0 {
            debug!(queued = queued, "Queued image preloads");
            self.dispatcher.schedule();
        }
    }

    /// Returns true if `path` has a cached result.
    #[must_use]
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        let key = self.shared.key_for(path.as_ref());
        self.shared
            .entries
            .load()
            .iter()
            .any(|entry| entry.key() == &key)
    }

    /// Returns the number of cached results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.entries.load().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.shared.hits.load(Ordering::Relaxed);
        let misses = self.shared.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            decodes: self.shared.decodes.load(Ordering::Relaxed),
            hit_rate,
            size: self.len(),
        }
    }

    /// Returns true once `dispose` has taken effect.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    /// Shuts the cache down.
    ///
    /// Runs even if the returned promise is dropped. Every request that has
    /// not started decoding is rejected with `TaskError::Cancelled` and all
    /// cached images are dropped. A decode already running still answers its
    /// caller but is not cached. Later calls to `get_image` are rejected and
    /// `preload` becomes a no-op.
    pub fn dispose(&self) -> Promise<()> {
        let shared = Arc::clone(&self.shared);
        self.dispatcher.clear(move || shared.shut_down())
    }
}

impl<D: Decoder> std::fmt::Debug for ImageCache<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("config", &self.shared.config)
            .field("size", &self.len())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl<D: Decoder> Shared<D> {
    fn key_for(&self, path: &Path) -> ImageKey {
        ImageKey::normalize(path, self.config.case_sensitivity)
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn find(&self, key: &ImageKey) -> Option<ImageResult<D::Image>> {
        let snapshot = self.entries.load();
        let entry = snapshot.iter().find(|entry| entry.key() == key)?;
        if self.config.eviction == EvictionPolicy::Recency {
            entry.touch(self.tick());
        }
        Some(entry.result().clone())
    }

    fn enqueue(
        &self,
        key: ImageKey,
        path: PathBuf,
        priority: IoPriority,
    ) -> Promise<ImageResult<D::Image>> {
        let (resolver, result) = promise();
        self.requests.lock().push_back(PendingRequest {
            key,
            path,
            priority,
            resolver,
        });
        result
    }

    /// Hands one request to the I/O scheduler. Runs on the cache's
    /// dispatcher and never waits for the decode.
    fn fulfil(self: &Arc<Self>, request: PendingRequest<D::Image>) {
        if self.disposed.load(Ordering::Acquire) {
            request.resolver.reject(TaskError::Cancelled);
            return;
        }
        if let Some(hit) = self.find(&request.key) {
            trace!(key = %request.key, "Queued request served from cache");
            request.resolver.resolve(hit);
            return;
        }

        let shared = Arc::clone(self);
        let path = request.path.clone();
        // The request's own resolver carries the outcome. If the I/O queue is
        // cleared the work is dropped and the caller sees `Cancelled`.
        drop(
            self.io
                .schedule_io(&path, request.priority, move || shared.decode(request)),
        );
    }

    /// Decodes one request and publishes the result. Runs as I/O work.
    fn decode(&self, request: PendingRequest<D::Image>) {
        let PendingRequest {
            key,
            path,
            priority,
            resolver,
        } = request;

        if self.disposed.load(Ordering::Acquire) {
            resolver.reject(TaskError::Cancelled);
            return;
        }
        // An earlier request for the same key may have been decoded while
        // this one waited in the I/O queue.
        if let Some(hit) = self.find(&key) {
            trace!(key = %key, "Queued request served from cache");
            resolver.resolve(hit);
            return;
        }

        let result = match panic::catch_unwind(AssertUnwindSafe(|| self.decoder.load(&path))) {
            Ok(Ok(image)) => Ok(Arc::new(image)),
            Ok(Err(error)) => Err(error),
            Err(payload) => Err(DecodeError::from_panic(payload.as_ref())),
        };
        self.decodes.fetch_add(1, Ordering::Relaxed);

        if self.publish(key, result.clone()) {
            match &result {
                Ok(_) => debug!(path = %path.display(), priority = %priority, "Cached decoded image"),
                Err(error) => warn!(path = %path.display(), error = %error, "Caching failed decode"),
            }
        } else {
            debug!(path = %path.display(), "Cache disposed during decode, result not cached");
        }
        resolver.resolve(result);
    }

    /// Stores `result` unless the cache has been disposed.
    fn publish(&self, key: ImageKey, result: ImageResult<D::Image>) -> bool {
        let _writer = self.writer.lock();
        if self.disposed.load(Ordering::Acquire) {
            return false;
        }

        let current = self.entries.load_full();
        let mut next = self.purge(&current);
        next.push(Arc::new(CacheEntry::new(key, self.tick(), result)));
        self.entries.store(Arc::new(next));
        true
    }

    fn purge(&self, current: &[Arc<CacheEntry<D::Image>>]) -> Snapshot<D::Image> {
        if current.len() < self.config.max_items {
            return current.to_vec();
        }

        let mut kept = current.to_vec();
        // Readers may touch stamps mid-sort, so each one is read once.
        kept.sort_by_cached_key(|entry| Reverse(entry.last_access()));
        kept.truncate(self.config.purge_size);
        debug!(
            before = current.len(),
            after = kept.len(),
            "Purged image cache"
        );
        kept
    }

    fn shut_down(&self) {
        let _writer = self.writer.lock();
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let abandoned: Vec<_> = self.requests.lock().drain(..).collect();
        let cancelled = abandoned.len();
        for request in abandoned {
            request.resolver.reject(TaskError::Cancelled);
        }

        let released = self.entries.swap(Arc::new(Vec::new()));
        debug!(
            cancelled = cancelled,
            released = released.len(),
            "Disposed image cache"
        );
    }
}

impl<D: Decoder> WorkSource for CacheWorker<D> {
    fn has_work(&self) -> bool {
        !self.shared.requests.lock().is_empty()
    }

    fn try_take_work(&self) -> Option<Action> {
        let request = self.shared.requests.lock().pop_front()?;
        let shared = Arc::clone(&self.shared);
        Some(Box::new(move || shared.fulfil(request)))
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to be queued.
    pub misses: u64,
    /// Decoder runs, failed ones included.
    pub decodes: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached results.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {:.1}% hit rate ({} hits, {} misses, {} decodes)",
            self.size, self.hit_rate, self.hits, self.misses, self.decodes
        )
    }
}
