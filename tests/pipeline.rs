//! End-to-end tests through the public API with real image files.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use imgflight::domain::ports::Action;
use imgflight::infrastructure::image::{CacheConfig, ImageCrateDecoder};
use imgflight::{DecodeError, Dispatcher, ImageCache, IoPriority, IoScheduler, TaskError, WorkSource};
use parking_lot::Mutex;
use tempfile::TempDir;

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::new(width, height)
        .save(&path)
        .expect("write test png");
    path
}

fn small_cache(io: &IoScheduler) -> ImageCache<ImageCrateDecoder> {
    let config = CacheConfig {
        max_items: 3,
        purge_size: 1,
        ..CacheConfig::default()
    };
    ImageCache::new(io.clone(), Arc::new(ImageCrateDecoder), config).expect("valid config")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_decodes_real_files_and_caches_failures() {
    let temp = TempDir::new().unwrap();
    let wide = write_png(temp.path(), "wide.png", 8, 2);
    let tall = write_png(temp.path(), "tall.png", 2, 8);
    let missing = temp.path().join("missing.png");

    let io = IoScheduler::new();
    let cache = small_cache(&io);

    let wide_image = cache.get_image(&wide).await.unwrap().unwrap();
    let tall_image = cache.get_image(&tall).await.unwrap().unwrap();
    assert_eq!((wide_image.width(), wide_image.height()), (8, 2));
    assert_eq!((tall_image.width(), tall_image.height()), (2, 8));

    let first = cache.get_image(&missing).await.unwrap();
    assert!(matches!(first, Err(DecodeError::NotFound(_))));

    // Creating the file afterwards does not help; the failure is cached.
    write_png(temp.path(), "missing.png", 1, 1);
    let second = cache.get_image(&missing).await.unwrap();
    assert_eq!(first.unwrap_err(), second.unwrap_err());
    assert_eq!(cache.stats().decodes, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_purge_keeps_cache_bounded() {
    let temp = TempDir::new().unwrap();
    let io = IoScheduler::new();
    let cache = small_cache(&io);

    let mut sizes = Vec::new();
    for n in 0..5 {
        let path = write_png(temp.path(), &format!("{n}.png"), 1, 1);
        cache.get_image(&path).await.unwrap().unwrap();
        sizes.push(cache.len());
    }

    assert_eq!(sizes, vec![1, 2, 3, 2, 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_raw_reads_share_the_io_queue() {
    let temp = TempDir::new().unwrap();
    let path = write_png(temp.path(), "shared.png", 3, 3);

    let io = IoScheduler::new();
    let cache = small_cache(&io);

    let (image, bytes) = tokio::join!(
        cache.get_image(&path),
        io.load_file(&path, IoPriority::Background)
    );
    let bytes = bytes.unwrap().unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    assert!(image.unwrap().is_ok());

    let missing = io
        .load_file(Path::new("/no/such/file"), IoPriority::Background)
        .await
        .unwrap();
    assert!(missing.is_err_and(|e| e.is_not_found()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dispose_releases_everything() {
    let temp = TempDir::new().unwrap();
    let path = write_png(temp.path(), "only.png", 2, 2);

    let io = IoScheduler::new();
    let cache = small_cache(&io);
    cache.get_image(&path).await.unwrap().unwrap();

    cache.dispose().await.unwrap();
    assert!(cache.is_empty());
    assert_eq!(cache.get_image(&path).await.unwrap_err(), TaskError::Cancelled);

    // The I/O scheduler outlives the cache.
    assert!(io.load_file(&path, IoPriority::Asap).await.unwrap().is_ok());
}

/// A sibling consumer of the dispatcher, shaped like a metadata cache.
#[derive(Default)]
struct MetadataQueue {
    jobs: Mutex<VecDeque<Action>>,
}

impl WorkSource for MetadataQueue {
    fn has_work(&self) -> bool {
        !self.jobs.lock().is_empty()
    }

    fn try_take_work(&self) -> Option<Action> {
        self.jobs.lock().pop_front()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dispatcher_drives_external_work_sources() {
    let queue = Arc::new(MetadataQueue::default());
    let dispatcher = Dispatcher::new(Arc::clone(&queue));
    let done = Arc::new(AtomicUsize::new(0));

    for _ in 0..20 {
        let done = Arc::clone(&done);
        queue.jobs.lock().push_back(Box::new(move || {
            done.fetch_add(1, Ordering::SeqCst);
        }));
        dispatcher.schedule();
    }

    tokio::time::timeout(Duration::from_secs(5), async {
        while done.load(Ordering::SeqCst) < 20 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("metadata jobs did not finish");
    assert!(!queue.has_work());
}
