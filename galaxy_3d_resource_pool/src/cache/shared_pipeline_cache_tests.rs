/// Tests for SharedPipelineCache
///
/// The race tests park every worker on a Barrier so they all reach
/// get_or_create together; the factory counter must still end at one.

use super::*;
use crate::mock_backend::{destroy_with, MockDevice, MockPipeline};
use crate::pool::PoolConfig;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

// ============================================================================
// Helper Functions
// ============================================================================

fn key(value: u32) -> CacheKey {
    CacheKey::builder().write_u32(value).build()
}

fn shared_cache(device: &Arc<MockDevice>) -> SharedPipelineCache<MockPipeline> {
    SharedPipelineCache::new().with_teardown(destroy_with::<Arc<MockPipeline>>(device))
}

// ============================================================================
// Tests: Single thread
// ============================================================================

#[test]
fn test_second_call_is_a_hit() {
    let cache: SharedPipelineCache<u32> = SharedPipelineCache::new();
    let first = cache.get_or_create(key(1), || Ok::<_, String>(5)).unwrap();
    let second = cache
        .get_or_create(key(1), || Err::<u32, _>("must not run"))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.lookup(&key(1)), Some(first));
    assert_eq!(*cache.try_get(first).unwrap(), 5);

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.failures), (1, 1, 0));
}

#[test]
fn test_artifact_outlives_invalidate_through_arc() {
    let cache: SharedPipelineCache<String> = SharedPipelineCache::new();
    let handle = cache
        .get_or_create(key(1), || Ok::<_, String>("opaque".to_string()))
        .unwrap();
    let held = cache.try_get(handle).unwrap();

    assert!(cache.invalidate(&key(1)));
    assert!(cache.try_get(handle).is_none());
    assert_eq!(held.as_str(), "opaque");
}

#[test]
fn test_factory_failure_removes_claim() {
    let cache: SharedPipelineCache<u32> = SharedPipelineCache::new();
    let err = cache
        .get_or_create(key(1), || Err::<u32, _>("compile error"))
        .unwrap_err();

    assert_eq!(err, Error::ConstructionFailed("compile error".to_string()));
    assert_eq!(cache.in_flight(), 0);
    assert!(cache.lookup(&key(1)).is_none());
    assert_eq!(cache.stats().failures, 1);

    let handle = cache.get_or_create(key(1), || Ok::<_, String>(3)).unwrap();
    assert_eq!(*cache.try_get(handle).unwrap(), 3);
}

#[test]
fn test_panicking_factory_releases_claim() {
    let cache: SharedPipelineCache<u32> = SharedPipelineCache::new();

    let result = catch_unwind(AssertUnwindSafe(|| {
        let _ = cache.get_or_create(key(1), || -> std::result::Result<u32, String> {
            panic!("driver crashed")
        });
    }));
    assert!(result.is_err());

    assert_eq!(cache.in_flight(), 0);
    assert_eq!(cache.stats().failures, 1);

    let handle = cache.get_or_create(key(1), || Ok::<_, String>(8)).unwrap();
    assert_eq!(*cache.try_get(handle).unwrap(), 8);
}

#[test]
fn test_factory_requesting_its_own_key_gets_error() {
    let cache: SharedPipelineCache<u32> = SharedPipelineCache::new();
    let mut inner = None;

    let handle = cache
        .get_or_create(key(1), || {
            inner = Some(cache.get_or_create(key(1), || Ok::<_, String>(2)));
            Ok::<_, String>(1)
        })
        .unwrap();

    assert!(matches!(inner, Some(Err(Error::BackendError(_)))));
    assert_eq!(*cache.try_get(handle).unwrap(), 1);
    assert_eq!(cache.in_flight(), 0);
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn test_factory_may_build_other_keys() {
    let cache: SharedPipelineCache<u32> = SharedPipelineCache::new();
    let outer = cache
        .get_or_create(key(1), || {
            let dependency = cache.get_or_create(key(2), || Ok::<_, String>(20)).unwrap();
            Ok::<_, String>(*cache.try_get(dependency).unwrap() + 1)
        })
        .unwrap();

    assert_eq!(*cache.try_get(outer).unwrap(), 21);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_capped_pool_rejects_and_tears_down() {
    let device = MockDevice::new();
    let cache = SharedPipelineCache::with_config(PipelineCacheConfig {
        pool: PoolConfig {
            name: "tiny_shared".to_string(),
            initial_capacity: 1,
            max_capacity: Some(1),
        },
    })
    .with_teardown(destroy_with::<Arc<MockPipeline>>(&device));

    cache.get_or_create(key(1), || Ok::<_, String>(device.create_pipeline("a"))).unwrap();
    let err = cache
        .get_or_create(key(2), || Ok::<_, String>(device.create_pipeline("b")))
        .unwrap_err();

    assert!(matches!(err, Error::CapacityExhausted { .. }));
    assert_eq!(cache.in_flight(), 0);
    assert_eq!(device.alive(), 1);
}

#[test]
fn test_clear_tears_down_built_artifacts() {
    let device = MockDevice::new();
    let cache = shared_cache(&device);
    for i in 0..4 {
        cache
            .get_or_create(key(i), || Ok::<_, String>(device.create_pipeline("p")))
            .unwrap();
    }

    assert_eq!(cache.clear(), 4);
    assert!(cache.is_empty());
    assert!(cache.lookup(&key(0)).is_none());
    assert_eq!(device.alive(), 0);
}

#[test]
fn test_invalidate_tears_down_once() {
    let device = MockDevice::new();
    let cache = shared_cache(&device);
    cache
        .get_or_create(key(1), || Ok::<_, String>(device.create_pipeline("p")))
        .unwrap();

    assert!(cache.invalidate(&key(1)));
    assert!(!cache.invalidate(&key(1)));
    assert_eq!(device.destroyed(), 1);
}

#[test]
fn test_reset_stats() {
    let cache: SharedPipelineCache<u32> = SharedPipelineCache::new();
    cache.get_or_create(key(1), || Ok::<_, String>(1)).unwrap();
    cache.reset_stats();
    assert_eq!(cache.stats(), CacheStats::default());
}

// ============================================================================
// Tests: Concurrency
// ============================================================================

#[test]
fn test_racing_threads_build_once() {
    const THREADS: usize = 8;
    let cache: Arc<SharedPipelineCache<u32>> = Arc::new(SharedPipelineCache::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = cache.clone();
            let calls = calls.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                cache
                    .get_or_create(key(42), || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Ok::<_, String>(42)
                    })
                    .unwrap()
            })
        })
        .collect();

    let handles: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(handles.iter().all(|h| *h == handles[0]));
    assert_eq!(cache.len(), 1);

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, (THREADS - 1) as u64);
}

#[test]
fn test_distinct_keys_build_in_parallel() {
    const THREADS: u32 = 4;
    let cache: Arc<SharedPipelineCache<u32>> = Arc::new(SharedPipelineCache::new());
    let barrier = Arc::new(Barrier::new(THREADS as usize));

    let workers: Vec<_> = (0..THREADS)
        .map(|i| {
            let cache = cache.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                cache
                    .get_or_create(key(i), || {
                        // Every factory must be running at once to get past this
                        barrier.wait();
                        Ok::<_, String>(i)
                    })
                    .unwrap()
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(cache.len(), THREADS as usize);
    assert_eq!(cache.stats().misses, THREADS as u64);
}

#[test]
fn test_waiter_claims_key_after_failed_build() {
    let cache: Arc<SharedPipelineCache<u32>> = Arc::new(SharedPipelineCache::new());
    let started = Arc::new(Barrier::new(2));

    let failing = {
        let cache = cache.clone();
        let started = started.clone();
        thread::spawn(move || {
            cache.get_or_create(key(1), || {
                started.wait();
                thread::sleep(Duration::from_millis(50));
                Err::<u32, _>("first attempt failed")
            })
        })
    };

    started.wait();
    // The first factory is running, so this call waits on its marker
    let handle = cache.get_or_create(key(1), || Ok::<_, String>(11)).unwrap();

    assert!(failing.join().unwrap().is_err());
    assert_eq!(*cache.try_get(handle).unwrap(), 11);
    assert_eq!(cache.stats().failures, 1);
    assert_eq!(cache.stats().misses, 2);
}
