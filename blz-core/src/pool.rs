//! Process-wide rayon thread pool used by chunk-parallel operations
//! (`BArray::sum`, multi-column table scans). Reconfigurable at runtime via
//! `set_nthreads`, mirroring the reference library's module-level
//! `blosc_set_nthreads`.

use std::sync::{OnceLock, RwLock};

static POOL: OnceLock<RwLock<rayon::ThreadPool>> = OnceLock::new();

fn build_pool(nthreads: usize) -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(nthreads)
        .thread_name(|i| format!("blz-worker-{i}"))
        .build()
        .expect("failed to build worker thread pool")
}

fn detect_default_nthreads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn pool_lock() -> &'static RwLock<rayon::ThreadPool> {
    POOL.get_or_init(|| RwLock::new(build_pool(detect_default_nthreads())))
}

/// Sets the number of worker threads used by parallel array operations,
/// returning the previous count. Takes effect for subsequently spawned
/// parallel work.
pub fn set_nthreads(nthreads: usize) -> usize {
    let nthreads = nthreads.max(1);
    let lock = pool_lock();
    let previous = lock.read().unwrap().current_num_threads();
    let mut guard = lock.write().unwrap();
    *guard = build_pool(nthreads);
    tracing::debug!(nthreads, previous, "reconfigured worker thread pool");
    previous
}

pub fn nthreads() -> usize {
    pool_lock().read().unwrap().current_num_threads()
}

/// Runs `f` on the shared worker pool.
pub fn install<R: Send>(f: impl FnOnce() -> R + Send) -> R {
    pool_lock().read().unwrap().install(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_nthreads_takes_effect() {
        let prev = set_nthreads(2);
        assert_eq!(nthreads(), 2);
        set_nthreads(prev.max(1));
    }
}
