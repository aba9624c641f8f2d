//! Shared thread pool for the permutation loop.
//!
//! Every run installs its parallel map into one lazily built pool, so
//! concurrent runs from several caller threads share workers instead of each
//! spawning their own.

#[cfg(feature = "parallel")]
use rayon::ThreadPool;

#[cfg(feature = "parallel")]
use std::sync::OnceLock;

#[cfg(feature = "parallel")]
static THREAD_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

/// Get or initialize the shared thread pool.
///
/// The pool uses one worker per logical CPU and an 8 MB stack per worker.
/// Returns `None` if the pool could not be built, in which case callers fall
/// back to rayon's global pool.
#[cfg(feature = "parallel")]
pub fn get_thread_pool() -> Option<&'static ThreadPool> {
    THREAD_POOL
        .get_or_init(|| {
            rayon::ThreadPoolBuilder::new()
                .stack_size(8 * 1024 * 1024)
                .thread_name(|i| format!("popconn-{i}"))
                .build()
                .map_err(|e| tracing::warn!(error = %e, "falling back to global rayon pool"))
                .ok()
        })
        .as_ref()
}

/// Execute a parallel operation in the shared thread pool.
#[cfg(feature = "parallel")]
pub fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    match get_thread_pool() {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// Execute `op` on the calling thread.
#[cfg(not(feature = "parallel"))]
pub fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R,
{
    op()
}
