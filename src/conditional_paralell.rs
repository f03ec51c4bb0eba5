#[cfg(feature = "parallel")]
pub use rayon::prelude;

/// A fixed set of workers that can be reused across contrast passes.
///
/// Without the `parallel` feature this is a single worker running on the
/// calling thread.
#[derive(Debug)]
pub struct WorkerPool {
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

#[cfg(feature = "parallel")]
impl WorkerPool {
    /// Builds `threads` workers, 0 picks the platform default. Falls back to
    /// the global rayon pool if the workers cannot be spawned.
    pub fn new(threads: usize) -> WorkerPool {
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => WorkerPool { pool: Some(pool) },
            Err(err) => {
                tracing::warn!(threads, %err, "cannot build thread pool, using the global one");
                WorkerPool { pool: None }
            }
        }
    }

    pub fn workers(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Runs `op` on these workers and passes it their count.
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce(usize) -> R + Send,
    {
        let workers = self.workers();
        match &self.pool {
            Some(pool) => pool.install(move || op(workers)),
            None => op(workers),
        }
    }
}

#[cfg(not(feature = "parallel"))]
impl WorkerPool {
    pub fn new(_threads: usize) -> WorkerPool {
        WorkerPool {}
    }

    pub fn workers(&self) -> usize {
        1
    }

    pub fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce(usize) -> R + Send,
    {
        op(1)
    }
}

/// One-shot form of [`WorkerPool::install`]: the pool lives for this call only.
pub fn with_thread_budget<R, OP>(threads: usize, op: OP) -> R
where
    R: Send,
    OP: FnOnce(usize) -> R + Send,
{
    WorkerPool::new(threads).install(op)
}

#[cfg(not(feature = "parallel"))]
pub mod prelude {
    pub use std::iter::Iterator as ParallelIterator;

    pub trait ParallelSliceMut<T> {
        fn par_chunks_mut(&mut self, chunk_size: usize) -> std::slice::ChunksMut<'_, T>;
    }

    impl<T> ParallelSliceMut<T> for [T] {
        fn par_chunks_mut(&mut self, chunk_size: usize) -> std::slice::ChunksMut<'_, T> {
            self.chunks_mut(chunk_size)
        }
    }
}
