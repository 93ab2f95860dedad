//! Work-stealing fork/join scheduler (C5), gated behind the
//! `multi-threading` feature. Built directly on `crossbeam-deque`'s
//! Chase-Lev deques rather than pulled in whole from a ready-made
//! scheduler crate, since the spec calls out the scheduler itself as
//! core engine surface, not ambient plumbing.
//!
//! Without the feature, `join` just runs both closures sequentially on
//! the calling thread (`apply_rec_st` in `addd-rules-evbdd` is written
//! against the same `join` signature either way).

#[cfg(feature = "multi-threading")]
mod mt {
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, OnceLock};
    use std::thread::JoinHandle;

    use crossbeam_deque::{Injector, Stealer, Worker};
    use parking_lot::{Condvar, Mutex};

    type Job = Box<dyn FnOnce() + Send>;

    struct Pool {
        injector: Injector<Job>,
        stealers: Vec<Stealer<Job>>,
        shutdown: AtomicBool,
        idle_signal: Condvar,
        idle_lock: Mutex<()>,
        _threads: Vec<JoinHandle<()>>,
        worker_count: AtomicUsize,
    }

    fn pool() -> &'static Pool {
        static POOL: OnceLock<Pool> = OnceLock::new();
        POOL.get_or_init(build_pool)
    }

    fn build_pool() -> Pool {
        let n = crate::config_worker_count();
        let workers: Vec<Worker<Job>> = (0..n).map(|_| Worker::new_lifo()).collect();
        let stealers: Vec<Stealer<Job>> = workers.iter().map(Worker::stealer).collect();
        let injector = Injector::new();

        let shutdown = Arc::new(AtomicBool::new(false));
        let mut threads = Vec::with_capacity(n);

        for (i, local) in workers.into_iter().enumerate() {
            let stealers_for_thread: Vec<Stealer<Job>> = stealers.clone();
            let shutdown = Arc::clone(&shutdown);
            threads.push(
                std::thread::Builder::new()
                    .name(format!("addd-worker-{i}"))
                    .spawn(move || worker_loop(local, stealers_for_thread, shutdown))
                    .expect("failed to spawn addd worker thread"),
            );
        }

        Pool {
            injector,
            stealers,
            shutdown: AtomicBool::new(false),
            idle_signal: Condvar::new(),
            idle_lock: Mutex::new(()),
            _threads: threads,
            worker_count: AtomicUsize::new(n),
        }
    }

    fn worker_loop(local: Worker<Job>, stealers: Vec<Stealer<Job>>, shutdown: Arc<AtomicBool>) {
        let this = pool();
        loop {
            if let Some(job) = find_job(&local, &this.injector, &stealers) {
                let _ = panic::catch_unwind(AssertUnwindSafe(job));
                continue;
            }
            if shutdown.load(Ordering::Acquire) {
                return;
            }
            // Park briefly rather than spin-wait forever; `join` below
            // notifies `idle_signal` whenever it queues a job.
            let mut guard = this.idle_lock.lock();
            this.idle_signal.wait_for(&mut guard, std::time::Duration::from_millis(2));
        }
    }

    fn find_job(local: &Worker<Job>, injector: &Injector<Job>, stealers: &[Stealer<Job>]) -> Option<Job> {
        if let Some(job) = local.pop() {
            return Some(job);
        }
        loop {
            match injector.steal_batch_and_pop(local) {
                crossbeam_deque::Steal::Success(job) => return Some(job),
                crossbeam_deque::Steal::Retry => continue,
                crossbeam_deque::Steal::Empty => break,
            }
        }
        for s in stealers {
            loop {
                match s.steal() {
                    crossbeam_deque::Steal::Success(job) => return Some(job),
                    crossbeam_deque::Steal::Retry => continue,
                    crossbeam_deque::Steal::Empty => break,
                }
            }
        }
        None
    }

    /// Run `a` and `b`, forking `a` onto the pool and running `b` on the
    /// calling thread, work-stealing other queued jobs while waiting
    /// for `a` to finish. Mirrors `SPAWN`/`CALL`/`SYNC` in the original.
    pub fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB,
        RA: Send,
    {
        let done = Arc::new(AtomicBool::new(false));
        let slot: Arc<Mutex<Option<RA>>> = Arc::new(Mutex::new(None));

        {
            let done = Arc::clone(&done);
            let slot = Arc::clone(&slot);
            let job: Job = Box::new(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(a)).ok();
                *slot.lock() = result;
                done.store(true, Ordering::Release);
            });
            pool().injector.push(job);
            let _lock = pool().idle_lock.lock();
            pool().idle_signal.notify_all();
        }

        let rb = b();

        // Help drain other work while waiting so this thread isn't idle.
        let local_helper: Worker<Job> = Worker::new_lifo();
        while !done.load(Ordering::Acquire) {
            let this = pool();
            if let Some(job) = find_job(&local_helper, &this.injector, &this.stealers) {
                let _ = panic::catch_unwind(AssertUnwindSafe(job));
            } else {
                std::thread::yield_now();
            }
        }

        let ra = slot
            .lock()
            .take()
            .expect("spawned task panicked without leaving a result");
        (ra, rb)
    }

    /// Fork every closure but the last onto the pool, run the last one
    /// locally, and collect all results in order. Used by `matvec`
    /// (forks 3, calls 1) and `matmat` (forks 7, calls 1).
    pub fn fork_join_n<T, F>(mut tasks: Vec<F>) -> Vec<T>
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        if tasks.is_empty() {
            return Vec::new();
        }
        let last = tasks.pop().unwrap();
        let n = tasks.len();
        let done: Vec<Arc<AtomicBool>> = (0..n).map(|_| Arc::new(AtomicBool::new(false))).collect();
        let slots: Vec<Arc<Mutex<Option<T>>>> = (0..n).map(|_| Arc::new(Mutex::new(None))).collect();

        for (i, task) in tasks.into_iter().enumerate() {
            let done = Arc::clone(&done[i]);
            let slot = Arc::clone(&slots[i]);
            let job: Job = Box::new(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(task)).ok();
                *slot.lock() = result;
                done.store(true, Ordering::Release);
            });
            pool().injector.push(job);
        }
        if n > 0 {
            let _lock = pool().idle_lock.lock();
            pool().idle_signal.notify_all();
        }

        let last_result = last();

        let local_helper: Worker<Job> = Worker::new_lifo();
        for d in &done {
            while !d.load(Ordering::Acquire) {
                let this = pool();
                if let Some(job) = find_job(&local_helper, &this.injector, &this.stealers) {
                    let _ = panic::catch_unwind(AssertUnwindSafe(job));
                } else {
                    std::thread::yield_now();
                }
            }
        }

        let mut results: Vec<T> = slots
            .into_iter()
            .map(|s| s.lock().take().expect("spawned task panicked without leaving a result"))
            .collect();
        results.push(last_result);
        results
    }
}

#[cfg(feature = "multi-threading")]
pub use mt::{fork_join_n, join};

#[cfg(not(feature = "multi-threading"))]
pub fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA,
    B: FnOnce() -> RB,
{
    let ra = a();
    let rb = b();
    (ra, rb)
}

#[cfg(not(feature = "multi-threading"))]
pub fn fork_join_n<T, F>(tasks: Vec<F>) -> Vec<T>
where
    F: FnOnce() -> T,
{
    tasks.into_iter().map(|t| t()).collect()
}
