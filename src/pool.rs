//! §4.G: a fixed-size worker pool over `std::thread`, driven by a shared
//! control block and one condition variable — not `rayon`/`tokio` (the
//! teacher's own `workers/pool.rs` is `tokio`-async). The spec's worker
//! loop needs explicit wait/notify lifecycle control that a task-stealing
//! or future-based executor doesn't expose; see `DESIGN.md`.

use crate::env::Environment;
use crate::logger::Logger;
use crate::manager::Manager;
use crate::node::DecisionNode;
use crate::trial;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

struct Control {
    trials_remaining: AtomicI64,
    max_run_time: Mutex<Duration>,
    start_time: Mutex<Instant>,
    threads_working: AtomicU64,
    alive: AtomicBool,
    work_left_lock: Mutex<()>,
    work_left_cv: Condvar,
    completed_backups: AtomicU64,
}

impl Control {
    fn work_left(&self) -> bool {
        self.trials_remaining.load(Ordering::SeqCst) > 0
            && self.start_time.lock().unwrap().elapsed() < *self.max_run_time.lock().unwrap()
    }
}

/// Owns the worker threads and the shared graph they search. `Env` is
/// pinned for the pool's lifetime: one pool searches one tree.
pub struct Pool<Env: Environment + 'static> {
    manager: Arc<Manager<Env>>,
    root: Arc<DecisionNode<Env>>,
    control: Arc<Control>,
    workers: Vec<JoinHandle<()>>,
}

impl<Env: Environment + 'static> Pool<Env> {
    pub fn new(manager: Arc<Manager<Env>>, root: Arc<DecisionNode<Env>>, logger: Option<Arc<Logger>>) -> Self {
        let num_threads = manager.config.num_threads.max(1) as u64;
        let control = Arc::new(Control {
            trials_remaining: AtomicI64::new(0),
            max_run_time: Mutex::new(Duration::ZERO),
            start_time: Mutex::new(Instant::now()),
            threads_working: AtomicU64::new(num_threads),
            alive: AtomicBool::new(true),
            work_left_lock: Mutex::new(()),
            work_left_cv: Condvar::new(),
            completed_backups: AtomicU64::new(0),
        });

        log::info!("starting pool with {num_threads} worker thread(s)");

        let workers = (0..num_threads)
            .map(|id| {
                let manager = manager.clone();
                let root = root.clone();
                let control = control.clone();
                let logger = logger.clone();
                std::thread::Builder::new()
                    .name(format!("thts-worker-{id}"))
                    .spawn(move || worker_loop(manager, root, control, logger))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self { manager, root, control, workers }
    }

    /// §6 control surface. `None` means unbounded for that axis; per §6 at
    /// least one of the two should be `Some` for the run to ever
    /// terminate, but `run_trials` itself does not enforce that — it is a
    /// caller contract, checked instead by `SearchConfig` callers that
    /// derive both from config (see `bin/search.rs`).
    pub fn run_trials(&self, max_trials: Option<u64>, max_time: Option<Duration>, blocking: bool) {
        {
            let _guard = self.control.work_left_lock.lock().unwrap();
            self.control
                .trials_remaining
                .store(max_trials.map(|t| t as i64).unwrap_or(i64::MAX), Ordering::SeqCst);
            *self.control.max_run_time.lock().unwrap() = max_time.unwrap_or(Duration::MAX);
            *self.control.start_time.lock().unwrap() = Instant::now();
        }
        self.control.work_left_cv.notify_all();

        if blocking {
            let guard = self.control.work_left_lock.lock().unwrap();
            let _ = self
                .control
                .work_left_cv
                .wait_while(guard, |_| {
                    self.control.threads_working.load(Ordering::SeqCst) != 0 || self.control.work_left()
                })
                .unwrap();
        }
    }

    /// The public "trials completed" metric uses `num_backups`, not
    /// `num_visits` (§9 design note: the source is inconsistent between
    /// loggers; we standardize on backups here).
    pub fn completed_backups(&self) -> u64 {
        self.control.completed_backups.load(Ordering::SeqCst)
    }

    pub fn root(&self) -> &Arc<DecisionNode<Env>> {
        &self.root
    }

    pub fn manager(&self) -> &Arc<Manager<Env>> {
        &self.manager
    }

    /// Flips `alive=false`, wakes every worker out of its condvar wait, and
    /// joins all worker threads. In-flight trials (already past the wait
    /// loop) run to completion; only the next wait is cut short (§5).
    pub fn join(self) {
        self.control.alive.store(false, Ordering::SeqCst);
        self.control.work_left_cv.notify_all();
        for w in self.workers {
            let _ = w.join();
        }
        log::info!("pool shut down after {} completed backups", self.completed_backups());
    }
}

impl<Env: Environment + 'static> Drop for Pool<Env> {
    fn drop(&mut self) {
        self.control.alive.store(false, Ordering::SeqCst);
        self.control.work_left_cv.notify_all();
    }
}

fn worker_loop<Env: Environment + 'static>(
    manager: Arc<Manager<Env>>,
    root: Arc<DecisionNode<Env>>,
    control: Arc<Control>,
    logger: Option<Arc<Logger>>,
) {
    loop {
        {
            let mut guard = control.work_left_lock.lock().unwrap();
            control.threads_working.fetch_sub(1, Ordering::SeqCst);
            if !control.work_left() {
                control.work_left_cv.notify_all();
            }
            while !control.work_left() {
                if !control.alive.load(Ordering::SeqCst) {
                    return;
                }
                guard = control.work_left_cv.wait(guard).unwrap();
                if !control.alive.load(Ordering::SeqCst) {
                    return;
                }
            }
            control.threads_working.fetch_add(1, Ordering::SeqCst);
            control.trials_remaining.fetch_sub(1, Ordering::SeqCst);
        }

        match trial::run_trial(&manager, &root) {
            Ok(()) => {
                let completed = control.completed_backups.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(logger) = &logger {
                    logger.maybe_log(completed, &manager, &root);
                }
            }
            Err(err) => {
                log::warn!("trial aborted: {err}");
            }
        }
    }
}
