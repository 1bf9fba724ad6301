// src/auto/mod.rs

//! Background polling scheduler driving periodic update checks.
//!
//! One worker thread runs check-and-update cycles: a cycle fires
//! immediately on start, and the next wait begins only after the
//! previous cycle has fully completed, so cycles never overlap. Errors
//! inside a cycle are logged and the scheduler keeps running; stopping
//! cancels the in-flight cycle's continuation and wakes the sleeper
//! promptly.
//!
//! The scheduler is an owned value: callers hold it, start it, stop
//! it, and may run several independent schedulers side by side.

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::manager::Updater;
use crate::version::Version;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Default interval between check cycles (one hour)
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(3600);

/// Callback invoked after a successful update
pub type UpdatedListener = Box<dyn Fn(&Version) + Send + Sync + 'static>;

/// Stop flag the worker sleeps against, so `stop()` interrupts the
/// inter-cycle wait instead of waiting out the interval
struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    fn signal(&self) {
        *self.stopped.lock() = true;
        self.condvar.notify_all();
    }

    /// Wait until the deadline or a stop, whichever comes first.
    /// Returns true if a stop was requested.
    fn wait_interval(&self, interval: Duration) -> bool {
        let deadline = Instant::now() + interval;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.condvar.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

struct Worker {
    handle: JoinHandle<()>,
    stop: Arc<StopSignal>,
    cancel: CancelToken,
}

/// Periodic check-and-update scheduler
pub struct AutoUpdater {
    updater: Arc<dyn Updater>,
    check_interval: Duration,
    listeners: Arc<Mutex<Vec<UpdatedListener>>>,
    worker: Mutex<Option<Worker>>,
}

impl AutoUpdater {
    pub fn new(updater: Arc<dyn Updater>) -> Self {
        Self {
            updater,
            check_interval: DEFAULT_CHECK_INTERVAL,
            listeners: Arc::new(Mutex::new(Vec::new())),
            worker: Mutex::new(None),
        }
    }

    /// Override the interval between check cycles
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Register a listener notified after every successful update
    pub fn on_updated(&self, listener: impl Fn(&Version) + Send + Sync + 'static) {
        self.listeners.lock().push(Box::new(listener));
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Start the background worker. A second `start()` while running
    /// is a no-op.
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return;
        }

        let stop = Arc::new(StopSignal::new());
        let cancel = CancelToken::new();

        let updater = Arc::clone(&self.updater);
        let listeners = Arc::clone(&self.listeners);
        let interval = self.check_interval;
        let thread_stop = Arc::clone(&stop);
        let thread_cancel = cancel.clone();

        let handle = thread::spawn(move || {
            debug!("Update scheduler started");
            loop {
                run_cycle(&updater, &listeners, &thread_cancel);
                if thread_stop.wait_interval(interval) {
                    break;
                }
            }
            debug!("Update scheduler stopped");
        });

        *worker = Some(Worker {
            handle,
            stop,
            cancel,
        });
    }

    /// Stop the worker: no further cycles fire, the in-flight cycle is
    /// cancelled, and already-issued downloads drain. Idempotent.
    pub fn stop(&self) {
        let worker = self.worker.lock().take();
        let Some(worker) = worker else {
            return;
        };

        debug!("Stopping the update scheduler");
        worker.cancel.cancel();
        worker.stop.signal();

        // A listener calling stop() runs on the worker itself; joining
        // would deadlock there
        if worker.handle.thread().id() != thread::current().id() {
            let _ = worker.handle.join();
        }
    }
}

impl Drop for AutoUpdater {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One check-and-update cycle. All failures are caught and logged so
/// the scheduler outlives them.
fn run_cycle(
    updater: &Arc<dyn Updater>,
    listeners: &Arc<Mutex<Vec<UpdatedListener>>>,
    cancel: &CancelToken,
) {
    if let Err(e) = try_cycle(updater, listeners, cancel) {
        if e.is_cancelled() {
            debug!("Update cycle cancelled");
        } else {
            error!("Update cycle failed: {e}");
        }
    }
}

fn try_cycle(
    updater: &Arc<dyn Updater>,
    listeners: &Arc<Mutex<Vec<UpdatedListener>>>,
    cancel: &CancelToken,
) -> Result<()> {
    debug!("Checking for updates");
    let info = updater.check_for_update()?;
    if !info.has_update {
        debug!("No updates found");
        return Ok(());
    }

    info!("Update found: {}", info.version);
    updater.do_update(&info, cancel)?;
    info!("Update to {} is ready", info.version);

    for listener in listeners.lock().iter() {
        listener(&info.version);
    }
    Ok(())
}
