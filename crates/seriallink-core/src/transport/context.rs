//! Execution contexts
//!
//! Most serial drivers are not safe to call from arbitrary threads. An
//! [`ExecutionContext`] decides where a raw call runs; the caller always
//! blocks until the call has completed.

use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};

/// Where raw driver calls execute
pub trait ExecutionContext: Send + Sync {
    /// Run `job` on this context and return its result.
    ///
    /// Blocks the caller until the job has finished.
    fn run<R, F>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static;
}

/// Runs every job in place on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct CallerContext;

impl ExecutionContext for CallerContext {
    fn run<R, F>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        job()
    }
}

/// Runs jobs on the calling thread, one at a time, behind a mutex
///
/// A job that calls back into the same context from the thread holding the
/// lock runs in place.
#[derive(Debug, Default)]
pub struct SerializedContext {
    lock: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

impl SerializedContext {
    /// Create an unlocked context
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the current thread holds the lock
    pub fn is_current(&self) -> bool {
        *self.owner() == Some(thread::current().id())
    }

    fn owner(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.owner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Clears the recorded owner when a job finishes or unwinds
struct OwnerRelease<'a>(&'a SerializedContext);

impl Drop for OwnerRelease<'_> {
    fn drop(&mut self) {
        *self.0.owner() = None;
    }
}

impl ExecutionContext for SerializedContext {
    fn run<R, F>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_current() {
            return job();
        }

        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *self.owner() = Some(thread::current().id());
        let _release = OwnerRelease(self);
        job()
    }
}

type Job = Box<dyn FnOnce() + Send>;

/// Owns a worker thread that executes every job
///
/// Jobs are sent to the worker over a channel and the caller waits on a reply
/// channel. A job submitted from the worker thread itself runs in place.
pub struct DedicatedThread {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl DedicatedThread {
    /// Start the worker thread
    pub fn spawn(name: &str) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for job in receiver {
                    job();
                }
                tracing::trace!("dispatch worker exiting");
            })?;
        let worker_id = worker.thread().id();
        tracing::debug!(name, "dispatch worker started");

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            worker_id,
        })
    }

    /// Whether the current thread is the worker
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.worker_id
    }
}

impl ExecutionContext for DedicatedThread {
    fn run<R, F>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_current() {
            return job();
        }

        let (reply_tx, reply_rx) = mpsc::sync_channel::<Result<R, Box<dyn Any + Send>>>(1);
        let wrapped: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(job));
            let _ = reply_tx.send(outcome);
        });

        // The worker only stops once `sender` is dropped, and panics inside
        // jobs are caught, so the channels stay open for the context's lifetime.
        let Some(sender) = self.sender.as_ref() else {
            worker_gone()
        };
        if sender.send(wrapped).is_err() {
            worker_gone();
        }
        match reply_rx.recv() {
            Ok(Ok(value)) => value,
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => worker_gone(),
        }
    }
}

fn worker_gone() -> ! {
    tracing::error!("dispatch worker is no longer running");
    unreachable!("dispatch worker outlives its context")
}

impl fmt::Debug for DedicatedThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedicatedThread")
            .field("worker_id", &self.worker_id)
            .finish()
    }
}

impl Drop for DedicatedThread {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if !self.is_current() {
                let _ = worker.join();
            }
        }
    }
}
