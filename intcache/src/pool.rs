//! A fixed-size pool of worker threads.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use crossbeam::sync::WaitGroup;
use log::{debug, error};

use crate::error::{Error, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed number of threads pulling jobs off a shared queue.
///
/// A job that panics is caught so its worker keeps serving the queue.
/// Dropping the pool shuts it down and joins every worker.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::Configuration(
                "worker pool needs at least one thread".to_string(),
            ));
        }

        let (sender, receiver) = channel::unbounded::<Job>();
        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("intcache-worker-{}", id))
                .spawn(move || {
                    for job in receiver.iter() {
                        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                            error!("job panicked on worker {}", id);
                        }
                    }
                })
                .map_err(|e| Error::ThreadSpawn(e.to_string()))?;
            workers.push(handle);
        }
        debug!("started worker pool with {} threads", size);

        Ok(WorkerPool {
            sender: Some(sender),
            workers,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.sender.is_none()
    }

    /// Queue `job` for execution on some worker.
    pub fn execute<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(Error::PoolShutDown)?;
        sender.send(Box::new(job)).map_err(|_| Error::PoolShutDown)
    }

    /// Run `task(i)` for every `i` in `0..count` on the pool and block until
    /// all of them have finished.
    ///
    /// Results come back in task order. If any task panicked the others are
    /// still waited for and [`Error::WorkerPanicked`] is returned.
    pub fn run_all<T, F>(&self, count: usize, task: F) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(usize) -> T + Send + Sync + 'static,
    {
        let task = Arc::new(task);
        let (results_tx, results_rx) = channel::bounded(count);
        let done = WaitGroup::new();

        for i in 0..count {
            let task = Arc::clone(&task);
            let results_tx = results_tx.clone();
            let done = done.clone();
            self.execute(move || {
                let out = task(i);
                // the receiver outlives every job
                let _ = results_tx.send((i, out));
                drop(done);
            })?;
        }
        drop(results_tx);
        // a panicking job drops its WaitGroup handle while unwinding, so
        // this returns once every job has either finished or died.
        done.wait();

        let mut results: Vec<(usize, T)> = results_rx.try_iter().collect();
        if results.len() != count {
            return Err(Error::WorkerPanicked);
        }
        results.sort_by_key(|(i, _)| *i);
        Ok(results.into_iter().map(|(_, out)| out).collect())
    }

    /// Stop accepting work, let queued jobs drain and join every worker.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("worker thread exited abnormally");
            }
        }
        debug!("worker pool shut down");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
