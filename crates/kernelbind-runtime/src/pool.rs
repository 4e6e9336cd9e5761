//! Fixed worker pool for async native calls.

use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, unbounded};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker threads draining a shared job queue.
///
/// Dropping the pool closes the queue; queued jobs still run before the
/// workers exit.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `size` workers (`None`: one per CPU).
    pub fn new(size: Option<usize>) -> io::Result<Self> {
        let size = size.unwrap_or_else(num_cpus::get).max(1);
        let (sender, receiver) = unbounded::<Job>();

        let mut workers = Vec::with_capacity(size);
        for i in 0..size {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("kernelbind-worker-{i}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        job();
                    }
                })?;
            workers.push(handle);
        }
        log::debug!("started {size} workers");

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a job. Returns `false` if the pool is shutting down.
    pub fn execute<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.sender {
            Some(sender) => sender.send(Box::new(job)).is_ok(),
            None => false,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("worker thread panicked");
            }
        }
        log::debug!("workers stopped");
    }
}
