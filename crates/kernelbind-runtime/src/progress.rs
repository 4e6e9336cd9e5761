//! Progress reporting from workers back to the managed thread.
//!
//! A long-running kernel operation holds a [`ProgressReporter`] and reports
//! step counts from the worker. The managed side polls the
//! [`ProgressChannel`] and may cancel; the next report returns `false` and
//! the operation is expected to stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};

pub struct ProgressChannel {
    receiver: Receiver<usize>,
    sender: Sender<usize>,
    cancelled: Arc<AtomicBool>,
}

impl ProgressChannel {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            receiver,
            sender,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle for the worker side.
    pub fn reporter(&self) -> ProgressReporter {
        ProgressReporter {
            sender: self.sender.clone(),
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Deliver every queued report to `listener`. Returns how many ran.
    pub fn poll(&self, mut listener: impl FnMut(usize)) -> usize {
        let mut delivered = 0;
        for steps in self.receiver.try_iter() {
            listener(steps);
            delivered += 1;
        }
        delivered
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: Sender<usize>,
    cancelled: Arc<AtomicBool>,
}

impl ProgressReporter {
    /// Report `steps`. Returns `false` once the operation is cancelled.
    pub fn progress(&self, steps: usize) -> bool {
        // The channel may already be gone; the report is then dropped.
        let _ = self.sender.send(steps);
        !self.is_cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
