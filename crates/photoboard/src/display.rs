//! The display execution context.
//!
//! Worker tasks never touch display state directly: they post jobs through a
//! [`DisplayHandle`], and whoever owns the [`DisplayQueue`] (the UI thread)
//! runs them in posting order.

use tokio::sync::mpsc;
use tracing::trace;

type Job = Box<dyn FnOnce() + Send>;

/// Create a connected handle/queue pair.
pub fn display_channel() -> (DisplayHandle, DisplayQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DisplayHandle { tx }, DisplayQueue { rx })
}

/// Posts jobs onto the display context. Cheap to clone, usable from any thread.
#[derive(Debug, Clone)]
pub struct DisplayHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl DisplayHandle {
    /// Queue `job`. Returns false if the display context is gone, in which
    /// case the job is dropped unrun.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(job)).is_ok()
    }
}

/// Receiving end, owned by the display thread.
#[derive(Debug)]
pub struct DisplayQueue {
    rx: mpsc::UnboundedReceiver<Job>,
}

impl DisplayQueue {
    /// Run every job queued so far without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        if ran > 0 {
            trace!("ran {ran} display jobs");
        }
        ran
    }

    /// Wait for the next job and run it. Returns false once every handle has
    /// been dropped and the queue is empty.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn jobs_run_only_when_drained() {
        let (handle, mut queue) = display_channel();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            assert!(handle.post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn post_fails_after_queue_dropped() {
        let (handle, queue) = display_channel();
        drop(queue);
        assert!(!handle.post(|| {}));
    }

    #[tokio::test]
    async fn run_next_waits_for_job_from_another_task() {
        let (handle, mut queue) = display_channel();
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            handle.post(move || {
                let _ = tx.send(42);
            });
        });
        assert!(queue.run_next().await);
        assert_eq!(rx.await.unwrap(), 42);
        // the only handle went away with the spawned task
        assert!(!queue.run_next().await);
    }
}
