//! Deferred work for one execution context.
//!
//! Tasks queued here run on a later turn, when the owning context is pumped,
//! never inside the call that queued them.

use crate::base::lock;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

pub(crate) type Task = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Queue {
    tasks: Mutex<VecDeque<Task>>,
    wakeup: Notify,
}

/// FIFO task queue shared by a context and its clients.
#[derive(Clone, Default)]
pub(crate) struct Scheduler {
    queue: Arc<Queue>,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a task for the next turn.
    pub(crate) fn defer<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        lock(&self.queue.tasks).push_back(Box::new(task));
        self.queue.wakeup.notify_one();
    }

    /// Pop the oldest task. The lock is released before the task runs.
    pub(crate) fn next_task(&self) -> Option<Task> {
        lock(&self.queue.tasks).pop_front()
    }

    pub(crate) fn pending(&self) -> usize {
        lock(&self.queue.tasks).len()
    }

    /// Resolves once a task is queued after the last wakeup.
    pub(crate) fn notified(&self) -> Notified<'_> {
        self.queue.wakeup.notified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_run_in_order() {
        let scheduler = Scheduler::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let seen = Arc::clone(&seen);
            scheduler.defer(move || seen.lock().unwrap().push(i));
        }
        assert_eq!(scheduler.pending(), 3);
        assert!(seen.lock().unwrap().is_empty());

        while let Some(task) = scheduler.next_task() {
            task();
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_defer_wakes_waiter() {
        let scheduler = Scheduler::new();
        scheduler.defer(|| {});
        // The permit stored by `defer` completes the wait immediately.
        tokio::time::timeout(std::time::Duration::from_secs(1), scheduler.notified())
            .await
            .unwrap();
    }
}
