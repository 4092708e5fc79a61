use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::Result;

use super::task::{LearnTask, TaskPriority};

/// Work a task is handed to once it's popped off the queue. Lives outside
/// this module because running it means extracting memories and writing
/// them to the store — concerns the queue itself doesn't own.
pub type TaskHandler = Arc<dyn Fn(&LearnTask) -> Result<()> + Send + Sync>;

#[derive(Default)]
struct Counters {
    queued: AtomicUsize,
    running: AtomicUsize,
    done: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

struct Shared {
    queue: Mutex<VecDeque<LearnTask>>,
    capacity: usize,
    notify: Notify,
    counters: Counters,
}

/// A bounded queue of pending [`LearnTask`]s drained by a small worker
/// pool (§4.8). `enqueue` is synchronous — it only ever holds a brief
/// standard-library lock, never an async one — so it can be called from
/// `Engine::open`'s synchronous replay path as well as from async
/// request handlers.
pub struct AsyncLearningQueue {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl AsyncLearningQueue {
    /// Spawn `workers` tasks that pull from a queue bounded at `capacity`,
    /// running `handler` on each popped task.
    pub fn spawn(capacity: usize, workers: usize, handler: TaskHandler) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
            counters: Counters::default(),
        });

        let handles = (0..workers.max(1))
            .map(|id| {
                let shared = shared.clone();
                let handler = handler.clone();
                tokio::spawn(worker_loop(id, shared, handler))
            })
            .collect();

        Self {
            shared,
            workers: handles,
        }
    }

    /// Enqueue a task, returning `false` if it was dropped outright
    /// (queue full and nothing lower-priority to evict) (§4.8).
    pub fn enqueue(&self, task: LearnTask) -> bool {
        let mut queue = self.shared.queue.lock().unwrap();

        if queue.len() >= self.shared.capacity {
            // Evict the lowest-priority queued task if the arrival
            // outranks it; otherwise the arrival itself is dropped.
            let weakest_idx = queue
                .iter()
                .enumerate()
                .min_by_key(|(_, t)| t.priority)
                .map(|(i, _)| i);

            match weakest_idx {
                Some(idx) if queue[idx].priority < task.priority => {
                    queue.remove(idx);
                    self.shared.counters.dropped.fetch_add(1, Ordering::Relaxed);
                }
                _ => {
                    self.shared.counters.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("learning queue full, dropping incoming task");
                    return false;
                }
            }
        }

        queue.push_back(task);
        self.shared.counters.queued.fetch_add(1, Ordering::Relaxed);
        drop(queue);
        self.shared.notify.notify_one();
        true
    }

    pub fn queued(&self) -> usize {
        self.shared.counters.queued.load(Ordering::Relaxed)
    }
    pub fn running(&self) -> usize {
        self.shared.counters.running.load(Ordering::Relaxed)
    }
    pub fn done(&self) -> u64 {
        self.shared.counters.done.load(Ordering::Relaxed)
    }
    pub fn failed(&self) -> u64 {
        self.shared.counters.failed.load(Ordering::Relaxed)
    }
    pub fn dropped(&self) -> u64 {
        self.shared.counters.dropped.load(Ordering::Relaxed)
    }

    /// Wait up to `deadline` for the queue to drain, then abort the
    /// workers and return whatever is still pending so the caller can
    /// spill it for replay (§4.8 graceful shutdown).
    pub async fn shutdown(mut self, deadline: Duration) -> Vec<LearnTask> {
        let waited = tokio::time::timeout(deadline, async {
            loop {
                let empty = {
                    let queue = self.shared.queue.lock().unwrap();
                    queue.is_empty() && self.shared.counters.running.load(Ordering::Relaxed) == 0
                };
                if empty {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        for handle in self.workers.drain(..) {
            handle.abort();
        }

        if waited.is_err() {
            tracing::warn!("learning queue shutdown deadline elapsed with pending work");
        }

        let mut remaining = self.shared.queue.lock().unwrap();
        remaining.drain(..).collect()
    }
}

async fn worker_loop(_id: usize, shared: Arc<Shared>, handler: TaskHandler) {
    loop {
        let task = {
            let mut queue = shared.queue.lock().unwrap();
            queue.pop_front()
        };

        let Some(task) = task else {
            shared.notify.notified().await;
            continue;
        };

        shared.counters.queued.fetch_sub(1, Ordering::Relaxed);
        shared.counters.running.fetch_add(1, Ordering::Relaxed);

        let result = handler(&task);

        shared.counters.running.fetch_sub(1, Ordering::Relaxed);
        match result {
            Ok(()) => {
                shared.counters.done.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                shared.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %err, "learning task failed");
            }
        }
    }
}

impl From<&crate::memory::MemoryType> for TaskPriority {
    fn from(memory_type: &crate::memory::MemoryType) -> Self {
        use crate::memory::MemoryType::*;
        match memory_type {
            Preference | Procedural | Semantic => TaskPriority::High,
            Episodic => TaskPriority::Normal,
            Working | Sensory => TaskPriority::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_enqueue_and_drain_runs_handler() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let handler: TaskHandler = Arc::new(move |_task| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let queue = AsyncLearningQueue::spawn(10, 2, handler);
        queue.enqueue(LearnTask::new("I prefer dark mode"));
        queue.enqueue(LearnTask::new("we use Rust"));

        let remaining = queue.shutdown(Duration::from_secs(1)).await;
        assert!(remaining.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_drop_policy_evicts_lower_priority_task() {
        // No workers: the queue never drains, so we can inspect the
        // eviction decision directly.
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            capacity: 1,
            notify: Notify::new(),
            counters: Counters::default(),
        });
        let isolated = AsyncLearningQueue {
            shared: shared.clone(),
            workers: Vec::new(),
        };

        let mut low = LearnTask::new("ephemeral working note");
        low.priority = TaskPriority::Low;
        assert!(isolated.enqueue(low));

        let mut high = LearnTask::new("I prefer dark mode");
        high.priority = TaskPriority::High;
        assert!(isolated.enqueue(high));

        let queue = shared.queue.lock().unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].priority, TaskPriority::High);
    }
}
