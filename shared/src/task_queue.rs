/// Bounded task queue for running downloads in parallel.
///
/// Jobs go through an mpsc channel whose capacity equals the worker count;
/// N worker tasks share the receiver, so at most N jobs are in flight and the
/// producer waits once the channel is full.
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

/// Main task queue with concurrency control.
pub struct TaskQueue {
    /// Number of worker tasks (and channel capacity).
    max_concurrent: usize,
    counters: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    running: AtomicUsize,
    peak_running: AtomicUsize,
    completed: AtomicUsize,
    panicked: AtomicUsize,
}

impl Counters {
    fn start(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(now, Ordering::SeqCst);
    }

    fn finish(&self, ok: bool) {
        self.running.fetch_sub(1, Ordering::SeqCst);
        if ok {
            self.completed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.panicked.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl TaskQueue {
    /// Create a new task queue with the given concurrency limit (at least 1).
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run `handler` over every item with at most `max_concurrent` in flight.
    ///
    /// Results come back in submission order; completion order is unspecified.
    /// A slot is `None` when its job panicked. Other jobs are unaffected.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, handler: F) -> Vec<Option<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let total = items.len();
        if total == 0 {
            return Vec::new();
        }

        let (job_tx, job_rx) = mpsc::channel::<(usize, T)>(self.max_concurrent);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<(usize, Option<R>)>();
        let handler = Arc::new(handler);

        let workers = self.max_concurrent.min(total);
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let handler = handler.clone();
            let counters = self.counters.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    // Hold the lock only while waiting for the next job
                    let job = job_rx.lock().await.recv().await;
                    let Some((index, item)) = job else { break };

                    debug!("Worker {} picked job {}", worker_id, index);
                    counters.start();
                    let result = match tokio::spawn((*handler)(item)).await {
                        Ok(r) => Some(r),
                        Err(e) => {
                            error!("Job {} panicked: {}", index, e);
                            None
                        }
                    };
                    counters.finish(result.is_some());

                    if result_tx.send((index, result)).is_err() {
                        break;
                    }
                }
                debug!("Worker {} finished", worker_id);
            }));
        }
        drop(result_tx);

        info!("Queued {} jobs across {} workers", total, workers);
        for (index, item) in items.into_iter().enumerate() {
            if job_tx.send((index, item)).await.is_err() {
                error!("All workers stopped before job {} was queued", index);
                break;
            }
        }
        drop(job_tx);

        let mut results: Vec<Option<R>> = (0..total).map(|_| None).collect();
        while let Some((index, result)) = result_rx.recv().await {
            results[index] = result;
        }
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task failed: {}", e);
            }
        }
        results
    }

    /// Get queue statistics.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            max_concurrent: self.max_concurrent,
            running: self.counters.running.load(Ordering::SeqCst),
            peak_running: self.counters.peak_running.load(Ordering::SeqCst),
            completed: self.counters.completed.load(Ordering::SeqCst),
            panicked: self.counters.panicked.load(Ordering::SeqCst),
        }
    }
}

/// Queue statistics snapshot.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueueStats {
    pub max_concurrent: usize,
    pub running: usize,
    pub peak_running: usize,
    pub completed: usize,
    pub panicked: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_in_submission_order() {
        let queue = TaskQueue::new(3);
        let results = queue
            .run((0..10u64).collect(), |n| async move {
                // later items finish first
                tokio::time::sleep(Duration::from_millis(20 - n * 2)).await;
                n * 10
            })
            .await;
        let values: Vec<u64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, (0..10).map(|n| n * 10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let queue = TaskQueue::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (f, p) = (in_flight.clone(), peak.clone());
        let results = queue
            .run((0..8).collect::<Vec<u32>>(), move |_| {
                let (f, p) = (f.clone(), p.clone());
                async move {
                    let now = f.fetch_add(1, Ordering::SeqCst) + 1;
                    p.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    f.fetch_sub(1, Ordering::SeqCst);
                    true
                }
            })
            .await;

        assert_eq!(results.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        let stats = queue.stats();
        assert_eq!(stats.max_concurrent, 2);
        assert!(stats.peak_running <= 2);
        assert_eq!(stats.completed, 8);
        assert_eq!(stats.running, 0);
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let queue = TaskQueue::new(2);
        let results = queue
            .run(vec![1, 2, 3, 4], |n| async move {
                if n == 3 {
                    panic!("boom");
                }
                n
            })
            .await;
        assert_eq!(results, vec![Some(1), Some(2), None, Some(4)]);
        assert_eq!(queue.stats().panicked, 1);
        assert_eq!(queue.stats().completed, 3);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let queue = TaskQueue::new(3);
        let results = queue.run(Vec::<u8>::new(), |n| async move { n }).await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_zero_workers_clamped() {
        assert_eq!(TaskQueue::new(0).max_concurrent(), 1);
    }
}
