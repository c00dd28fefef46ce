use crate::sdk::util::rate_limit::Limiter;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchPolicy {
    /// Minimum spacing between two dispatches.
    pub delay: Duration,
    /// Requests allowed in flight at once. 1 keeps the batch strictly sequential.
    pub max_in_flight: NonZeroUsize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_BATCH_DELAY,
            max_in_flight: NonZeroUsize::MIN,
        }
    }
}

/// Cooperative cancellation flag shared between a batch and whoever may stop it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-item results in input order. `None` marks items never dispatched because
/// the batch was cancelled first.
#[derive(Debug)]
pub struct BatchOutcome<R, E> {
    pub results: Vec<Option<Result<R, E>>>,
    pub cancelled: bool,
}

impl<R, E> BatchOutcome<R, E> {
    pub fn completed(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }

    pub fn successes(self) -> Vec<R> {
        self.results.into_iter().flatten().filter_map(Result::ok).collect()
    }
}

/// Dispatches work items against a shared external service while respecting its rate limit.
pub struct BatchScheduler {
    policy: BatchPolicy,
    limiter: Option<Limiter>,
}

impl BatchScheduler {
    pub fn new(policy: BatchPolicy) -> Self {
        Self {
            policy,
            limiter: Limiter::with_period(policy.delay),
        }
    }

    pub fn unthrottled() -> Self {
        Self::new(BatchPolicy {
            delay: Duration::ZERO,
            max_in_flight: NonZeroUsize::MIN,
        })
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Runs `task` over `items`. A failing item never aborts the batch; cancellation
    /// stops new dispatches and keeps whatever already finished.
    pub fn run<T, R, E, F>(&self, items: &[T], cancel: Option<&CancelToken>, task: F) -> BatchOutcome<R, E>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync,
    {
        let workers = self.policy.max_in_flight.get().min(items.len().max(1));
        log::debug!(
            "Starting batch of {} items ({} in flight, {:?} between dispatches)",
            items.len(),
            workers,
            self.policy.delay
        );

        if workers == 1 {
            self.run_sequential(items, cancel, &task)
        } else {
            self.run_parallel(items, cancel, &task, workers)
        }
    }

    fn run_sequential<T, R, E, F>(&self, items: &[T], cancel: Option<&CancelToken>, task: &F) -> BatchOutcome<R, E>
    where
        F: Fn(&T) -> Result<R, E>,
    {
        let mut results = Vec::with_capacity(items.len());
        let mut cancelled = false;

        for (index, item) in items.iter().enumerate() {
            if !self.acquire_slot(cancel) {
                log::info!("Batch cancelled after {} of {} items", index, items.len());
                cancelled = true;
                break;
            }
            results.push(Some(task(item)));
        }

        results.resize_with(items.len(), || None);
        BatchOutcome { results, cancelled }
    }

    fn run_parallel<T, R, E, F>(
        &self,
        items: &[T],
        cancel: Option<&CancelToken>,
        task: &F,
        workers: usize,
    ) -> BatchOutcome<R, E>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync,
    {
        let next = AtomicUsize::new(0);
        let stopped = AtomicBool::new(false);
        let slots: Mutex<Vec<Option<Result<R, E>>>> = Mutex::new((0..items.len()).map(|_| None).collect());

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if stopped.load(Ordering::SeqCst) {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(item) = items.get(index) else {
                        break;
                    };
                    if !self.acquire_slot(cancel) {
                        stopped.store(true, Ordering::SeqCst);
                        break;
                    }
                    let result = task(item);
                    if let Ok(mut slots) = slots.lock() {
                        slots[index] = Some(result);
                    }
                });
            }
        });

        let results = slots.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        BatchOutcome {
            results,
            cancelled: stopped.load(Ordering::SeqCst),
        }
    }

    /// Waits for the rate limiter, then re-checks cancellation so a cancel issued
    /// during the wait still prevents the dispatch.
    fn acquire_slot(&self, cancel: Option<&CancelToken>) -> bool {
        let is_cancelled = || cancel.map_or(false, CancelToken::is_cancelled);
        if is_cancelled() {
            return false;
        }
        if let Some(limiter) = &self.limiter {
            limiter.wait();
        }
        !is_cancelled()
    }
}
