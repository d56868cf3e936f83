//! Periodic self-registration scheduler (C7).
//!
//! Drives recurring registration against a remote LDS, retrying failures
//! starting at 1 second and doubling until the retry interval would meet or
//! exceed the normal interval (at which point the next normal tick takes
//! over).

use crate::error::StatusCode;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Handle to the registration call the scheduler drives. Implemented over a
/// client session in production; a closure in tests.
#[async_trait::async_trait]
pub trait RegisterAttempt: Send + Sync {
    async fn attempt(&self, url: &str) -> bool;
}

#[async_trait::async_trait]
impl<F, Fut> RegisterAttempt for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send,
{
    async fn attempt(&self, url: &str) -> bool {
        (self)(url.to_string()).await
    }
}

/// Opaque identifier for a scheduled job. Only one job may exist at a time;
/// this exists so callers have something to hold even though there is no
/// per-job cancellation API beyond dropping the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobId(u64);

struct RetryState {
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

/// Owns the at-most-one periodic registration job for this server instance.
pub struct DiscoveryScheduler<A: RegisterAttempt + 'static> {
    attempt: Arc<A>,
    normal_handle: Mutex<Option<JoinHandle<()>>>,
    delayed_handle: Mutex<Option<JoinHandle<()>>>,
    retry: Arc<Mutex<RetryState>>,
    has_job: std::sync::atomic::AtomicBool,
}

impl<A: RegisterAttempt + 'static> DiscoveryScheduler<A> {
    pub fn new(attempt: A) -> Self {
        Self {
            attempt: Arc::new(attempt),
            normal_handle: Mutex::new(None),
            delayed_handle: Mutex::new(None),
            retry: Arc::new(Mutex::new(RetryState { handle: None, interval: Duration::ZERO })),
            has_job: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Register the periodic job. Returns `BadInternalError` if one already
    /// exists.
    pub async fn add_periodic_server_register_job(
        &self,
        url: String,
        interval: Duration,
        delay_first: Duration,
    ) -> Result<JobId, StatusCode> {
        if self.has_job.swap(true, std::sync::atomic::Ordering::SeqCst) {
            return Err(StatusCode::BadInternalError);
        }

        let attempt = self.attempt.clone();
        let retry = self.retry.clone();
        let normal_url = url.clone();
        let normal_handle = tokio::spawn(async move {
            loop {
                sleep(interval).await;
                Self::run_tick(&attempt, &normal_url, interval, &retry).await;
            }
        });
        *self.normal_handle.lock().await = Some(normal_handle);

        if delay_first > Duration::ZERO {
            let attempt = self.attempt.clone();
            let retry = self.retry.clone();
            let delayed_handle = tokio::spawn(async move {
                sleep(delay_first).await;
                Self::run_tick(&attempt, &url, interval, &retry).await;
            });
            *self.delayed_handle.lock().await = Some(delayed_handle);
        }

        Ok(JobId(0))
    }

    fn run_tick<'a>(
        attempt: &'a Arc<A>,
        url: &'a str,
        interval: Duration,
        retry: &'a Arc<Mutex<RetryState>>,
    ) -> std::pin::Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let ok = attempt.attempt(url).await;

            let mut state = retry.lock().await;
            if let Some(handle) = state.handle.take() {
                handle.abort();
            }

            if ok {
                info!(url, "periodic registration succeeded");
                state.interval = Duration::ZERO;
                return;
            }

            let next = if state.interval == Duration::ZERO {
                Duration::from_secs(1)
            } else {
                state.interval * 2
            };

            if next >= interval {
                error!(url, "periodic registration failed, retry interval reached ceiling");
                state.interval = Duration::ZERO;
                return;
            }

            error!(url = url, retry_in = ?next, "periodic registration failed, scheduling retry");
            state.interval = next;

            let attempt = attempt.clone();
            let retry = retry.clone();
            let retry_url = url.to_string();
            let handle = tokio::spawn(async move {
                sleep(next).await;
                Self::run_tick(&attempt, &retry_url, interval, &retry).await;
            });
            state.handle = Some(handle);
        })
    }

    /// Current retry interval, `Duration::ZERO` when no retry is pending.
    /// Exposed for tests that assert on the doubling schedule.
    pub async fn current_retry_interval(&self) -> Duration {
        self.retry.lock().await.interval
    }
}

impl<A: RegisterAttempt + 'static> Drop for DiscoveryScheduler<A> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.normal_handle.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
        if let Ok(mut guard) = self.delayed_handle.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
        if let Ok(mut guard) = self.retry.try_lock() {
            if let Some(handle) = guard.handle.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // `tokio::time::advance` jumps the virtual clock but, per its docs, does
    // not guarantee that tasks woken by the jump have been polled before it
    // returns. Yielding before and after gives the executor a chance to run
    // the spawned scheduler tasks so assertions observe post-tick state.
    async fn advance_and_settle(duration: Duration) {
        tokio::task::yield_now().await;
        tokio::time::advance(duration).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }

    // S6 / testable property 5 — retry doubling up to a ceiling.
    #[tokio::test(start_paused = true)]
    async fn retry_doubles_until_ceiling_then_stops() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let scheduler = DiscoveryScheduler::new(move |_url: String| {
            let attempts = attempts_clone.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                false
            }
        });

        // A power-of-two interval keeps the retry chain's last tick just
        // before the second normal-interval tick, so the two don't interleave.
        let interval = Duration::from_secs(16);
        scheduler
            .add_periodic_server_register_job("opc.tcp://lds:4840".into(), interval, Duration::ZERO)
            .await
            .unwrap();

        // First normal tick at t=16s fails -> retry scheduled at 1s (t=17s).
        advance_and_settle(interval + Duration::from_millis(1)).await;
        assert_eq!(scheduler.current_retry_interval().await, Duration::from_secs(1));

        // Retry at t=17s fails -> next retry at 2s.
        advance_and_settle(Duration::from_secs(1) + Duration::from_millis(1)).await;
        assert_eq!(scheduler.current_retry_interval().await, Duration::from_secs(2));

        // Retry at 2s fails -> next would be 4s, still < 16s interval.
        advance_and_settle(Duration::from_secs(2) + Duration::from_millis(1)).await;
        assert_eq!(scheduler.current_retry_interval().await, Duration::from_secs(4));

        // Retry at 4s fails -> next would be 8s, still < 16s.
        advance_and_settle(Duration::from_secs(4) + Duration::from_millis(1)).await;
        assert_eq!(scheduler.current_retry_interval().await, Duration::from_secs(8));

        // Retry at 8s fails -> next would be 16s >= 16s interval: stop retrying.
        advance_and_settle(Duration::from_secs(8) + Duration::from_millis(1)).await;
        assert_eq!(scheduler.current_retry_interval().await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn success_cancels_pending_retry() {
        let should_fail = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let should_fail_clone = should_fail.clone();
        let scheduler = DiscoveryScheduler::new(move |_url: String| {
            let should_fail = should_fail_clone.clone();
            async move { !should_fail.load(Ordering::SeqCst) }
        });

        let interval = Duration::from_secs(10);
        scheduler
            .add_periodic_server_register_job("opc.tcp://lds:4840".into(), interval, Duration::ZERO)
            .await
            .unwrap();

        advance_and_settle(interval + Duration::from_millis(1)).await;
        assert_eq!(scheduler.current_retry_interval().await, Duration::from_secs(1));

        should_fail.store(false, Ordering::SeqCst);
        advance_and_settle(Duration::from_secs(1) + Duration::from_millis(1)).await;
        assert_eq!(scheduler.current_retry_interval().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn adding_a_second_job_fails() {
        let scheduler = DiscoveryScheduler::new(|_url: String| async { true });
        scheduler
            .add_periodic_server_register_job("opc.tcp://lds:4840".into(), Duration::from_secs(60), Duration::ZERO)
            .await
            .unwrap();

        let result = scheduler
            .add_periodic_server_register_job("opc.tcp://lds:4840".into(), Duration::from_secs(60), Duration::ZERO)
            .await;
        assert_eq!(result, Err(StatusCode::BadInternalError));
    }
}
