//! Re-query a resource until it reports ready.
//!
//! The dashboard waits for the organization profile to be populated by
//! polling it once a second. [`Poller::start`] runs that loop on a tokio task
//! and hands back a [`PollHandle`]; cancelling or dropping the handle stops
//! the loop, including mid-request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::service::{HiringClient, HiringService, OrgProfile, ServiceError};

/// Timing of a polling loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay after the first miss.
    pub interval: Duration,
    /// Multiplier applied to the delay after each further miss. 1.0 keeps it fixed.
    pub backoff: f64,
    /// Upper bound for the delay.
    pub max_interval: Duration,
    /// Give up after this many fetches.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1))
    }
}

impl PollPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            backoff: 1.0,
            max_interval: interval,
            max_attempts: None,
        }
    }

    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff = factor.max(1.0);
        self.max_interval = max_interval.max(self.interval);
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    /// Delay before the fetch that follows `attempt` misses.
    /// delay = interval * backoff^(attempt - 1), capped at `max_interval`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.interval.as_secs_f64() * self.backoff.powi(exp);
        Duration::from_secs_f64(secs.min(self.max_interval.as_secs_f64()))
    }
}

/// How a polling loop ended.
#[derive(Debug)]
pub enum PollOutcome<T> {
    Ready(T),
    Cancelled,
    /// `max_attempts` fetches came back not ready.
    Exhausted,
    /// The credential was missing or rejected; polling cannot succeed.
    Failed(ServiceError),
}

impl<T> PollOutcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            PollOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Owner of a running polling loop. Dropping it cancels the loop.
pub struct PollHandle<T> {
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<PollOutcome<T>>>,
}

impl<T> PollHandle<T> {
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the loop to end.
    pub async fn wait(mut self) -> PollOutcome<T> {
        let Some(task) = self.task.take() else {
            return PollOutcome::Cancelled;
        };
        match task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => PollOutcome::Cancelled,
        }
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

pub struct Poller;

impl Poller {
    /// Call `fetch` now and then after every miss until it yields a value.
    ///
    /// `Ok(None)` is a miss. Errors are logged and count as a miss, except
    /// auth errors, which end the loop.
    pub fn start<T, F, Fut>(policy: PollPolicy, fetch: F) -> PollHandle<T>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<T>, ServiceError>> + Send + 'static,
    {
        let (cancel, cancelled) = watch::channel(false);
        let task = tokio::spawn(run(policy, fetch, cancelled));
        PollHandle {
            cancel,
            task: Some(task),
        }
    }

    /// Poll the organization profile until the service has populated it.
    pub fn profile(client: Arc<HiringClient>, policy: PollPolicy) -> PollHandle<OrgProfile> {
        Self::start(policy, move || {
            let client = Arc::clone(&client);
            async move {
                let profile = client.org_profile().await?;
                Ok::<_, ServiceError>(profile.populated.then_some(profile))
            }
        })
    }
}

async fn run<T, F, Fut>(
    policy: PollPolicy,
    mut fetch: F,
    mut cancelled: watch::Receiver<bool>,
) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, ServiceError>>,
{
    let mut attempt: u32 = 0;
    loop {
        if *cancelled.borrow_and_update() {
            return PollOutcome::Cancelled;
        }
        attempt += 1;

        let result = tokio::select! {
            r = fetch() => r,
            _ = cancelled.changed() => return PollOutcome::Cancelled,
        };
        match result {
            Ok(Some(value)) => {
                debug!(attempt, "poll ready");
                return PollOutcome::Ready(value);
            }
            Ok(None) => debug!(attempt, "poll not ready"),
            Err(err) if err.is_auth() => {
                warn!(attempt, error = %err, "poll stopped, credential missing or rejected");
                return PollOutcome::Failed(err);
            }
            Err(err) => warn!(attempt, error = %err, "poll failed, will retry"),
        }

        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            return PollOutcome::Exhausted;
        }

        tokio::select! {
            _ = tokio::time::sleep(policy.delay_for_attempt(attempt)) => {}
            _ = cancelled.changed() => return PollOutcome::Cancelled,
        }
    }
}
