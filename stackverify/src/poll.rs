//! Bounded-retry convergence polling.
//!
//! Metrics arrive in the backend only after agents scrape and push on their own schedules, so a
//! check against a live stack is evaluated repeatedly until it holds or a time budget runs out.
//! A check reports "not yet" by returning `Ok(false)`; an `Err` ends the wait immediately and is
//! handed back to the caller as-is.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter};
use thiserror::Error;
use tokio::time::Instant;

use crate::settings::PollSettings;

/// The poll budget ran out before the check converged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}: not satisfied after {attempts} attempts over {elapsed:?}")]
pub struct PollTimeout {
    pub message: String,
    pub elapsed: Duration,
    pub attempts: usize,
}

/// A re-evaluable condition over an eventually-consistent system.
///
/// Implementations bundle whatever context the evaluation needs (clients, expected values,
/// queries), so repeated evaluation carries no hidden state between attempts.
#[async_trait]
pub trait ConvergenceCheck: Send + Sync {
    type Error: Send;

    async fn is_converged(&self) -> Result<bool, Self::Error>;
}

/// Evaluates `check` until it returns `Ok(true)` or `settings.timeout` elapses.
///
/// The first evaluation happens immediately and success returns without sleeping. Between
/// unsuccessful evaluations the task sleeps for `settings.interval`. When the budget is exhausted
/// the wait fails with a [`PollTimeout`] converted into the caller's error type; an error from the
/// check itself is returned unchanged, without sleeping or retrying.
#[tracing::instrument(
    level = "info",
    skip(settings, check),
    fields(poll_message=%settings.timeout_message, timeout=?settings.timeout, interval=?settings.interval)
)]
pub async fn wait_until<F, Fut, E>(settings: &PollSettings, mut check: F) -> Result<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: From<PollTimeout>,
{
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        if check().await? {
            POLL_ATTEMPTS.observe(attempts as f64);
            tracing::debug!(%attempts, elapsed=?start.elapsed(), "check converged");
            return Ok(());
        }

        let elapsed = Instant::now().duration_since(start);
        if settings.timeout <= elapsed {
            POLL_ATTEMPTS.observe(attempts as f64);
            POLL_TIMEOUTS.inc();
            tracing::error!(%attempts, ?elapsed, "{}", settings.timeout_message);
            return Err(PollTimeout {
                message: settings.timeout_message.clone(),
                elapsed,
                attempts,
            }
            .into());
        }

        tracing::debug!(
            %attempts, ?elapsed,
            "check not yet converged - retrying in {:?}", settings.interval
        );
        tokio::time::sleep(settings.interval).await;
    }
}

/// Polls a [`ConvergenceCheck`] under the same contract as [`wait_until`].
pub async fn wait_for<C>(settings: &PollSettings, check: &C) -> Result<(), C::Error>
where
    C: ConvergenceCheck + ?Sized,
    C::Error: From<PollTimeout>,
{
    wait_until(settings, || check.is_converged()).await
}

pub static POLL_ATTEMPTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "poll_attempts",
            "Number of check evaluations made per convergence wait",
        )
        .buckets(vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0]),
    )
    .expect("failed creating poll_attempts metric")
});

pub static POLL_TIMEOUTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("poll_timeouts", "Number of convergence waits that exhausted their budget")
        .expect("failed creating poll_timeouts metric")
});
