//! Scatter-gather over tokio tasks
//!
//! A wave spawns one task per child input and waits for every task before the
//! parent continues. Contributions arrive in completion order.

use crate::types::{AppError, Result};
use std::future::Future;
use tokio::task::JoinSet;
use tracing::Instrument;

/// What a wave does when a child fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanInPolicy {
    /// First failure aborts the remaining children and fails the wave
    FailFast,
    /// Failures are logged and recorded; the wave continues
    Partial,
}

/// Everything a wave produced once the barrier is passed
#[derive(Debug)]
pub struct FanIn<T> {
    pub contributions: Vec<T>,
    pub failures: Vec<AppError>,
}

impl<T> FanIn<T> {
    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }
}

/// Run `task` once per input concurrently and collect all results.
///
/// Under [`FanInPolicy::FailFast`] the first error is returned after the
/// remaining children are aborted. A panicked child counts as an
/// [`AppError::Internal`] failure.
pub async fn scatter_gather<I, T, F, Fut>(
    wave: &str,
    inputs: Vec<I>,
    policy: FanInPolicy,
    task: F,
) -> Result<FanIn<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let width = inputs.len();
    let mut set = JoinSet::new();
    for input in inputs {
        set.spawn(task(input).in_current_span());
    }
    tracing::debug!(wave, width, "Fanned out");

    let mut fan_in = FanIn {
        contributions: Vec::with_capacity(width),
        failures: Vec::new(),
    };

    while let Some(joined) = set.join_next().await {
        let error = match joined {
            Ok(Ok(contribution)) => {
                fan_in.contributions.push(contribution);
                continue;
            }
            Ok(Err(e)) => e,
            Err(join_err) => AppError::Internal(format!("{} task failed: {}", wave, join_err)),
        };

        match policy {
            FanInPolicy::FailFast => {
                tracing::error!(wave, error = %error, "Branch failed, aborting wave");
                set.abort_all();
                return Err(error);
            }
            FanInPolicy::Partial => {
                tracing::warn!(wave, error = %error, "Branch failed, continuing");
                fan_in.failures.push(error);
            }
        }
    }

    tracing::debug!(
        wave,
        contributions = fan_in.contributions.len(),
        failures = fan_in.failures.len(),
        "Fanned in"
    );
    Ok(fan_in)
}
