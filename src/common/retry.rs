// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::clock::Sleeper;
use crate::common::error::AppError;
use std::future::Future;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: usize, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

/// Retry an async operation while it fails with `AppError::Transient`, waiting
/// a fixed delay between attempts. Any other error is returned immediately.
pub async fn retry_transient<F, Fut, T>(
    mut op: F,
    policy: RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<T, AppError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < attempts => {
                tracing::debug!(attempt, attempts, error = %e, "Transient failure; retrying");
                if !sleeper.sleep(policy.delay).await {
                    return Err(e);
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
