// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use async_trait::async_trait;
use std::io::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

/// Every deliberate pause in the orchestrator goes through this.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Returns `false` when the wait was cut short by shutdown.
    async fn sleep(&self, duration: Duration) -> bool;
}

/// Production sleeper bound to the process shutdown token.
#[derive(Clone)]
pub struct TokioSleeper {
    shutdown: CancellationToken,
}

impl TokioSleeper {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }
}

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.shutdown.is_cancelled();
        }
        tokio::select! {
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

/// Return the current UNIX timestamp in seconds.
pub fn current_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub fn format_remaining(secs: u64) -> String {
    let hours = secs / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    format!("{hours}h {minutes}m {seconds}s")
}

/// Sleep for `total`, one tick per second, optionally rewriting a single
/// stdout line with the time left. Returns `false` if shutdown interrupted it.
pub async fn countdown(sleeper: &dyn Sleeper, total: Duration, render: bool) -> bool {
    let whole_secs = total.as_secs();
    tracing::info!(
        target: "cycle",
        remaining = %format_remaining(whole_secs),
        "Starting cooldown countdown"
    );

    let mut out = std::io::stdout();
    for remaining in (1..=whole_secs).rev() {
        if render {
            let _ = write!(out, "\rTime remaining: {} ", format_remaining(remaining));
            let _ = out.flush();
        }
        if !sleeper.sleep(Duration::from_secs(1)).await {
            if render {
                let _ = writeln!(out);
            }
            return false;
        }
    }

    let fraction = total.saturating_sub(Duration::from_secs(whole_secs));
    if !fraction.is_zero() && !sleeper.sleep(fraction).await {
        return false;
    }
    if render {
        let _ = writeln!(out, "\rCountdown complete! Restarting process...");
    }
    true
}
