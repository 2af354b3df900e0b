// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::types::{FaucetStatus, Session};
use crate::network::points_api::PointsApi;
use chrono::{DateTime, Utc};

pub fn format_available_at(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("unix {}", timestamp))
}

/// Daily check-in and faucet claim. Business refusals are logged, never raised.
pub struct DailyRoutine;

impl DailyRoutine {
    pub async fn check_in(api: &dyn PointsApi, session: &Session, label: &str) -> bool {
        match api.check_in(session).await {
            Ok(ack) if ack.ok => {
                tracing::info!(target: "points", wallet = label, "Check-in successful");
                true
            }
            Ok(ack) => {
                tracing::info!(
                    target: "points",
                    wallet = label,
                    msg = %ack.message,
                    "Check-in refused, possibly already checked in"
                );
                false
            }
            Err(e) => {
                tracing::warn!(target: "points", wallet = label, error = %e, "Check-in failed");
                false
            }
        }
    }

    /// Claim only when the status endpoint reports eligibility.
    pub async fn claim_faucet(api: &dyn PointsApi, session: &Session, label: &str) -> bool {
        match api.faucet_status(session).await {
            Ok(FaucetStatus::Available) => {}
            Ok(FaucetStatus::Cooldown { available_at }) => {
                tracing::info!(
                    target: "points",
                    wallet = label,
                    next = %format_available_at(available_at),
                    "Faucet not available yet"
                );
                return false;
            }
            Err(e) => {
                tracing::warn!(target: "points", wallet = label, error = %e, "Faucet status check failed");
                return false;
            }
        }

        match api.claim_faucet(session).await {
            Ok(ack) if ack.ok => {
                tracing::info!(target: "points", wallet = label, "Faucet claimed");
                true
            }
            Ok(ack) => {
                tracing::warn!(target: "points", wallet = label, msg = %ack.message, "Faucet claim refused");
                false
            }
            Err(e) => {
                tracing::warn!(target: "points", wallet = label, error = %e, "Faucet claim failed");
                false
            }
        }
    }
}
