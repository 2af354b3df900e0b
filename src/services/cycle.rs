// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::app::policy::CyclePolicy;
use crate::common::clock::{Sleeper, countdown};
use crate::common::error::AppError;
use crate::domain::types::{Proxy, Wallet};
use crate::services::scheduler::{Scheduler, WalletReport};
use alloy::primitives::Address;
use rand::Rng;
use rand::rngs::StdRng;
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycles: u64,
    pub wallet_passes: u64,
    /// Passes ended early by a login or other wallet-level error.
    pub wallets_skipped: u64,
    pub actions_executed: u64,
    pub actions_confirmed: u64,
    pub actions_verified: u64,
    /// Addresses in the order their passes completed.
    pub completed: Vec<Address>,
}

impl CycleSummary {
    fn record(&mut self, report: &WalletReport) {
        self.wallet_passes += 1;
        self.actions_executed += u64::from(report.executed());
        self.actions_confirmed += u64::from(report.confirmed);
        self.actions_verified += u64::from(report.verified);
        self.completed.push(report.address);
    }
}

enum PassResult {
    Done(WalletReport),
    Skipped,
    Shutdown,
}

/// Repeats the scheduler over every wallet, with a long cooldown between passes.
pub struct CycleLoop {
    scheduler: Scheduler,
    wallets: Vec<Wallet>,
    proxies: Vec<Proxy>,
    policy: CyclePolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl CycleLoop {
    pub fn new(
        scheduler: Scheduler,
        wallets: Vec<Wallet>,
        proxies: Vec<Proxy>,
        policy: CyclePolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            scheduler,
            wallets,
            proxies,
            policy,
            sleeper,
        }
    }

    fn pick_proxy(&self, rng: &mut StdRng) -> Option<&Proxy> {
        if self.proxies.is_empty() {
            return None;
        }
        self.proxies.get(rng.gen_range(0..self.proxies.len()))
    }

    /// Runs until `max_cycles` is reached or shutdown fires. Only a `Config`
    /// error escapes.
    pub async fn run(&self, rng: &mut StdRng) -> Result<CycleSummary, AppError> {
        let mut summary = CycleSummary::default();
        if self.wallets.is_empty() {
            tracing::warn!(target: "cycle", "No wallets loaded; nothing to do");
            return Ok(summary);
        }
        if self.proxies.is_empty() {
            tracing::info!(target: "cycle", "No proxies loaded; running in direct mode");
        }

        loop {
            summary.cycles += 1;
            tracing::info!(
                target: "cycle",
                cycle = summary.cycles,
                wallets = self.wallets.len(),
                proxies = self.proxies.len(),
                "Starting cycle"
            );

            for (index, wallet) in self.wallets.iter().enumerate() {
                match self.run_wallet(wallet, index, rng).await? {
                    PassResult::Done(report) => {
                        summary.record(&report);
                        if report.interrupted {
                            tracing::info!(target: "cycle", "Shutdown requested; stopping");
                            return Ok(summary);
                        }
                    }
                    PassResult::Skipped => summary.wallets_skipped += 1,
                    PassResult::Shutdown => {
                        tracing::info!(target: "cycle", "Shutdown requested; stopping");
                        return Ok(summary);
                    }
                }
            }

            tracing::info!(
                target: "cycle",
                cycle = summary.cycles,
                passes = summary.wallet_passes,
                skipped = summary.wallets_skipped,
                executed = summary.actions_executed,
                confirmed = summary.actions_confirmed,
                verified = summary.actions_verified,
                "All actions completed for all wallets"
            );

            if self
                .policy
                .max_cycles
                .is_some_and(|max| summary.cycles >= max)
            {
                return Ok(summary);
            }
            if !countdown(
                self.sleeper.as_ref(),
                self.policy.cooldown,
                self.policy.render_countdown,
            )
            .await
            {
                tracing::info!(target: "cycle", "Shutdown during cooldown; stopping");
                return Ok(summary);
            }
        }
    }

    /// A `Connection` failure re-runs the wallet after `outer_retry_delay`,
    /// without bound, drawing a fresh proxy each time.
    async fn run_wallet(
        &self,
        wallet: &Wallet,
        index: usize,
        rng: &mut StdRng,
    ) -> Result<PassResult, AppError> {
        let total = self.wallets.len();
        loop {
            let proxy = self.pick_proxy(rng).cloned();
            match self
                .scheduler
                .run_wallet(wallet, index, total, proxy.as_ref(), rng)
                .await
            {
                Ok(report) => return Ok(PassResult::Done(report)),
                Err(e @ AppError::Config(_)) => return Err(e),
                Err(AppError::Connection(reason)) => {
                    tracing::warn!(
                        target: "cycle",
                        wallet = index + 1,
                        %reason,
                        retry_in_secs = self.policy.outer_retry_delay.as_secs(),
                        "Provider unavailable; retrying wallet"
                    );
                    if !self.sleeper.sleep(self.policy.outer_retry_delay).await {
                        return Ok(PassResult::Shutdown);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        target: "cycle",
                        wallet = index + 1,
                        address = %wallet.address,
                        error = %e,
                        "Skipping wallet for this cycle"
                    );
                    return Ok(PassResult::Skipped);
                }
            }
        }
    }
}
