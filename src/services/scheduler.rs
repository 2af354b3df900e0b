// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::app::policy::RunPolicy;
use crate::common::clock::Sleeper;
use crate::common::error::AppError;
use crate::domain::types::{
    ActionGroup, ActionKind, ActionOutcome, Proxy, Session, UserPoints, Wallet,
};
use crate::network::points_api::{ApiConnector, PointsApi};
use crate::network::provider::ProviderFactory;
use crate::services::actions::{ActionExecutor, ActionSlot, WalletContext};
use crate::services::points::{DailyRoutine, SessionAuthenticator, TaskVerifier};
use alloy::primitives::Address;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Expand the quotas into action groups, shuffled when the policy asks for it.
/// Kinds with a zero quota are dropped.
pub fn plan_groups(policy: &RunPolicy, rng: &mut StdRng) -> Vec<ActionGroup> {
    let mut groups: Vec<ActionGroup> = ActionKind::ALL
        .iter()
        .map(|&kind| ActionGroup {
            kind,
            count: policy.quota(kind),
        })
        .filter(|g| g.count > 0)
        .collect();
    if policy.randomize_order {
        groups.shuffle(rng);
    }
    groups
}

/// Tally of one wallet pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalletReport {
    pub address: Address,
    pub confirmed: u32,
    pub unconfirmed: u32,
    pub skipped: u32,
    pub failed: u32,
    pub verified: u32,
    pub points_before: Option<UserPoints>,
    pub points_after: Option<UserPoints>,
    /// Shutdown fired during the pass.
    pub interrupted: bool,
}

impl WalletReport {
    fn new(address: Address) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    pub fn executed(&self) -> u32 {
        self.confirmed + self.unconfirmed + self.skipped + self.failed
    }

    fn record(&mut self, outcome: &ActionOutcome) {
        match outcome {
            ActionOutcome::Confirmed(_) => self.confirmed += 1,
            ActionOutcome::Unconfirmed(_) => self.unconfirmed += 1,
            ActionOutcome::Skipped { .. } => self.skipped += 1,
            ActionOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn points_delta(&self) -> Option<UserPoints> {
        match (self.points_before, self.points_after) {
            (Some(before), Some(after)) => Some(after.delta_since(&before)),
            _ => None,
        }
    }
}

/// Runs one wallet through login, daily routine and its action quota.
pub struct Scheduler {
    run: RunPolicy,
    auth: SessionAuthenticator,
    api: Arc<dyn ApiConnector>,
    providers: ProviderFactory,
    executor: ActionExecutor,
    verifier: TaskVerifier,
    sleeper: Arc<dyn Sleeper>,
}

impl Scheduler {
    pub fn new(
        run: RunPolicy,
        auth: SessionAuthenticator,
        api: Arc<dyn ApiConnector>,
        providers: ProviderFactory,
        executor: ActionExecutor,
        verifier: TaskVerifier,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            run,
            auth,
            api,
            providers,
            executor,
            verifier,
            sleeper,
        }
    }

    /// One pass for one wallet. `Auth` and `Connection` errors end the pass
    /// before any chain activity; per-action failures never do.
    pub async fn run_wallet(
        &self,
        wallet: &Wallet,
        wallet_index: usize,
        wallet_total: usize,
        proxy: Option<&Proxy>,
        rng: &mut StdRng,
    ) -> Result<WalletReport, AppError> {
        let label = format!("{}/{}", wallet_index + 1, wallet_total);
        tracing::info!(
            target: "scheduler",
            wallet = %label,
            address = %wallet.address,
            proxy = proxy.map(Proxy::as_str).unwrap_or("direct"),
            "Starting wallet pass"
        );

        let api = self.api.connect(proxy)?;
        let session = self.auth.login(api.as_ref(), wallet).await?;
        let client = self.providers.acquire(proxy).await?;
        let ctx = WalletContext::new(wallet, client, wallet_index, wallet_total);

        let mut report = WalletReport::new(wallet.address);
        report.points_before = self.read_points(api.as_ref(), &session, &label).await;

        if self.run.check_in_first {
            DailyRoutine::check_in(api.as_ref(), &session, &label).await;
            DailyRoutine::claim_faucet(api.as_ref(), &session, &label).await;
        } else {
            DailyRoutine::claim_faucet(api.as_ref(), &session, &label).await;
            DailyRoutine::check_in(api.as_ref(), &session, &label).await;
        }

        let groups = plan_groups(&self.run, rng);
        tracing::debug!(
            target: "scheduler",
            wallet = %label,
            order = ?groups.iter().map(|g| g.kind.label()).collect::<Vec<_>>(),
            "Planned action groups"
        );

        'groups: for group in groups {
            for index in 0..group.count {
                let slot = ActionSlot {
                    index,
                    total: group.count,
                };
                let outcome = self.executor.run(group.kind, &ctx, slot, rng).await;
                report.record(&outcome);

                if self
                    .verifier
                    .verify(api.as_ref(), &session, group.kind, outcome.tx_hash())
                    .await
                {
                    report.verified += 1;
                }

                let jitter = self.run.draw_jitter(rng);
                if !self.sleeper.sleep(jitter).await {
                    report.interrupted = true;
                    break 'groups;
                }
            }
        }

        report.points_after = self.read_points(api.as_ref(), &session, &label).await;
        if let Some(delta) = report.points_delta() {
            tracing::info!(
                target: "scheduler",
                wallet = %label,
                task_points = delta.task_points,
                total_points = delta.total_points,
                "Points delta for pass"
            );
        }
        tracing::info!(
            target: "scheduler",
            wallet = %label,
            executed = report.executed(),
            confirmed = report.confirmed,
            verified = report.verified,
            "Wallet pass finished"
        );
        Ok(report)
    }

    async fn read_points(
        &self,
        api: &dyn PointsApi,
        session: &Session,
        label: &str,
    ) -> Option<UserPoints> {
        match api.profile(session).await {
            Ok(points) => {
                tracing::info!(
                    target: "scheduler",
                    wallet = label,
                    task_points = points.task_points,
                    total_points = points.total_points,
                    "Points"
                );
                Some(points)
            }
            Err(e) => {
                tracing::warn!(target: "scheduler", wallet = label, error = %e, "Profile read failed");
                None
            }
        }
    }
}
