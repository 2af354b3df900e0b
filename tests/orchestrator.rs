// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use testnet_autopilot::app::policy::{ActionPolicy, CyclePolicy, RetrySettings, RunPolicy, TaskIds};
use testnet_autopilot::domain::error::AppError;
use testnet_autopilot::domain::types::{UserPoints, Wallet};
use testnet_autopilot::network::provider::ProviderFactory;
use testnet_autopilot::network::receipt::ReceiptWaiter;
use testnet_autopilot::services::actions::ActionExecutor;
use testnet_autopilot::services::cycle::CycleLoop;
use testnet_autopilot::services::points::{SessionAuthenticator, TaskVerifier};
use testnet_autopilot::services::scheduler::Scheduler;
use testnet_autopilot::test_support::{
    FakeApiConnector, FakeChain, FakeConnector, FakePointsApi, RecordingSleeper, test_wallet,
};
use url::Url;

const JITTER: Duration = Duration::from_millis(10);

struct Harness {
    chain: Arc<FakeChain>,
    connector: Arc<FakeConnector>,
    api: Arc<FakePointsApi>,
    sleeper: Arc<RecordingSleeper>,
}

impl Harness {
    fn new() -> Self {
        Self::with_connector_failures(Vec::new())
    }

    fn with_connector_failures(failures: Vec<AppError>) -> Self {
        let chain = Arc::new(FakeChain::default());
        let connector = Arc::new(FakeConnector::new(chain.clone()).failing_with(failures));
        Self {
            chain,
            connector,
            api: Arc::new(FakePointsApi::default()),
            sleeper: Arc::new(RecordingSleeper::default()),
        }
    }

    fn scheduler(&self, run: RunPolicy) -> Scheduler {
        let retry = RetrySettings::default();
        let providers = ProviderFactory::new(
            self.connector.clone(),
            Url::parse("http://localhost:8545").expect("url"),
            FakeChain::CHAIN_ID,
            retry.provider,
            self.sleeper.clone(),
        );
        let policy_actions = ActionPolicy {
            chain_id: FakeChain::CHAIN_ID,
            ..ActionPolicy::default()
        };
        let executor = ActionExecutor::new(
            policy_actions,
            retry,
            ReceiptWaiter::new(retry.receipt, self.sleeper.clone()),
            self.sleeper.clone(),
        );
        Scheduler::new(
            run,
            SessionAuthenticator::new("pharos"),
            Arc::new(FakeApiConnector::new(self.api.clone())),
            providers,
            executor,
            TaskVerifier::new(TaskIds::default(), retry.verify, self.sleeper.clone()),
            self.sleeper.clone(),
        )
    }

    fn cycle(&self, wallets: Vec<Wallet>, policy: CyclePolicy) -> CycleLoop {
        CycleLoop::new(
            self.scheduler(one_of_each()),
            wallets,
            Vec::new(),
            policy,
            self.sleeper.clone(),
        )
    }
}

fn one_of_each() -> RunPolicy {
    RunPolicy {
        transfer_count: 1,
        swap_count: 1,
        add_liquidity_count: 1,
        randomize_order: false,
        check_in_first: true,
        jitter_min: JITTER,
        jitter_max: JITTER,
    }
}

fn single_cycle() -> CyclePolicy {
    CyclePolicy {
        max_cycles: Some(1),
        render_countdown: false,
        ..CyclePolicy::default()
    }
}

#[tokio::test]
async fn every_wallet_runs_its_quota_in_file_order() {
    let harness = Harness::new();
    let wallets = vec![test_wallet(1), test_wallet(2)];
    let addresses: Vec<_> = wallets.iter().map(|w| w.address).collect();

    let summary = harness
        .cycle(wallets, single_cycle())
        .run(&mut StdRng::seed_from_u64(1))
        .await
        .expect("cycle");

    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.wallet_passes, 2);
    assert_eq!(summary.wallets_skipped, 0);
    assert_eq!(summary.actions_executed, 6);
    assert_eq!(summary.actions_confirmed, 6);
    assert_eq!(summary.actions_verified, 6);
    assert_eq!(summary.completed, addresses);

    assert_eq!(harness.chain.sent().len(), 6);
    assert_eq!(harness.api.verifications_for(addresses[0]), 3);
    assert_eq!(harness.api.verifications_for(addresses[1]), 3);
    assert_eq!(harness.api.check_ins(), 2);
    assert_eq!(harness.api.faucet_claims(), 2);

    let task_order: Vec<u64> = harness
        .api
        .verifications()
        .iter()
        .take(3)
        .map(|(task, _)| *task)
        .collect();
    let ids = TaskIds::default();
    assert_eq!(task_order, vec![ids.transfer, ids.swap, ids.add_liquidity]);

    // One jitter per action and no cooldown after the last cycle.
    assert_eq!(harness.sleeper.recorded(), vec![JITTER; 6]);
}

#[tokio::test]
async fn login_failure_skips_only_that_wallet() {
    let harness = Harness::new();
    let rejected = test_wallet(1);
    harness.api.reject_login(rejected.address);
    let healthy = test_wallet(2);
    let healthy_address = healthy.address;

    let summary = harness
        .cycle(vec![rejected, healthy], single_cycle())
        .run(&mut StdRng::seed_from_u64(2))
        .await
        .expect("cycle");

    assert_eq!(summary.wallets_skipped, 1);
    assert_eq!(summary.wallet_passes, 1);
    assert_eq!(summary.completed, vec![healthy_address]);
    assert_eq!(harness.chain.sent().len(), 3);
    assert_eq!(harness.api.verifications().len(), 3);
    // The skipped wallet never reached the chain endpoint.
    assert_eq!(harness.connector.dials(), 1);
}

#[tokio::test]
async fn empty_wallet_list_returns_immediately() {
    let harness = Harness::new();
    let summary = harness
        .cycle(Vec::new(), CyclePolicy::default())
        .run(&mut StdRng::seed_from_u64(3))
        .await
        .expect("cycle");

    assert_eq!(summary.cycles, 0);
    assert!(harness.sleeper.recorded().is_empty());
    assert_eq!(harness.connector.dials(), 0);
}

#[tokio::test]
async fn flaky_provider_is_retried_inside_the_pass() {
    let harness = Harness::with_connector_failures(vec![
        AppError::Transient("429 Too Many Requests".into()),
        AppError::Transient("Unable to complete request at this time".into()),
    ]);

    let summary = harness
        .cycle(vec![test_wallet(1)], single_cycle())
        .run(&mut StdRng::seed_from_u64(4))
        .await
        .expect("cycle");

    assert_eq!(harness.connector.dials(), 3);
    assert_eq!(summary.wallet_passes, 1);
    assert_eq!(summary.actions_confirmed, 3);
    let slept = harness.sleeper.recorded();
    assert_eq!(&slept[..2], &[Duration::from_secs(2); 2]);
}

#[tokio::test]
async fn unreachable_provider_reruns_the_wallet_after_outer_delay() {
    let harness = Harness::with_connector_failures(vec![
        AppError::Transient("503".into()),
        AppError::Transient("503".into()),
        AppError::Transient("503".into()),
    ]);
    let wallet = test_wallet(1);
    let address = wallet.address;
    let policy = single_cycle();
    let outer_delay = policy.outer_retry_delay;

    let summary = harness
        .cycle(vec![wallet], policy)
        .run(&mut StdRng::seed_from_u64(5))
        .await
        .expect("cycle");

    assert_eq!(harness.connector.dials(), 4);
    assert_eq!(harness.api.logins(), vec![address, address]);
    assert_eq!(summary.wallet_passes, 1);
    assert_eq!(summary.wallets_skipped, 0);
    assert!(harness.sleeper.recorded().contains(&outer_delay));
}

#[tokio::test]
async fn chain_id_mismatch_stops_the_loop() {
    let chain = Arc::new(FakeChain::with_chain_id(1));
    let harness = Harness {
        connector: Arc::new(FakeConnector::new(chain.clone())),
        chain,
        api: Arc::new(FakePointsApi::default()),
        sleeper: Arc::new(RecordingSleeper::default()),
    };

    let err = harness
        .cycle(vec![test_wallet(1), test_wallet(2)], single_cycle())
        .run(&mut StdRng::seed_from_u64(6))
        .await
        .err()
        .expect("must fail");

    assert!(matches!(err, AppError::Config(_)));
    assert!(harness.chain.sent().is_empty());
}

#[tokio::test]
async fn cooldown_separates_cycles() {
    let harness = Harness::new();
    let policy = CyclePolicy {
        cooldown: Duration::from_secs(3),
        max_cycles: Some(2),
        render_countdown: false,
        ..CyclePolicy::default()
    };

    let summary = harness
        .cycle(vec![test_wallet(1)], policy)
        .run(&mut StdRng::seed_from_u64(7))
        .await
        .expect("cycle");

    assert_eq!(summary.cycles, 2);
    assert_eq!(summary.wallet_passes, 2);
    let mut expected = vec![JITTER; 3];
    expected.extend([Duration::from_secs(1); 3]);
    expected.extend([JITTER; 3]);
    assert_eq!(harness.sleeper.recorded(), expected);
}

#[tokio::test]
async fn shutdown_during_cooldown_ends_the_loop() {
    let chain = Arc::new(FakeChain::default());
    let harness = Harness {
        connector: Arc::new(FakeConnector::new(chain.clone())),
        chain,
        api: Arc::new(FakePointsApi::default()),
        // Three jitters, then the first cooldown tick reports shutdown.
        sleeper: Arc::new(RecordingSleeper::cancelled_after(4)),
    };

    let summary = harness
        .cycle(
            vec![test_wallet(1)],
            CyclePolicy {
                render_countdown: false,
                ..CyclePolicy::default()
            },
        )
        .run(&mut StdRng::seed_from_u64(8))
        .await
        .expect("cycle");

    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.wallet_passes, 1);
    assert_eq!(harness.sleeper.recorded().len(), 4);
}

#[tokio::test]
async fn faucet_can_run_before_check_in() {
    let harness = Harness::new();
    let scheduler = harness.scheduler(RunPolicy {
        check_in_first: false,
        ..one_of_each()
    });

    scheduler
        .run_wallet(&test_wallet(1), 0, 1, None, &mut StdRng::seed_from_u64(9))
        .await
        .expect("pass");

    assert_eq!(harness.api.daily_calls(), vec!["faucet", "check_in"]);
}

#[tokio::test]
async fn check_in_runs_first_by_default() {
    let harness = Harness::new();
    harness
        .scheduler(one_of_each())
        .run_wallet(&test_wallet(1), 0, 1, None, &mut StdRng::seed_from_u64(10))
        .await
        .expect("pass");

    assert_eq!(harness.api.daily_calls(), vec!["check_in", "faucet"]);
}

#[tokio::test]
async fn pass_reports_points_before_and_after() {
    let harness = Harness::new();
    let report = harness
        .scheduler(one_of_each())
        .run_wallet(&test_wallet(1), 0, 1, None, &mut StdRng::seed_from_u64(11))
        .await
        .expect("pass");

    assert_eq!(harness.api.profile_reads(), 2);
    assert_eq!(
        report.points_before,
        Some(UserPoints {
            task_points: 0,
            total_points: 100
        })
    );
    assert_eq!(
        report.points_after,
        Some(UserPoints {
            task_points: 30,
            total_points: 130
        })
    );
    assert_eq!(
        report.points_delta(),
        Some(UserPoints {
            task_points: 30,
            total_points: 30
        })
    );
    assert_eq!(report.verified, 3);
}
