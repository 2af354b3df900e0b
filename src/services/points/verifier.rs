// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::app::policy::TaskIds;
use crate::common::clock::Sleeper;
use crate::common::constants::PLACEHOLDER_TX_HASH;
use crate::common::retry::RetryPolicy;
use crate::domain::types::{ActionKind, Session, VerifyStatus};
use crate::network::points_api::PointsApi;
use alloy::primitives::B256;
use std::sync::Arc;

pub struct TaskVerifier {
    task_ids: TaskIds,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl TaskVerifier {
    pub fn new(task_ids: TaskIds, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            task_ids,
            policy,
            sleeper,
        }
    }

    /// Ask the points service to credit `kind` for `tx_hash`. Retries while
    /// the answer is "pending" or the call fails transiently; anything else is
    /// final. A missing hash is reported as the zero placeholder.
    pub async fn verify(
        &self,
        api: &dyn PointsApi,
        session: &Session,
        kind: ActionKind,
        tx_hash: Option<B256>,
    ) -> bool {
        let hash = tx_hash.unwrap_or(PLACEHOLDER_TX_HASH);
        let task_id = self.task_ids.for_kind(kind);
        let attempts = self.policy.attempts.max(1);

        for attempt in 1..=attempts {
            match api.verify_task(session, task_id, hash).await {
                Ok(VerifyStatus::Verified) => {
                    tracing::info!(target: "points", %kind, task_id, tx = %hash, "Task verified");
                    return true;
                }
                Ok(VerifyStatus::Rejected(reason)) => {
                    tracing::warn!(target: "points", %kind, task_id, tx = %hash, %reason, "Task verification rejected");
                    return false;
                }
                Ok(VerifyStatus::Pending) => {
                    tracing::debug!(target: "points", %kind, task_id, attempt, "Verification pending");
                }
                Err(e) if e.is_transient() => {
                    tracing::debug!(target: "points", %kind, task_id, attempt, error = %e, "Verification call failed transiently");
                }
                Err(e) => {
                    tracing::warn!(target: "points", %kind, task_id, tx = %hash, error = %e, "Task verification failed");
                    return false;
                }
            }
            if attempt < attempts && !self.sleeper.sleep(self.policy.delay).await {
                return false;
            }
        }

        tracing::warn!(target: "points", %kind, task_id, tx = %hash, attempts, "Task verification still pending; giving up");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::AppError;
    use crate::test_support::{FakePointsApi, RecordingSleeper, test_session};
    use std::time::Duration;

    fn verifier(sleeper: Arc<RecordingSleeper>) -> TaskVerifier {
        TaskVerifier::new(
            TaskIds::default(),
            RetryPolicy::new(5, Duration::from_secs(5)),
            sleeper,
        )
    }

    #[tokio::test]
    async fn placeholder_hash_is_sent_when_no_transaction_exists() {
        let api = FakePointsApi::default();
        let session = test_session(0);
        let ok = verifier(Arc::new(RecordingSleeper::default()))
            .verify(&api, &session, ActionKind::Transfer, None)
            .await;

        assert!(ok);
        assert_eq!(api.verifications(), vec![(103, PLACEHOLDER_TX_HASH)]);
    }

    #[tokio::test]
    async fn pending_is_retried_until_verified() {
        let api = FakePointsApi::default();
        api.queue_verify(vec![
            Ok(VerifyStatus::Pending),
            Err(AppError::Transient("503".into())),
            Ok(VerifyStatus::Verified),
        ]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let hash = B256::repeat_byte(4);

        let ok = verifier(sleeper.clone())
            .verify(&api, &test_session(0), ActionKind::Swap, Some(hash))
            .await;

        assert!(ok);
        assert_eq!(api.verifications(), vec![(101, hash); 3]);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(5); 2]);
    }

    #[tokio::test]
    async fn rejection_is_final() {
        let api = FakePointsApi::default();
        api.queue_verify(vec![Ok(VerifyStatus::Rejected("already done".into()))]);

        let ok = verifier(Arc::new(RecordingSleeper::default()))
            .verify(&api, &test_session(0), ActionKind::AddLiquidity, Some(B256::ZERO))
            .await;

        assert!(!ok);
        assert_eq!(api.verifications().len(), 1);
    }

    #[tokio::test]
    async fn bounded_when_server_stays_pending() {
        let api = FakePointsApi::default();
        api.queue_verify((0..10).map(|_| Ok(VerifyStatus::Pending)).collect());
        let sleeper = Arc::new(RecordingSleeper::default());

        let ok = verifier(sleeper.clone())
            .verify(&api, &test_session(0), ActionKind::Swap, None)
            .await;

        assert!(!ok);
        assert_eq!(api.verifications().len(), 5);
        assert_eq!(sleeper.recorded().len(), 4);
    }
}
