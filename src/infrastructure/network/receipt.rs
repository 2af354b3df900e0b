// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::clock::Sleeper;
use crate::common::error::AppError;
use crate::common::retry::RetryPolicy;
use crate::domain::types::Receipt;
use crate::network::chain::ChainClient;
use alloy::primitives::B256;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReceiptWaiter {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ReceiptWaiter {
    pub fn new(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    /// Poll until the receipt shows up. Running out of attempts is not an
    /// error: the result is simply `confirmed = false`.
    pub async fn await_receipt(
        &self,
        client: &dyn ChainClient,
        tx_hash: B256,
    ) -> Result<Receipt, AppError> {
        let attempts = self.policy.attempts.max(1);
        for attempt in 1..=attempts {
            match client.transaction_receipt(tx_hash).await {
                Ok(Some(info)) => {
                    tracing::debug!(
                        target: "receipt",
                        tx = %tx_hash,
                        attempt,
                        block = ?info.block_number,
                        success = info.success,
                        "Receipt found"
                    );
                    return Ok(Receipt {
                        tx_hash,
                        confirmed: true,
                        success: Some(info.success),
                        block_number: info.block_number,
                    });
                }
                Ok(None) => {
                    tracing::trace!(target: "receipt", tx = %tx_hash, attempt, "Receipt not yet available");
                }
                Err(e) if e.is_transient() => {
                    tracing::debug!(target: "receipt", tx = %tx_hash, attempt, error = %e, "Transient receipt lookup failure");
                }
                Err(e) => return Err(e),
            }

            if attempt < attempts && !self.sleeper.sleep(self.policy.delay).await {
                break;
            }
        }

        tracing::warn!(
            target: "receipt",
            tx = %tx_hash,
            attempts,
            "Transaction not confirmed within polling window"
        );
        Ok(Receipt::unconfirmed(tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeChain, RecordingSleeper};
    use std::time::Duration;

    fn waiter(sleeper: Arc<RecordingSleeper>) -> ReceiptWaiter {
        ReceiptWaiter::new(RetryPolicy::new(5, Duration::from_secs(2)), sleeper)
    }

    #[tokio::test]
    async fn confirmed_when_receipt_appears_within_window() {
        let chain = FakeChain::default();
        let hash = B256::repeat_byte(0xaa);
        chain.mine_after(hash, 3, true);
        let sleeper = Arc::new(RecordingSleeper::default());

        let receipt = waiter(sleeper.clone())
            .await_receipt(&chain, hash)
            .await
            .expect("receipt");

        assert!(receipt.confirmed);
        assert_eq!(receipt.success, Some(true));
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(2); 2]);
    }

    #[tokio::test]
    async fn unconfirmed_after_exhausting_attempts() {
        let chain = FakeChain::default();
        let hash = B256::repeat_byte(0xbb);
        let sleeper = Arc::new(RecordingSleeper::default());

        let receipt = waiter(sleeper.clone())
            .await_receipt(&chain, hash)
            .await
            .expect("never an error");

        assert_eq!(receipt, Receipt::unconfirmed(hash));
        assert_eq!(chain.receipt_lookups(), 5);
        assert_eq!(sleeper.recorded().len(), 4);
    }

    #[tokio::test]
    async fn reverted_receipt_is_confirmed_with_failure_status() {
        let chain = FakeChain::default();
        let hash = B256::repeat_byte(0xcc);
        chain.mine_after(hash, 1, false);

        let receipt = waiter(Arc::new(RecordingSleeper::default()))
            .await_receipt(&chain, hash)
            .await
            .expect("receipt");
        assert!(receipt.confirmed);
        assert_eq!(receipt.success, Some(false));
    }

    #[tokio::test]
    async fn transient_lookup_failure_keeps_polling() {
        let chain = FakeChain::default();
        let hash = B256::repeat_byte(0xdd);
        chain.mine_after(hash, 2, true);
        chain.fail_next_receipt_lookups(vec![AppError::Transient("429 Too Many Requests".into())]);
        let sleeper = Arc::new(RecordingSleeper::default());

        let receipt = waiter(sleeper.clone())
            .await_receipt(&chain, hash)
            .await
            .expect("receipt");

        assert!(receipt.confirmed);
        assert_eq!(chain.receipt_lookups(), 3);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(2); 2]);
    }

    #[tokio::test]
    async fn fatal_lookup_error_propagates_immediately() {
        let chain = FakeChain::default();
        let hash = B256::repeat_byte(0xee);
        chain.mine_after(hash, 1, true);
        chain.fail_next_receipt_lookups(vec![AppError::Rpc("method not found".into())]);
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = waiter(sleeper.clone())
            .await_receipt(&chain, hash)
            .await
            .expect_err("fatal error must surface");

        assert!(matches!(err, AppError::Rpc(_)));
        assert_eq!(chain.receipt_lookups(), 1);
        assert!(sleeper.recorded().is_empty());
    }
}
