// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::clock::Sleeper;
use crate::common::constants::USER_AGENTS;
use crate::common::error::AppError;
use crate::common::retry::{RetryPolicy, retry_transient};
use crate::domain::types::Proxy;
use crate::network::chain::{HttpProvider, RpcChainClient, SharedChainClient};
use alloy::providers::RootProvider;
use alloy_rpc_client::RpcClient;
use alloy_transport_http::Http;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Mozilla/5.0")
}

/// Opens a chain client for an endpoint, optionally through a proxy.
#[async_trait]
pub trait ChainConnector: Send + Sync {
    async fn dial(&self, endpoint: &Url, proxy: Option<&Proxy>)
    -> Result<SharedChainClient, AppError>;
}

pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ChainConnector for HttpConnector {
    async fn dial(
        &self,
        endpoint: &Url,
        proxy: Option<&Proxy>,
    ) -> Result<SharedChainClient, AppError> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(random_user_agent());
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| AppError::Initialization(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {}", e)))?;

        let transport = Http::with_client(client, endpoint.clone());
        let provider: HttpProvider = RootProvider::new(RpcClient::new(transport, false));
        Ok(Arc::new(RpcChainClient::new(provider)))
    }
}

/// Dials the chain endpoint and probes `eth_chainId` with bounded retry on
/// transient failures.
pub struct ProviderFactory {
    connector: Arc<dyn ChainConnector>,
    endpoint: Url,
    expected_chain_id: u64,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ProviderFactory {
    pub fn new(
        connector: Arc<dyn ChainConnector>,
        endpoint: Url,
        expected_chain_id: u64,
        retry: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            connector,
            endpoint,
            expected_chain_id,
            retry,
            sleeper,
        }
    }

    /// `Config` on a chain-id mismatch; `Connection` for everything else
    /// that survives the retry budget.
    pub async fn acquire(&self, proxy: Option<&Proxy>) -> Result<SharedChainClient, AppError> {
        let this = self;
        let result = retry_transient(
            move |attempt| this.dial_and_probe(attempt, proxy),
            self.retry,
            self.sleeper.as_ref(),
        )
        .await;

        match result {
            Ok(client) => Ok(client),
            Err(e @ AppError::Config(_)) => Err(e),
            Err(e) => {
                tracing::warn!(
                    target: "provider",
                    endpoint = %self.endpoint,
                    error = %e,
                    "Provider unavailable"
                );
                Err(AppError::Connection(format!("{}: {}", self.endpoint, e)))
            }
        }
    }

    async fn dial_and_probe(
        &self,
        attempt: usize,
        proxy: Option<&Proxy>,
    ) -> Result<SharedChainClient, AppError> {
        tracing::debug!(
            target: "provider",
            attempt,
            proxied = proxy.is_some(),
            "Dialing chain endpoint"
        );
        let client = self.connector.dial(&self.endpoint, proxy).await?;
        let chain_id = client.chain_id().await?;
        if chain_id != self.expected_chain_id {
            return Err(AppError::Config(format!(
                "Chain id mismatch: endpoint reports {}, expected {}",
                chain_id, self.expected_chain_id
            )));
        }
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeChain, FakeConnector, RecordingSleeper};

    fn factory(connector: Arc<FakeConnector>, sleeper: Arc<RecordingSleeper>) -> ProviderFactory {
        ProviderFactory::new(
            connector,
            Url::parse("http://localhost:8545").expect("url"),
            FakeChain::CHAIN_ID,
            RetryPolicy::new(3, Duration::from_secs(2)),
            sleeper,
        )
    }

    #[tokio::test]
    async fn transient_twice_then_success_takes_three_attempts() {
        let chain = Arc::new(FakeChain::default());
        let connector = Arc::new(FakeConnector::new(chain).failing_with(vec![
            AppError::Transient("429 Too Many Requests".into()),
            AppError::Transient("Unable to complete request at this time".into()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let client = factory(connector.clone(), sleeper.clone())
            .acquire(None)
            .await
            .expect("acquire");

        assert_eq!(client.chain_id().await.expect("chain id"), FakeChain::CHAIN_ID);
        assert_eq!(connector.dials(), 3);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(2); 2]);
    }

    #[tokio::test]
    async fn non_transient_failure_is_a_connection_error_without_retry() {
        let chain = Arc::new(FakeChain::default());
        let connector = Arc::new(
            FakeConnector::new(chain).failing_with(vec![AppError::Rpc("invalid api key".into())]),
        );
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = factory(connector.clone(), sleeper.clone())
            .acquire(None)
            .await
            .err()
            .expect("must fail");

        assert!(matches!(err, AppError::Connection(_)));
        assert_eq!(connector.dials(), 1);
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn exhausted_transient_budget_is_a_connection_error() {
        let chain = Arc::new(FakeChain::default());
        let connector = Arc::new(FakeConnector::new(chain).failing_with(vec![
            AppError::Transient("503".into()),
            AppError::Transient("503".into()),
            AppError::Transient("503".into()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = factory(connector.clone(), sleeper)
            .acquire(None)
            .await
            .err()
            .expect("must fail");

        assert!(matches!(err, AppError::Connection(_)));
        assert_eq!(connector.dials(), 3);
    }

    #[tokio::test]
    async fn chain_id_mismatch_is_a_config_error() {
        let chain = Arc::new(FakeChain::with_chain_id(1));
        let connector = Arc::new(FakeConnector::new(chain));
        let err = factory(connector, Arc::new(RecordingSleeper::default()))
            .acquire(None)
            .await
            .err()
            .expect("must fail");
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn user_agent_comes_from_browser_pool() {
        assert!(USER_AGENTS.contains(&random_user_agent()));
    }
}
