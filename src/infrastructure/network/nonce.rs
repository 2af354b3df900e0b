// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::network::chain::SharedChainClient;
use alloy::primitives::Address;
use tokio::sync::Mutex;

/// Per-wallet-pass nonce high-water mark.
///
/// Every draw returns `max(chain pending count, last drawn + 1)`, so a
/// submission that failed never has its nonce handed out again. The lock is
/// held across the chain read, which keeps draws for one wallet serialized.
pub struct NonceManager {
    client: SharedChainClient,
    address: Address,
    last_drawn: Mutex<Option<u64>>,
}

impl NonceManager {
    pub fn new(client: SharedChainClient, address: Address) -> Self {
        Self {
            client,
            address,
            last_drawn: Mutex::new(None),
        }
    }

    pub async fn next_nonce(&self) -> Result<u64, AppError> {
        let mut last = self.last_drawn.lock().await;
        let on_chain = self.client.pending_nonce(self.address).await?;
        let nonce = match *last {
            Some(prev) => on_chain.max(prev + 1),
            None => on_chain,
        };
        *last = Some(nonce);
        tracing::trace!(target: "nonce", address = %self.address, on_chain, nonce, "Drew nonce");
        Ok(nonce)
    }

    pub async fn last_drawn(&self) -> Option<u64> {
        *self.last_drawn.lock().await
    }
}
