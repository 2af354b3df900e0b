// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::domain::types::PendingOperation;
use alloy::consensus::{SignableTransaction, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{Ethereum, ReceiptResponse, TxSignerSync};
use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::eth::{TransactionInput, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy_consensus::TxEnvelope;
use async_trait::async_trait;
use std::sync::Arc;

pub type HttpProvider = RootProvider<Ethereum>;

/// Read-only call shape used for `eth_call` and `eth_estimateGas`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

impl CallRequest {
    fn into_rpc(self) -> TransactionRequest {
        TransactionRequest {
            from: Some(self.from),
            to: Some(TxKind::Call(self.to)),
            value: Some(self.value),
            input: TransactionInput::new(self.input),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptInfo {
    pub success: bool,
    pub block_number: Option<u64>,
}

/// The slice of the JSON-RPC surface the orchestrator touches.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, AppError>;
    async fn balance(&self, address: Address) -> Result<U256, AppError>;
    async fn pending_nonce(&self, address: Address) -> Result<u64, AppError>;
    async fn gas_price(&self) -> Result<u128, AppError>;
    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, AppError>;
    async fn call(&self, request: &CallRequest) -> Result<Bytes, AppError>;
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, AppError>;
    /// `Ok(None)` while the transaction is not yet mined.
    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<ReceiptInfo>, AppError>;
}

pub type SharedChainClient = Arc<dyn ChainClient>;

#[derive(Clone)]
pub struct RpcChainClient {
    provider: HttpProvider,
}

impl RpcChainClient {
    pub fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn chain_id(&self) -> Result<u64, AppError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| AppError::from_rpc("eth_chainId", e))
    }

    async fn balance(&self, address: Address) -> Result<U256, AppError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| AppError::from_rpc("eth_getBalance", e))
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, AppError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| AppError::from_rpc("eth_getTransactionCount", e))
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| AppError::from_rpc("eth_gasPrice", e))
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, AppError> {
        self.provider
            .estimate_gas(request.clone().into_rpc())
            .await
            .map_err(|e| AppError::from_rpc("eth_estimateGas", e))
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, AppError> {
        self.provider
            .call(request.clone().into_rpc())
            .await
            .map_err(|e| AppError::from_rpc("eth_call", e))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, AppError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| AppError::from_rpc("eth_sendRawTransaction", e))?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<ReceiptInfo>, AppError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| AppError::from_rpc("eth_getTransactionReceipt", e))?;
        Ok(receipt.map(|r| ReceiptInfo {
            success: r.status(),
            block_number: r.block_number,
        }))
    }
}

/// Sign a legacy (gas-price) transaction for `op`. Returns the EIP-2718
/// encoding and its hash.
pub fn sign_legacy_transaction(
    signer: &PrivateKeySigner,
    chain_id: u64,
    op: &PendingOperation,
    gas_price: u128,
    gas_limit: u64,
) -> Result<(Vec<u8>, B256), AppError> {
    let mut tx = TxLegacy {
        chain_id: Some(chain_id),
        nonce: op.nonce,
        gas_price,
        gas_limit,
        to: TxKind::Call(op.payload.to),
        value: op.payload.value,
        input: op.payload.input.clone(),
    };

    let sig = TxSignerSync::sign_transaction_sync(signer, &mut tx)
        .map_err(|e| AppError::Transaction {
            hash: "unsigned".into(),
            reason: format!("Sign tx failed: {}", e),
        })?;
    let signed: TxEnvelope = tx.into_signed(sig).into();
    let raw = signed.encoded_2718();
    Ok((raw, *signed.tx_hash()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ActionKind, CallPayload, OperationKind};
    use alloy::consensus::Transaction as _;
    use alloy::eips::eip2718::Decodable2718;

    #[test]
    fn signed_legacy_tx_round_trips_nonce_and_chain() {
        let signer: PrivateKeySigner =
            "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
                .parse()
                .expect("key");
        let op = PendingOperation {
            kind: OperationKind::Action(ActionKind::Transfer),
            payload: CallPayload {
                to: Address::repeat_byte(0x11),
                value: U256::from(1_000u64),
                input: Bytes::new(),
                gas_limit: Some(21_000),
            },
            nonce: 42,
        };

        let (raw, hash) =
            sign_legacy_transaction(&signer, 688_688, &op, 1_000_000_000, 21_000).expect("sign");
        let decoded = TxEnvelope::decode_2718(&mut raw.as_slice()).expect("decode");

        assert_eq!(*decoded.tx_hash(), hash);
        assert_eq!(decoded.nonce(), 42);
        assert_eq!(decoded.chain_id(), Some(688_688));
        assert_eq!(decoded.gas_limit(), 21_000);
        assert_eq!(decoded.value(), U256::from(1_000u64));
    }
}
