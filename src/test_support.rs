// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! In-memory fakes for the chain, the points API and the clock.

use crate::common::clock::Sleeper;
use crate::common::error::AppError;
use crate::domain::types::{FaucetStatus, Proxy, Session, UserPoints, VerifyStatus, Wallet};
use crate::network::chain::{CallRequest, ChainClient, ReceiptInfo, SharedChainClient};
use crate::network::points_api::{ApiAck, ApiConnector, PointsApi, SharedPointsApi};
use crate::network::provider::ChainConnector;
use alloy::consensus::Transaction as _;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy_consensus::TxEnvelope;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

const TEST_KEYS: [&str; 4] = [
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "0x7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
    "0x47e179ec197488593b187f80a00eb0da91f1b9d0b13f8733639f19c30a34926a",
];

pub fn test_wallet(index: usize) -> Wallet {
    let signer: PrivateKeySigner = TEST_KEYS[index % TEST_KEYS.len()]
        .parse()
        .expect("valid test key");
    Wallet::new(signer)
}

pub fn test_session(index: usize) -> Session {
    let address = test_wallet(index).address;
    Session {
        address,
        token: FakePointsApi::token_for(address),
        created_at: Utc::now(),
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// =============================================================================
// Sleeper
// =============================================================================

/// Returns immediately and remembers every requested duration.
#[derive(Default)]
pub struct RecordingSleeper {
    recorded: Mutex<Vec<Duration>>,
    cancel_after: Option<usize>,
}

impl RecordingSleeper {
    /// The `n`th sleep (and every later one) reports shutdown.
    pub fn cancelled_after(n: usize) -> Self {
        Self {
            recorded: Mutex::new(Vec::new()),
            cancel_after: Some(n),
        }
    }

    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.recorded).clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) -> bool {
        let mut recorded = lock(&self.recorded);
        recorded.push(duration);
        match self.cancel_after {
            Some(n) => recorded.len() < n,
            None => true,
        }
    }
}

// =============================================================================
// Chain
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentTx {
    pub hash: B256,
    pub nonce: u64,
    pub to: Address,
    pub value: U256,
    pub gas_limit: u64,
    pub input: Bytes,
}

struct ChainState {
    chain_id: u64,
    /// Next nonce the account can use; only advances over a contiguous run.
    pending_nonce: u64,
    balance: U256,
    allowance: U256,
    auto_mine: bool,
    sent: Vec<SentTx>,
    attempted_nonces: Vec<u64>,
    send_failures: VecDeque<AppError>,
    lost_replies: VecDeque<AppError>,
    gas_price_failures: VecDeque<AppError>,
    receipt_failures: VecDeque<AppError>,
    reverts: usize,
    /// nonce -> (hash, success) accepted into the pool but not yet executable.
    queued: BTreeMap<u64, (B256, bool)>,
    /// hash -> (lookups before the receipt shows up, success)
    receipts: HashMap<B256, (usize, bool)>,
    receipt_lookups: usize,
}

/// A single-account chain that mines every accepted transaction on the first
/// receipt lookup unless told otherwise. Like a real pool, a transaction
/// whose nonce leaves a gap stays queued and is never mined until the gap
/// is filled.
pub struct FakeChain {
    state: Mutex<ChainState>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self::with_chain_id(Self::CHAIN_ID)
    }
}

impl FakeChain {
    pub const CHAIN_ID: u64 = 688_688;
    pub const GAS_ESTIMATE: u64 = 150_000;
    pub const GAS_PRICE: u128 = 1_000_000_000;

    pub fn with_chain_id(chain_id: u64) -> Self {
        Self {
            state: Mutex::new(ChainState {
                chain_id,
                pending_nonce: 0,
                balance: U256::from(10u64).pow(U256::from(18u64)),
                allowance: U256::MAX,
                auto_mine: true,
                sent: Vec::new(),
                attempted_nonces: Vec::new(),
                send_failures: VecDeque::new(),
                lost_replies: VecDeque::new(),
                gas_price_failures: VecDeque::new(),
                receipt_failures: VecDeque::new(),
                reverts: 0,
                queued: BTreeMap::new(),
                receipts: HashMap::new(),
                receipt_lookups: 0,
            }),
        }
    }

    pub fn set_pending_nonce(&self, nonce: u64) {
        lock(&self.state).pending_nonce = nonce;
    }

    pub fn set_balance(&self, balance: U256) {
        lock(&self.state).balance = balance;
    }

    pub fn set_allowance(&self, allowance: U256) {
        lock(&self.state).allowance = allowance;
    }

    pub fn set_auto_mine(&self, on: bool) {
        lock(&self.state).auto_mine = on;
    }

    /// Errors returned, in order, by the next `send_raw_transaction` calls.
    /// The transaction is rejected and never reaches the pool.
    pub fn fail_next_sends(&self, errors: Vec<AppError>) {
        lock(&self.state).send_failures.extend(errors);
    }

    /// The next sends are accepted into the pool but the caller sees these
    /// errors, as when a reply is lost on the way back.
    pub fn lose_next_replies(&self, errors: Vec<AppError>) {
        lock(&self.state).lost_replies.extend(errors);
    }

    pub fn fail_next_gas_prices(&self, errors: Vec<AppError>) {
        lock(&self.state).gas_price_failures.extend(errors);
    }

    pub fn fail_next_receipt_lookups(&self, errors: Vec<AppError>) {
        lock(&self.state).receipt_failures.extend(errors);
    }

    /// The next `count` accepted transactions are mined as reverted.
    pub fn revert_next_sends(&self, count: usize) {
        lock(&self.state).reverts += count;
    }

    /// The receipt for `hash` becomes visible on lookup number `lookups`.
    pub fn mine_after(&self, hash: B256, lookups: usize, success: bool) {
        lock(&self.state)
            .receipts
            .insert(hash, (lookups.saturating_sub(1), success));
    }

    pub fn sent(&self) -> Vec<SentTx> {
        lock(&self.state).sent.clone()
    }

    pub fn attempted_nonces(&self) -> Vec<u64> {
        lock(&self.state).attempted_nonces.clone()
    }

    /// Nonces stuck in the pool behind a gap.
    pub fn queued_nonces(&self) -> Vec<u64> {
        lock(&self.state).queued.keys().copied().collect()
    }

    pub fn receipt_lookups(&self) -> usize {
        lock(&self.state).receipt_lookups
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn chain_id(&self) -> Result<u64, AppError> {
        Ok(lock(&self.state).chain_id)
    }

    async fn balance(&self, _address: Address) -> Result<U256, AppError> {
        Ok(lock(&self.state).balance)
    }

    async fn pending_nonce(&self, _address: Address) -> Result<u64, AppError> {
        Ok(lock(&self.state).pending_nonce)
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        match lock(&self.state).gas_price_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(Self::GAS_PRICE),
        }
    }

    async fn estimate_gas(&self, _request: &CallRequest) -> Result<u64, AppError> {
        Ok(Self::GAS_ESTIMATE)
    }

    /// Only `allowance` is ever read.
    async fn call(&self, _request: &CallRequest) -> Result<Bytes, AppError> {
        let allowance = lock(&self.state).allowance;
        Ok(Bytes::from(allowance.to_be_bytes::<32>().to_vec()))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, AppError> {
        let mut buf = raw;
        let envelope = TxEnvelope::decode_2718(&mut buf)
            .map_err(|e| AppError::Rpc(format!("undecodable tx: {e}")))?;

        let mut state = lock(&self.state);
        let nonce = envelope.nonce();
        state.attempted_nonces.push(nonce);
        if let Some(err) = state.send_failures.pop_front() {
            return Err(err);
        }
        if nonce < state.pending_nonce {
            return Err(AppError::Rpc(format!(
                "nonce too low: next nonce {}, tx nonce {}",
                state.pending_nonce, nonce
            )));
        }

        let hash = *envelope.tx_hash();
        let to = match envelope.kind() {
            TxKind::Call(to) => to,
            TxKind::Create => Address::ZERO,
        };
        state.sent.push(SentTx {
            hash,
            nonce,
            to,
            value: envelope.value(),
            gas_limit: envelope.gas_limit(),
            input: envelope.input().clone(),
        });
        let success = if state.reverts > 0 {
            state.reverts -= 1;
            false
        } else {
            true
        };
        state.queued.insert(nonce, (hash, success));
        loop {
            let next = state.pending_nonce;
            let Some((ready, success)) = state.queued.remove(&next) else {
                break;
            };
            state.pending_nonce = next + 1;
            if state.auto_mine {
                state.receipts.insert(ready, (0, success));
            }
        }
        match state.lost_replies.pop_front() {
            Some(err) => Err(err),
            None => Ok(hash),
        }
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<ReceiptInfo>, AppError> {
        let mut state = lock(&self.state);
        state.receipt_lookups += 1;
        if let Some(err) = state.receipt_failures.pop_front() {
            return Err(err);
        }
        let lookups = state.receipt_lookups;
        match state.receipts.get_mut(&tx_hash) {
            Some((0, success)) => Ok(Some(ReceiptInfo {
                success: *success,
                block_number: Some(lookups as u64),
            })),
            Some((remaining, _)) => {
                *remaining -= 1;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// Hands out the same `FakeChain`, failing the first dials as scripted.
pub struct FakeConnector {
    chain: Arc<FakeChain>,
    failures: Mutex<VecDeque<AppError>>,
    dials: AtomicUsize,
}

impl FakeConnector {
    pub fn new(chain: Arc<FakeChain>) -> Self {
        Self {
            chain,
            failures: Mutex::new(VecDeque::new()),
            dials: AtomicUsize::new(0),
        }
    }

    pub fn failing_with(self, errors: Vec<AppError>) -> Self {
        lock(&self.failures).extend(errors);
        self
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChainConnector for FakeConnector {
    async fn dial(
        &self,
        _endpoint: &Url,
        _proxy: Option<&Proxy>,
    ) -> Result<SharedChainClient, AppError> {
        self.dials.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = lock(&self.failures).pop_front() {
            return Err(err);
        }
        Ok(self.chain.clone())
    }
}

// =============================================================================
// Points API
// =============================================================================

struct ApiState {
    rejected_logins: HashSet<Address>,
    logins: Vec<Address>,
    verify_script: VecDeque<Result<VerifyStatus, AppError>>,
    verifications: Vec<(Address, u64, B256)>,
    faucet: FaucetStatus,
    faucet_claims: usize,
    check_in_refusal: Option<String>,
    check_ins: usize,
    profile_reads: usize,
    daily_calls: Vec<&'static str>,
}

pub struct FakePointsApi {
    state: Mutex<ApiState>,
}

impl Default for FakePointsApi {
    fn default() -> Self {
        Self {
            state: Mutex::new(ApiState {
                rejected_logins: HashSet::new(),
                logins: Vec::new(),
                verify_script: VecDeque::new(),
                verifications: Vec::new(),
                faucet: FaucetStatus::Available,
                faucet_claims: 0,
                check_in_refusal: None,
                check_ins: 0,
                profile_reads: 0,
                daily_calls: Vec::new(),
            }),
        }
    }
}

impl FakePointsApi {
    pub fn token_for(address: Address) -> String {
        format!("jwt-{address}")
    }

    pub fn reject_login(&self, address: Address) {
        lock(&self.state).rejected_logins.insert(address);
    }

    /// Responses for the next verify calls; `Verified` once exhausted.
    pub fn queue_verify(&self, responses: Vec<Result<VerifyStatus, AppError>>) {
        lock(&self.state).verify_script.extend(responses);
    }

    pub fn set_faucet(&self, status: FaucetStatus) {
        lock(&self.state).faucet = status;
    }

    pub fn refuse_check_in(&self, message: &str) {
        lock(&self.state).check_in_refusal = Some(message.to_string());
    }

    pub fn logins(&self) -> Vec<Address> {
        lock(&self.state).logins.clone()
    }

    /// `(task id, hash)` of every verify call.
    pub fn verifications(&self) -> Vec<(u64, B256)> {
        lock(&self.state)
            .verifications
            .iter()
            .map(|(_, task, hash)| (*task, *hash))
            .collect()
    }

    pub fn verifications_for(&self, address: Address) -> usize {
        lock(&self.state)
            .verifications
            .iter()
            .filter(|(a, _, _)| *a == address)
            .count()
    }

    pub fn faucet_claims(&self) -> usize {
        lock(&self.state).faucet_claims
    }

    pub fn check_ins(&self) -> usize {
        lock(&self.state).check_ins
    }

    pub fn profile_reads(&self) -> usize {
        lock(&self.state).profile_reads
    }

    /// `"check_in"` and `"faucet"` in the order they were called.
    pub fn daily_calls(&self) -> Vec<&'static str> {
        lock(&self.state).daily_calls.clone()
    }
}

#[async_trait]
impl PointsApi for FakePointsApi {
    async fn login(&self, address: Address, signature: &str) -> Result<String, AppError> {
        let mut state = lock(&self.state);
        state.logins.push(address);
        if state.rejected_logins.contains(&address) || !signature.starts_with("0x") {
            return Err(AppError::Auth("invalid signature".into()));
        }
        Ok(Self::token_for(address))
    }

    async fn profile(&self, _session: &Session) -> Result<UserPoints, AppError> {
        let mut state = lock(&self.state);
        state.profile_reads += 1;
        let earned = state.verifications.len() as i64;
        Ok(UserPoints {
            task_points: earned * 10,
            total_points: 100 + earned * 10,
        })
    }

    async fn faucet_status(&self, _session: &Session) -> Result<FaucetStatus, AppError> {
        Ok(lock(&self.state).faucet.clone())
    }

    async fn claim_faucet(&self, _session: &Session) -> Result<ApiAck, AppError> {
        let mut state = lock(&self.state);
        state.faucet_claims += 1;
        state.daily_calls.push("faucet");
        Ok(ApiAck {
            ok: true,
            message: "ok".into(),
        })
    }

    async fn check_in(&self, _session: &Session) -> Result<ApiAck, AppError> {
        let mut state = lock(&self.state);
        state.check_ins += 1;
        state.daily_calls.push("check_in");
        Ok(match &state.check_in_refusal {
            Some(msg) => ApiAck {
                ok: false,
                message: msg.clone(),
            },
            None => ApiAck {
                ok: true,
                message: "ok".into(),
            },
        })
    }

    async fn verify_task(
        &self,
        session: &Session,
        task_id: u64,
        tx_hash: B256,
    ) -> Result<VerifyStatus, AppError> {
        let mut state = lock(&self.state);
        state.verifications.push((session.address, task_id, tx_hash));
        state
            .verify_script
            .pop_front()
            .unwrap_or(Ok(VerifyStatus::Verified))
    }
}

/// Always returns the same shared `FakePointsApi`.
pub struct FakeApiConnector {
    api: Arc<FakePointsApi>,
}

impl FakeApiConnector {
    pub fn new(api: Arc<FakePointsApi>) -> Self {
        Self { api }
    }
}

impl ApiConnector for FakeApiConnector {
    fn connect(&self, _proxy: Option<&Proxy>) -> Result<SharedPointsApi, AppError> {
        Ok(self.api.clone())
    }
}
