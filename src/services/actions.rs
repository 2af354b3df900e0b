// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::app::policy::{ActionPolicy, RetrySettings};
use crate::common::clock::{Sleeper, current_unix};
use crate::common::constants::{
    ADD_LIQUIDITY_DEADLINE_SECS, ADD_LIQUIDITY_GAS_LIMIT, APPROVE_GAS_LIMIT,
    GAS_ESTIMATE_MULTIPLIER_BPS, NATIVE_SYMBOL, SWAP_DEADLINE_SECS, TRANSFER_GAS_LIMIT,
};
use crate::common::error::AppError;
use crate::common::retry::retry_transient;
use crate::data::abi::{IERC20, INonfungiblePositionManager, ISwapRouter02};
use crate::domain::types::{
    ActionKind, ActionOutcome, CallPayload, OperationKind, PendingOperation, Wallet,
};
use crate::network::chain::{CallRequest, SharedChainClient, sign_legacy_transaction};
use crate::network::nonce::NonceManager;
use crate::network::receipt::ReceiptWaiter;
use alloy::primitives::aliases::{I24, U24};
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, B256, Bytes, U160, U256};
use alloy_sol_types::SolCall;
use rand::Rng;
use rand::rngs::StdRng;
use std::future::Future;
use std::sync::Arc;

/// Everything an operation needs to know about the wallet it runs for.
pub struct WalletContext<'a> {
    pub wallet: &'a Wallet,
    pub client: SharedChainClient,
    pub nonces: NonceManager,
    /// Zero-based.
    pub wallet_index: usize,
    pub wallet_total: usize,
}

impl<'a> WalletContext<'a> {
    pub fn new(
        wallet: &'a Wallet,
        client: SharedChainClient,
        wallet_index: usize,
        wallet_total: usize,
    ) -> Self {
        let nonces = NonceManager::new(client.clone(), wallet.address);
        Self {
            wallet,
            client,
            nonces,
            wallet_index,
            wallet_total,
        }
    }
}

/// Position of an operation inside its action group. Zero-based index.
#[derive(Clone, Copy, Debug)]
pub struct ActionSlot {
    pub index: u32,
    pub total: u32,
}

struct Attempt {
    outcome: ActionOutcome,
    detail: String,
}

impl Attempt {
    fn new(outcome: ActionOutcome, detail: impl Into<String>) -> Self {
        Self {
            outcome,
            detail: detail.into(),
        }
    }
}

fn random_address(rng: &mut StdRng) -> Address {
    let mut bytes = [0u8; 20];
    rng.fill(&mut bytes);
    Address::from(bytes)
}

fn with_headroom(estimate: u64) -> u64 {
    estimate.saturating_mul(GAS_ESTIMATE_MULTIPLIER_BPS) / 10_000
}

fn fee_tier(field: &str, fee: u32) -> Result<U24, AppError> {
    U24::try_from(fee).map_err(|e| AppError::Validation {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn deadline_in(secs: u64) -> U256 {
    U256::from(current_unix() + secs)
}

pub struct ActionExecutor {
    policy: ActionPolicy,
    retry: RetrySettings,
    receipts: ReceiptWaiter,
    sleeper: Arc<dyn Sleeper>,
}

impl ActionExecutor {
    pub fn new(
        policy: ActionPolicy,
        retry: RetrySettings,
        receipts: ReceiptWaiter,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            policy,
            retry,
            receipts,
            sleeper,
        }
    }

    /// Run one operation. Never fails: errors become `ActionOutcome::Failed`.
    /// Emits exactly one progress line.
    pub async fn run(
        &self,
        kind: ActionKind,
        ctx: &WalletContext<'_>,
        slot: ActionSlot,
        rng: &mut StdRng,
    ) -> ActionOutcome {
        let attempt = match kind {
            ActionKind::Transfer => self.transfer(ctx, rng).await,
            ActionKind::Swap => self.swap(ctx, rng).await,
            ActionKind::AddLiquidity => self.add_liquidity(ctx, rng).await,
        };
        let Attempt { outcome, detail } = attempt.unwrap_or_else(|e| {
            Attempt::new(
                ActionOutcome::Failed {
                    reason: e.to_string(),
                    tx_hash: None,
                },
                "",
            )
        });

        let wallet = format!("{}/{}", ctx.wallet_index + 1, ctx.wallet_total);
        let action = format!("{}/{}", slot.index + 1, slot.total);
        match &outcome {
            ActionOutcome::Confirmed(r) if r.success != Some(false) => tracing::info!(
                target: "action",
                wallet = %wallet,
                action = %action,
                kind = %kind,
                outcome = outcome.label(),
                tx = %r.tx_hash,
                block = ?r.block_number,
                "{detail}"
            ),
            ActionOutcome::Confirmed(r) | ActionOutcome::Unconfirmed(r) => tracing::warn!(
                target: "action",
                wallet = %wallet,
                action = %action,
                kind = %kind,
                outcome = outcome.label(),
                tx = %r.tx_hash,
                "{detail}"
            ),
            ActionOutcome::Skipped { reason } | ActionOutcome::Failed { reason, .. } => tracing::warn!(
                target: "action",
                wallet = %wallet,
                action = %action,
                kind = %kind,
                outcome = outcome.label(),
                reason = %reason,
                "{detail}"
            ),
        }
        outcome
    }

    async fn transfer(
        &self,
        ctx: &WalletContext<'_>,
        rng: &mut StdRng,
    ) -> Result<Attempt, AppError> {
        let amount = self.policy.transfer_amount;
        let recipient = random_address(rng);
        let detail = format!("Transfer {} {} to {}", format_ether(amount), NATIVE_SYMBOL, recipient);

        if let Some(skip) = self.check_balance(ctx, amount).await? {
            return Ok(Attempt::new(skip, detail));
        }
        let payload = CallPayload {
            to: recipient,
            value: amount,
            input: Bytes::new(),
            gas_limit: Some(TRANSFER_GAS_LIMIT),
        };
        let outcome = self
            .submit_and_confirm(ctx, OperationKind::Action(ActionKind::Transfer), payload)
            .await?;
        Ok(Attempt::new(outcome, detail))
    }

    async fn swap(&self, ctx: &WalletContext<'_>, rng: &mut StdRng) -> Result<Attempt, AppError> {
        let token = self
            .policy
            .pick_stable(rng)
            .cloned()
            .ok_or_else(|| AppError::Config("No stable tokens configured".into()))?;
        let amount = self.policy.draw_swap_amount(rng);
        let detail = format!(
            "Swap {} {} -> {}",
            format_ether(amount),
            NATIVE_SYMBOL,
            token.symbol
        );

        if let Some(skip) = self.check_balance(ctx, amount).await? {
            return Ok(Attempt::new(skip, detail));
        }

        let inner = ISwapRouter02::exactInputSingleCall {
            params: ISwapRouter02::ExactInputSingleParams {
                tokenIn: self.policy.wrapped_native,
                tokenOut: token.address,
                fee: fee_tier("swap_fee", self.policy.swap_fee)?,
                recipient: ctx.wallet.address,
                amountIn: amount,
                amountOutMinimum: U256::ZERO,
                sqrtPriceLimitX96: U160::ZERO,
            },
        }
        .abi_encode();
        let input = ISwapRouter02::multicallCall {
            deadline: deadline_in(SWAP_DEADLINE_SECS),
            data: vec![Bytes::from(inner)],
        }
        .abi_encode();

        let payload = CallPayload {
            to: self.policy.swap_router,
            value: amount,
            input: Bytes::from(input),
            gas_limit: None,
        };
        let outcome = self
            .submit_and_confirm(ctx, OperationKind::Action(ActionKind::Swap), payload)
            .await?;
        Ok(Attempt::new(outcome, detail))
    }

    async fn add_liquidity(
        &self,
        ctx: &WalletContext<'_>,
        rng: &mut StdRng,
    ) -> Result<Attempt, AppError> {
        let token = self
            .policy
            .pick_stable(rng)
            .cloned()
            .ok_or_else(|| AppError::Config("No stable tokens configured".into()))?;
        let detail = format!("Add liquidity {}/{}", NATIVE_SYMBOL, token.symbol);
        let manager = self.policy.position_manager;

        self.ensure_approval(
            ctx,
            self.policy.wrapped_native,
            manager,
            self.policy.lp_amount0_desired,
        )
        .await?;
        self.ensure_approval(ctx, token.address, manager, self.policy.lp_amount1_desired)
            .await?;

        let tick = |field: &str, v: i32| {
            I24::try_from(v).map_err(|e| AppError::Validation {
                field: field.to_string(),
                message: e.to_string(),
            })
        };
        let mint = INonfungiblePositionManager::mintCall {
            params: INonfungiblePositionManager::MintParams {
                token0: self.policy.wrapped_native,
                token1: token.address,
                fee: fee_tier("lp_fee", self.policy.lp_fee)?,
                tickLower: tick("lp_tick_lower", self.policy.lp_tick_lower)?,
                tickUpper: tick("lp_tick_upper", self.policy.lp_tick_upper)?,
                amount0Desired: self.policy.lp_amount0_desired,
                amount1Desired: self.policy.lp_amount1_desired,
                amount0Min: U256::ZERO,
                amount1Min: U256::ZERO,
                recipient: ctx.wallet.address,
                deadline: deadline_in(ADD_LIQUIDITY_DEADLINE_SECS),
            },
        }
        .abi_encode();
        let refund = INonfungiblePositionManager::refundETHCall {}.abi_encode();
        let input = INonfungiblePositionManager::multicallCall {
            data: vec![Bytes::from(mint), Bytes::from(refund)],
        }
        .abi_encode();

        let payload = CallPayload {
            to: manager,
            value: self.policy.lp_value,
            input: Bytes::from(input),
            gas_limit: Some(ADD_LIQUIDITY_GAS_LIMIT),
        };
        let outcome = self
            .submit_and_confirm(
                ctx,
                OperationKind::Action(ActionKind::AddLiquidity),
                payload,
            )
            .await?;
        Ok(Attempt::new(outcome, detail))
    }

    /// Read `allowance` and approve `spender` for the max amount only when it
    /// falls short of `required`.
    pub async fn ensure_approval(
        &self,
        ctx: &WalletContext<'_>,
        token: Address,
        spender: Address,
        required: U256,
    ) -> Result<(), AppError> {
        let owner = ctx.wallet.address;
        let request = CallRequest {
            from: owner,
            to: token,
            value: U256::ZERO,
            input: Bytes::from(IERC20::allowanceCall { owner, spender }.abi_encode()),
        };
        let request = &request;
        let client = &ctx.client;
        let raw = self.read(move || client.call(request)).await?;
        let allowance = IERC20::allowanceCall::abi_decode_returns(&raw)
            .map_err(|e| AppError::Rpc(format!("allowance decode failed for {}: {}", token, e)))?;
        if allowance >= required {
            return Ok(());
        }

        tracing::debug!(target: "action", %token, %spender, %allowance, "Approving spender");
        let payload = CallPayload {
            to: token,
            value: U256::ZERO,
            input: Bytes::from(
                IERC20::approveCall {
                    spender,
                    amount: U256::MAX,
                }
                .abi_encode(),
            ),
            gas_limit: Some(APPROVE_GAS_LIMIT),
        };
        match self
            .submit_and_confirm(ctx, OperationKind::Approval, payload)
            .await?
        {
            ActionOutcome::Confirmed(r) if r.success != Some(false) => {
                tracing::info!(target: "action", %token, %spender, tx = %r.tx_hash, "Approval confirmed");
                Ok(())
            }
            other => Err(AppError::Transaction {
                hash: other.tx_hash().map(|h| h.to_string()).unwrap_or_default(),
                reason: format!("approval for {} {}", token, other.label()),
            }),
        }
    }

    /// Submit `payload` under a freshly drawn nonce and wait for its receipt.
    /// Transient submission failures retry with a new nonce each time. Gas is
    /// priced before the loop so only the broadcast can fail after a draw.
    pub async fn submit_and_confirm(
        &self,
        ctx: &WalletContext<'_>,
        kind: OperationKind,
        payload: CallPayload,
    ) -> Result<ActionOutcome, AppError> {
        let gas_limit = match payload.gas_limit {
            Some(limit) => limit,
            None => {
                let request = CallRequest {
                    from: ctx.wallet.address,
                    to: payload.to,
                    value: payload.value,
                    input: payload.input.clone(),
                };
                let request = &request;
                let client = &ctx.client;
                with_headroom(self.read(move || client.estimate_gas(request)).await?)
            }
        };

        let client = &ctx.client;
        let gas_price = self.read(move || client.gas_price()).await?;

        let payload = &payload;
        let tx_hash = retry_transient(
            move |attempt| self.submit_once(ctx, kind, payload, gas_limit, gas_price, attempt),
            self.retry.submit,
            self.sleeper.as_ref(),
        )
        .await?;

        match self.receipts.await_receipt(ctx.client.as_ref(), tx_hash).await {
            Ok(receipt) if receipt.confirmed => Ok(ActionOutcome::Confirmed(receipt)),
            Ok(receipt) => Ok(ActionOutcome::Unconfirmed(receipt)),
            Err(e) => {
                tracing::warn!(target: "action", tx = %tx_hash, error = %e, "Receipt lookup failed");
                Ok(ActionOutcome::Failed {
                    reason: format!("receipt lookup failed: {e}"),
                    tx_hash: Some(tx_hash),
                })
            }
        }
    }

    async fn submit_once(
        &self,
        ctx: &WalletContext<'_>,
        kind: OperationKind,
        payload: &CallPayload,
        gas_limit: u64,
        gas_price: u128,
        attempt: usize,
    ) -> Result<B256, AppError> {
        let nonce = ctx.nonces.next_nonce().await?;
        let op = PendingOperation {
            kind,
            payload: payload.clone(),
            nonce,
        };
        let (raw, local_hash) = sign_legacy_transaction(
            ctx.wallet.signer(),
            self.policy.chain_id,
            &op,
            gas_price,
            gas_limit,
        )?;
        tracing::debug!(
            target: "action",
            %kind,
            nonce,
            gas_limit,
            gas_price,
            attempt,
            tx = %local_hash,
            "Submitting transaction"
        );
        ctx.client.send_raw_transaction(&raw).await
    }

    /// `Some(Skipped)` when the wallet cannot cover `amount`.
    async fn check_balance(
        &self,
        ctx: &WalletContext<'_>,
        amount: U256,
    ) -> Result<Option<ActionOutcome>, AppError> {
        let client = &ctx.client;
        let address = ctx.wallet.address;
        let balance = self.read(move || client.balance(address)).await?;
        if balance < amount {
            return Ok(Some(ActionOutcome::Skipped {
                reason: format!(
                    "insufficient balance: {} {} available, {} required",
                    format_ether(balance),
                    NATIVE_SYMBOL,
                    format_ether(amount)
                ),
            }));
        }
        Ok(None)
    }

    async fn read<T, F, Fut>(&self, mut op: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        retry_transient(move |_| op(), self.retry.read, self.sleeper.as_ref()).await
    }
}
