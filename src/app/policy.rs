// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Immutable policy values handed to the orchestrator at construction.
//! `GlobalSettings` converts into these; nothing downstream reads config.

use crate::common::retry::RetryPolicy;
use crate::domain::constants;
use crate::domain::types::ActionKind;
use alloy::primitives::{Address, U256};
use rand::Rng;
use std::time::Duration;

/// Per-wallet scheduling policy. The two historical generations of the bot
/// differ only in these values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunPolicy {
    pub transfer_count: u32,
    pub swap_count: u32,
    pub add_liquidity_count: u32,
    pub randomize_order: bool,
    pub check_in_first: bool,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            transfer_count: 30,
            swap_count: 30,
            add_liquidity_count: 30,
            randomize_order: true,
            check_in_first: true,
            jitter_min: Duration::from_secs(2),
            jitter_max: Duration::from_secs(5),
        }
    }
}

impl RunPolicy {
    pub fn quota(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::Transfer => self.transfer_count,
            ActionKind::Swap => self.swap_count,
            ActionKind::AddLiquidity => self.add_liquidity_count,
        }
    }

    pub fn draw_jitter<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let lo = self.jitter_min.as_millis() as u64;
        let hi = self.jitter_max.as_millis() as u64;
        if hi <= lo {
            return self.jitter_min;
        }
        Duration::from_millis(rng.gen_range(lo..=hi))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CyclePolicy {
    pub cooldown: Duration,
    /// Wait before re-running a wallet whose provider could not be acquired.
    pub outer_retry_delay: Duration,
    /// `None` runs forever.
    pub max_cycles: Option<u64>,
    pub render_countdown: bool,
}

impl Default for CyclePolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(24 * 60 * 60),
            outer_retry_delay: Duration::from_secs(30),
            max_cycles: None,
            render_countdown: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetrySettings {
    pub provider: RetryPolicy,
    pub receipt: RetryPolicy,
    pub submit: RetryPolicy,
    pub read: RetryPolicy,
    pub verify: RetryPolicy,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            provider: RetryPolicy::new(3, Duration::from_secs(2)),
            receipt: RetryPolicy::new(30, Duration::from_secs(2)),
            submit: RetryPolicy::new(3, Duration::from_secs(1)),
            read: RetryPolicy::new(3, Duration::from_millis(500)),
            verify: RetryPolicy::new(5, Duration::from_secs(5)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskIds {
    pub transfer: u64,
    pub swap: u64,
    pub add_liquidity: u64,
}

impl Default for TaskIds {
    fn default() -> Self {
        Self {
            transfer: constants::TASK_ID_TRANSFER,
            swap: constants::TASK_ID_SWAP,
            add_liquidity: constants::TASK_ID_ADD_LIQUIDITY,
        }
    }
}

impl TaskIds {
    pub fn for_kind(&self, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::Transfer => self.transfer,
            ActionKind::Swap => self.swap,
            ActionKind::AddLiquidity => self.add_liquidity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StableToken {
    pub symbol: String,
    pub address: Address,
}

/// Contract addresses and the fixed amounts each operation submits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionPolicy {
    pub chain_id: u64,
    pub wrapped_native: Address,
    pub swap_router: Address,
    pub position_manager: Address,
    pub stable_tokens: Vec<StableToken>,
    pub transfer_amount: U256,
    pub swap_amount_min: U256,
    pub swap_amount_max: U256,
    /// Swap amounts are multiples of this many wei.
    pub swap_amount_step: U256,
    pub swap_fee: u32,
    pub lp_fee: u32,
    pub lp_tick_lower: i32,
    pub lp_tick_upper: i32,
    pub lp_amount0_desired: U256,
    pub lp_amount1_desired: U256,
    pub lp_value: U256,
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self {
            chain_id: constants::DEFAULT_CHAIN_ID,
            wrapped_native: constants::WRAPPED_NATIVE,
            swap_router: constants::SWAP_ROUTER,
            position_manager: constants::POSITION_MANAGER,
            stable_tokens: vec![
                StableToken {
                    symbol: "USDC".into(),
                    address: constants::USDC,
                },
                StableToken {
                    symbol: "USDT".into(),
                    address: constants::USDT,
                },
            ],
            // 0.000001 native
            transfer_amount: U256::from(1_000_000_000_000u64),
            // 0.0001 .. 0.0009 native in 0.0001 steps
            swap_amount_min: U256::from(100_000_000_000_000u64),
            swap_amount_max: U256::from(900_000_000_000_000u64),
            swap_amount_step: U256::from(100_000_000_000_000u64),
            swap_fee: 3_000,
            lp_fee: 500,
            lp_tick_lower: 51_530,
            lp_tick_upper: 51_550,
            lp_amount0_desired: U256::from(100_000_000_000u64),
            lp_amount1_desired: U256::from(8_779_257_879_444u64),
            // 0.0000001 native
            lp_value: U256::from(100_000_000_000u64),
        }
    }
}

impl ActionPolicy {
    /// Uniform draw over the step grid inside `[swap_amount_min, swap_amount_max]`.
    pub fn draw_swap_amount<R: Rng + ?Sized>(&self, rng: &mut R) -> U256 {
        let step = if self.swap_amount_step.is_zero() {
            U256::from(1u64)
        } else {
            self.swap_amount_step
        };
        let lo = self.swap_amount_min.div_ceil(step);
        let hi = self.swap_amount_max / step;
        if hi <= lo {
            return self.swap_amount_min;
        }
        let lo_ticks: u64 = lo.saturating_to();
        let hi_ticks: u64 = hi.saturating_to();
        U256::from(rng.gen_range(lo_ticks..=hi_ticks)) * step
    }

    pub fn pick_stable<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&StableToken> {
        if self.stable_tokens.is_empty() {
            return None;
        }
        self.stable_tokens.get(rng.gen_range(0..self.stable_tokens.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn swap_amounts_stay_on_grid_and_in_range() {
        let policy = ActionPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let amount = policy.draw_swap_amount(&mut rng);
            assert!(amount >= policy.swap_amount_min);
            assert!(amount <= policy.swap_amount_max);
            assert!((amount % policy.swap_amount_step).is_zero());
        }
    }

    #[test]
    fn jitter_is_bounded() {
        let policy = RunPolicy::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let d = policy.draw_jitter(&mut rng);
            assert!(d >= policy.jitter_min && d <= policy.jitter_max);
        }
    }

    #[test]
    fn degenerate_ranges_collapse_to_minimum() {
        let run = RunPolicy {
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
            ..RunPolicy::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(run.draw_jitter(&mut rng), Duration::ZERO);

        let actions = ActionPolicy {
            swap_amount_max: U256::from(1u64),
            ..ActionPolicy::default()
        };
        assert_eq!(actions.draw_swap_amount(&mut rng), actions.swap_amount_min);
    }

    #[test]
    fn task_ids_follow_action_kind() {
        let ids = TaskIds::default();
        assert_eq!(ids.for_kind(ActionKind::Swap), 101);
        assert_eq!(ids.for_kind(ActionKind::AddLiquidity), 102);
        assert_eq!(ids.for_kind(ActionKind::Transfer), 103);
    }
}
