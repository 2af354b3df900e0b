// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::app::policy::{
    ActionPolicy, CyclePolicy, RetrySettings, RunPolicy, StableToken, TaskIds,
};
use crate::common::data_path::resolve_input_path;
use crate::common::retry::RetryPolicy;
use crate::domain::constants;
use crate::domain::error::AppError;
use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub keep_alive_on_error: bool,

    // Inputs
    #[serde(default = "default_wallet_file")]
    pub wallet_file: String,
    #[serde(default = "default_proxy_file")]
    pub proxy_file: String,
    pub data_dir: Option<String>,

    // Chain
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // Points API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_api_referer")]
    pub api_referer: String,
    #[serde(default = "default_invite_code")]
    pub invite_code: String,
    #[serde(default = "default_login_message")]
    pub login_message: String,
    #[serde(default = "default_task_id_transfer")]
    pub task_id_transfer: u64,
    #[serde(default = "default_task_id_swap")]
    pub task_id_swap: u64,
    #[serde(default = "default_task_id_add_liquidity")]
    pub task_id_add_liquidity: u64,

    // Scheduling
    #[serde(default = "default_action_count")]
    pub transfer_count: u32,
    #[serde(default = "default_action_count")]
    pub swap_count: u32,
    #[serde(default = "default_action_count")]
    pub add_liquidity_count: u32,
    #[serde(default = "default_true")]
    pub randomize_order: bool,
    #[serde(default = "default_true")]
    pub check_in_first: bool,
    #[serde(default = "default_jitter_min_ms")]
    pub jitter_min_ms: u64,
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_outer_retry_delay_secs")]
    pub outer_retry_delay_secs: u64,
    #[serde(default = "default_true")]
    pub render_countdown: bool,

    // Retry bounds
    #[serde(default = "default_provider_attempts")]
    pub provider_attempts: usize,
    #[serde(default = "default_provider_retry_delay_ms")]
    pub provider_retry_delay_ms: u64,
    #[serde(default = "default_receipt_attempts")]
    pub receipt_attempts: usize,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_submit_attempts")]
    pub submit_attempts: usize,
    #[serde(default = "default_submit_retry_delay_ms")]
    pub submit_retry_delay_ms: u64,
    #[serde(default = "default_read_attempts")]
    pub read_attempts: usize,
    #[serde(default = "default_read_retry_delay_ms")]
    pub read_retry_delay_ms: u64,
    #[serde(default = "default_verify_attempts")]
    pub verify_attempts: usize,
    #[serde(default = "default_verify_retry_delay_ms")]
    pub verify_retry_delay_ms: u64,

    // Contracts
    pub wrapped_native: Option<Address>,
    pub swap_router: Option<Address>,
    pub position_manager: Option<Address>,
    /// Symbol -> token address
    pub stable_tokens: Option<BTreeMap<String, String>>,

    // Amounts (native amounts in ether units, LP desired amounts in raw token units)
    #[serde(default = "default_transfer_amount")]
    pub transfer_amount: String,
    #[serde(default = "default_swap_amount_min")]
    pub swap_amount_min: String,
    #[serde(default = "default_swap_amount_max")]
    pub swap_amount_max: String,
    #[serde(default = "default_swap_amount_step")]
    pub swap_amount_step: String,
    #[serde(default = "default_swap_fee")]
    pub swap_fee: u32,
    #[serde(default = "default_lp_fee")]
    pub lp_fee: u32,
    #[serde(default = "default_lp_tick_lower")]
    pub lp_tick_lower: i32,
    #[serde(default = "default_lp_tick_upper")]
    pub lp_tick_upper: i32,
    #[serde(default = "default_lp_amount0_desired")]
    pub lp_amount0_desired: String,
    #[serde(default = "default_lp_amount1_desired")]
    pub lp_amount1_desired: String,
    #[serde(default = "default_lp_value")]
    pub lp_value: String,
}

// Defaults
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_wallet_file() -> String {
    constants::DEFAULT_WALLET_FILE.to_string()
}
fn default_proxy_file() -> String {
    constants::DEFAULT_PROXY_FILE.to_string()
}
fn default_rpc_url() -> String {
    constants::DEFAULT_RPC_URL.to_string()
}
fn default_chain_id() -> u64 {
    constants::DEFAULT_CHAIN_ID
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_api_base_url() -> String {
    constants::DEFAULT_API_BASE_URL.to_string()
}
fn default_api_referer() -> String {
    constants::DEFAULT_API_REFERER.to_string()
}
fn default_invite_code() -> String {
    constants::DEFAULT_INVITE_CODE.to_string()
}
fn default_login_message() -> String {
    constants::LOGIN_MESSAGE.to_string()
}
fn default_task_id_transfer() -> u64 {
    constants::TASK_ID_TRANSFER
}
fn default_task_id_swap() -> u64 {
    constants::TASK_ID_SWAP
}
fn default_task_id_add_liquidity() -> u64 {
    constants::TASK_ID_ADD_LIQUIDITY
}
fn default_action_count() -> u32 {
    30
}
fn default_jitter_min_ms() -> u64 {
    2_000
}
fn default_jitter_max_ms() -> u64 {
    5_000
}
fn default_cooldown_secs() -> u64 {
    24 * 60 * 60
}
fn default_outer_retry_delay_secs() -> u64 {
    30
}
fn default_provider_attempts() -> usize {
    3
}
fn default_provider_retry_delay_ms() -> u64 {
    2_000
}
fn default_receipt_attempts() -> usize {
    30
}
fn default_receipt_poll_ms() -> u64 {
    2_000
}
fn default_submit_attempts() -> usize {
    3
}
fn default_submit_retry_delay_ms() -> u64 {
    1_000
}
fn default_read_attempts() -> usize {
    3
}
fn default_read_retry_delay_ms() -> u64 {
    500
}
fn default_verify_attempts() -> usize {
    5
}
fn default_verify_retry_delay_ms() -> u64 {
    5_000
}
fn default_transfer_amount() -> String {
    "0.000001".to_string()
}
fn default_swap_amount_min() -> String {
    "0.0001".to_string()
}
fn default_swap_amount_max() -> String {
    "0.0009".to_string()
}
fn default_swap_amount_step() -> String {
    "0.0001".to_string()
}
/// Largest value a Uniswap v3 `uint24` fee field can hold.
const MAX_FEE_TIER: u32 = 0x00FF_FFFF;

fn default_swap_fee() -> u32 {
    3_000
}
fn default_lp_fee() -> u32 {
    500
}
fn default_lp_tick_lower() -> i32 {
    51_530
}
fn default_lp_tick_upper() -> i32 {
    51_550
}
fn default_lp_amount0_desired() -> String {
    "100000000000".to_string()
}
fn default_lp_amount1_desired() -> String {
    "8779257879444".to_string()
}
fn default_lp_value() -> String {
    "0.0000001".to_string()
}

fn resolve_config_path(explicit: Option<&str>) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn parse_native(field: &str, raw: &str) -> Result<U256, AppError> {
    parse_ether(raw.trim()).map_err(|e| AppError::Validation {
        field: field.to_string(),
        message: format!("invalid native amount {raw:?}: {e}"),
    })
}

fn parse_raw_units(field: &str, raw: &str) -> Result<U256, AppError> {
    U256::from_str(raw.trim()).map_err(|e| AppError::Validation {
        field: field.to_string(),
        message: format!("invalid integer amount {raw:?}: {e}"),
    })
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = resolve_config_path(path) {
            builder = builder.add_source(File::from(Path::new(&selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Precedence: env/.env > config file > defaults.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        Url::parse(&self.rpc_url)
            .map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;
        Url::parse(&self.api_base_url)
            .map_err(|e| AppError::Config(format!("Invalid API base URL: {}", e)))?;
        if self.chain_id == 0 {
            return Err(AppError::Config("chain_id must be non-zero".into()));
        }
        if self.jitter_min_ms > self.jitter_max_ms {
            return Err(AppError::Validation {
                field: "jitter_min_ms".into(),
                message: "must not exceed jitter_max_ms".into(),
            });
        }
        for (field, fee) in [("swap_fee", self.swap_fee), ("lp_fee", self.lp_fee)] {
            if fee > MAX_FEE_TIER {
                return Err(AppError::Validation {
                    field: field.into(),
                    message: format!("{fee} does not fit a uint24 fee tier"),
                });
            }
        }
        if self.lp_tick_lower >= self.lp_tick_upper {
            return Err(AppError::Validation {
                field: "lp_tick_lower".into(),
                message: "must be below lp_tick_upper".into(),
            });
        }
        let policy = self.action_policy()?;
        if policy.swap_amount_min > policy.swap_amount_max {
            return Err(AppError::Validation {
                field: "swap_amount_min".into(),
                message: "must not exceed swap_amount_max".into(),
            });
        }
        Ok(())
    }

    pub fn wallet_path(&self) -> PathBuf {
        resolve_input_path(&self.wallet_file, self.data_dir.as_deref())
    }

    pub fn proxy_path(&self) -> PathBuf {
        resolve_input_path(&self.proxy_file, self.data_dir.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn run_policy(&self) -> RunPolicy {
        RunPolicy {
            transfer_count: self.transfer_count,
            swap_count: self.swap_count,
            add_liquidity_count: self.add_liquidity_count,
            randomize_order: self.randomize_order,
            check_in_first: self.check_in_first,
            jitter_min: Duration::from_millis(self.jitter_min_ms),
            jitter_max: Duration::from_millis(self.jitter_max_ms),
        }
    }

    pub fn cycle_policy(&self, once: bool) -> CyclePolicy {
        CyclePolicy {
            cooldown: Duration::from_secs(self.cooldown_secs),
            outer_retry_delay: Duration::from_secs(self.outer_retry_delay_secs),
            max_cycles: once.then_some(1),
            render_countdown: self.render_countdown,
        }
    }

    pub fn retry_settings(&self) -> RetrySettings {
        RetrySettings {
            provider: RetryPolicy::new(
                self.provider_attempts,
                Duration::from_millis(self.provider_retry_delay_ms),
            ),
            receipt: RetryPolicy::new(
                self.receipt_attempts,
                Duration::from_millis(self.receipt_poll_ms),
            ),
            submit: RetryPolicy::new(
                self.submit_attempts,
                Duration::from_millis(self.submit_retry_delay_ms),
            ),
            read: RetryPolicy::new(
                self.read_attempts,
                Duration::from_millis(self.read_retry_delay_ms),
            ),
            verify: RetryPolicy::new(
                self.verify_attempts,
                Duration::from_millis(self.verify_retry_delay_ms),
            ),
        }
    }

    pub fn task_ids(&self) -> TaskIds {
        TaskIds {
            transfer: self.task_id_transfer,
            swap: self.task_id_swap,
            add_liquidity: self.task_id_add_liquidity,
        }
    }

    pub fn stable_tokens(&self) -> Result<Vec<StableToken>, AppError> {
        let Some(map) = &self.stable_tokens else {
            return Ok(ActionPolicy::default().stable_tokens);
        };
        let mut tokens = Vec::with_capacity(map.len());
        for (symbol, raw) in map {
            let address = Address::from_str(raw.trim()).map_err(|e| AppError::Validation {
                field: format!("stable_tokens.{symbol}"),
                message: e.to_string(),
            })?;
            tokens.push(StableToken {
                symbol: symbol.to_uppercase(),
                address,
            });
        }
        if tokens.is_empty() {
            return Err(AppError::Config("stable_tokens must not be empty".into()));
        }
        Ok(tokens)
    }

    pub fn action_policy(&self) -> Result<ActionPolicy, AppError> {
        Ok(ActionPolicy {
            chain_id: self.chain_id,
            wrapped_native: self.wrapped_native.unwrap_or(constants::WRAPPED_NATIVE),
            swap_router: self.swap_router.unwrap_or(constants::SWAP_ROUTER),
            position_manager: self.position_manager.unwrap_or(constants::POSITION_MANAGER),
            stable_tokens: self.stable_tokens()?,
            transfer_amount: parse_native("transfer_amount", &self.transfer_amount)?,
            swap_amount_min: parse_native("swap_amount_min", &self.swap_amount_min)?,
            swap_amount_max: parse_native("swap_amount_max", &self.swap_amount_max)?,
            swap_amount_step: parse_native("swap_amount_step", &self.swap_amount_step)?,
            swap_fee: self.swap_fee,
            lp_fee: self.lp_fee,
            lp_tick_lower: self.lp_tick_lower,
            lp_tick_upper: self.lp_tick_upper,
            lp_amount0_desired: parse_raw_units("lp_amount0_desired", &self.lp_amount0_desired)?,
            lp_amount1_desired: parse_raw_units("lp_amount1_desired", &self.lp_amount1_desired)?,
            lp_value: parse_native("lp_value", &self.lp_value)?,
        })
    }
}
