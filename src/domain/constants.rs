// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, B256, address};

// =============================================================================
// NETWORK DEFAULTS (Pharos testnet)
// =============================================================================

pub const DEFAULT_CHAIN_ID: u64 = 688_688;
pub const DEFAULT_RPC_URL: &str = "https://testnet.dplabs-internal.com";
pub const DEFAULT_API_BASE_URL: &str = "https://api.pharosnetwork.xyz";
pub const DEFAULT_API_REFERER: &str = "https://testnet.pharosnetwork.xyz/";
pub const NATIVE_SYMBOL: &str = "PHRS";

// Contracts
pub const WRAPPED_NATIVE: Address = address!("76aaaDA469D23216bE5f7C596fA25F282Ff9b364");
pub const SWAP_ROUTER: Address = address!("1a4de519154ae51200b0ad7c90f7fac75547888a");
pub const POSITION_MANAGER: Address = address!("f8a1d4ff0f9b9af7ce58e1fc1833688f3bfd6115");
pub const USDC: Address = address!("ad902cf99c2de2f1ba5ec4d642fd7e49cae9ee37");
pub const USDT: Address = address!("ed59de2d7ad9c043442e381231ee3646fc3c2939");

// =============================================================================
// POINTS API
// =============================================================================

pub const LOGIN_MESSAGE: &str = "pharos";
pub const DEFAULT_INVITE_CODE: &str = "rfX8jGZPEp7MiFJ1";

pub const TASK_ID_SWAP: u64 = 101;
pub const TASK_ID_ADD_LIQUIDITY: u64 = 102;
pub const TASK_ID_TRANSFER: u64 = 103;

/// Sent to the verify endpoint when an action produced no transaction.
pub const PLACEHOLDER_TX_HASH: B256 = B256::ZERO;

// =============================================================================
// GAS & TRANSACTION CONSTANTS
// =============================================================================

pub const TRANSFER_GAS_LIMIT: u64 = 21_000;
pub const ADD_LIQUIDITY_GAS_LIMIT: u64 = 500_000;
pub const APPROVE_GAS_LIMIT: u64 = 100_000;
/// Headroom applied to `eth_estimateGas` results (12_000 = 1.2x).
pub const GAS_ESTIMATE_MULTIPLIER_BPS: u64 = 12_000;

pub const SWAP_DEADLINE_SECS: u64 = 600;
pub const ADD_LIQUIDITY_DEADLINE_SECS: u64 = 1_800;

// =============================================================================
// INPUT FILES
// =============================================================================

pub const DEFAULT_WALLET_FILE: &str = "wallet.txt";
pub const DEFAULT_PROXY_FILE: &str = "proxies.txt";

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:138.0) Gecko/20100101 Firefox/138.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36 Edg/136.0.0.0",
];
