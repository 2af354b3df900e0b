// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::parsing::{content_lines, parse_b256_hex};
use crate::domain::types::{Proxy, Wallet};
use alloy::signers::local::PrivateKeySigner;
use std::fs;
use std::path::Path;

/// Parse hex-prefixed secrets, one per line. Duplicates are kept.
pub fn parse_wallets(body: &str) -> Vec<Wallet> {
    let mut wallets = Vec::new();
    for (idx, line) in content_lines(body).enumerate() {
        if !line.starts_with("0x") {
            continue;
        }
        let signer = parse_b256_hex(line)
            .and_then(|bytes| PrivateKeySigner::from_bytes(&bytes).ok());
        match signer {
            Some(signer) => wallets.push(Wallet::new(signer)),
            None => {
                tracing::warn!(target: "inputs", line = idx + 1, "Skipping malformed private key");
            }
        }
    }
    wallets
}

pub fn parse_proxies(body: &str) -> Vec<Proxy> {
    content_lines(body).filter_map(Proxy::parse).collect()
}

/// Missing or unreadable file yields an empty list.
pub fn load_wallets(path: &Path) -> Vec<Wallet> {
    match fs::read_to_string(path) {
        Ok(body) => {
            let wallets = parse_wallets(&body);
            tracing::info!(target: "inputs", path = %path.display(), count = wallets.len(), "Loaded wallets");
            wallets
        }
        Err(e) => {
            tracing::warn!(target: "inputs", path = %path.display(), error = %e, "No wallet file found or failed to load");
            Vec::new()
        }
    }
}

/// Missing file means direct connections.
pub fn load_proxies(path: &Path) -> Vec<Proxy> {
    match fs::read_to_string(path) {
        Ok(body) => {
            let proxies = parse_proxies(&body);
            if proxies.is_empty() {
                tracing::info!(target: "inputs", path = %path.display(), "Proxy file is empty; using direct mode");
            } else {
                tracing::info!(target: "inputs", count = proxies.len(), "Loaded proxies for rotation");
            }
            proxies
        }
        Err(_) => {
            tracing::info!(target: "inputs", path = %path.display(), "No proxy file found; using direct mode");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
    const KEY_B: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

    #[test]
    fn wallets_keep_duplicates_and_skip_noise() {
        let body = format!("{KEY_A}\n\nnot-a-key\n{KEY_B}\n{KEY_A}\n0x1234\n");
        let wallets = parse_wallets(&body);
        assert_eq!(wallets.len(), 3);
        assert_eq!(wallets[0].address, wallets[2].address);
        assert_ne!(wallets[0].address, wallets[1].address);
    }

    #[test]
    fn missing_files_are_not_fatal() {
        let dir = std::env::temp_dir().join(format!("autopilot-missing-{}", std::process::id()));
        assert!(load_wallets(&dir.join("wallet.txt")).is_empty());
        assert!(load_proxies(&dir.join("proxies.txt")).is_empty());
    }

    #[test]
    fn proxies_are_normalised() {
        let proxies = parse_proxies("127.0.0.1:8080\n\nsocks5://10.1.1.1:1080\n");
        assert_eq!(proxies.len(), 2);
        assert_eq!(proxies[0].as_str(), "http://127.0.0.1:8080");
    }
}
