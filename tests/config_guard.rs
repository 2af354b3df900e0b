// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use regex::Regex;
use std::fs;
use std::path::Path;

/// Fail CI if committed config files carry 64-hex private keys or a JWT.
#[test]
fn no_committed_secrets_in_configs() {
    let key = Regex::new(r"0x?[a-fA-F0-9]{64}").unwrap();
    let jwt = Regex::new(r"eyJ[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\.").unwrap();
    let candidates = [
        "config.toml",
        "config.example.toml",
        "config.dev.toml",
        ".env.example",
    ];
    for file in candidates {
        if !Path::new(file).exists() {
            continue;
        }
        let body = fs::read_to_string(file).expect("read config");
        for (idx, line) in body.lines().enumerate() {
            if key.is_match(line) || jwt.is_match(line) {
                panic!("Secret-looking value in {} at line {}", file, idx + 1);
            }
        }
    }
}

/// Wallet and proxy lists hold live secrets and must stay out of the tree.
#[test]
fn wallet_lists_are_not_committed() {
    for file in ["wallets.txt", "privateKeys.json", "proxies.txt"] {
        if !Path::new(file).exists() {
            continue;
        }
        let body = fs::read_to_string(file).expect("read input list");
        assert!(
            body.lines()
                .map(str::trim)
                .all(|l| l.is_empty() || l.starts_with('#')),
            "{} must not contain entries in the repository",
            file
        );
    }
}

/// The fakes and their fixed test keys stay out of the release library.
#[test]
fn test_fakes_are_feature_gated() {
    let lib = fs::read_to_string("src/lib.rs").expect("read lib.rs");
    let gate = Regex::new(
        r#"#\[cfg\(any\(test, feature = "test-support"\)\)\]\s*(#\[doc\(hidden\)\]\s*)?pub mod test_support;"#,
    )
    .unwrap();
    assert!(gate.is_match(&lib), "test_support must be behind the test-support feature");

    let manifest = fs::read_to_string("Cargo.toml").expect("read Cargo.toml");
    let default_features = manifest
        .lines()
        .find(|l| l.trim_start().starts_with("default ="))
        .unwrap_or("");
    assert!(!default_features.contains("test-support"));
}
