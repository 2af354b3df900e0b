// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    /// Upstream hiccup worth another attempt at the layer that saw it.
    #[error("Transient upstream failure: {0}")]
    Transient(String),

    #[error("RPC call failed: {0}")]
    Rpc(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transaction failed: {hash:?}, reason: {reason}")]
    Transaction { hash: String, reason: String },

    #[error("External API error: {endpoint} responded with {status}: {message}")]
    ApiCall {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }

    /// Wrap a transport/RPC error, promoting recognised upstream hiccups to `Transient`.
    pub fn from_rpc(context: &str, err: impl std::fmt::Display) -> Self {
        let message = format!("{context}: {err}");
        if is_transient_message(&message) {
            AppError::Transient(message)
        } else {
            AppError::Rpc(message)
        }
    }

    pub fn from_http(endpoint: &str, err: reqwest::Error) -> Self {
        let transient = err.is_timeout()
            || err.is_connect()
            || err
                .status()
                .map(|s| s.as_u16() == 429 || s.is_server_error())
                .unwrap_or(false);
        let message = format!("{endpoint}: {err}");
        if transient || is_transient_message(&message) {
            AppError::Transient(message)
        } else {
            AppError::Connection(message)
        }
    }
}

const TRANSIENT_MARKERS: &[&str] = &[
    "unable to complete request",
    "rate limit",
    "ratelimit",
    "too many requests",
    "429",
    "502",
    "503",
    "504",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
    "timed out",
    "timeout",
    "connection reset",
    "connection refused",
    "connection closed",
    "temporarily unavailable",
];

pub fn is_transient_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|m| lower.contains(m))
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_upstream_errors_are_transient() {
        assert!(is_transient_message("HTTP error 429 with body: slow down"));
        assert!(is_transient_message(
            "server returned an error response: Unable to complete request at this time"
        ));
        assert!(AppError::from_rpc("eth_chainId", "503 Service Unavailable").is_transient());
    }

    #[test]
    fn reverts_and_bad_params_are_not_transient() {
        assert!(!is_transient_message("execution reverted: STF"));
        let err = AppError::from_rpc("eth_sendRawTransaction", "nonce too low");
        assert!(matches!(err, AppError::Rpc(msg) if msg.contains("nonce too low")));
    }
}
