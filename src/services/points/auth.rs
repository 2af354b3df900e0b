// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::domain::types::{Session, Wallet};
use crate::network::points_api::PointsApi;
use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;
use chrono::Utc;

/// EIP-191 personal signature over `message`, hex encoded with a `0x` prefix
/// and a 27/28 recovery byte.
pub fn sign_login_message(signer: &PrivateKeySigner, message: &str) -> Result<String, AppError> {
    let signature = signer
        .sign_message_sync(message.as_bytes())
        .map_err(|e| AppError::Auth(format!("Login signing failed: {}", e)))?;
    Ok(format!("0x{}", hex::encode(signature.as_bytes())))
}

pub struct SessionAuthenticator {
    message: String,
}

impl SessionAuthenticator {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Single attempt. Any failure comes back as `AppError::Auth`.
    pub async fn login(&self, api: &dyn PointsApi, wallet: &Wallet) -> Result<Session, AppError> {
        let signature = sign_login_message(wallet.signer(), &self.message)?;
        let token = api
            .login(wallet.address, &signature)
            .await
            .map_err(|e| match e {
                AppError::Auth(_) => e,
                other => AppError::Auth(other.to_string()),
            })?;
        tracing::debug!(target: "points", address = %wallet.address, "Session established");
        Ok(Session {
            address: wallet.address,
            token,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakePointsApi, test_wallet};
    use alloy::primitives::Signature;

    #[test]
    fn login_signature_recovers_to_wallet() {
        let wallet = test_wallet(0);
        let sig_hex = sign_login_message(wallet.signer(), "pharos").expect("sign");
        assert!(sig_hex.starts_with("0x"));
        assert_eq!(sig_hex.len(), 2 + 130);

        let bytes = hex::decode(&sig_hex[2..]).expect("hex");
        assert!(bytes[64] == 27 || bytes[64] == 28);
        let sig = Signature::from_raw(&bytes).expect("signature");
        let recovered = sig.recover_address_from_msg("pharos").expect("recover");
        assert_eq!(recovered, wallet.address);
    }

    #[tokio::test]
    async fn rejected_login_is_an_auth_error() {
        let wallet = test_wallet(1);
        let api = FakePointsApi::default();
        api.reject_login(wallet.address);

        let err = SessionAuthenticator::new("pharos")
            .login(&api, &wallet)
            .await
            .expect_err("must fail");
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn session_carries_issued_token() {
        let wallet = test_wallet(2);
        let api = FakePointsApi::default();
        let session = SessionAuthenticator::new("pharos")
            .login(&api, &wallet)
            .await
            .expect("login");
        assert_eq!(session.address, wallet.address);
        assert_eq!(session.token, FakePointsApi::token_for(wallet.address));
    }
}
