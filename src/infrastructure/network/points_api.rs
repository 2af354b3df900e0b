// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::domain::types::{FaucetStatus, Proxy, Session, UserPoints, VerifyStatus};
use crate::network::provider::random_user_agent;
use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, HeaderMap, HeaderValue, REFERER};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Business-level answer for calls whose only payload is success/failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiAck {
    pub ok: bool,
    pub message: String,
}

/// The points service as the orchestrator sees it. Transport failures are
/// errors; business rejections come back as values.
#[async_trait]
pub trait PointsApi: Send + Sync {
    /// Exchange a signature over the login message for a bearer token.
    async fn login(&self, address: Address, signature: &str) -> Result<String, AppError>;
    async fn profile(&self, session: &Session) -> Result<UserPoints, AppError>;
    async fn faucet_status(&self, session: &Session) -> Result<FaucetStatus, AppError>;
    async fn claim_faucet(&self, session: &Session) -> Result<ApiAck, AppError>;
    async fn check_in(&self, session: &Session) -> Result<ApiAck, AppError>;
    async fn verify_task(
        &self,
        session: &Session,
        task_id: u64,
        tx_hash: B256,
    ) -> Result<VerifyStatus, AppError>;
}

pub type SharedPointsApi = Arc<dyn PointsApi>;

/// Builds a points client bound to one wallet pass's proxy.
pub trait ApiConnector: Send + Sync {
    fn connect(&self, proxy: Option<&Proxy>) -> Result<SharedPointsApi, AppError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    jwt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileData {
    user_info: ProfileUserInfo,
}

#[derive(Debug, Deserialize)]
struct ProfileUserInfo {
    #[serde(rename = "TaskPoints", default)]
    task_points: i64,
    #[serde(rename = "TotalPoints", default)]
    total_points: i64,
}

#[derive(Debug, Deserialize)]
struct FaucetStatusData {
    is_able_to_faucet: bool,
    // Field name as served by the API.
    #[serde(rename = "avaliable_timestamp", default)]
    available_timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    #[serde(default)]
    verified: Option<bool>,
}

const PENDING_MARKERS: &[&str] = &["pending", "not found", "not yet", "try again", "processing"];

/// Map a verify response onto the three outcomes the verifier distinguishes.
pub fn classify_verify(code: i64, message: &str, verified: Option<bool>) -> VerifyStatus {
    if code == 0 && verified != Some(false) {
        return VerifyStatus::Verified;
    }
    let lower = message.to_ascii_lowercase();
    if PENDING_MARKERS.iter().any(|m| lower.contains(m)) {
        VerifyStatus::Pending
    } else if message.is_empty() {
        VerifyStatus::Rejected(format!("code {}", code))
    } else {
        VerifyStatus::Rejected(message.to_string())
    }
}

fn browser_headers(referer: &str) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    let pairs: [(&str, &str); 8] = [
        ("sec-ch-ua", "\"Chromium\";v=\"136\", \"Brave\";v=\"136\", \"Not.A/Brand\";v=\"99\""),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"Windows\""),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-site"),
        ("sec-gpc", "1"),
        ("referrer-policy", "strict-origin-when-cross-origin"),
    ];
    for (name, value) in pairs {
        headers.insert(name, HeaderValue::from_static(value));
    }
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));
    let referer = HeaderValue::from_str(referer)
        .map_err(|e| AppError::Config(format!("Invalid API referer: {}", e)))?;
    headers.insert(REFERER, referer);
    Ok(headers)
}

pub struct HttpPointsApi {
    client: reqwest::Client,
    base_url: Url,
    invite_code: String,
}

impl HttpPointsApi {
    pub fn new(
        base_url: Url,
        referer: &str,
        invite_code: &str,
        timeout: Duration,
        proxy: Option<&Proxy>,
    ) -> Result<Self, AppError> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(random_user_agent())
            .default_headers(browser_headers(referer)?);
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| AppError::Initialization(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            invite_code: invite_code.to_string(),
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<Envelope<T>, AppError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| AppError::Config(format!("Invalid API path {}: {}", path, e)))?;
        let resp = self
            .client
            .request(method, url)
            .query(query)
            .header(AUTHORIZATION, format!("Bearer {}", token.unwrap_or("null")))
            .send()
            .await
            .map_err(|e| AppError::from_http(path, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AppError::from_http(path, e))?;
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(AppError::Transient(format!("{} responded with {}", path, status)));
        }
        if !status.is_success() {
            return Err(AppError::ApiCall {
                endpoint: path.to_string(),
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        serde_json::from_str(&body).map_err(|e| AppError::ApiCall {
            endpoint: path.to_string(),
            status: status.as_u16(),
            message: format!("Unexpected response body: {}", e),
        })
    }

    fn address_query(session: &Session) -> Vec<(&'static str, String)> {
        vec![("address", session.address.to_string())]
    }

    fn ack(envelope: Envelope<serde_json::Value>) -> ApiAck {
        ApiAck {
            ok: envelope.code == 0,
            message: envelope.msg,
        }
    }
}

#[async_trait]
impl PointsApi for HttpPointsApi {
    async fn login(&self, address: Address, signature: &str) -> Result<String, AppError> {
        let query = [
            ("address", address.to_string()),
            ("signature", signature.to_string()),
            ("invite_code", self.invite_code.clone()),
        ];
        let envelope: Envelope<LoginData> =
            self.request(Method::POST, "/user/login", &query, None).await?;
        match envelope.data.and_then(|d| d.jwt) {
            Some(jwt) if envelope.code == 0 && !jwt.is_empty() => Ok(jwt),
            _ => Err(AppError::Auth(if envelope.msg.is_empty() {
                format!("login rejected with code {}", envelope.code)
            } else {
                envelope.msg
            })),
        }
    }

    async fn profile(&self, session: &Session) -> Result<UserPoints, AppError> {
        let envelope: Envelope<ProfileData> = self
            .request(
                Method::GET,
                "/user/profile",
                &Self::address_query(session),
                Some(&session.token),
            )
            .await?;
        match envelope.data {
            Some(data) if envelope.code == 0 => Ok(UserPoints {
                task_points: data.user_info.task_points,
                total_points: data.user_info.total_points,
            }),
            _ => Err(AppError::ApiCall {
                endpoint: "/user/profile".into(),
                status: 200,
                message: envelope.msg,
            }),
        }
    }

    async fn faucet_status(&self, session: &Session) -> Result<FaucetStatus, AppError> {
        let envelope: Envelope<FaucetStatusData> = self
            .request(
                Method::GET,
                "/faucet/status",
                &Self::address_query(session),
                Some(&session.token),
            )
            .await?;
        match envelope.data {
            Some(data) if envelope.code == 0 => Ok(if data.is_able_to_faucet {
                FaucetStatus::Available
            } else {
                FaucetStatus::Cooldown {
                    available_at: data.available_timestamp.unwrap_or_default(),
                }
            }),
            _ => Err(AppError::ApiCall {
                endpoint: "/faucet/status".into(),
                status: 200,
                message: envelope.msg,
            }),
        }
    }

    async fn claim_faucet(&self, session: &Session) -> Result<ApiAck, AppError> {
        let envelope = self
            .request(
                Method::POST,
                "/faucet/daily",
                &Self::address_query(session),
                Some(&session.token),
            )
            .await?;
        Ok(Self::ack(envelope))
    }

    async fn check_in(&self, session: &Session) -> Result<ApiAck, AppError> {
        let envelope = self
            .request(
                Method::POST,
                "/sign/in",
                &Self::address_query(session),
                Some(&session.token),
            )
            .await?;
        Ok(Self::ack(envelope))
    }

    async fn verify_task(
        &self,
        session: &Session,
        task_id: u64,
        tx_hash: B256,
    ) -> Result<VerifyStatus, AppError> {
        let query = [
            ("address", session.address.to_string()),
            ("task_id", task_id.to_string()),
            ("tx_hash", tx_hash.to_string()),
        ];
        let envelope: Envelope<VerifyData> = self
            .request(Method::POST, "/task/verify", &query, Some(&session.token))
            .await?;
        let verified = envelope.data.and_then(|d| d.verified);
        Ok(classify_verify(envelope.code, &envelope.msg, verified))
    }
}

pub struct HttpApiConnector {
    base_url: Url,
    referer: String,
    invite_code: String,
    timeout: Duration,
}

impl HttpApiConnector {
    pub fn new(base_url: Url, referer: String, invite_code: String, timeout: Duration) -> Self {
        Self {
            base_url,
            referer,
            invite_code,
            timeout,
        }
    }
}

impl ApiConnector for HttpApiConnector {
    fn connect(&self, proxy: Option<&Proxy>) -> Result<SharedPointsApi, AppError> {
        let api = HttpPointsApi::new(
            self.base_url.clone(),
            &self.referer,
            &self.invite_code,
            self.timeout,
            proxy,
        )?;
        Ok(Arc::new(api))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_classification_separates_pending_from_rejection() {
        assert_eq!(classify_verify(0, "ok", Some(true)), VerifyStatus::Verified);
        assert_eq!(classify_verify(0, "", None), VerifyStatus::Verified);
        assert_eq!(
            classify_verify(1, "Transaction pending, please retry", None),
            VerifyStatus::Pending
        );
        assert_eq!(
            classify_verify(0, "tx not found", Some(false)),
            VerifyStatus::Pending
        );
        assert_eq!(
            classify_verify(1, "task already completed", None),
            VerifyStatus::Rejected("task already completed".into())
        );
        assert_eq!(
            classify_verify(7, "", Some(false)),
            VerifyStatus::Rejected("code 7".into())
        );
    }

    #[test]
    fn profile_envelope_reads_point_totals() {
        let body = r#"{"code":0,"msg":"ok","data":{"user_info":{"ID":1,"TaskPoints":120,"TotalPoints":450}}}"#;
        let env: Envelope<ProfileData> = serde_json::from_str(body).expect("parse");
        assert_eq!(env.code, 0);
        let info = env.data.expect("data").user_info;
        assert_eq!((info.task_points, info.total_points), (120, 450));
    }

    #[test]
    fn faucet_envelope_accepts_served_field_spelling() {
        let body = r#"{"code":0,"msg":"ok","data":{"is_able_to_faucet":false,"avaliable_timestamp":1750000000}}"#;
        let env: Envelope<FaucetStatusData> = serde_json::from_str(body).expect("parse");
        let data = env.data.expect("data");
        assert!(!data.is_able_to_faucet);
        assert_eq!(data.available_timestamp, Some(1_750_000_000));
    }

    #[test]
    fn login_envelope_without_data_parses() {
        let env: Envelope<LoginData> =
            serde_json::from_str(r#"{"code":1,"msg":"invalid signature"}"#).expect("parse");
        assert!(env.data.is_none());
        assert_eq!(env.msg, "invalid signature");
    }

    #[test]
    fn browser_headers_carry_referer() {
        let headers = browser_headers("https://testnet.pharosnetwork.xyz/").expect("headers");
        assert_eq!(
            headers.get(REFERER).and_then(|v| v.to_str().ok()),
            Some("https://testnet.pharosnetwork.xyz/")
        );
        assert!(headers.contains_key("sec-fetch-mode"));
    }
}
