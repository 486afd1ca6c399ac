//! HTTP client for the Parley auth API.
//!
//! Thin reqwest wrapper: one method per endpoint, each mapping the
//! endpoint's documented failure statuses onto [`ClientError`].  There is
//! no retry or backoff anywhere; every failure is terminal for that
//! single attempt.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use parley_shared::constants::AUTH_TOKEN_HEADER;
use parley_shared::{ProfileUpdate, User};

use crate::error::{ClientError, Result};

/// Client for the auth API at a fixed base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

/// Payload returned by a successful OTP verification.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PhoneRequest<'a> {
    phone_number: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    phone_number: &'a str,
    otp: &'a str,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Ask the server to generate and deliver a fresh OTP, creating the
    /// account if the phone number is new.  Any prior code for that number
    /// is invalidated upstream.
    pub async fn send_otp(&self, phone_number: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.url("/api/user/send-otp"))
            .json(&PhoneRequest { phone_number })
            .send()
            .await?;
        Self::expect_sent(resp.status())
    }

    /// Same as [`send_otp`](Self::send_otp) but fails with
    /// [`ClientError::NotFound`] when no account exists for the number.
    pub async fn send_login_otp(&self, phone_number: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.url("/api/user/send-login-otp"))
            .json(&PhoneRequest { phone_number })
            .send()
            .await?;
        Self::expect_sent(resp.status())
    }

    fn expect_sent(status: StatusCode) -> Result<()> {
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => Err(ClientError::Throttled),
            s if s.is_server_error() => Err(ClientError::DeliveryFailure),
            s => Err(ClientError::UnexpectedStatus(s)),
        }
    }

    /// Check `otp` against the stored challenge for `phone_number`.
    /// On match the server consumes the code and issues a session token.
    pub async fn verify_otp(&self, phone_number: &str, otp: &str) -> Result<LoginResponse> {
        let resp = self
            .http
            .post(self.url("/api/user/verify-login-otp"))
            .json(&VerifyRequest { phone_number, otp })
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(resp.json().await?),
            StatusCode::BAD_REQUEST => Err(ClientError::InvalidCredentials),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            s => Err(ClientError::UnexpectedStatus(s)),
        }
    }

    /// Fetch the user record the given token belongs to.
    pub async fn me(&self, token: &str) -> Result<User> {
        let resp = self
            .http
            .get(self.url("/api/user/me"))
            .header(AUTH_TOKEN_HEADER, token)
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(resp.json().await?),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            s => Err(ClientError::UnexpectedStatus(s)),
        }
    }

    /// Merge the non-empty fields of `update` into the authenticated
    /// user's profile and return the updated record.
    pub async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<User> {
        let resp = self
            .http
            .put(self.url("/api/user/update-profile"))
            .header(AUTH_TOKEN_HEADER, token)
            .json(update)
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(resp.json().await?),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            s => Err(ClientError::UnexpectedStatus(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_tolerated() {
        let api = ApiClient::new("http://127.0.0.1:5000/");
        assert_eq!(
            api.url("/api/user/me"),
            "http://127.0.0.1:5000/api/user/me"
        );
    }

    #[test]
    fn send_status_mapping() {
        assert!(ApiClient::expect_sent(StatusCode::OK).is_ok());
        assert!(matches!(
            ApiClient::expect_sent(StatusCode::INTERNAL_SERVER_ERROR),
            Err(ClientError::DeliveryFailure)
        ));
        assert!(matches!(
            ApiClient::expect_sent(StatusCode::NOT_FOUND),
            Err(ClientError::NotFound)
        ));
        assert!(matches!(
            ApiClient::expect_sent(StatusCode::TOO_MANY_REQUESTS),
            Err(ClientError::Throttled)
        ));
    }
}
