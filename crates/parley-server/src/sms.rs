//! SMS delivery seam.
//!
//! The server never talks to an SMS provider directly; it goes through
//! [`SmsSender`] so that development runs log the code, tests capture it,
//! and production plugs in a real transport (Twilio or similar).

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("SMS delivery failed: {0}")]
pub struct SmsError(pub String);

/// Out-of-band delivery of a one-time passcode.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_otp(&self, to: &str, code: &str) -> Result<(), SmsError>;
}

/// Development transport: logs the code instead of sending it.
pub struct ConsoleSender;

#[async_trait]
impl SmsSender for ConsoleSender {
    async fn send_otp(&self, to: &str, code: &str) -> Result<(), SmsError> {
        tracing::info!(to, code, "OTP delivery (console transport)");
        Ok(())
    }
}
