//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// How long an issued OTP challenge stays verifiable.
    /// Env: `OTP_TTL_SECS`
    /// Default: 300 seconds.
    pub otp_ttl: Duration,

    /// Sustained OTP send rate per phone number, in sends per second.
    /// Env: `OTP_SEND_RATE`
    /// Default: one per minute.
    pub otp_send_rate: f64,

    /// Burst allowance for OTP sends per phone number.
    /// Env: `OTP_SEND_BURST`
    /// Default: 3.
    pub otp_send_burst: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 5000).into(),
            otp_ttl: Duration::from_secs(300),
            otp_send_rate: 1.0 / 60.0,
            otp_send_burst: 3.0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(val) = std::env::var("OTP_TTL_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.otp_ttl = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid OTP_TTL_SECS, using default"),
            }
        }

        if let Ok(val) = std::env::var("OTP_SEND_RATE") {
            match val.parse::<f64>() {
                Ok(rate) if rate > 0.0 => config.otp_send_rate = rate,
                _ => tracing::warn!(value = %val, "Invalid OTP_SEND_RATE, using default"),
            }
        }

        if let Ok(val) = std::env::var("OTP_SEND_BURST") {
            match val.parse::<f64>() {
                Ok(burst) if burst >= 1.0 => config.otp_send_burst = burst,
                _ => tracing::warn!(value = %val, "Invalid OTP_SEND_BURST, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
