//! # parley-server
//!
//! Minimal phone-OTP authentication backend for the Parley client.
//!
//! This crate provides:
//! - **REST API** (axum) for OTP request/verification, the current-user
//!   lookup, and profile updates
//! - **In-memory user directory** holding accounts, live OTP challenges
//!   (at most one per phone number, TTL-bounded), and session tokens
//! - **Pluggable SMS delivery** behind the [`sms::SmsSender`] trait
//! - **Per-phone OTP send throttling** to keep one number from draining
//!   the SMS budget

pub mod api;
pub mod config;
pub mod error;
pub mod sms;
pub mod throttle;
pub mod users;
