//! Wire-level constants shared by client and server.

use std::time::Duration;

/// Header carrying the opaque session token on authenticated calls.
pub const AUTH_TOKEN_HEADER: &str = "auth-token";

/// Number of digits in a one-time passcode.
pub const OTP_LENGTH: usize = 6;

/// How long a text or image slide stays on screen.
pub const SLIDE_DURATION: Duration = Duration::from_millis(6_000);

/// How long a video slide stays on screen.
pub const VIDEO_SLIDE_DURATION: Duration = Duration::from_millis(30_000);
